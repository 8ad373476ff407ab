use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

use ospf_sim::{
    cli::{self, Command},
    config::SimulatorConfig,
    simulation::Simulator,
    topology::Preset,
};

/// Interactive OSPF network simulator.
#[derive(Debug, Parser)]
#[command(name = "ospf-sim", version)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Solver base URL; overrides the config file
    #[arg(long)]
    solver: Option<String>,

    /// Topology JSON file to load
    #[arg(short, long, conflicts_with = "preset")]
    topology: Option<PathBuf>,

    /// Preset to load when no topology file is given (single_area, multi_area, complex)
    #[arg(short, long)]
    preset: Option<Preset>,

    /// Run the simulation once before reading commands
    #[arg(long)]
    simulate: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => SimulatorConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => SimulatorConfig::default(),
    };
    if let Some(endpoint) = &args.solver {
        config = config.with_solver_endpoint(endpoint.clone());
    }

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(config.log_filter.as_deref().unwrap_or("info"))?,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run(args, config))
}

async fn run(args: Args, config: SimulatorConfig) -> Result<()> {
    let mut sim = Simulator::from_config(&config);
    match (&args.topology, args.preset) {
        (Some(path), _) => sim
            .load_topology(path)
            .with_context(|| format!("loading topology {}", path.display()))?,
        (None, preset) => sim.load_preset(preset.unwrap_or(Preset::SingleArea))?,
    }
    info!(
        devices = sim.store().device_count(),
        links = sim.store().link_count(),
        "topology ready"
    );

    let mut stdout = tokio::io::stdout();
    if args.simulate {
        print_lines(&mut stdout, &cli::execute(&mut sim, &Command::Simulate).await?).await?;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        stdout.write_all(b"ospf-sim> ").await?;
        stdout.flush().await?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let output = match Command::parse(&line) {
            Ok(None) => continue,
            Ok(Some(Command::Exit)) => break,
            Ok(Some(command)) => match cli::execute(&mut sim, &command).await {
                Ok(output) => output,
                Err(e) => vec![format!("Error: {e}")],
            },
            Err(e) => vec![e.to_string()],
        };
        print_lines(&mut stdout, &output).await?;
    }
    Ok(())
}

async fn print_lines(stdout: &mut tokio::io::Stdout, lines: &[String]) -> Result<()> {
    for line in lines {
        stdout.write_all(line.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
    }
    stdout.flush().await?;
    Ok(())
}
