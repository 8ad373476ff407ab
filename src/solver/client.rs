/*!
Transport to the external solver.

This module defines:
- `SolverError`: every way a solver call can fail.
- `SolverTransport`: an async trait hiding how a request reaches a solver.
- `HttpSolverClient`: the HTTP implementation.
*/

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::solver::protocol::{SolverRequest, SolverResponse};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SolverError {
    #[error("Solver unreachable: {0}")]
    Transport(String),
    #[error("Solver did not answer within {0:?}")]
    Timeout(Duration),
    #[error("Solver returned HTTP {0}")]
    Status(u16),
    #[error("Solver response could not be decoded: {0}")]
    Decode(String),
    #[error("Solver reported failure: {0}")]
    Rejected(String),
    #[error("Solver response is inconsistent with the topology: {0}")]
    Invalid(String),
}

#[async_trait]
pub trait SolverTransport: Send + Sync {
    async fn solve(&self, request: &SolverRequest) -> Result<SolverResponse, SolverError>;
}

pub struct HttpSolverClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpSolverClient {
    /// `endpoint` is the solver's base URL, e.g. `http://localhost:8000`.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    pub fn url(&self) -> String {
        format!("{}/ospf", self.endpoint.trim_end_matches('/'))
    }
}

#[async_trait]
impl SolverTransport for HttpSolverClient {
    async fn solve(&self, request: &SolverRequest) -> Result<SolverResponse, SolverError> {
        let url = self.url();
        debug!(%url, devices = request.topology.devices.len(), "posting topology to solver");
        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| SolverError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SolverError::Status(response.status().as_u16()));
        }
        response
            .json::<SolverResponse>()
            .await
            .map_err(|e| SolverError::Decode(e.to_string()))
    }
}
