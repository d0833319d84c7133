//! HTTP client for the remote face-comparison service.

use std::io::Read;
use std::time::Duration;

use facecmp_match::{ComparisonMatrix, DistanceMatrix};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::CompareError;
use crate::session::Comparator;

const MAX_RESPONSE_BYTES: usize = 256 * 1024;

#[derive(Clone, Debug, Serialize)]
pub struct CompareRequest<'a> {
    pub urls: &'a [String],
}

/// A successful, shape-checked service reply.
#[derive(Clone, Debug, PartialEq)]
pub struct ServiceResponse {
    pub matrix: ComparisonMatrix,
    pub distances: DistanceMatrix,
    pub threshold: Option<f64>,
}

#[derive(Clone, Debug, Deserialize)]
struct CompareResponseWire {
    matrix: Option<Vec<Vec<bool>>>,
    distances: Option<Vec<Vec<f64>>>,
    threshold: Option<f64>,
    error: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
struct ErrorWire {
    error: Option<String>,
}

pub struct ComparisonClient {
    agent: ureq::Agent,
    base_url: String,
}

impl ComparisonClient {
    pub fn new(cfg: &Config) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(cfg.connect_timeout_secs))
            .build();
        Self {
            agent,
            base_url: cfg.api_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `POST /compare` with the given URLs. Exactly one attempt is made.
    pub fn compare(&self, urls: &[String]) -> Result<ServiceResponse, CompareError> {
        let url = format!("{}/compare", self.base_url);
        log::debug!("POST {} with {} url(s)", url, urls.len());
        let req = self
            .agent
            .post(&url)
            .set("Accept", "application/json")
            .set("Content-Type", "application/json");

        let response = match req.send_json(CompareRequest { urls }) {
            Ok(response) => response,
            Err(ureq::Error::Status(code, response)) => {
                let body = read_body_limited(response).unwrap_or_else(|err| err);
                return Err(map_status_error(code, &body));
            }
            Err(ureq::Error::Transport(err)) => {
                return Err(CompareError::TransportFailure(err.to_string()));
            }
        };

        let body = read_body_limited(response).map_err(CompareError::ServiceError)?;
        parse_compare_response(&body)
    }

    /// `GET /`, the service's health check.
    pub fn health(&self) -> Result<serde_json::Value, CompareError> {
        let url = format!("{}/", self.base_url);
        let response = match self.agent.get(&url).call() {
            Ok(response) => response,
            Err(ureq::Error::Status(code, response)) => {
                let body = read_body_limited(response).unwrap_or_else(|err| err);
                return Err(map_status_error(code, &body));
            }
            Err(ureq::Error::Transport(err)) => {
                return Err(CompareError::TransportFailure(err.to_string()));
            }
        };
        let body = read_body_limited(response).map_err(CompareError::ServiceError)?;
        serde_json::from_str(body.trim())
            .map_err(|err| CompareError::ServiceError(format!("invalid health response: {err}")))
    }
}

impl Comparator for ComparisonClient {
    fn compare(&self, urls: &[String]) -> Result<ServiceResponse, CompareError> {
        ComparisonClient::compare(self, urls)
    }
}

fn read_body_limited(response: ureq::Response) -> Result<String, String> {
    let mut limited = response.into_reader().take(MAX_RESPONSE_BYTES as u64 + 1);
    let mut bytes = Vec::new();
    limited
        .read_to_end(&mut bytes)
        .map_err(|err| format!("failed to read response: {err}"))?;
    if bytes.len() > MAX_RESPONSE_BYTES {
        return Err(format!("Response exceeded {MAX_RESPONSE_BYTES} bytes"));
    }
    String::from_utf8(bytes).map_err(|err| format!("response is not UTF-8: {err}"))
}

fn map_status_error(code: u16, body: &str) -> CompareError {
    let trimmed = body.trim();
    if let Ok(ErrorWire { error: Some(msg) }) = serde_json::from_str::<ErrorWire>(trimmed) {
        return CompareError::ServiceError(msg);
    }
    if trimmed.is_empty() {
        CompareError::ServiceError(format!("HTTP error! status: {code}"))
    } else {
        CompareError::ServiceError(format!("Backend error ({code}): {trimmed}"))
    }
}

fn parse_compare_response(body: &str) -> Result<ServiceResponse, CompareError> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Err(CompareError::ServiceError("Empty response body".to_string()));
    }
    let wire: CompareResponseWire = serde_json::from_str(trimmed)
        .map_err(|err| CompareError::ServiceError(format!("invalid response: {err}")))?;

    if let Some(error) = wire.error {
        return Err(CompareError::ServiceError(error));
    }
    let (Some(matrix), Some(distances)) = (wire.matrix, wire.distances) else {
        return Err(CompareError::ServiceError(
            "response is missing matrix or distances".to_string(),
        ));
    };

    Ok(ServiceResponse {
        matrix: ComparisonMatrix::from_rows(matrix)?,
        distances: DistanceMatrix::from_rows(distances)?,
        threshold: wire.threshold,
    })
}
