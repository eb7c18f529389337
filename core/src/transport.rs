//! The seam between request building and the network.
//!
//! `Transport` executes one `HttpRequest` and reports non-2xx statuses as
//! ordinary responses; only connection-level failures are errors. Tests
//! substitute their own implementation through `Arc<dyn Transport>`.

use std::time::Duration;

use crate::error::ToolError;
use crate::http::{HttpRequest, HttpResponse};

pub trait Transport: Send + Sync {
    /// Perform the GET. Errors must be `ToolError::Transport`.
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ToolError>;
}

/// Blocking transport over one shared `ureq::Agent`.
///
/// The agent owns the connection pool and is safe to use from several
/// threads at once. Every request carries the global timeout.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        // Status codes are interpreted by `BdlClient::parse_response`.
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ToolError> {
        let mut builder = self.agent.get(request.url.as_str());
        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }

        let mut response = builder
            .call()
            .map_err(|e| ToolError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| ToolError::Transport(e.to_string()))?;

        Ok(HttpResponse { status, body })
    }
}
