//! Request builder and response parser for the statistical API.
//!
//! # Design
//! `BdlClient` holds only the base URL and fixed headers and carries no
//! mutable state between calls. `build_request` turns a `RequestShape` into
//! an `HttpRequest`; `parse_response` turns an `HttpResponse` into JSON or a
//! `ToolError`. The round-trip in between belongs to a `Transport`, which
//! `RemoteClient` pairs with the builder to offer a single `get`.

use std::sync::Arc;

use serde_json::Value;
use url::Url;

use crate::config::ClientConfig;
use crate::error::ToolError;
use crate::http::{HttpRequest, HttpResponse};
use crate::translate::RequestShape;
use crate::transport::Transport;

/// Synchronous, stateless request builder for the statistical API.
#[derive(Debug, Clone)]
pub struct BdlClient {
    base_url: String,
    user_agent: String,
}

impl BdlClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            user_agent: crate::config::DEFAULT_USER_AGENT.to_string(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            ..Self::new(&config.base_url)
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the GET for `shape`, appending `format=json` after the
    /// caller-derived query.
    pub fn build_request(&self, shape: &RequestShape) -> Result<HttpRequest, ToolError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ToolError::Internal(format!("invalid base URL `{}`: {e}", self.base_url)))?;

        url.path_segments_mut()
            .map_err(|_| ToolError::Internal(format!("base URL `{}` cannot carry a path", self.base_url)))?
            .pop_if_empty()
            .extend(&shape.segments);

        {
            let mut query = url.query_pairs_mut();
            for (key, value) in shape.pairs() {
                query.append_pair(key, value);
            }
            query.append_pair("format", "json");
        }

        Ok(HttpRequest {
            url: url.into(),
            headers: vec![
                ("User-Agent".to_string(), self.user_agent.clone()),
                ("Accept".to_string(), "application/json".to_string()),
            ],
        })
    }

    /// Decode a 2xx body as JSON; anything else becomes `UpstreamHttp`.
    pub fn parse_response(&self, response: HttpResponse) -> Result<Value, ToolError> {
        if !response.is_success() {
            return Err(ToolError::UpstreamHttp {
                status: response.status,
                body: response.body,
            });
        }
        serde_json::from_str(&response.body)
            .map_err(|e| ToolError::Internal(format!("response body is not valid JSON: {e}")))
    }
}

/// `BdlClient` plus the transport that executes its requests.
///
/// Cloning is cheap; clones share the transport and its connection pool.
#[derive(Clone)]
pub struct RemoteClient {
    client: BdlClient,
    transport: Arc<dyn Transport>,
}

impl RemoteClient {
    pub fn new(client: BdlClient, transport: Arc<dyn Transport>) -> Self {
        Self { client, transport }
    }

    pub fn client(&self) -> &BdlClient {
        &self.client
    }

    /// Perform the GET described by `shape` and return the decoded payload.
    pub fn get(&self, shape: &RequestShape) -> Result<Value, ToolError> {
        let request = self.client.build_request(shape)?;
        tracing::debug!(url = %request.url, "GET");

        let result = self
            .transport
            .execute(&request)
            .and_then(|response| self.client.parse_response(response));

        if let Err(err) = &result {
            tracing::warn!(url = %request.url, error = %err, "upstream request failed");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate::QueryValue;

    fn client() -> BdlClient {
        BdlClient::new("https://bdl.stat.gov.pl/api/v1")
    }

    fn shape(segments: &[&str], query: Vec<(&str, QueryValue)>) -> RequestShape {
        RequestShape {
            segments: segments.iter().map(|s| s.to_string()).collect(),
            query: query.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
        }
    }

    fn single(v: &str) -> QueryValue {
        QueryValue::Single(v.to_string())
    }

    #[test]
    fn build_list_request() {
        let req = client()
            .build_request(&shape(&["years"], vec![("lang", single("pl"))]))
            .unwrap();
        assert_eq!(req.url, "https://bdl.stat.gov.pl/api/v1/years?lang=pl&format=json");
    }

    #[test]
    fn build_request_sets_identity_headers() {
        let req = client().build_request(&shape(&["levels"], vec![])).unwrap();
        assert_eq!(req.headers.len(), 2);
        assert_eq!(req.headers[0].0, "User-Agent");
        assert!(req.headers[0].1.starts_with("bdl-mcp/"));
        assert_eq!(
            req.headers[1],
            ("Accept".to_string(), "application/json".to_string())
        );
    }

    #[test]
    fn build_request_repeats_array_keys() {
        let req = client()
            .build_request(&shape(
                &["data", "by-variable", "3643"],
                vec![
                    ("year", QueryValue::Repeated(vec!["2020".into(), "2021".into()])),
                    ("lang", single("en")),
                ],
            ))
            .unwrap();
        assert_eq!(
            req.url,
            "https://bdl.stat.gov.pl/api/v1/data/by-variable/3643?year=2020&year=2021&lang=en&format=json"
        );
    }

    #[test]
    fn path_segments_are_encoded() {
        let req = client()
            .build_request(&shape(&["units", "a/b c"], vec![]))
            .unwrap();
        assert!(req.url.starts_with("https://bdl.stat.gov.pl/api/v1/units/a%2Fb%20c?"));
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let client = BdlClient::new("http://localhost:3000/");
        assert_eq!(client.base_url(), "http://localhost:3000");
        let req = client.build_request(&shape(&["years"], vec![])).unwrap();
        assert_eq!(req.url, "http://localhost:3000/years?format=json");
    }

    #[test]
    fn invalid_base_url_is_internal_error() {
        let err = BdlClient::new("not a url")
            .build_request(&shape(&["years"], vec![]))
            .unwrap_err();
        assert!(matches!(err, ToolError::Internal(_)));
    }

    #[test]
    fn parse_success_returns_payload_unmodified() {
        let body = r#"{"results":[{"id":2022},{"id":2021}],"totalRecords":2}"#;
        let value = client()
            .parse_response(HttpResponse {
                status: 200,
                body: body.to_string(),
            })
            .unwrap();
        assert_eq!(value, serde_json::from_str::<Value>(body).unwrap());
    }

    #[test]
    fn parse_error_status() {
        let err = client()
            .parse_response(HttpResponse {
                status: 500,
                body: "internal error".to_string(),
            })
            .unwrap_err();
        assert_eq!(
            err,
            ToolError::UpstreamHttp {
                status: 500,
                body: "internal error".to_string()
            }
        );
    }

    #[test]
    fn parse_not_found_is_upstream_error() {
        let err = client()
            .parse_response(HttpResponse {
                status: 404,
                body: String::new(),
            })
            .unwrap_err();
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn parse_bad_json() {
        let err = client()
            .parse_response(HttpResponse {
                status: 200,
                body: "not json".to_string(),
            })
            .unwrap_err();
        assert!(matches!(err, ToolError::Internal(_)));
    }
}
