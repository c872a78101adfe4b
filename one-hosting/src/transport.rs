//! HTTP transport seam.
//!
//! Clients build [`ApiRequest`]s and interpret [`ApiResponse`]s; the
//! [`Transport`] only moves bytes. Non-2xx statuses are returned as ordinary
//! responses so that status policy stays with the clients.

use std::fmt;
use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use crate::error::ProviderError;

pub const USER_AGENT: &str = concat!("one-cli/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn post(url: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            headers: Vec::new(),
            body: Some(body),
        }
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_owned(), value.into()));
        self
    }

    /// Case-insensitive header lookup.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

pub trait Transport {
    fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ProviderError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ProviderError> {
        (**self).send(request)
    }
}

/// Blocking `ureq` transport with a 30s timeout.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self {
            agent: ureq::AgentBuilder::new()
                .timeout(Duration::from_secs(30))
                .user_agent(USER_AGENT)
                .build(),
        }
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ProviderError> {
        let mut call = self.agent.request(request.method.as_str(), &request.url);
        for (name, value) in &request.headers {
            call = call.set(name, value);
        }

        let result = match &request.body {
            Some(body) => call.send_json(body),
            None => call.call(),
        };
        let response = match result {
            Ok(response) => response,
            Err(ureq::Error::Status(_, response)) => response,
            Err(e) => {
                return Err(ProviderError::Transport {
                    url: request.url.clone(),
                    source: Box::new(e),
                })
            }
        };

        let status = response.status();
        let body = response.into_string().map_err(|source| ProviderError::Body {
            url: request.url.clone(),
            source,
        })?;
        debug!(method = %request.method, url = %request.url, status, "api call");
        Ok(ApiResponse { status, body })
    }
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

/// Parse `response` as JSON if it carries `expected` status.
pub(crate) fn json_with_status(
    provider: &'static str,
    response: ApiResponse,
    expected: u16,
) -> Result<Value, ProviderError> {
    if response.status != expected {
        return Err(ProviderError::Status {
            provider,
            status: response.status,
            body: response.body,
        });
    }
    serde_json::from_str(&response.body).map_err(|e| ProviderError::MalformedResponse {
        provider,
        reason: e.to_string(),
    })
}

/// String at JSON `pointer` (e.g. `/links/html/href`).
pub(crate) fn string_at(
    provider: &'static str,
    value: &Value,
    pointer: &str,
) -> Result<String, ProviderError> {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or_else(|| ProviderError::MalformedResponse {
            provider,
            reason: format!("missing string field '{pointer}'"),
        })
}
