//! Error types for one-hosting.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    /// The backend answered with a status other than the one the call expects.
    #[error("{provider} API returned status {status}: {}", truncate(.body))]
    Status {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("malformed {provider} response: {reason}")]
    MalformedResponse {
        provider: &'static str,
        reason: String,
    },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: Box<ureq::Error>,
    },

    #[error("failed to read response from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} is not supported")]
    Unsupported(String),

    #[error("'{ticket}' is not a valid {provider} issue number")]
    InvalidTicketId {
        provider: &'static str,
        ticket: String,
    },
}

/// Error bodies can be whole HTML pages.
fn truncate(body: &str) -> String {
    const LIMIT: usize = 200;
    let body = body.trim();
    match body.char_indices().nth(LIMIT) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_owned(),
    }
}
