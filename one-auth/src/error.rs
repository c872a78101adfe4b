//! Error types for one-auth.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Neither the secret store nor the fallback env var holds a token.
    #[error("not authenticated with {provider} for '{project}'; {hint}")]
    NotAuthenticated {
        provider: String,
        project: String,
        hint: String,
    },

    /// The token endpoint answered with an error other than `authorization_pending`.
    #[error("authorization failed: {error}{}", parenthesized(.description))]
    OAuth {
        error: String,
        description: Option<String>,
    },

    #[error("device code expired after {expires_in}s before authorization completed")]
    Timeout { expires_in: u64 },

    #[error("authorization cancelled")]
    Cancelled,

    #[error("HTTP request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: Box<ureq::Error>,
    },

    #[error("unexpected response from {url}: {source}")]
    Response {
        url: String,
        #[source]
        source: std::io::Error,
    },

    #[error("secret store error for '{account}': {source}")]
    Store {
        account: String,
        #[source]
        source: keyring::Error,
    },

    #[error("stored credential is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

fn parenthesized(detail: &Option<String>) -> String {
    detail
        .as_deref()
        .map(|d| format!(" ({d})"))
        .unwrap_or_default()
}
