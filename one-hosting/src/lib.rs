//! REST clients for code-hosting providers and ticket trackers.
//!
//! - [`providers`]: GitHub / GitLab / Bitbucket pull requests and issues
//! - [`jira`]: Jira issue summaries
//! - [`facade`]: [`HostingApi`], the seam the orchestrator talks to
//! - [`transport`]: the HTTP seam; [`UreqTransport`] in production

pub mod error;
pub mod facade;
pub mod jira;
pub mod providers;
pub mod transport;

pub use error::ProviderError;
pub use facade::{HostingApi, HttpHosting};
pub use jira::JiraClient;
pub use providers::{ProviderClient, PullRequestDraft};
pub use transport::{ApiRequest, ApiResponse, Method, Transport, UreqTransport};
