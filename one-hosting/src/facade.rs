//! The hosting seam used by the lifecycle orchestrator.

use tracing::debug;

use one_core::types::{ProviderBinding, TicketId, TicketSettings, TicketSystem};

use crate::error::ProviderError;
use crate::jira::JiraClient;
use crate::providers::{ProviderClient, PullRequestDraft};
use crate::transport::{Transport, UreqTransport};

pub trait HostingApi {
    /// Open a pull request on the profile's provider; returns its web URL.
    fn create_pull_request(
        &self,
        binding: &ProviderBinding,
        draft: &PullRequestDraft,
        token: &str,
    ) -> Result<String, ProviderError>;

    /// Summary (title) of `ticket` in the configured tracker.
    fn fetch_ticket_summary(
        &self,
        settings: &TicketSettings,
        binding: &ProviderBinding,
        ticket: &TicketId,
        token: &str,
    ) -> Result<String, ProviderError>;
}

/// [`HostingApi`] over real HTTP.
#[derive(Debug, Clone, Default)]
pub struct HttpHosting<T = UreqTransport> {
    transport: T,
}

impl<T: Transport> HttpHosting<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }
}

impl<T: Transport> HostingApi for HttpHosting<T> {
    fn create_pull_request(
        &self,
        binding: &ProviderBinding,
        draft: &PullRequestDraft,
        token: &str,
    ) -> Result<String, ProviderError> {
        ProviderClient::from(binding).create_pull_request(&self.transport, draft, token)
    }

    fn fetch_ticket_summary(
        &self,
        settings: &TicketSettings,
        binding: &ProviderBinding,
        ticket: &TicketId,
        token: &str,
    ) -> Result<String, ProviderError> {
        debug!(system = %settings.system, %ticket, "fetching ticket summary");
        match (settings.kind(), binding) {
            (Some(TicketSystem::Jira), _) => {
                JiraClient::new(&settings.base_url).fetch_ticket_summary(&self.transport, ticket, token)
            }
            (Some(TicketSystem::GitHub), ProviderBinding::GitHub { .. }) => {
                ProviderClient::from(binding).fetch_ticket_summary(&self.transport, ticket, token)
            }
            (Some(TicketSystem::GitHub), _) => Err(ProviderError::Unsupported(format!(
                "GitHub issues for a {} project",
                binding.kind()
            ))),
            (Some(TicketSystem::Linear), _) => {
                Err(ProviderError::Unsupported("fetching Linear tickets".to_owned()))
            }
            (None, _) => Err(ProviderError::Unsupported(format!(
                "ticket system '{}'",
                settings.system
            ))),
        }
    }
}
