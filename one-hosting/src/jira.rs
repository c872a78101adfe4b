//! Jira issue lookups.

use one_core::types::TicketId;

use crate::error::ProviderError;
use crate::transport::{json_with_status, string_at, ApiRequest, Transport};

const PROVIDER: &str = "jira";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JiraClient {
    base_url: String,
}

impl JiraClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    /// `token` is the pre-encoded `email:api_token` pair sent as Basic auth.
    pub fn issue_request(&self, key: &TicketId, token: &str) -> ApiRequest {
        ApiRequest::get(format!("{}/rest/api/2/issue/{key}", self.base_url))
            .header("Authorization", format!("Basic {token}"))
            .header("Accept", "application/json")
    }

    pub fn fetch_ticket_summary<T: Transport + ?Sized>(
        &self,
        transport: &T,
        key: &TicketId,
        token: &str,
    ) -> Result<String, ProviderError> {
        let response = transport.send(&self.issue_request(key, token))?;
        let value = json_with_status(PROVIDER, response, 200)?;
        string_at(PROVIDER, &value, "/fields/summary")
    }
}
