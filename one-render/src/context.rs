//! Lifecycle context: the placeholder values available to PR templates.

use std::collections::BTreeMap;

use one_core::types::{ProjectProfile, TicketId};

use crate::template::{build_ticket_url, current_date};

/// Placeholder names understood by [`crate::render`].
pub mod keys {
    pub const TICKET_ID: &str = "ticket_id";
    pub const BRANCH_NAME: &str = "branch_name";
    pub const BASE_BRANCH: &str = "base_branch";
    pub const TICKET_URL: &str = "ticket_url";
    pub const DATE: &str = "date";
    pub const AUTHOR: &str = "author";
}

/// Ordered key/value map built fresh for each invocation. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LifecycleContext {
    values: BTreeMap<String, String>,
}

impl LifecycleContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context for the `pr` stage of `profile`, dated today.
    pub fn for_pull_request(
        profile: &ProjectProfile,
        branch: &str,
        ticket: Option<&TicketId>,
        author: Option<&str>,
    ) -> Self {
        Self::for_pull_request_on(profile, branch, ticket, author, &current_date())
    }

    /// As [`Self::for_pull_request`], with an explicit `YYYY-MM-DD` date.
    pub fn for_pull_request_on(
        profile: &ProjectProfile,
        branch: &str,
        ticket: Option<&TicketId>,
        author: Option<&str>,
        date: &str,
    ) -> Self {
        let mut ctx = Self::new()
            .with(keys::BRANCH_NAME, branch)
            .with(keys::BASE_BRANCH, profile.base_branch())
            .with(keys::DATE, date);

        if let Some(ticket) = ticket {
            ctx.insert(keys::TICKET_ID, ticket.as_str());
            if let Some(settings) = profile.ticket.as_ref() {
                let url = build_ticket_url(&settings.system, &settings.base_url, ticket.as_str());
                if !url.is_empty() {
                    ctx.insert(keys::TICKET_URL, url);
                }
            }
        }
        if let Some(author) = author {
            ctx.insert(keys::AUTHOR, author);
        }
        ctx
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
