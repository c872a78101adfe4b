//! `one ticket <TICKET-ID>`

use anyhow::{bail, Context, Result};
use clap::Args;

use one_core::report::Reporter;
use one_lifecycle::BrowserOpener;
use one_render::build_ticket_url;

use super::current_profile;
use crate::browser::BrowserLauncher;
use crate::reporter::TerminalReporter;

#[derive(Args, Debug)]
pub struct TicketArgs {
    /// Ticket key, e.g. PROJ-123.
    pub ticket_id: String,
}

impl TicketArgs {
    pub fn run(self) -> Result<()> {
        let profile = current_profile()?;
        let Some(ticket) = profile.ticket.as_ref() else {
            bail!("no ticket system configured for project '{}'", profile.name());
        };

        let url = build_ticket_url(&ticket.system, &ticket.base_url, &self.ticket_id);
        if url.is_empty() {
            bail!("unknown ticket system '{}'; expected jira, linear or github", ticket.system);
        }

        BrowserLauncher::new(profile.browser.clone())
            .open(&url)
            .context("failed to open browser")?;
        TerminalReporter.success(&format!("Opening ticket {}", self.ticket_id));
        TerminalReporter.detail("URL", &url);
        Ok(())
    }
}
