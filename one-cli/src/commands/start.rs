//! `one start <TICKET-ID> [--description <text>]`

use anyhow::{Context, Result};
use clap::Args;

use one_auth::CredentialStore;
use one_core::report::Reporter;
use one_core::TicketId;
use one_hosting::HttpHosting;
use one_lifecycle::{execute_start, plan_start, Collaborators, HookPipeline, NoBrowser, StartRequest};

use super::{current_profile, open_repository};
use crate::reporter::TerminalReporter;

#[derive(Args, Debug)]
pub struct StartArgs {
    /// Ticket key, e.g. PROJ-123.
    pub ticket_id: String,

    /// Branch title; fetched from the ticket tracker when omitted.
    #[arg(long, short = 'd')]
    pub description: Option<String>,
}

impl StartArgs {
    pub fn run(self) -> Result<()> {
        let profile = current_profile()?;
        let repo = open_repository()?;
        let ticket = self.ticket_id.clone();
        let plan = plan_start(
            &profile,
            StartRequest {
                ticket_id: TicketId::from(self.ticket_id),
                description: self.description,
            },
        )?;

        let reporter = TerminalReporter;
        reporter.step(&format!("Starting work on {ticket}"));
        reporter.detail("Project", &profile.name().0);

        let store: CredentialStore = CredentialStore::default();
        let hosting: HttpHosting = HttpHosting::default();
        let hooks = HookPipeline::new();
        let deps = Collaborators {
            repo: &repo,
            hosting: &hosting,
            tokens: &store,
            hooks: &hooks,
            browser: &NoBrowser,
            reporter: &reporter,
        };

        let outcome = execute_start(&plan, &deps)
            .with_context(|| format!("failed to start work on {ticket}"))?;
        println!();
        println!("Branch {} is ready.", outcome.branch);
        Ok(())
    }
}
