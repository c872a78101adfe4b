//! `one pr [--title <t>] [--description <d>] [--no-browser] [--no-device-flow]`

use anyhow::{Context, Result};
use clap::Args;

use one_auth::CredentialStore;
use one_core::report::Reporter;
use one_hosting::HttpHosting;
use one_lifecycle::{execute_pr, plan_pr, Collaborators, HookPipeline, PrRequest};
use one_vcs::Repository;

use super::auth::InteractiveTokens;
use super::{current_profile, open_repository};
use crate::browser::BrowserLauncher;
use crate::reporter::TerminalReporter;
use crate::signal::Interrupts;

#[derive(Args, Debug)]
pub struct PrArgs {
    /// Pull request title; overrides `templates.pr_title`.
    #[arg(long, short = 't')]
    pub title: Option<String>,

    /// Pull request body; overrides `templates.pr_body`.
    #[arg(long, short = 'd')]
    pub description: Option<String>,

    /// Do not open the created pull request in the browser.
    #[arg(long)]
    pub no_browser: bool,

    /// Fail instead of starting the GitHub device flow when no token is found.
    #[arg(long)]
    pub no_device_flow: bool,
}

impl PrArgs {
    pub fn run(self, interrupts: &Interrupts) -> Result<()> {
        let profile = current_profile()?;
        let repo = open_repository()?;
        let branch = repo.current_branch().context("failed to read current branch")?;

        let request = PrRequest {
            title: self.title,
            description: self.description,
            open_browser: !self.no_browser,
        };
        let plan = plan_pr(&profile, request, &branch)?;

        let store: CredentialStore = CredentialStore::default();
        let tokens = InteractiveTokens {
            store: &store,
            device_flow: !self.no_device_flow,
            interrupts,
        };
        let hosting: HttpHosting = HttpHosting::default();
        let hooks = HookPipeline::new();
        let browser = BrowserLauncher::new(profile.browser.clone());
        let reporter = TerminalReporter;
        let deps = Collaborators {
            repo: &repo,
            hosting: &hosting,
            tokens: &tokens,
            hooks: &hooks,
            browser: &browser,
            reporter: &reporter,
        };

        let outcome = execute_pr(&plan, &deps)
            .with_context(|| format!("failed to create pull request for {branch}"))?;
        if !outcome.after_hooks_ok {
            reporter.warn("some after_pr hooks failed; the pull request was still created");
        }
        println!();
        println!("{}", outcome.url);
        Ok(())
    }
}
