//! `one pr`: hooks, push, create the pull request, open it.

use tracing::{info, warn};

use one_core::types::{HookSpec, ProjectProfile, ProviderBinding, TicketId};
use one_hosting::PullRequestDraft;
use one_render::{render, LifecycleContext};
use one_vcs::{extract_ticket_id, PatternError, DEFAULT_TICKET_PATTERN};

use crate::error::LifecycleError;
use crate::hooks::{validate_hooks, HookStage, StageReport};
use crate::Collaborators;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub open_browser: bool,
}

#[derive(Debug, Clone)]
pub struct PrPlan<'a> {
    pub profile: &'a ProjectProfile,
    pub branch: String,
    /// `None` when the branch name carries no ticket id.
    pub ticket_id: Option<TicketId>,
    pub binding: ProviderBinding,
    pub before_hooks: &'a [HookSpec],
    pub after_hooks: &'a [HookSpec],
    pub request: PrRequest,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrOutcome {
    pub url: String,
    pub branch: String,
    pub title: String,
    pub ticket_id: Option<TicketId>,
    pub before_hooks: StageReport,
    /// `false` when any after-PR hook failed or the stage was aborted.
    pub after_hooks_ok: bool,
}

/// Resolve everything that does not touch the outside world.
///
/// A branch without a ticket id is fine; a pattern that does not compile is
/// not. Both hook lists are validated up front.
pub fn plan_pr<'a>(
    profile: &'a ProjectProfile,
    request: PrRequest,
    current_branch: &str,
) -> Result<PrPlan<'a>, LifecycleError> {
    let binding = profile.provider_binding()?;
    let pattern = profile.ticket_pattern().unwrap_or(DEFAULT_TICKET_PATTERN);
    let ticket_id = match extract_ticket_id(current_branch, pattern) {
        Ok(id) => Some(id),
        Err(PatternError::NoMatch { .. }) => None,
        Err(e) => return Err(e.into()),
    };

    let before_hooks = profile.before_pr_hooks();
    let after_hooks = profile.after_pr_hooks();
    validate_hooks(HookStage::BeforePr, before_hooks)?;
    validate_hooks(HookStage::AfterPr, after_hooks)?;

    Ok(PrPlan {
        profile,
        branch: current_branch.to_owned(),
        ticket_id,
        binding,
        before_hooks,
        after_hooks,
        request,
    })
}

pub fn execute_pr(plan: &PrPlan<'_>, deps: &Collaborators<'_>) -> Result<PrOutcome, LifecycleError> {
    let reporter = deps.reporter;
    let profile = plan.profile;

    if !deps.repo.is_clean()? {
        return Err(LifecycleError::DirtyWorkingTree { command: "pr" });
    }

    reporter.step("Creating pull request...");
    reporter.detail("Project", &profile.name().0);
    reporter.detail("Branch", &plan.branch);
    if let Some(ticket) = plan.ticket_id.as_ref() {
        reporter.detail("Ticket", ticket.as_str());
    }

    // Resolve the token first so a missing login fails before anything is pushed.
    let provider = plan.binding.kind();
    let token = deps
        .tokens
        .token(provider.as_str(), profile.name(), profile.token_env())?;

    let before_hooks = deps
        .hooks
        .run(plan.before_hooks, HookStage::BeforePr, reporter)?;

    reporter.step(&format!("Pushing to {}...", profile.remote()));
    deps.repo.push(profile.remote(), &plan.branch)?;
    reporter.success(&format!("Pushed to {}", profile.remote()));

    let ctx = LifecycleContext::for_pull_request(
        profile,
        &plan.branch,
        plan.ticket_id.as_ref(),
        deps.repo.author().as_deref(),
    );
    let draft = PullRequestDraft {
        title: pr_title(plan, &ctx),
        body: pr_body(plan, &ctx),
        head: plan.branch.clone(),
        base: profile.base_branch().to_owned(),
    };

    reporter.step(&format!("Opening pull request on {provider}..."));
    let url = deps
        .hosting
        .create_pull_request(&plan.binding, &draft, &token)
        .map_err(|source| LifecycleError::CreatePullRequest { provider, source })?;
    reporter.success(&format!("PR created: {url}"));
    info!(%url, branch = %plan.branch, "pull request created");

    if plan.request.open_browser {
        if let Err(e) = deps.browser.open(&url) {
            warn!(error = %e, "failed to open browser");
            reporter.warn(&format!("could not open browser: {e}"));
        }
    }

    let after_hooks_ok = match deps.hooks.run(plan.after_hooks, HookStage::AfterPr, reporter) {
        Ok(report) => report.all_succeeded(),
        Err(e) => {
            warn!(error = %e, "after_pr hooks failed");
            reporter.warn(&format!("after_pr hooks failed: {e}"));
            false
        }
    };

    Ok(PrOutcome {
        url,
        branch: plan.branch.clone(),
        title: draft.title,
        ticket_id: plan.ticket_id.clone(),
        before_hooks,
        after_hooks_ok,
    })
}

/// Explicit title, else the rendered template, else the branch name.
fn pr_title(plan: &PrPlan<'_>, ctx: &LifecycleContext) -> String {
    non_empty(plan.request.title.as_deref())
        .map(str::to_owned)
        .or_else(|| template(plan, |t| t.pr_title.as_deref()).map(|t| render(t, ctx)))
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| plan.branch.clone())
}

/// Explicit description, else the rendered template, else empty.
fn pr_body(plan: &PrPlan<'_>, ctx: &LifecycleContext) -> String {
    non_empty(plan.request.description.as_deref())
        .map(str::to_owned)
        .or_else(|| template(plan, |t| t.pr_body.as_deref()).map(|t| render(t, ctx)))
        .unwrap_or_default()
}

fn template<'p>(
    plan: &'p PrPlan<'_>,
    pick: impl Fn(&'p one_core::types::Templates) -> Option<&'p str>,
) -> Option<&'p str> {
    plan.profile.templates.as_ref().and_then(pick).and_then(|t| non_empty(Some(t)))
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.trim().is_empty())
}
