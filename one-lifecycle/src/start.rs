//! `one start`: branch off the freshly pulled base branch for a ticket.

use tracing::{info, warn};

use one_core::types::{ProfileName, ProjectProfile, ProviderBinding, TicketId, TicketSettings, TicketSystem};
use one_vcs::{task_branch_name, PullOutcome};

use crate::error::LifecycleError;
use crate::Collaborators;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartRequest {
    pub ticket_id: TicketId,
    /// Used verbatim as the branch title when given.
    pub description: Option<String>,
}

/// Everything `execute_start` needs, resolved from the profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartPlan {
    pub project: ProfileName,
    pub ticket_id: TicketId,
    pub description: Option<String>,
    pub remote: String,
    pub base_branch: String,
    pub binding: ProviderBinding,
    pub ticket: Option<TicketSettings>,
    /// Env var consulted for the ticket tracker token.
    pub ticket_token_env: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartOutcome {
    pub branch: String,
    pub title: String,
    pub pulled: PullOutcome,
}

pub fn plan_start(profile: &ProjectProfile, request: StartRequest) -> Result<StartPlan, LifecycleError> {
    let binding = profile.provider_binding()?;
    let ticket = profile.ticket.clone();
    let ticket_token_env = ticket.as_ref().and_then(|t| match t.kind() {
        Some(TicketSystem::GitHub) => profile.token_env().map(str::to_owned),
        _ => t.token_env().map(str::to_owned),
    });
    let description = request
        .description
        .filter(|d| !d.trim().is_empty());

    Ok(StartPlan {
        project: profile.name().clone(),
        ticket_id: request.ticket_id,
        description,
        remote: profile.remote().to_owned(),
        base_branch: profile.base_branch().to_owned(),
        binding,
        ticket,
        ticket_token_env,
    })
}

/// Check out and fast-forward the base branch, then create and switch to
/// `<TICKET>-<title>`.
pub fn execute_start(plan: &StartPlan, deps: &Collaborators<'_>) -> Result<StartOutcome, LifecycleError> {
    let reporter = deps.reporter;
    if !deps.repo.is_clean()? {
        return Err(LifecycleError::DirtyWorkingTree { command: "start" });
    }

    reporter.step(&format!("Checking out {}...", plan.base_branch));
    deps.repo.checkout_branch(&plan.base_branch)?;

    reporter.step(&format!("Pulling {}/{}...", plan.remote, plan.base_branch));
    let pulled = deps.repo.pull(&plan.remote, &plan.base_branch)?;
    match pulled {
        PullOutcome::UpToDate => reporter.success("Already up to date"),
        PullOutcome::FastForwarded => reporter.success(&format!("Updated {}", plan.base_branch)),
    }

    let title = branch_title(plan, deps);
    let branch = task_branch_name(&plan.ticket_id, &title);

    reporter.step(&format!("Creating branch {branch}..."));
    deps.repo.create_branch(&branch)?;
    deps.repo.checkout_branch(&branch)?;
    info!(%branch, base = %plan.base_branch, "task branch created");
    reporter.success(&format!("Switched to new branch {branch}"));

    Ok(StartOutcome {
        branch,
        title,
        pulled,
    })
}

/// Description, else the tracker's summary, else the ticket id.
fn branch_title(plan: &StartPlan, deps: &Collaborators<'_>) -> String {
    if let Some(description) = plan.description.as_ref() {
        return description.clone();
    }
    let Some(settings) = plan.ticket.as_ref() else {
        return plan.ticket_id.to_string();
    };

    deps.reporter.step(&format!("Fetching {} from {}...", plan.ticket_id, settings.system));
    let summary = deps
        .tokens
        .token(&settings.system, &plan.project, plan.ticket_token_env.as_deref())
        .map_err(LifecycleError::from)
        .and_then(|token| {
            deps.hosting
                .fetch_ticket_summary(settings, &plan.binding, &plan.ticket_id, &token)
                .map_err(LifecycleError::from)
        });

    match summary {
        Ok(summary) => {
            deps.reporter.detail("Title", &summary);
            summary
        }
        Err(e) => {
            warn!(ticket = %plan.ticket_id, error = %e, "ticket summary unavailable");
            deps.reporter.warn(&format!(
                "could not fetch ticket title ({e}); using {}",
                plan.ticket_id
            ));
            plan.ticket_id.to_string()
        }
    }
}
