//! # one-lifecycle
//!
//! Headless orchestration of the `start` and `pr` workflows. Every input
//! arrives in a request struct and every side effect goes through a
//! [`Collaborators`] handle, so the same code drives the CLI and the tests.
//!
//! Each workflow is split into a pure `plan_*` step and an `execute_*` step.

pub mod error;
pub mod hooks;
pub mod pr;
pub mod start;

use one_auth::TokenSource;
use one_core::report::Reporter;
use one_hosting::HostingApi;
use one_vcs::Repository;

pub use error::{HookError, LifecycleError};
pub use hooks::{validate_hooks, HookPipeline, HookStage, StageReport};
pub use pr::{execute_pr, plan_pr, PrOutcome, PrPlan, PrRequest};
pub use start::{execute_start, plan_start, StartOutcome, StartPlan, StartRequest};

/// Opens URLs for the user. Failures are reported, never fatal.
pub trait BrowserOpener {
    fn open(&self, url: &str) -> std::io::Result<()>;
}

/// Does nothing; for `--no-browser` style callers and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBrowser;

impl BrowserOpener for NoBrowser {
    fn open(&self, _url: &str) -> std::io::Result<()> {
        Ok(())
    }
}

/// The outside world as seen by a workflow.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub repo: &'a dyn Repository,
    pub hosting: &'a dyn HostingApi,
    pub tokens: &'a dyn TokenSource,
    pub hooks: &'a HookPipeline,
    pub browser: &'a dyn BrowserOpener,
    pub reporter: &'a dyn Reporter,
}
