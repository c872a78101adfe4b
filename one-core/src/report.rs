//! Presentation capability handed to every layer that prints progress.
//!
//! Library crates never write to the terminal themselves; they call a
//! [`Reporter`]. The binary supplies a colored terminal implementation,
//! headless callers use [`NullReporter`].

use std::time::Duration;

use crate::types::HookSpec;

/// Outcome of a single hook, as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookReport {
    pub name: String,
    pub succeeded: bool,
    pub duration: Duration,
    /// Combined stdout + stderr, trimmed.
    pub output: String,
}

pub trait Reporter {
    /// Start of a lifecycle step ("Pushing to remote...").
    fn step(&self, message: &str);

    /// A labelled value under the current step.
    fn detail(&self, label: &str, value: &str);

    /// A step completed.
    fn success(&self, message: &str);

    /// A recoverable failure; the command carries on.
    fn warn(&self, message: &str);

    /// A hook at `position` (1-based) of `total` is about to run.
    fn hook_started(&self, position: usize, total: usize, hook: &HookSpec);

    fn hook_finished(&self, report: &HookReport);

    /// Device-flow phase 1 finished: the user must visit `verification_uri`
    /// and enter `user_code` to authorize `provider`.
    fn authorization_required(&self, provider: &str, verification_uri: &str, user_code: &str);
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn step(&self, _message: &str) {}
    fn detail(&self, _label: &str, _value: &str) {}
    fn success(&self, _message: &str) {}
    fn warn(&self, _message: &str) {}
    fn hook_started(&self, _position: usize, _total: usize, _hook: &HookSpec) {}
    fn hook_finished(&self, _report: &HookReport) {}
    fn authorization_required(&self, _provider: &str, _verification_uri: &str, _user_code: &str) {}
}
