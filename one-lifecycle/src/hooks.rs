//! Hook pipeline.
//!
//! Hooks run one at a time, in declared order, through the platform shell.
//! The whole list is validated before the first hook starts so that a bad
//! stage never half-runs.

use std::fmt;
use std::path::PathBuf;
use std::process::{Command, Output};
use std::time::Instant;

use tracing::{debug, warn};

use one_core::report::{HookReport, Reporter};
use one_core::types::HookSpec;

use crate::error::HookError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookStage {
    BeforePr,
    AfterPr,
}

impl HookStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            HookStage::BeforePr => "before_pr",
            HookStage::AfterPr => "after_pr",
        }
    }
}

impl fmt::Display for HookStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-hook results of a stage that was not aborted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReport {
    pub stage: HookStage,
    pub hooks: Vec<HookReport>,
}

impl StageReport {
    pub fn all_succeeded(&self) -> bool {
        self.hooks.iter().all(|h| h.succeeded)
    }

    pub fn failed(&self) -> impl Iterator<Item = &HookReport> {
        self.hooks.iter().filter(|h| !h.succeeded)
    }
}

/// Reject the list if any hook has an empty name or command.
pub fn validate_hooks(stage: HookStage, hooks: &[HookSpec]) -> Result<(), HookError> {
    for (index, hook) in hooks.iter().enumerate() {
        let reason = if hook.name.trim().is_empty() {
            "name is empty"
        } else if hook.command.trim().is_empty() {
            "command is empty"
        } else {
            continue;
        };
        return Err(HookError::InvalidHook {
            stage,
            position: index + 1,
            reason: reason.to_owned(),
        });
    }
    Ok(())
}

#[derive(Debug, Clone, Default)]
pub struct HookPipeline {
    working_dir: Option<PathBuf>,
}

impl HookPipeline {
    /// Hooks inherit the process working directory.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: Some(dir.into()),
        }
    }

    pub fn run(
        &self,
        hooks: &[HookSpec],
        stage: HookStage,
        reporter: &dyn Reporter,
    ) -> Result<StageReport, HookError> {
        validate_hooks(stage, hooks)?;

        let mut reports = Vec::with_capacity(hooks.len());
        for (index, hook) in hooks.iter().enumerate() {
            reporter.hook_started(index + 1, hooks.len(), hook);
            let (report, failure) = self.run_one(hook);
            reporter.hook_finished(&report);

            if let Some(reason) = failure {
                if hook.fail_on_error {
                    return Err(HookError::HookFailed {
                        stage,
                        hook: hook.name.clone(),
                        reason,
                    });
                }
                warn!(%stage, hook = %hook.name, %reason, "hook failed, continuing");
                reporter.warn(&format!(
                    "hook '{}' failed but continuing (fail_on_error: false)",
                    hook.name
                ));
            }
            reports.push(report);
        }

        debug!(%stage, count = reports.len(), "stage complete");
        Ok(StageReport {
            stage,
            hooks: reports,
        })
    }

    /// Returns the report plus a failure reason when the hook did not succeed.
    fn run_one(&self, hook: &HookSpec) -> (HookReport, Option<String>) {
        let mut command = shell_command(&hook.command);
        if let Some(dir) = self.working_dir.as_ref() {
            command.current_dir(dir);
        }

        debug!(hook = %hook.name, command = %hook.command, "running hook");
        let started = Instant::now();
        let result = command.output();
        let duration = started.elapsed();

        let (output, failure) = match result {
            Ok(out) => {
                let text = combined_output(&out);
                let failure = (!out.status.success()).then(|| match out.status.code() {
                    Some(code) => format!("exited with status {code}"),
                    None => "terminated by signal".to_owned(),
                });
                (text, failure)
            }
            Err(e) => (String::new(), Some(format!("failed to start: {e}"))),
        };

        let report = HookReport {
            name: hook.name.clone(),
            succeeded: failure.is_none(),
            duration,
            output,
        };
        (report, failure)
    }
}

#[cfg(windows)]
fn shell_command(line: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.args(["/C", line]);
    cmd
}

#[cfg(not(windows))]
fn shell_command(line: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.args(["-c", line]);
    cmd
}

/// stdout then stderr, trimmed.
fn combined_output(out: &Output) -> String {
    let stdout = String::from_utf8_lossy(&out.stdout);
    let stderr = String::from_utf8_lossy(&out.stderr);
    format!("{}\n{}", stdout.trim_end(), stderr.trim_end())
        .trim()
        .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn stage_names() {
        assert_eq!(HookStage::BeforePr.to_string(), "before_pr");
        assert_eq!(HookStage::AfterPr.to_string(), "after_pr");
    }

    #[rstest]
    #[case::empty_name(HookSpec::new("", "true"), "name is empty")]
    #[case::blank_command(HookSpec::new("lint", "   "), "command is empty")]
    fn validation_names_the_offender(#[case] bad: HookSpec, #[case] reason: &str) {
        let hooks = vec![HookSpec::new("ok", "true"), bad];
        let err = validate_hooks(HookStage::BeforePr, &hooks).unwrap_err();
        match err {
            HookError::InvalidHook {
                stage,
                position,
                reason: got,
            } => {
                assert_eq!(stage, HookStage::BeforePr);
                assert_eq!(position, 2);
                assert_eq!(got, reason);
            }
            other => panic!("unexpected: {other}"),
        }
    }

    #[test]
    fn empty_list_is_valid() {
        assert!(validate_hooks(HookStage::AfterPr, &[]).is_ok());
    }
}
