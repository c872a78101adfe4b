//! Colored terminal output for lifecycle progress.

use colored::Colorize;

use one_core::report::{HookReport, Reporter};
use one_core::types::HookSpec;
use one_core::ProviderKind;

/// Lines of hook output echoed when a hook fails.
const FAILED_OUTPUT_LINES: usize = 20;

#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalReporter;

impl Reporter for TerminalReporter {
    fn step(&self, message: &str) {
        println!("{} {message}", "→".cyan().bold());
    }

    fn detail(&self, label: &str, value: &str) {
        println!("  {} {value}", format!("{label}:").bright_black());
    }

    fn success(&self, message: &str) {
        println!("{} {message}", "✓".green().bold());
    }

    fn warn(&self, message: &str) {
        eprintln!("{} {message}", "⚠".yellow().bold());
    }

    fn hook_started(&self, position: usize, total: usize, hook: &HookSpec) {
        let label = hook.description.as_deref().unwrap_or(&hook.command);
        println!(
            "  {} {} {}",
            format!("[{position}/{total}]").bright_black(),
            hook.name.bold(),
            label.bright_black()
        );
    }

    fn hook_finished(&self, report: &HookReport) {
        let elapsed = format!("({:.1}s)", report.duration.as_secs_f64()).bright_black();
        if report.succeeded {
            println!("    {} {elapsed}", "✓".green());
            return;
        }
        println!("    {} {elapsed}", "✗".red());
        for line in report.output.lines().take(FAILED_OUTPUT_LINES) {
            println!("    {}", line.bright_black());
        }
    }

    fn authorization_required(&self, provider: &str, verification_uri: &str, user_code: &str) {
        println!();
        println!("{}", authorization_heading(provider).bold());
        println!("  1. Open {}", verification_uri.underline());
        println!("  2. Enter the code {}", user_code.yellow().bold());
        println!("{}", "Waiting for authorization (Ctrl-C to cancel)...".bright_black());
    }
}

fn authorization_heading(provider: &str) -> String {
    let name = match provider.parse::<ProviderKind>() {
        Ok(ProviderKind::GitHub) => "GitHub",
        Ok(ProviderKind::GitLab) => "GitLab",
        Ok(ProviderKind::Bitbucket) => "Bitbucket",
        Err(_) => provider,
    };
    format!("{name} authorization required")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_names_the_provider_being_authorized() {
        assert_eq!(authorization_heading("github"), "GitHub authorization required");
        assert_eq!(authorization_heading("gitlab"), "GitLab authorization required");
        assert_eq!(authorization_heading("Bitbucket"), "Bitbucket authorization required");
    }

    #[test]
    fn heading_keeps_unknown_provider_names() {
        assert_eq!(authorization_heading("gitea"), "gitea authorization required");
    }
}
