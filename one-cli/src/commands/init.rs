//! `one init --name <project> [--path <dir>] [--provider <kind>] ...`
//!
//! Writes a profile built from flags and whatever the repository's remote
//! gives away. Existing profiles are only replaced with `--force`.

use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use clap::Args;

use one_core::profiles;
use one_core::types::{
    BitbucketSettings, BrowserKind, BrowserSettings, BranchPatterns, GitHubSettings,
    GitLabSettings, GitSettings, ProjectInfo, TicketSettings,
};
use one_core::{ProfileName, ProjectProfile, ProviderKind, TicketSystem};
use one_core::report::Reporter;
use one_vcs::{parse_remote_url, GitRepository, RemoteInfo, DEFAULT_TICKET_PATTERN};

use crate::reporter::TerminalReporter;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Project name; also the profile's file name.
    #[arg(long, short = 'n')]
    pub name: String,

    /// Directory owned by the project. Defaults to the working directory.
    #[arg(long)]
    pub path: Option<PathBuf>,

    /// Remote pushed to and pulled from.
    #[arg(long, default_value = "origin")]
    pub remote: String,

    /// Integration branch. Detected from the repository when omitted.
    #[arg(long)]
    pub base_branch: Option<String>,

    /// Hosting provider. Detected from the remote URL when omitted.
    #[arg(long)]
    pub provider: Option<ProviderKind>,

    /// Numeric GitLab project id (required for gitlab).
    #[arg(long)]
    pub project_id: Option<u64>,

    /// Env var holding the provider token. Defaults to e.g. GITHUB_TOKEN.
    #[arg(long)]
    pub token_env: Option<String>,

    /// Browser used for `one pr` and `one ticket`.
    #[arg(long, value_parser = parse_browser)]
    pub browser: Option<BrowserKind>,

    /// Ticket tracker: jira, linear or github.
    #[arg(long, requires = "ticket_url")]
    pub ticket_system: Option<String>,

    /// Tracker base URL, e.g. https://acme.atlassian.net.
    #[arg(long, requires = "ticket_system")]
    pub ticket_url: Option<String>,

    /// Replace an existing profile with the same name.
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    pub fn run(self) -> Result<()> {
        let path = match self.path.clone() {
            Some(path) => path,
            None => std::env::current_dir().context("could not determine working directory")?,
        };
        let path = path
            .canonicalize()
            .with_context(|| format!("cannot resolve path '{}'", path.display()))?;

        let config_dir = profiles::config_dir()?;
        let target = profiles::profile_path_at(&config_dir, &self.name);
        if target.exists() && !self.force {
            bail!(
                "profile '{}' already exists at {}; pass --force to replace it",
                self.name,
                target.display()
            );
        }

        let detected = detect_repository(&path, &self.remote);
        let profile = self.build_profile(path, detected)?;
        let saved = profiles::save_profile_at(&config_dir, &profile, &self.name)
            .with_context(|| format!("failed to save profile '{}'", self.name))?;

        TerminalReporter.success(&format!("Created project '{}'", profile.name()));
        TerminalReporter.detail("Provider", profile.git.provider.as_str());
        TerminalReporter.detail("Base branch", profile.base_branch());
        TerminalReporter.detail("Saved to", &saved.display().to_string());
        if profile.git.provider == ProviderKind::GitHub {
            println!("Run `one auth login` to authorize GitHub access.");
        }
        Ok(())
    }

    fn build_profile(&self, path: PathBuf, detected: Detected) -> Result<ProjectProfile> {
        let provider = self
            .provider
            .or(detected.remote.as_ref().and_then(|r| r.provider))
            .ok_or_else(|| anyhow!("could not detect the hosting provider; pass --provider"))?;
        let token_env = Some(
            self.token_env
                .clone()
                .unwrap_or_else(|| default_token_env(provider).to_owned()),
        );

        let mut git = GitSettings {
            provider,
            remote: Some(self.remote.clone()),
            base_branch: Some(
                self.base_branch
                    .clone()
                    .unwrap_or(detected.base_branch),
            ),
            github: None,
            gitlab: None,
            bitbucket: None,
        };
        let coordinates = || {
            detected
                .remote
                .as_ref()
                .map(|r| (r.owner.clone(), r.repo.clone()))
                .ok_or_else(|| anyhow!("remote '{}' not found; cannot infer {provider} owner and repo", self.remote))
        };
        match provider {
            ProviderKind::GitHub => {
                let (owner, repo) = coordinates()?;
                git.github = Some(GitHubSettings { owner, repo, token_env });
            }
            ProviderKind::GitLab => {
                let project_id = self
                    .project_id
                    .ok_or_else(|| anyhow!("gitlab profiles need --project-id"))?;
                git.gitlab = Some(GitLabSettings { project_id, token_env });
            }
            ProviderKind::Bitbucket => {
                let (workspace, repo_slug) = coordinates()?;
                git.bitbucket = Some(BitbucketSettings {
                    workspace,
                    repo_slug,
                    token_env,
                });
            }
        }

        let ticket = match (self.ticket_system.as_deref(), self.ticket_url.as_deref()) {
            (Some(system), Some(base_url)) => {
                if TicketSystem::parse(system).is_none() {
                    bail!("unknown ticket system '{system}'; expected jira, linear or github");
                }
                Some(TicketSettings {
                    system: system.to_ascii_lowercase(),
                    base_url: base_url.trim_end_matches('/').to_owned(),
                    jira: None,
                })
            }
            _ => None,
        };

        Ok(ProjectProfile {
            version: 1,
            project: ProjectInfo {
                name: ProfileName::from(self.name.as_str()),
                paths: vec![path],
            },
            git,
            browser: BrowserSettings {
                kind: self.browser.unwrap_or_default(),
                profile: None,
            },
            ticket,
            templates: None,
            branch_patterns: Some(BranchPatterns {
                ticket_id: Some(DEFAULT_TICKET_PATTERN.to_owned()),
            }),
            hooks: None,
        })
    }
}

/// What the repository at the project path reveals.
struct Detected {
    remote: Option<RemoteInfo>,
    base_branch: String,
}

fn detect_repository(path: &std::path::Path, remote: &str) -> Detected {
    let Ok(repo) = GitRepository::discover(path) else {
        tracing::debug!(path = %path.display(), "no git repository to inspect");
        return Detected {
            remote: None,
            base_branch: "main".to_owned(),
        };
    };
    let remote = match repo.remote_url(remote) {
        Ok(Some(url)) => parse_remote_url(&url)
            .map_err(|e| tracing::warn!(error = %e, "unrecognised remote URL"))
            .ok(),
        Ok(None) => None,
        Err(e) => {
            tracing::warn!(error = %e, remote, "failed to read remote");
            None
        }
    };
    if let Some(info) = remote.as_ref() {
        TerminalReporter.detail("Detected remote", &format!("{}/{} on {}", info.owner, info.repo, info.host));
    }
    Detected {
        remote,
        base_branch: repo.default_base_branch(),
    }
}

fn default_token_env(provider: ProviderKind) -> &'static str {
    match provider {
        ProviderKind::GitHub => "GITHUB_TOKEN",
        ProviderKind::GitLab => "GITLAB_TOKEN",
        ProviderKind::Bitbucket => "BITBUCKET_TOKEN",
    }
}

fn parse_browser(s: &str) -> Result<BrowserKind, String> {
    match s.to_ascii_lowercase().as_str() {
        "system" => Ok(BrowserKind::System),
        "chrome" => Ok(BrowserKind::Chrome),
        "firefox" => Ok(BrowserKind::Firefox),
        "safari" => Ok(BrowserKind::Safari),
        other => Err(format!(
            "unknown browser '{other}'; expected: system, chrome, firefox, safari"
        )),
    }
}
