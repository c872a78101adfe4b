//! Domain types for project profiles.
//!
//! A profile is one YAML document under `<config_dir>/projects/`. The on-disk
//! shape keeps provider settings as optional per-provider blocks; callers get
//! the closed [`ProviderBinding`] enum via [`ProjectProfile::provider_binding`].

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Remote used when neither the profile nor the global defaults name one.
pub const DEFAULT_REMOTE: &str = "origin";
/// Base branch used when neither the profile nor the global defaults name one.
pub const DEFAULT_BASE_BRANCH: &str = "main";

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed profile (project) name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProfileName(pub String);

impl fmt::Display for ProfileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ProfileName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ProfileName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A tracker issue key such as `PROJ-1234`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TicketId(pub String);

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for TicketId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TicketId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl TicketId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Code-hosting provider a profile pushes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    GitHub,
    GitLab,
    Bitbucket,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::GitHub => "github",
            ProviderKind::GitLab => "gitlab",
            ProviderKind::Bitbucket => "bitbucket",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "github" => Ok(Self::GitHub),
            "gitlab" => Ok(Self::GitLab),
            "bitbucket" => Ok(Self::Bitbucket),
            other => Err(ConfigError::UnknownProvider(other.to_owned())),
        }
    }
}

/// Ticket trackers that have a known browse URL shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TicketSystem {
    Jira,
    Linear,
    GitHub,
}

impl TicketSystem {
    /// Parses a configured system name. Unknown names yield `None` rather than
    /// an error so that profiles with custom trackers still load.
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "jira" => Some(Self::Jira),
            "linear" => Some(Self::Linear),
            "github" => Some(Self::GitHub),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TicketSystem::Jira => "jira",
            TicketSystem::Linear => "linear",
            TicketSystem::GitHub => "github",
        }
    }
}

impl fmt::Display for TicketSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Browser used for opening PR and ticket URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BrowserKind {
    /// Whatever the platform opener (`open`, `xdg-open`, `start`) picks.
    #[default]
    System,
    Chrome,
    Firefox,
    Safari,
}

impl fmt::Display for BrowserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BrowserKind::System => write!(f, "system"),
            BrowserKind::Chrome => write!(f, "chrome"),
            BrowserKind::Firefox => write!(f, "firefox"),
            BrowserKind::Safari => write!(f, "safari"),
        }
    }
}

// ---------------------------------------------------------------------------
// Profile document
// ---------------------------------------------------------------------------

/// One managed project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectProfile {
    #[serde(default = "default_version")]
    pub version: u32,
    pub project: ProjectInfo,
    pub git: GitSettings,
    #[serde(default)]
    pub browser: BrowserSettings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket: Option<TicketSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub templates: Option<Templates>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_patterns: Option<BranchPatterns>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hooks: Option<Hooks>,
}

fn default_version() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub name: ProfileName,
    /// Filesystem prefixes owned by this project. `~/` is expanded on match.
    pub paths: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitSettings {
    pub provider: ProviderKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<GitHubSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gitlab: Option<GitLabSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bitbucket: Option<BitbucketSettings>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitHubSettings {
    pub owner: String,
    pub repo: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_env: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitLabSettings {
    pub project_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_env: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitbucketSettings {
    pub workspace: String,
    pub repo_slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_env: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BrowserSettings {
    #[serde(rename = "type", default)]
    pub kind: BrowserKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketSettings {
    /// Tracker name; see [`TicketSystem::parse`].
    pub system: String,
    pub base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jira: Option<JiraSettings>,
}

impl TicketSettings {
    pub fn kind(&self) -> Option<TicketSystem> {
        TicketSystem::parse(&self.system)
    }

    /// Env var holding the tracker token, if one is declared.
    pub fn token_env(&self) -> Option<&str> {
        self.jira.as_ref().and_then(|j| j.token_env.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct JiraSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub board_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_env: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Templates {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pr_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pr_body: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BranchPatterns {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Hooks {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub before_pr: Vec<HookSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub after_pr: Vec<HookSpec>,
}

/// An external command run at a lifecycle stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookSpec {
    pub name: String,
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub fail_on_error: bool,
}

impl HookSpec {
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            description: None,
            fail_on_error: false,
        }
    }

    pub fn failing_on_error(mut self) -> Self {
        self.fail_on_error = true;
        self
    }
}

// ---------------------------------------------------------------------------
// Provider binding
// ---------------------------------------------------------------------------

/// Provider-specific identifiers, resolved from [`GitSettings`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderBinding {
    GitHub { owner: String, repo: String },
    GitLab { project_id: u64 },
    Bitbucket { workspace: String, repo_slug: String },
}

impl ProviderBinding {
    pub fn kind(&self) -> ProviderKind {
        match self {
            ProviderBinding::GitHub { .. } => ProviderKind::GitHub,
            ProviderBinding::GitLab { .. } => ProviderKind::GitLab,
            ProviderBinding::Bitbucket { .. } => ProviderKind::Bitbucket,
        }
    }
}

impl fmt::Display for ProviderBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderBinding::GitHub { owner, repo } => write!(f, "github:{owner}/{repo}"),
            ProviderBinding::GitLab { project_id } => write!(f, "gitlab:{project_id}"),
            ProviderBinding::Bitbucket {
                workspace,
                repo_slug,
            } => write!(f, "bitbucket:{workspace}/{repo_slug}"),
        }
    }
}

impl ProjectProfile {
    pub fn name(&self) -> &ProfileName {
        &self.project.name
    }

    pub fn remote(&self) -> &str {
        self.git.remote.as_deref().unwrap_or(DEFAULT_REMOTE)
    }

    pub fn base_branch(&self) -> &str {
        self.git.base_branch.as_deref().unwrap_or(DEFAULT_BASE_BRANCH)
    }

    /// Resolve the closed provider binding for the declared provider.
    ///
    /// Fails with [`ConfigError::MissingProviderSettings`] when `git.provider`
    /// names a provider whose settings block is absent.
    pub fn provider_binding(&self) -> Result<ProviderBinding, ConfigError> {
        let missing = || ConfigError::MissingProviderSettings {
            profile: self.project.name.0.clone(),
            provider: self.git.provider,
        };
        match self.git.provider {
            ProviderKind::GitHub => self
                .git
                .github
                .as_ref()
                .map(|g| ProviderBinding::GitHub {
                    owner: g.owner.clone(),
                    repo: g.repo.clone(),
                })
                .ok_or_else(missing),
            ProviderKind::GitLab => self
                .git
                .gitlab
                .as_ref()
                .map(|g| ProviderBinding::GitLab {
                    project_id: g.project_id,
                })
                .ok_or_else(missing),
            ProviderKind::Bitbucket => self
                .git
                .bitbucket
                .as_ref()
                .map(|b| ProviderBinding::Bitbucket {
                    workspace: b.workspace.clone(),
                    repo_slug: b.repo_slug.clone(),
                })
                .ok_or_else(missing),
        }
    }

    /// Env var consulted when no stored credential exists for the provider.
    pub fn token_env(&self) -> Option<&str> {
        match self.git.provider {
            ProviderKind::GitHub => self.git.github.as_ref()?.token_env.as_deref(),
            ProviderKind::GitLab => self.git.gitlab.as_ref()?.token_env.as_deref(),
            ProviderKind::Bitbucket => self.git.bitbucket.as_ref()?.token_env.as_deref(),
        }
    }

    pub fn ticket_pattern(&self) -> Option<&str> {
        self.branch_patterns
            .as_ref()
            .and_then(|p| p.ticket_id.as_deref())
            .filter(|p| !p.is_empty())
    }

    pub fn before_pr_hooks(&self) -> &[HookSpec] {
        self.hooks.as_ref().map(|h| h.before_pr.as_slice()).unwrap_or(&[])
    }

    pub fn after_pr_hooks(&self) -> &[HookSpec] {
        self.hooks.as_ref().map(|h| h.after_pr.as_slice()).unwrap_or(&[])
    }

    /// Fill unset fields from the global defaults file.
    pub fn apply_defaults(&mut self, global: &GlobalConfig) {
        if let Some(git) = global.defaults.git.as_ref() {
            if self.git.remote.is_none() {
                self.git.remote = git.remote.clone();
            }
            if self.git.base_branch.is_none() {
                self.git.base_branch = git.base_branch.clone();
            }
        }
        if self.browser == BrowserSettings::default() {
            if let Some(browser) = global.defaults.browser.as_ref() {
                self.browser = browser.clone();
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Global defaults
// ---------------------------------------------------------------------------

/// Optional `<config_dir>/config.yml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct GlobalConfig {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub defaults: Defaults,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Defaults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub browser: Option<BrowserSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git: Option<GitDefaults>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct GitDefaults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_branch: Option<String>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const GITHUB_PROFILE: &str = r#"
version: 1
project:
  name: acme
  paths: [/code/acme]
git:
  provider: github
  github:
    owner: acme
    repo: api
    token_env: ACME_TOKEN
ticket:
  system: jira
  base_url: https://acme.atlassian.net
hooks:
  before_pr:
    - name: test
      command: cargo test
      fail_on_error: true
"#;

    fn github_profile() -> ProjectProfile {
        serde_yaml::from_str(GITHUB_PROFILE).expect("parse profile")
    }

    #[test]
    fn defaults_for_remote_and_base_branch() {
        let profile = github_profile();
        assert_eq!(profile.remote(), "origin");
        assert_eq!(profile.base_branch(), "main");
        assert_eq!(profile.browser.kind, BrowserKind::System);
    }

    #[test]
    fn provider_binding_resolves_github() {
        let profile = github_profile();
        assert_eq!(
            profile.provider_binding().expect("binding"),
            ProviderBinding::GitHub {
                owner: "acme".into(),
                repo: "api".into()
            }
        );
        assert_eq!(profile.token_env(), Some("ACME_TOKEN"));
    }

    #[test]
    fn provider_binding_missing_block_is_error() {
        let mut profile = github_profile();
        profile.git.provider = ProviderKind::GitLab;
        let err = profile.provider_binding().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingProviderSettings {
                provider: ProviderKind::GitLab,
                ..
            }
        ));
        assert!(err.to_string().contains("acme"));
    }

    #[test]
    fn hooks_default_fail_on_error_false() {
        let yaml = "name: lint\ncommand: cargo clippy\n";
        let hook: HookSpec = serde_yaml::from_str(yaml).expect("hook");
        assert!(!hook.fail_on_error);
        assert!(github_profile().before_pr_hooks()[0].fail_on_error);
        assert!(github_profile().after_pr_hooks().is_empty());
    }

    #[test]
    fn apply_defaults_only_fills_unset_fields() {
        let mut profile = github_profile();
        profile.git.remote = Some("upstream".into());
        let global = GlobalConfig {
            version: 1,
            defaults: Defaults {
                browser: Some(BrowserSettings {
                    kind: BrowserKind::Firefox,
                    profile: None,
                }),
                git: Some(GitDefaults {
                    remote: Some("origin".into()),
                    base_branch: Some("develop".into()),
                }),
            },
        };
        profile.apply_defaults(&global);
        assert_eq!(profile.remote(), "upstream");
        assert_eq!(profile.base_branch(), "develop");
        assert_eq!(profile.browser.kind, BrowserKind::Firefox);
    }

    #[test]
    fn ticket_system_parse_is_case_insensitive() {
        assert_eq!(TicketSystem::parse("JIRA"), Some(TicketSystem::Jira));
        assert_eq!(TicketSystem::parse("youtrack"), None);
        assert_eq!(github_profile().ticket.expect("ticket").kind(), Some(TicketSystem::Jira));
    }

    #[test]
    fn provider_kind_from_str() {
        assert_eq!("GitLab".parse::<ProviderKind>().expect("kind"), ProviderKind::GitLab);
        assert!("gitea".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn empty_ticket_pattern_is_treated_as_unset() {
        let mut profile = github_profile();
        profile.branch_patterns = Some(BranchPatterns {
            ticket_id: Some(String::new()),
        });
        assert_eq!(profile.ticket_pattern(), None);
    }
}
