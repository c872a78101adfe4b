//! Remote URL parsing for `one init`.

use std::sync::LazyLock;

use regex::Regex;

use one_core::types::ProviderKind;

use crate::error::RemoteUrlError;

static SSH_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:ssh://)?[\w.-]+@(?P<host>[\w.-]+)[:/](?P<path>.+?)(?:\.git)?/?$")
        .expect("static regex")
});

static HTTP_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://(?:[^@/]+@)?(?P<host>[\w.-]+)(?::\d+)?/(?P<path>.+?)(?:\.git)?/?$")
        .expect("static regex")
});

/// Owner/repo coordinates parsed from a remote URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteInfo {
    /// `None` for self-hosted instances whose host name gives nothing away.
    pub provider: Option<ProviderKind>,
    pub host: String,
    /// Everything before the last path segment; GitLab subgroups included.
    pub owner: String,
    pub repo: String,
}

pub fn detect_provider(host: &str) -> Option<ProviderKind> {
    let host = host.to_ascii_lowercase();
    if host.contains("github") {
        Some(ProviderKind::GitHub)
    } else if host.contains("gitlab") {
        Some(ProviderKind::GitLab)
    } else if host.contains("bitbucket") {
        Some(ProviderKind::Bitbucket)
    } else {
        None
    }
}

/// Parse `git@host:owner/repo.git`, `ssh://git@host/owner/repo` or
/// `https://host/owner/repo(.git)`.
pub fn parse_remote_url(url: &str) -> Result<RemoteInfo, RemoteUrlError> {
    let url = url.trim();
    let caps = HTTP_URL
        .captures(url)
        .or_else(|| SSH_URL.captures(url))
        .ok_or_else(|| RemoteUrlError { url: url.to_owned() })?;

    let host = &caps["host"];
    let path = caps["path"].trim_matches('/');
    let (owner, repo) = path
        .rsplit_once('/')
        .filter(|(owner, repo)| !owner.is_empty() && !repo.is_empty())
        .ok_or_else(|| RemoteUrlError { url: url.to_owned() })?;

    Ok(RemoteInfo {
        provider: detect_provider(host),
        host: host.to_owned(),
        owner: owner.to_owned(),
        repo: repo.to_owned(),
    })
}
