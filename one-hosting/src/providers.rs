//! Code-hosting providers behind one closed enum.

use serde_json::json;
use tracing::info;

use one_core::types::{ProviderBinding, ProviderKind, TicketId};

use crate::error::ProviderError;
use crate::transport::{json_with_status, string_at, ApiRequest, Transport};

pub const GITHUB_API: &str = "https://api.github.com";
pub const GITLAB_API: &str = "https://gitlab.com/api/v4";
pub const BITBUCKET_API: &str = "https://api.bitbucket.org/2.0";

const GITHUB_ACCEPT: &str = "application/vnd.github+json";
const GITHUB_API_VERSION: &str = "2022-11-28";

const CREATED: u16 = 201;
const OK: u16 = 200;

/// What to open: `head` into `base`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestDraft {
    pub title: String,
    pub body: String,
    pub head: String,
    pub base: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderClient {
    GitHub {
        api_base: String,
        owner: String,
        repo: String,
    },
    GitLab {
        api_base: String,
        project_id: u64,
    },
    Bitbucket {
        api_base: String,
        workspace: String,
        repo_slug: String,
    },
}

impl From<&ProviderBinding> for ProviderClient {
    fn from(binding: &ProviderBinding) -> Self {
        match binding {
            ProviderBinding::GitHub { owner, repo } => ProviderClient::GitHub {
                api_base: GITHUB_API.to_owned(),
                owner: owner.clone(),
                repo: repo.clone(),
            },
            ProviderBinding::GitLab { project_id } => ProviderClient::GitLab {
                api_base: GITLAB_API.to_owned(),
                project_id: *project_id,
            },
            ProviderBinding::Bitbucket {
                workspace,
                repo_slug,
            } => ProviderClient::Bitbucket {
                api_base: BITBUCKET_API.to_owned(),
                workspace: workspace.clone(),
                repo_slug: repo_slug.clone(),
            },
        }
    }
}

impl ProviderClient {
    pub fn kind(&self) -> ProviderKind {
        match self {
            ProviderClient::GitHub { .. } => ProviderKind::GitHub,
            ProviderClient::GitLab { .. } => ProviderKind::GitLab,
            ProviderClient::Bitbucket { .. } => ProviderKind::Bitbucket,
        }
    }

    fn name(&self) -> &'static str {
        self.kind().as_str()
    }

    /// Point the client at a self-hosted instance.
    pub fn with_api_base(mut self, base: &str) -> Self {
        let base = base.trim_end_matches('/').to_owned();
        match &mut self {
            ProviderClient::GitHub { api_base, .. }
            | ProviderClient::GitLab { api_base, .. }
            | ProviderClient::Bitbucket { api_base, .. } => *api_base = base,
        }
        self
    }

    fn authorize(&self, request: ApiRequest, token: &str) -> ApiRequest {
        match self {
            ProviderClient::GitHub { .. } => request
                .header("Authorization", format!("Bearer {token}"))
                .header("Accept", GITHUB_ACCEPT)
                .header("X-GitHub-Api-Version", GITHUB_API_VERSION),
            ProviderClient::GitLab { .. } => request.header("PRIVATE-TOKEN", token),
            ProviderClient::Bitbucket { .. } => request
                .header("Authorization", format!("Bearer {token}"))
                .header("Accept", "application/json"),
        }
    }

    pub fn pull_request_request(&self, draft: &PullRequestDraft, token: &str) -> ApiRequest {
        let request = match self {
            ProviderClient::GitHub {
                api_base,
                owner,
                repo,
            } => ApiRequest::post(
                format!("{api_base}/repos/{owner}/{repo}/pulls"),
                json!({
                    "title": draft.title,
                    "body": draft.body,
                    "head": draft.head,
                    "base": draft.base,
                    "draft": false,
                }),
            ),
            ProviderClient::GitLab {
                api_base,
                project_id,
            } => ApiRequest::post(
                format!("{api_base}/projects/{project_id}/merge_requests"),
                json!({
                    "source_branch": draft.head,
                    "target_branch": draft.base,
                    "title": draft.title,
                    "description": draft.body,
                }),
            ),
            ProviderClient::Bitbucket {
                api_base,
                workspace,
                repo_slug,
            } => ApiRequest::post(
                format!("{api_base}/repositories/{workspace}/{repo_slug}/pullrequests"),
                json!({
                    "title": draft.title,
                    "description": draft.body,
                    "source": { "branch": { "name": draft.head } },
                    "destination": { "branch": { "name": draft.base } },
                }),
            ),
        };
        self.authorize(request, token)
    }

    /// Open a pull/merge request and return its web URL.
    pub fn create_pull_request<T: Transport + ?Sized>(
        &self,
        transport: &T,
        draft: &PullRequestDraft,
        token: &str,
    ) -> Result<String, ProviderError> {
        let response = transport.send(&self.pull_request_request(draft, token))?;
        let value = json_with_status(self.name(), response, CREATED)?;
        let pointer = match self {
            ProviderClient::GitHub { .. } => "/html_url",
            ProviderClient::GitLab { .. } => "/web_url",
            ProviderClient::Bitbucket { .. } => "/links/html/href",
        };
        let url = string_at(self.name(), &value, pointer)?;
        info!(provider = self.name(), head = %draft.head, base = %draft.base, %url, "pull request created");
        Ok(url)
    }

    pub fn issue_request(&self, ticket: &TicketId, token: &str) -> Result<ApiRequest, ProviderError> {
        let number = issue_number(self.name(), ticket)?;
        let url = match self {
            ProviderClient::GitHub {
                api_base,
                owner,
                repo,
            } => format!("{api_base}/repos/{owner}/{repo}/issues/{number}"),
            ProviderClient::GitLab {
                api_base,
                project_id,
            } => format!("{api_base}/projects/{project_id}/issues/{number}"),
            ProviderClient::Bitbucket {
                api_base,
                workspace,
                repo_slug,
            } => format!("{api_base}/repositories/{workspace}/{repo_slug}/issues/{number}"),
        };
        Ok(self.authorize(ApiRequest::get(url), token))
    }

    /// Title of the provider's own issue `ticket`.
    pub fn fetch_ticket_summary<T: Transport + ?Sized>(
        &self,
        transport: &T,
        ticket: &TicketId,
        token: &str,
    ) -> Result<String, ProviderError> {
        let response = transport.send(&self.issue_request(ticket, token)?)?;
        let value = json_with_status(self.name(), response, OK)?;
        string_at(self.name(), &value, "/title")
    }
}

/// Trailing digits of `#12`, `12` or `ACME-12`.
fn issue_number(provider: &'static str, ticket: &TicketId) -> Result<u64, ProviderError> {
    let raw = ticket.as_str();
    let digits_start = raw
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, _)| i);
    digits_start
        .and_then(|i| raw[i..].parse().ok())
        .ok_or_else(|| ProviderError::InvalidTicketId {
            provider,
            ticket: raw.to_owned(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("#12", 12)]
    #[case("12", 12)]
    #[case("ACME-345", 345)]
    fn issue_numbers(#[case] ticket: &str, #[case] expected: u64) {
        assert_eq!(issue_number("github", &TicketId::from(ticket)).expect("number"), expected);
    }

    #[rstest]
    #[case("")]
    #[case("ACME")]
    #[case("12a")]
    fn invalid_issue_numbers(#[case] ticket: &str) {
        assert!(issue_number("github", &TicketId::from(ticket)).is_err());
    }

    #[test]
    fn with_api_base_strips_trailing_slash() {
        let client = ProviderClient::from(&ProviderBinding::GitLab { project_id: 7 })
            .with_api_base("https://git.example.com/api/v4/");
        let req = client.issue_request(&TicketId::from("3"), "t").expect("request");
        assert_eq!(req.url, "https://git.example.com/api/v4/projects/7/issues/3");
    }
}
