//! REST contracts per provider, checked against a recording fake transport.

use std::cell::RefCell;

use one_core::types::{ProviderBinding, TicketId, TicketSettings};
use one_hosting::{
    ApiRequest, ApiResponse, HostingApi, HttpHosting, Method, ProviderError, PullRequestDraft,
    Transport,
};
use rstest::rstest;
use serde_json::json;

struct FakeTransport {
    status: u16,
    body: String,
    seen: RefCell<Vec<ApiRequest>>,
}

impl FakeTransport {
    fn replying(status: u16, body: serde_json::Value) -> Self {
        Self {
            status,
            body: body.to_string(),
            seen: RefCell::new(Vec::new()),
        }
    }

    fn raw(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_owned(),
            seen: RefCell::new(Vec::new()),
        }
    }

    fn only_request(&self) -> ApiRequest {
        let seen = self.seen.borrow();
        assert_eq!(seen.len(), 1, "expected exactly one request");
        seen[0].clone()
    }
}

impl Transport for FakeTransport {
    fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ProviderError> {
        self.seen.borrow_mut().push(request.clone());
        Ok(ApiResponse {
            status: self.status,
            body: self.body.clone(),
        })
    }
}

fn draft() -> PullRequestDraft {
    PullRequestDraft {
        title: "[PROJ-1] login".into(),
        body: "Closes PROJ-1".into(),
        head: "PROJ-1-login".into(),
        base: "main".into(),
    }
}

fn github() -> ProviderBinding {
    ProviderBinding::GitHub {
        owner: "acme".into(),
        repo: "api".into(),
    }
}

fn gitlab() -> ProviderBinding {
    ProviderBinding::GitLab { project_id: 42 }
}

fn bitbucket() -> ProviderBinding {
    ProviderBinding::Bitbucket {
        workspace: "acme".into(),
        repo_slug: "site".into(),
    }
}

fn ticket_settings(system: &str) -> TicketSettings {
    TicketSettings {
        system: system.into(),
        base_url: "https://acme.atlassian.net/".into(),
        jira: None,
    }
}

// ---------------------------------------------------------------------------
// Pull requests
// ---------------------------------------------------------------------------

#[test]
fn github_pull_request_contract() {
    let transport = FakeTransport::replying(201, json!({"html_url": "https://github.com/acme/api/pull/7"}));
    let url = HttpHosting::new(&transport)
        .create_pull_request(&github(), &draft(), "gho_tok")
        .expect("create");
    assert_eq!(url, "https://github.com/acme/api/pull/7");

    let req = transport.only_request();
    assert_eq!(req.method, Method::Post);
    assert_eq!(req.url, "https://api.github.com/repos/acme/api/pulls");
    assert_eq!(req.header_value("authorization"), Some("Bearer gho_tok"));
    assert_eq!(req.header_value("Accept"), Some("application/vnd.github+json"));
    assert_eq!(
        req.body,
        Some(json!({
            "title": "[PROJ-1] login",
            "body": "Closes PROJ-1",
            "head": "PROJ-1-login",
            "base": "main",
            "draft": false,
        }))
    );
}

#[test]
fn gitlab_merge_request_contract() {
    let transport = FakeTransport::replying(201, json!({"web_url": "https://gitlab.com/acme/api/-/merge_requests/3"}));
    let url = HttpHosting::new(&transport)
        .create_pull_request(&gitlab(), &draft(), "glpat")
        .expect("create");
    assert_eq!(url, "https://gitlab.com/acme/api/-/merge_requests/3");

    let req = transport.only_request();
    assert_eq!(req.url, "https://gitlab.com/api/v4/projects/42/merge_requests");
    assert_eq!(req.header_value("PRIVATE-TOKEN"), Some("glpat"));
    assert_eq!(req.header_value("Authorization"), None);
    assert_eq!(
        req.body,
        Some(json!({
            "source_branch": "PROJ-1-login",
            "target_branch": "main",
            "title": "[PROJ-1] login",
            "description": "Closes PROJ-1",
        }))
    );
}

#[test]
fn bitbucket_pull_request_contract() {
    let transport = FakeTransport::replying(
        201,
        json!({"links": {"html": {"href": "https://bitbucket.org/acme/site/pull-requests/9"}}}),
    );
    let url = HttpHosting::new(&transport)
        .create_pull_request(&bitbucket(), &draft(), "bb")
        .expect("create");
    assert_eq!(url, "https://bitbucket.org/acme/site/pull-requests/9");

    let req = transport.only_request();
    assert_eq!(req.url, "https://api.bitbucket.org/2.0/repositories/acme/site/pullrequests");
    assert_eq!(req.header_value("Authorization"), Some("Bearer bb"));
    let body = req.body.expect("body");
    assert_eq!(body["source"]["branch"]["name"], "PROJ-1-login");
    assert_eq!(body["destination"]["branch"]["name"], "main");
    assert_eq!(body["description"], "Closes PROJ-1");
}

#[rstest]
#[case::github(github())]
#[case::gitlab(gitlab())]
#[case::bitbucket(bitbucket())]
fn non_created_status_is_status_error(#[case] binding: ProviderBinding) {
    let transport = FakeTransport::raw(422, r#"{"message":"Validation Failed"}"#);
    let err = HttpHosting::new(&transport)
        .create_pull_request(&binding, &draft(), "t")
        .unwrap_err();
    match err {
        ProviderError::Status { status, ref body, .. } => {
            assert_eq!(status, 422);
            assert!(body.contains("Validation Failed"));
        }
        other => panic!("unexpected: {other}"),
    }
}

#[test]
fn ok_instead_of_created_is_rejected() {
    let transport = FakeTransport::replying(200, json!({"html_url": "https://x"}));
    let err = HttpHosting::new(&transport)
        .create_pull_request(&github(), &draft(), "t")
        .unwrap_err();
    assert!(matches!(err, ProviderError::Status { status: 200, .. }));
}

#[rstest]
#[case::missing_field(FakeTransport::replying(201, json!({"url": "https://x"})))]
#[case::wrong_type(FakeTransport::replying(201, json!({"html_url": 5})))]
#[case::not_json(FakeTransport::raw(201, "<html>"))]
fn malformed_created_response(#[case] transport: FakeTransport) {
    let err = HttpHosting::new(&transport)
        .create_pull_request(&github(), &draft(), "t")
        .unwrap_err();
    assert!(matches!(err, ProviderError::MalformedResponse { provider: "github", .. }), "got: {err}");
}

// ---------------------------------------------------------------------------
// Ticket summaries
// ---------------------------------------------------------------------------

#[test]
fn jira_summary_contract() {
    let transport = FakeTransport::replying(200, json!({"key": "PROJ-1", "fields": {"summary": "Add login"}}));
    let summary = HttpHosting::new(&transport)
        .fetch_ticket_summary(&ticket_settings("jira"), &github(), &TicketId::from("PROJ-1"), "dXNlcjp0b2s=")
        .expect("summary");
    assert_eq!(summary, "Add login");

    let req = transport.only_request();
    assert_eq!(req.method, Method::Get);
    assert_eq!(req.url, "https://acme.atlassian.net/rest/api/2/issue/PROJ-1");
    assert_eq!(req.header_value("Authorization"), Some("Basic dXNlcjp0b2s="));
}

#[test]
fn jira_missing_summary_is_malformed() {
    let transport = FakeTransport::replying(200, json!({"fields": {}}));
    let err = HttpHosting::new(&transport)
        .fetch_ticket_summary(&ticket_settings("jira"), &github(), &TicketId::from("PROJ-1"), "t")
        .unwrap_err();
    assert!(matches!(err, ProviderError::MalformedResponse { provider: "jira", .. }));
}

#[test]
fn github_issue_summary_uses_issue_number() {
    let transport = FakeTransport::replying(200, json!({"title": "Crash on start"}));
    let summary = HttpHosting::new(&transport)
        .fetch_ticket_summary(&ticket_settings("github"), &github(), &TicketId::from("#88"), "t")
        .expect("summary");
    assert_eq!(summary, "Crash on start");
    assert_eq!(
        transport.only_request().url,
        "https://api.github.com/repos/acme/api/issues/88"
    );
}

#[rstest]
#[case::linear("linear", github())]
#[case::unknown("youtrack", github())]
#[case::github_issues_on_gitlab("github", gitlab())]
fn unsupported_ticket_fetches(#[case] system: &str, #[case] binding: ProviderBinding) {
    let transport = FakeTransport::replying(200, json!({}));
    let err = HttpHosting::new(&transport)
        .fetch_ticket_summary(&ticket_settings(system), &binding, &TicketId::from("X-1"), "t")
        .unwrap_err();
    assert!(matches!(err, ProviderError::Unsupported(_)), "got: {err}");
    assert!(transport.seen.borrow().is_empty());
}
