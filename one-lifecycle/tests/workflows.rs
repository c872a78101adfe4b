//! `start` and `pr` against in-memory collaborators. Every collaborator writes
//! to one shared log so that ordering across them can be asserted.
#![cfg(unix)]

use std::cell::RefCell;
use std::rc::Rc;

use one_auth::{AuthError, TokenSource};
use one_core::report::{HookReport, Reporter};
use one_core::types::{HookSpec, ProfileName, ProjectProfile, ProviderBinding, TicketId, TicketSettings};
use one_hosting::{HostingApi, ProviderError, PullRequestDraft};
use one_lifecycle::{
    execute_pr, execute_start, plan_pr, plan_start, BrowserOpener, Collaborators, HookPipeline,
    LifecycleError, PrRequest, StartRequest,
};
use one_vcs::{PullOutcome, RepoError, Repository};
use tempfile::TempDir;

type Log = Rc<RefCell<Vec<String>>>;

fn entries(log: &Log) -> Vec<String> {
    log.borrow().clone()
}

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

struct FakeRepo {
    log: Log,
    clean: bool,
    diverged: bool,
    current: RefCell<String>,
}

impl FakeRepo {
    fn new(log: &Log) -> Self {
        Self {
            log: log.clone(),
            clean: true,
            diverged: false,
            current: RefCell::new("main".into()),
        }
    }
}

impl Repository for FakeRepo {
    fn current_branch(&self) -> Result<String, RepoError> {
        Ok(self.current.borrow().clone())
    }
    fn is_clean(&self) -> Result<bool, RepoError> {
        self.log.borrow_mut().push("status".into());
        Ok(self.clean)
    }
    fn checkout_branch(&self, name: &str) -> Result<(), RepoError> {
        self.log.borrow_mut().push(format!("checkout {name}"));
        *self.current.borrow_mut() = name.to_owned();
        Ok(())
    }
    fn create_branch(&self, name: &str) -> Result<(), RepoError> {
        self.log.borrow_mut().push(format!("branch {name}"));
        Ok(())
    }
    fn pull(&self, remote: &str, branch: &str) -> Result<PullOutcome, RepoError> {
        self.log.borrow_mut().push(format!("pull {remote}/{branch}"));
        if self.diverged {
            return Err(RepoError::NotFastForward {
                remote: remote.into(),
                branch: branch.into(),
            });
        }
        Ok(PullOutcome::UpToDate)
    }
    fn push(&self, remote: &str, branch: &str) -> Result<(), RepoError> {
        self.log.borrow_mut().push(format!("push {remote} {branch}"));
        Ok(())
    }
    fn author(&self) -> Option<String> {
        Some("Ada".into())
    }
}

struct FakeHosting {
    log: Log,
    summary: Option<String>,
    create_fails: bool,
    drafts: RefCell<Vec<PullRequestDraft>>,
}

impl FakeHosting {
    fn new(log: &Log) -> Self {
        Self {
            log: log.clone(),
            summary: None,
            create_fails: false,
            drafts: RefCell::new(Vec::new()),
        }
    }
}

impl HostingApi for FakeHosting {
    fn create_pull_request(
        &self,
        binding: &ProviderBinding,
        draft: &PullRequestDraft,
        token: &str,
    ) -> Result<String, ProviderError> {
        self.log
            .borrow_mut()
            .push(format!("create_pr {binding} {}->{} token={token}", draft.head, draft.base));
        self.drafts.borrow_mut().push(draft.clone());
        if self.create_fails {
            return Err(ProviderError::Status {
                provider: "github",
                status: 422,
                body: "Validation Failed".into(),
            });
        }
        Ok("https://github.com/acme/api/pull/1".into())
    }

    fn fetch_ticket_summary(
        &self,
        settings: &TicketSettings,
        _binding: &ProviderBinding,
        ticket: &TicketId,
        token: &str,
    ) -> Result<String, ProviderError> {
        self.log
            .borrow_mut()
            .push(format!("summary {} {ticket} token={token}", settings.system));
        self.summary
            .clone()
            .ok_or_else(|| ProviderError::Unsupported("no summary scripted".into()))
    }
}

struct FakeTokens {
    log: Log,
    authenticated: bool,
}

impl TokenSource for FakeTokens {
    fn token(
        &self,
        provider: &str,
        project: &ProfileName,
        token_env: Option<&str>,
    ) -> Result<String, AuthError> {
        self.log.borrow_mut().push(format!(
            "token {provider}:{project} env={}",
            token_env.unwrap_or("-")
        ));
        if self.authenticated {
            Ok(format!("{provider}-token"))
        } else {
            Err(AuthError::NotAuthenticated {
                provider: provider.into(),
                project: project.to_string(),
                hint: "run `one auth login`".into(),
            })
        }
    }
}

struct FakeBrowser {
    log: Log,
    fails: bool,
}

impl BrowserOpener for FakeBrowser {
    fn open(&self, url: &str) -> std::io::Result<()> {
        self.log.borrow_mut().push(format!("browser {url}"));
        if self.fails {
            return Err(std::io::Error::new(std::io::ErrorKind::NotFound, "no browser"));
        }
        Ok(())
    }
}

struct LogReporter {
    log: Log,
}

impl Reporter for LogReporter {
    fn step(&self, _message: &str) {}
    fn detail(&self, _label: &str, _value: &str) {}
    fn success(&self, _message: &str) {}
    fn warn(&self, message: &str) {
        self.log.borrow_mut().push(format!("warn {message}"));
    }
    fn hook_started(&self, _position: usize, _total: usize, hook: &HookSpec) {
        self.log.borrow_mut().push(format!("hook {}", hook.name));
    }
    fn hook_finished(&self, _report: &HookReport) {}
    fn authorization_required(&self, _provider: &str, _verification_uri: &str, _user_code: &str) {}
}

struct World {
    log: Log,
    repo: FakeRepo,
    hosting: FakeHosting,
    tokens: FakeTokens,
    browser: FakeBrowser,
    reporter: LogReporter,
    hooks: HookPipeline,
    _dir: TempDir,
}

impl World {
    fn new() -> Self {
        let log: Log = Rc::default();
        let dir = TempDir::new().expect("dir");
        Self {
            repo: FakeRepo::new(&log),
            hosting: FakeHosting::new(&log),
            tokens: FakeTokens {
                log: log.clone(),
                authenticated: true,
            },
            browser: FakeBrowser {
                log: log.clone(),
                fails: false,
            },
            reporter: LogReporter { log: log.clone() },
            hooks: HookPipeline::in_dir(dir.path()),
            _dir: dir,
            log,
        }
    }

    fn deps(&self) -> Collaborators<'_> {
        Collaborators {
            repo: &self.repo,
            hosting: &self.hosting,
            tokens: &self.tokens,
            hooks: &self.hooks,
            browser: &self.browser,
            reporter: &self.reporter,
        }
    }
}

fn profile(extra: &str) -> ProjectProfile {
    let yaml = format!(
        r#"
project: {{ name: acme, paths: [/code/acme] }}
git:
  provider: github
  github: {{ owner: acme, repo: api, token_env: ACME_GH }}
{extra}"#
    );
    serde_yaml::from_str(&yaml).expect("profile")
}

const JIRA: &str = r#"
ticket:
  system: jira
  base_url: https://acme.atlassian.net
  jira: { token_env: ACME_JIRA }
"#;

const TEMPLATES_AND_HOOKS: &str = r#"
templates:
  pr_title: "[{ticket_id}] {branch_name}"
  pr_body: "Closes {ticket_url} by {author}"
ticket:
  system: jira
  base_url: https://acme.atlassian.net
hooks:
  before_pr:
    - { name: lint, command: "true", fail_on_error: true }
  after_pr:
    - { name: notify, command: "true" }
"#;

fn start(world: &World, profile: &ProjectProfile, description: Option<&str>) -> Result<one_lifecycle::StartOutcome, LifecycleError> {
    let plan = plan_start(
        profile,
        StartRequest {
            ticket_id: TicketId::from("PROJ-1"),
            description: description.map(str::to_owned),
        },
    )
    .expect("plan");
    execute_start(&plan, &world.deps())
}

// ---------------------------------------------------------------------------
// start
// ---------------------------------------------------------------------------

#[test]
fn start_with_description_branches_from_fresh_base() {
    let world = World::new();
    let outcome = start(&world, &profile(""), Some("Add Login!")).expect("start");

    assert_eq!(outcome.branch, "PROJ-1-add-login");
    assert_eq!(outcome.title, "Add Login!");
    assert_eq!(outcome.pulled, PullOutcome::UpToDate);
    assert_eq!(
        entries(&world.log),
        [
            "status",
            "checkout main",
            "pull origin/main",
            "branch PROJ-1-add-login",
            "checkout PROJ-1-add-login",
        ]
    );
}

#[test]
fn start_refuses_dirty_tree() {
    let mut world = World::new();
    world.repo.clean = false;
    let err = start(&world, &profile(""), Some("x")).unwrap_err();
    assert!(matches!(err, LifecycleError::DirtyWorkingTree { command: "start" }));
    assert_eq!(entries(&world.log), ["status"]);
}

#[test]
fn start_uses_ticket_summary_when_no_description() {
    let mut world = World::new();
    world.hosting.summary = Some("Fix the login bug".into());
    let outcome = start(&world, &profile(JIRA), None).expect("start");

    assert_eq!(outcome.branch, "PROJ-1-fix-the-login-bug");
    let log = entries(&world.log);
    assert!(log.contains(&"token jira:acme env=ACME_JIRA".to_owned()), "{log:?}");
    assert!(log.contains(&"summary jira PROJ-1 token=jira-token".to_owned()), "{log:?}");
}

#[test]
fn start_falls_back_to_ticket_id_when_summary_unavailable() {
    let world = World::new();
    let outcome = start(&world, &profile(JIRA), None).expect("start");

    assert_eq!(outcome.branch, "PROJ-1");
    assert!(entries(&world.log).iter().any(|e| e.starts_with("warn could not fetch ticket title")));
}

#[test]
fn start_without_ticket_system_uses_ticket_id() {
    let world = World::new();
    let outcome = start(&world, &profile(""), None).expect("start");
    assert_eq!(outcome.branch, "PROJ-1");
    assert!(!entries(&world.log).iter().any(|e| e.starts_with("summary")));
}

#[test]
fn start_stops_on_diverged_base() {
    let mut world = World::new();
    world.repo.diverged = true;
    let err = start(&world, &profile(""), Some("x")).unwrap_err();
    assert!(matches!(err, LifecycleError::Repository(RepoError::NotFastForward { .. })));
    assert!(!entries(&world.log).iter().any(|e| e.starts_with("branch")));
}

// ---------------------------------------------------------------------------
// pr
// ---------------------------------------------------------------------------

fn open_browser() -> PrRequest {
    PrRequest {
        open_browser: true,
        ..PrRequest::default()
    }
}

#[test]
fn pr_runs_stages_in_order_and_renders_templates() {
    let world = World::new();
    let profile = profile(TEMPLATES_AND_HOOKS);
    let plan = plan_pr(&profile, open_browser(), "PROJ-7-login").expect("plan");
    assert_eq!(plan.ticket_id, Some(TicketId::from("PROJ-7")));

    let outcome = execute_pr(&plan, &world.deps()).expect("pr");

    assert_eq!(outcome.url, "https://github.com/acme/api/pull/1");
    assert!(outcome.after_hooks_ok);
    assert!(outcome.before_hooks.all_succeeded());
    assert_eq!(
        entries(&world.log),
        [
            "status",
            "token github:acme env=ACME_GH",
            "hook lint",
            "push origin PROJ-7-login",
            "create_pr github:acme/api PROJ-7-login->main token=github-token",
            "browser https://github.com/acme/api/pull/1",
            "hook notify",
        ]
    );

    let draft = world.hosting.drafts.borrow()[0].clone();
    assert_eq!(draft.title, "[PROJ-7] PROJ-7-login");
    assert_eq!(draft.body, "Closes https://acme.atlassian.net/browse/PROJ-7 by Ada");
}

#[test]
fn explicit_title_and_description_win_over_templates() {
    let world = World::new();
    let profile = profile(TEMPLATES_AND_HOOKS);
    let request = PrRequest {
        title: Some("Custom".into()),
        description: Some("Body".into()),
        open_browser: false,
    };
    let plan = plan_pr(&profile, request, "PROJ-7-login").expect("plan");
    let outcome = execute_pr(&plan, &world.deps()).expect("pr");

    assert_eq!(outcome.title, "Custom");
    assert_eq!(world.hosting.drafts.borrow()[0].body, "Body");
    assert!(!entries(&world.log).iter().any(|e| e.starts_with("browser")));
}

#[test]
fn branch_name_is_title_without_templates() {
    let world = World::new();
    let profile = profile("");
    let plan = plan_pr(&profile, PrRequest::default(), "fix-typo").expect("plan");
    assert_eq!(plan.ticket_id, None);

    let outcome = execute_pr(&plan, &world.deps()).expect("pr");
    assert_eq!(outcome.title, "fix-typo");
    assert_eq!(world.hosting.drafts.borrow()[0].body, "");
}

#[test]
fn invalid_ticket_pattern_is_fatal_at_planning() {
    let profile = profile("branch_patterns: { ticket_id: '([A-Z' }\n");
    let err = plan_pr(&profile, PrRequest::default(), "PROJ-1").unwrap_err();
    assert!(matches!(err, LifecycleError::Pattern(_)), "got: {err}");
}

#[test]
fn invalid_hooks_are_rejected_at_planning() {
    let profile = profile("hooks: { after_pr: [ { name: broken, command: '' } ] }\n");
    let err = plan_pr(&profile, PrRequest::default(), "PROJ-1").unwrap_err();
    assert!(matches!(err, LifecycleError::Hook(_)), "got: {err}");
}

#[test]
fn missing_credentials_abort_before_hooks_and_push() {
    let mut world = World::new();
    world.tokens.authenticated = false;
    let profile = profile(TEMPLATES_AND_HOOKS);
    let plan = plan_pr(&profile, PrRequest::default(), "PROJ-7-login").expect("plan");

    let err = execute_pr(&plan, &world.deps()).unwrap_err();
    assert!(matches!(err, LifecycleError::Auth(AuthError::NotAuthenticated { .. })));
    let log = entries(&world.log);
    assert!(!log.iter().any(|e| e.starts_with("hook") || e.starts_with("push")), "{log:?}");
}

#[test]
fn fatal_before_hook_prevents_push() {
    let world = World::new();
    let profile = profile("hooks: { before_pr: [ { name: tests, command: 'exit 1', fail_on_error: true } ] }\n");
    let plan = plan_pr(&profile, PrRequest::default(), "PROJ-7-login").expect("plan");

    let err = execute_pr(&plan, &world.deps()).unwrap_err();
    assert!(matches!(err, LifecycleError::Hook(_)), "got: {err}");
    assert!(!entries(&world.log).iter().any(|e| e.starts_with("push") || e.starts_with("create_pr")));
}

#[test]
fn after_hook_failure_is_only_a_warning() {
    let world = World::new();
    let profile = profile("hooks: { after_pr: [ { name: notify, command: 'exit 1', fail_on_error: true } ] }\n");
    let plan = plan_pr(&profile, PrRequest::default(), "PROJ-7-login").expect("plan");

    let outcome = execute_pr(&plan, &world.deps()).expect("pr still succeeds");
    assert!(!outcome.after_hooks_ok);
    assert!(entries(&world.log).iter().any(|e| e.starts_with("warn after_pr hooks failed")));
}

#[test]
fn browser_failure_is_not_fatal() {
    let mut world = World::new();
    world.browser.fails = true;
    let profile = profile("");
    let plan = plan_pr(&profile, open_browser(), "PROJ-7-login").expect("plan");

    let outcome = execute_pr(&plan, &world.deps()).expect("pr");
    assert_eq!(outcome.url, "https://github.com/acme/api/pull/1");
    assert!(entries(&world.log).iter().any(|e| e.starts_with("warn could not open browser")));
}

#[test]
fn provider_rejection_names_the_provider() {
    let mut world = World::new();
    world.hosting.create_fails = true;
    let profile = profile("");
    let plan = plan_pr(&profile, PrRequest::default(), "PROJ-7-login").expect("plan");

    let err = execute_pr(&plan, &world.deps()).unwrap_err();
    assert!(matches!(err, LifecycleError::CreatePullRequest { .. }));
    assert!(err.to_string().contains("github"), "{err}");
}

#[test]
fn dirty_tree_blocks_pr() {
    let mut world = World::new();
    world.repo.clean = false;
    let profile = profile("");
    let plan = plan_pr(&profile, PrRequest::default(), "PROJ-7-login").expect("plan");
    let err = execute_pr(&plan, &world.deps()).unwrap_err();
    assert!(matches!(err, LifecycleError::DirtyWorkingTree { command: "pr" }));
}
