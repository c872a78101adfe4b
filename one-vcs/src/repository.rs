//! Repository state adapter.
//!
//! [`Repository`] is the seam the lifecycle orchestrator drives; the production
//! backend is [`GitRepository`], built on libgit2. Operations are one-shot and
//! never retried here.

use std::cell::RefCell;
use std::path::Path;

use git2::build::CheckoutBuilder;
use git2::{
    BranchType, Cred, CredentialType, ErrorCode, FetchOptions, PushOptions, RemoteCallbacks,
    StatusOptions,
};
use tracing::debug;

use crate::error::RepoError;

/// How many times the credential callback may be asked before giving up.
/// libgit2 re-invokes it indefinitely when a credential is refused.
const MAX_CREDENTIAL_ATTEMPTS: usize = 3;

/// Branches treated as a project's integration branch by [`GitRepository::default_base_branch`].
const WELL_KNOWN_BASE_BRANCHES: &[&str] = &["main", "master", "develop"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullOutcome {
    UpToDate,
    FastForwarded,
}

pub trait Repository {
    /// Short name of the checked-out branch.
    fn current_branch(&self) -> Result<String, RepoError>;

    /// True when there are no staged, unstaged or untracked changes.
    fn is_clean(&self) -> Result<bool, RepoError>;

    /// Switch to an existing local branch.
    fn checkout_branch(&self, name: &str) -> Result<(), RepoError>;

    /// Create a branch at the HEAD commit without switching to it.
    fn create_branch(&self, name: &str) -> Result<(), RepoError>;

    /// Fetch `remote/branch` and fast-forward the local branch.
    fn pull(&self, remote: &str, branch: &str) -> Result<PullOutcome, RepoError>;

    fn push(&self, remote: &str, branch: &str) -> Result<(), RepoError>;

    /// `user.name` from Git configuration.
    fn author(&self) -> Option<String>;
}

/// libgit2-backed repository.
pub struct GitRepository {
    repo: git2::Repository,
}

impl std::fmt::Debug for GitRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitRepository")
            .field("path", &self.repo.path())
            .finish()
    }
}

impl GitRepository {
    /// Open the repository containing `path`, searching parent directories.
    pub fn discover(path: &Path) -> Result<Self, RepoError> {
        let repo = git2::Repository::discover(path).map_err(|source| RepoError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(git_dir = %repo.path().display(), "opened repository");
        Ok(Self { repo })
    }

    /// First URL configured for `remote`, if the remote exists and has one.
    pub fn remote_url(&self, remote: &str) -> Result<Option<String>, RepoError> {
        match self.repo.find_remote(remote) {
            Ok(r) => Ok(r.url().map(str::to_owned)),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// The current branch when it is one of `main`, `master` or `develop`;
    /// `main` otherwise.
    pub fn default_base_branch(&self) -> String {
        match self.current_branch() {
            Ok(branch) if WELL_KNOWN_BASE_BRANCHES.contains(&branch.as_str()) => branch,
            _ => "main".to_owned(),
        }
    }

    /// SSH agent for SSH remotes, the Git credential helper for HTTPS,
    /// libgit2 defaults for everything else.
    fn remote_callbacks<'a>(&self) -> RemoteCallbacks<'a> {
        let config = self.repo.config().ok();
        let mut attempts = 0usize;
        let mut callbacks = RemoteCallbacks::new();
        callbacks.credentials(move |url, username, allowed| {
            attempts += 1;
            if attempts > MAX_CREDENTIAL_ATTEMPTS {
                return Err(git2::Error::from_str("authentication failed"));
            }
            if allowed.contains(CredentialType::SSH_KEY) {
                return Cred::ssh_key_from_agent(username.unwrap_or("git"));
            }
            if allowed.contains(CredentialType::USER_PASS_PLAINTEXT) {
                if let Some(config) = config.as_ref() {
                    return Cred::credential_helper(config, url, username);
                }
            }
            Cred::default()
        });
        callbacks
    }
}

impl Repository for GitRepository {
    fn current_branch(&self) -> Result<String, RepoError> {
        let head = match self.repo.head() {
            Ok(head) => head,
            Err(e) if e.code() == ErrorCode::UnbornBranch => return Err(RepoError::DetachedHead),
            Err(e) => return Err(e.into()),
        };
        if !head.is_branch() {
            return Err(RepoError::DetachedHead);
        }
        head.shorthand()
            .map(str::to_owned)
            .ok_or(RepoError::DetachedHead)
    }

    fn is_clean(&self) -> Result<bool, RepoError> {
        let mut opts = StatusOptions::new();
        opts.include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(false);
        let statuses = self.repo.statuses(Some(&mut opts))?;
        Ok(statuses.is_empty())
    }

    fn checkout_branch(&self, name: &str) -> Result<(), RepoError> {
        let checkout_error = |source| RepoError::Checkout {
            branch: name.to_owned(),
            source,
        };
        let branch = self
            .repo
            .find_branch(name, BranchType::Local)
            .map_err(checkout_error)?;
        let reference = branch.into_reference();
        let tree = reference.peel_to_tree().map_err(checkout_error)?;
        self.repo
            .checkout_tree(tree.as_object(), Some(CheckoutBuilder::new().safe()))
            .map_err(checkout_error)?;
        let refname = reference
            .name()
            .ok_or_else(|| checkout_error(git2::Error::from_str("branch name is not UTF-8")))?;
        self.repo.set_head(refname).map_err(checkout_error)?;
        debug!(branch = name, "checked out");
        Ok(())
    }

    fn create_branch(&self, name: &str) -> Result<(), RepoError> {
        let head = self.repo.head()?.peel_to_commit()?;
        match self.repo.branch(name, &head, false) {
            Ok(_) => {
                debug!(branch = name, at = %head.id(), "created branch");
                Ok(())
            }
            Err(e) if e.code() == ErrorCode::Exists => Err(RepoError::RefExists {
                branch: name.to_owned(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    fn pull(&self, remote: &str, branch: &str) -> Result<PullOutcome, RepoError> {
        let pull_error = |source| RepoError::Pull {
            remote: remote.to_owned(),
            branch: branch.to_owned(),
            source,
        };

        let mut origin = self.repo.find_remote(remote).map_err(pull_error)?;
        let mut fetch_opts = FetchOptions::new();
        fetch_opts.remote_callbacks(self.remote_callbacks());
        origin
            .fetch(&[branch], Some(&mut fetch_opts), None)
            .map_err(pull_error)?;

        let fetch_head = self.repo.find_reference("FETCH_HEAD").map_err(pull_error)?;
        let incoming = self
            .repo
            .reference_to_annotated_commit(&fetch_head)
            .map_err(pull_error)?;

        let refname = format!("refs/heads/{branch}");
        let mut local = self.repo.find_reference(&refname).map_err(pull_error)?;
        let (analysis, _) = self
            .repo
            .merge_analysis_for_ref(&local, &[&incoming])
            .map_err(pull_error)?;

        if analysis.is_up_to_date() {
            debug!(remote, branch, "already up to date");
            return Ok(PullOutcome::UpToDate);
        }
        if !analysis.is_fast_forward() {
            return Err(RepoError::NotFastForward {
                remote: remote.to_owned(),
                branch: branch.to_owned(),
            });
        }

        let message = format!("pull: fast-forward {branch} to {}", incoming.id());
        local
            .set_target(incoming.id(), &message)
            .map_err(pull_error)?;
        self.repo.set_head(&refname).map_err(pull_error)?;
        self.repo
            .checkout_head(Some(CheckoutBuilder::new().force()))
            .map_err(pull_error)?;
        debug!(remote, branch, to = %incoming.id(), "fast-forwarded");
        Ok(PullOutcome::FastForwarded)
    }

    fn push(&self, remote: &str, branch: &str) -> Result<(), RepoError> {
        let rejected = |reason: String| RepoError::PushRejected {
            remote: remote.to_owned(),
            branch: branch.to_owned(),
            reason,
        };

        let mut target = self
            .repo
            .find_remote(remote)
            .map_err(|e| rejected(e.message().to_owned()))?;

        // Remote-side refusals arrive through this callback, not as an Err.
        let refusal: RefCell<Option<String>> = RefCell::new(None);
        let mut callbacks = self.remote_callbacks();
        callbacks.push_update_reference(|refname, status| {
            if let Some(status) = status {
                *refusal.borrow_mut() = Some(format!("{refname}: {status}"));
            }
            Ok(())
        });
        let mut push_opts = PushOptions::new();
        push_opts.remote_callbacks(callbacks);

        let refspec = format!("refs/heads/{branch}:refs/heads/{branch}");
        target
            .push(&[refspec.as_str()], Some(&mut push_opts))
            .map_err(|e| rejected(e.message().to_owned()))?;
        drop(push_opts);

        if let Some(reason) = refusal.into_inner() {
            return Err(rejected(reason));
        }
        debug!(remote, branch, "pushed");
        Ok(())
    }

    fn author(&self) -> Option<String> {
        self.repo
            .config()
            .ok()?
            .get_string("user.name")
            .ok()
            .filter(|name| !name.trim().is_empty())
    }
}
