//! Error types for one-vcs.

use std::path::PathBuf;

use thiserror::Error;

/// Failures of repository state operations. Nothing here is retried.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("not a git repository ({path}): {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: git2::Error,
    },

    /// HEAD does not point at a branch.
    #[error("HEAD is detached; check out a branch first")]
    DetachedHead,

    /// The branch reference or its tree could not be resolved.
    #[error("failed to check out branch '{branch}': {source}")]
    Checkout {
        branch: String,
        #[source]
        source: git2::Error,
    },

    #[error("branch '{branch}' already exists")]
    RefExists { branch: String },

    #[error("cannot fast-forward '{branch}' to {remote}/{branch}; histories have diverged")]
    NotFastForward { remote: String, branch: String },

    #[error("failed to pull {remote}/{branch}: {source}")]
    Pull {
        remote: String,
        branch: String,
        #[source]
        source: git2::Error,
    },

    /// Non-fast-forward, remote-side rejection, or authentication failure.
    #[error("push of '{branch}' to {remote} rejected: {reason}")]
    PushRejected {
        remote: String,
        branch: String,
        reason: String,
    },

    #[error("git error: {0}")]
    Git(#[from] git2::Error),
}

/// Failures of ticket-id extraction.
#[derive(Debug, Error)]
pub enum PatternError {
    #[error("no ticket pattern provided")]
    EmptyPattern,

    #[error("invalid ticket pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("no ticket id found in branch '{branch}' (pattern '{pattern}')")]
    NoMatch { branch: String, pattern: String },
}

/// Failures of remote URL parsing.
#[derive(Debug, Error)]
#[error("unrecognized remote URL '{url}'")]
pub struct RemoteUrlError {
    pub url: String,
}
