//! Error types for one-lifecycle.

use thiserror::Error;

use one_auth::AuthError;
use one_core::types::ProviderKind;
use one_core::ConfigError;
use one_hosting::ProviderError;
use one_vcs::{PatternError, RepoError};

use crate::hooks::HookStage;

#[derive(Debug, Error)]
pub enum HookError {
    /// Pre-flight validation rejected the hook list; nothing ran.
    #[error("invalid {stage} hook #{position}: {reason}")]
    InvalidHook {
        stage: HookStage,
        /// 1-based position in the stage's list.
        position: usize,
        reason: String,
    },

    #[error("{stage} hook '{hook}' failed: {reason}")]
    HookFailed {
        stage: HookStage,
        hook: String,
        reason: String,
    },
}

/// Everything that can abort `start` or `pr`.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Repository(#[from] RepoError),

    #[error("working directory has uncommitted changes; commit or stash them before `{command}`")]
    DirtyWorkingTree { command: &'static str },

    #[error(transparent)]
    Pattern(#[from] PatternError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Hook(#[from] HookError),

    #[error("failed to create pull request on {provider}: {source}")]
    CreatePullRequest {
        provider: ProviderKind,
        #[source]
        source: ProviderError,
    },

    #[error(transparent)]
    Provider(#[from] ProviderError),
}
