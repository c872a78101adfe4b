//! Error types for one-core.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::ProviderKind;

/// All errors that can arise from locating, loading, or saving profiles.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure (permission denied, unreadable directory, etc.).
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML serialization error (save path).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// YAML parse error on load, with the offending file.
    #[error("failed to parse profile at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// Neither `$XDG_CONFIG_HOME` nor a home directory is available.
    #[error("cannot determine configuration directory; set $HOME or $XDG_CONFIG_HOME")]
    HomeNotFound,

    /// The profile store is absent or holds no valid profile.
    #[error("no projects configured (looked in {dir}); run `one init` first")]
    NoProfilesConfigured { dir: PathBuf },

    /// No profile path prefix matches the working directory.
    #[error("no project configuration found for directory {dir}")]
    NoProfileFound { dir: PathBuf },

    /// `git.provider` names a provider whose settings block is missing.
    #[error("profile '{profile}' uses provider {provider} but has no `git.{provider}` settings")]
    MissingProviderSettings {
        profile: String,
        provider: ProviderKind,
    },

    #[error("unknown provider '{0}'; expected: github, gitlab, bitbucket")]
    UnknownProvider(String),
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ConfigError {
    ConfigError::Io {
        path: path.into(),
        source,
    }
}
