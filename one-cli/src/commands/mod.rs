pub mod auth;
pub mod config;
pub mod init;
pub mod pr;
pub mod start;
pub mod ticket;

use anyhow::{Context, Result};

use one_core::{profiles, ProjectProfile};
use one_vcs::GitRepository;

/// Profile owning the working directory, with global defaults applied.
pub(crate) fn current_profile() -> Result<ProjectProfile> {
    profiles::resolve().context("could not resolve a project profile for this directory")
}

pub(crate) fn open_repository() -> Result<GitRepository> {
    let cwd = std::env::current_dir().context("could not determine working directory")?;
    GitRepository::discover(&cwd).context("not inside a git repository")
}
