//! Git plumbing for one: repository state, branch naming and remote parsing.

pub mod branch;
pub mod error;
pub mod remote;
pub mod repository;

pub use branch::{extract_ticket_id, sanitize_branch_name, task_branch_name, DEFAULT_TICKET_PATTERN};
pub use error::{PatternError, RemoteUrlError, RepoError};
pub use remote::{parse_remote_url, RemoteInfo};
pub use repository::{GitRepository, PullOutcome, Repository};
