//! one core library: profile types, profile store, errors, presentation.
//!
//! - [`types`]: profile document, provider binding, hook specs
//! - [`profiles`]: list / save / resolve against the working directory
//! - [`report`]: the [`Reporter`] capability used by every printing layer
//! - [`error`]: [`ConfigError`]

pub mod error;
pub mod profiles;
pub mod report;
pub mod types;

pub use error::ConfigError;
pub use report::{HookReport, NullReporter, Reporter};
pub use types::{
    BrowserKind, BrowserSettings, GlobalConfig, HookSpec, Hooks, ProfileName, ProjectProfile,
    ProviderBinding, ProviderKind, TicketId, TicketSettings, TicketSystem,
};
