//! # one-render
//!
//! Literal `{key}` templating for PR titles and bodies.
//!
//! ```rust
//! use one_render::{render, LifecycleContext};
//!
//! let ctx = LifecycleContext::new()
//!     .with("ticket_id", "X-1")
//!     .with("branch_name", "x-1-fix");
//! assert_eq!(render("[{ticket_id}] {branch_name}", &ctx), "[X-1] x-1-fix");
//! ```

pub mod context;
pub mod template;

pub use context::LifecycleContext;
pub use template::{build_ticket_url, current_date, render};
