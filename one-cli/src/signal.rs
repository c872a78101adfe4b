//! Process-wide Ctrl-C handling.
//!
//! One handler is installed for the life of the process. While a device-flow
//! poll is armed, Ctrl-C cancels it; at any other time the process exits with
//! [`INTERRUPTED_EXIT_CODE`], the same status a default SIGINT gives.

use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, Result};
use one_auth::CancellationToken;

/// 128 + SIGINT.
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InterruptAction {
    /// An armed token was cancelled; the waiting operation unwinds itself.
    Cancelled,
    /// Nothing is listening; terminate.
    Exit,
}

/// Shared slot the Ctrl-C handler consults.
#[derive(Debug, Clone, Default)]
pub struct Interrupts {
    armed: Arc<Mutex<Option<CancellationToken>>>,
}

impl Interrupts {
    /// Registers the process handler. Call once, early in `main`.
    pub fn install() -> Result<Self> {
        let interrupts = Self::default();
        let handler = interrupts.clone();
        ctrlc::set_handler(move || {
            if handler.interrupt() == InterruptAction::Exit {
                std::process::exit(INTERRUPTED_EXIT_CODE);
            }
        })
        .context("failed to install Ctrl-C handler")?;
        Ok(interrupts)
    }

    /// Routes Ctrl-C to a fresh token until the returned guard is dropped.
    pub fn arm(&self) -> ArmedCancel<'_> {
        let token = CancellationToken::new();
        *self.slot() = Some(token.clone());
        ArmedCancel {
            interrupts: self,
            token,
        }
    }

    fn interrupt(&self) -> InterruptAction {
        match self.slot().as_ref() {
            Some(token) => {
                token.cancel();
                InterruptAction::Cancelled
            }
            None => InterruptAction::Exit,
        }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<CancellationToken>> {
        self.armed.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Keeps Ctrl-C routed to [`Self::token`]; disarms on drop.
pub struct ArmedCancel<'a> {
    interrupts: &'a Interrupts,
    token: CancellationToken,
}

impl ArmedCancel<'_> {
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl Drop for ArmedCancel<'_> {
    fn drop(&mut self) {
        *self.interrupts.slot() = None;
    }
}
