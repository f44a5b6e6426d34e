//! Where background failures and status messages go.
//!
//! Nothing in the poller or the aggregator writes output directly; they hand
//! everything to a [`Reporter`].

use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::UnleashError;

pub trait Reporter: Send + Sync {
    /// A failure that was swallowed so the client keeps serving.
    fn report(&self, error: &UnleashError);

    /// A status message with no error attached.
    fn note(&self, _message: &str) {}
}

/// [`Reporter`] that logs through `tracing`.
///
/// In verbose mode failures are logged at `warn` and notes at `info`;
/// otherwise both go to `debug`.
#[derive(Debug, Default)]
pub struct TracingReporter {
    verbose: AtomicBool,
}

impl TracingReporter {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose: AtomicBool::new(verbose),
        }
    }

    pub fn set_verbose(&self, verbose: bool) {
        self.verbose.store(verbose, Ordering::Relaxed);
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose.load(Ordering::Relaxed)
    }
}

impl Reporter for TracingReporter {
    fn report(&self, error: &UnleashError) {
        if self.is_verbose() {
            tracing::warn!(code = %error.code, "{}", error.message);
        } else {
            tracing::debug!(code = %error.code, "{}", error.message);
        }
    }

    fn note(&self, message: &str) {
        if self.is_verbose() {
            tracing::info!("{}", message);
        } else {
            tracing::debug!("{}", message);
        }
    }
}
