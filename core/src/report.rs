//! User-facing notification of network failures.
//!
//! `Fetcher` calls its reporter once per failed round-trip, before the error
//! is returned to the caller. Status-code failures and `{"error": ...}`
//! bodies never reach a reporter.

use crate::error::TransportError;

pub trait FailureReporter: Send + Sync {
    fn report(&self, error: &TransportError);
}

/// Emits the failure as a `tracing` error event.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl FailureReporter for LogReporter {
    fn report(&self, error: &TransportError) {
        tracing::error!(error = %error, "network request failed");
    }
}

impl<F> FailureReporter for F
where
    F: Fn(&TransportError) + Send + Sync,
{
    fn report(&self, error: &TransportError) {
        self(error)
    }
}
