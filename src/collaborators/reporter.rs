//! # Error-reporting collaborator.
//!
//! Pipelines forward every reportable failure here exactly once, at the
//! stage where it originated. Consent blocking and cancellation never reach
//! the reporter.

use crate::core::ElementInfo;
use crate::error::ElementError;

/// Receives reportable element failures (fire-and-forget).
pub trait ErrorReporter: Send + Sync + 'static {
    fn report(&self, error: &ElementError, element: &ElementInfo);
}

/// Default reporter writing failures through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, error: &ElementError, element: &ElementInfo) {
        tracing::error!(
            element = %element.id,
            tag = %element.tag,
            label = error.as_label(),
            "{}",
            error.as_message()
        );
    }
}
