//! Error types used by the elementvisor runtime and by element behaviors.
//!
//! This module defines two enums:
//!
//! - [`ElementError`]: failures of a single element's lifecycle pipelines
//!   (resolution, build, mount, layout) and precondition violations.
//! - [`RuntimeError`]: failures of the host itself (arena lookups, registry
//!   definitions, scheduler channel).
//!
//! Both provide `as_label` / `as_message` helpers for logs and events.
//!
//! ## Classification
//! Behaviors raise [`ElementError::Fail`]. Each pipeline classifies that
//! generic failure into its stage variant via [`ElementError::classify`]:
//! ```text
//! Fail ──► Stage::Resolution ─► ResolutionFailed
//!      ──► Stage::Build      ─► BuildFailed
//!      ──► Stage::Mount      ─► MountFailed
//!      ──► Stage::Layout     ─► LayoutFailed
//! BlockedByConsent / Cancelled / preconditions pass through unchanged.
//! ```

use std::sync::Arc;

use thiserror::Error;

/// Pipeline stage used to classify a behavior-raised failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Resolution,
    Build,
    Mount,
    Layout,
}

/// # Errors produced by an element's lifecycle.
///
/// The type is `Clone` because a single pipeline outcome is shared by every
/// caller awaiting the same build or mount handle.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ElementError {
    /// Generic failure raised by a behavior hook, not yet classified.
    #[error("behavior failed: {reason}")]
    Fail {
        /// Failure message.
        reason: Arc<str>,
    },

    /// The resolution hook rejected; terminal for the element.
    #[error("resolution failed: {reason}")]
    ResolutionFailed { reason: Arc<str> },

    /// The consent gate declined the build. Expected outcome, never reported.
    #[error("blocked by consent")]
    BlockedByConsent,

    /// The build hook (or behavior construction) failed.
    #[error("build failed: {reason}")]
    BuildFailed { reason: Arc<str> },

    /// A mount attempt was aborted through its cancellation token.
    #[error("mount cancelled")]
    Cancelled,

    /// The mount hook failed for a reason other than cancellation.
    #[error("mount failed: {reason}")]
    MountFailed { reason: Arc<str> },

    /// The layout hook failed.
    #[error("layout failed: {reason}")]
    LayoutFailed { reason: Arc<str> },

    /// Lifecycle work was requested on an element inside a template.
    #[error("element is inside a template")]
    InTemplate,

    /// Build requested before the behavior was resolved.
    #[error("cannot build an element that has not been upgraded")]
    NotUpgraded,

    /// Operation requires a built element.
    #[error("element is not built")]
    NotBuilt,

    /// Operation only exists on the legacy execution path.
    #[error("`{op}` is only available on the legacy execution path")]
    LegacyOnly { op: &'static str },

    /// The checkpoint owner was dropped while a waiter was pending.
    #[error("element disposed")]
    Disposed,
}

impl ElementError {
    /// Shorthand for a behavior-raised failure.
    ///
    /// # Example
    /// ```
    /// use elementvisor::ElementError;
    ///
    /// let err = ElementError::fail("network down");
    /// assert_eq!(err.as_label(), "behavior_failed");
    /// ```
    pub fn fail(reason: impl Into<Arc<str>>) -> Self {
        ElementError::Fail {
            reason: reason.into(),
        }
    }

    /// Converts a generic [`ElementError::Fail`] into the variant for `stage`.
    ///
    /// Already classified errors are returned unchanged.
    #[must_use]
    pub fn classify(self, stage: Stage) -> Self {
        match self {
            ElementError::Fail { reason } => match stage {
                Stage::Resolution => ElementError::ResolutionFailed { reason },
                Stage::Build => ElementError::BuildFailed { reason },
                Stage::Mount => ElementError::MountFailed { reason },
                Stage::Layout => ElementError::LayoutFailed { reason },
            },
            other => other,
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/events.
    pub fn as_label(&self) -> &'static str {
        match self {
            ElementError::Fail { .. } => "behavior_failed",
            ElementError::ResolutionFailed { .. } => "resolution_failed",
            ElementError::BlockedByConsent => "blocked_by_consent",
            ElementError::BuildFailed { .. } => "build_failed",
            ElementError::Cancelled => "mount_cancelled",
            ElementError::MountFailed { .. } => "mount_failed",
            ElementError::LayoutFailed { .. } => "layout_failed",
            ElementError::InTemplate => "in_template",
            ElementError::NotUpgraded => "not_upgraded",
            ElementError::NotBuilt => "not_built",
            ElementError::LegacyOnly { .. } => "legacy_only",
            ElementError::Disposed => "disposed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            ElementError::Fail { reason }
            | ElementError::ResolutionFailed { reason }
            | ElementError::BuildFailed { reason }
            | ElementError::MountFailed { reason }
            | ElementError::LayoutFailed { reason } => format!("{}: {reason}", self.as_label()),
            other => other.to_string(),
        }
    }

    /// True for the consent-gate outcome.
    pub fn is_consent_blocked(&self) -> bool {
        matches!(self, ElementError::BlockedByConsent)
    }

    /// True for an aborted mount attempt.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, ElementError::Cancelled)
    }

    /// Indicates whether the error should reach the error-reporting collaborator.
    ///
    /// Consent blocking and cancellation are expected control flow.
    ///
    /// # Example
    /// ```
    /// use elementvisor::ElementError;
    ///
    /// assert!(!ElementError::BlockedByConsent.is_reportable());
    /// assert!(!ElementError::Cancelled.is_reportable());
    /// assert!(ElementError::fail("boom").is_reportable());
    /// ```
    pub fn is_reportable(&self) -> bool {
        !self.is_consent_blocked() && !self.is_cancellation()
    }
}

/// # Errors produced by the host runtime.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    /// No element with this id lives in the host arena.
    #[error("element {id} not found")]
    ElementNotFound { id: u64 },

    /// A behavior class was already defined for this tag.
    #[error("behavior for `{tag}` is already defined")]
    DuplicateDefinition { tag: Arc<str> },

    /// The scheduler loop is gone (host shut down).
    #[error("scheduler channel closed")]
    SchedulerClosed,
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::ElementNotFound { .. } => "runtime_element_not_found",
            RuntimeError::DuplicateDefinition { .. } => "runtime_duplicate_definition",
            RuntimeError::SchedulerClosed => "runtime_scheduler_closed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        self.to_string()
    }
}
