//! # Element identity and observable state.
//!
//! Plain data shared by the controller, the event model and subscribers:
//! - [`ElementId`] arena handle assigned by the host
//! - [`ElementInfo`] id + tag pair handed to collaborators
//! - [`UpgradeState`] behavior resolution sub-machine
//! - [`ReadyState`] coarse host-visible phase
//! - [`Markers`] visual marker flags
//! - [`Size`] last applied size
//!
//! ## Ready-state machine
//! ```text
//! Upgrading ──► Building ──► Mounting ──► Loading ──► Complete
//!                  │            │            │
//!                  └────────────┴────────────┴──► Error
//! ```

use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;

/// Stable handle of an element inside its host arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identity passed to behavior constructors and the error reporter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementInfo {
    pub id: ElementId,
    /// Component tag name (registry key).
    pub tag: Arc<str>,
}

/// Behavior resolution state.
///
/// `Resolved` and `ResolutionFailed` are terminal; there is no retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpgradeState {
    #[default]
    NotResolved,
    Resolving,
    Resolved,
    ResolutionFailed,
}

/// Coarse lifecycle phase observable by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ReadyState {
    #[default]
    Upgrading,
    Building,
    Mounting,
    Loading,
    Complete,
    Error,
}

impl ReadyState {
    /// Returns a short stable label (kebab-case).
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadyState::Upgrading => "upgrading",
            ReadyState::Building => "building",
            ReadyState::Mounting => "mounting",
            ReadyState::Loading => "loading",
            ReadyState::Complete => "complete",
            ReadyState::Error => "error",
        }
    }

    /// True once the element reached a settled phase (`Complete` or `Error`).
    #[inline]
    pub fn is_settled(&self) -> bool {
        matches!(self, ReadyState::Complete | ReadyState::Error)
    }
}

impl fmt::Display for ReadyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

bitflags! {
    /// Visual marker flags surfaced to the host tree.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Markers: u16 {
        /// Element was attached at least once.
        const ELEMENT     = 1 << 0;
        /// Attached while its behavior had not loaded yet.
        const UNRESOLVED  = 1 << 1;
        const NOT_BUILT   = 1 << 2;
        const BUILT       = 1 << 3;
        /// A layout pass (or a loading phase) has started.
        const LAYOUT      = 1 << 4;
        /// Loading indicator should be visible.
        const LOADING     = 1 << 5;
        /// A placeholder child exists.
        const PLACEHOLDER = 1 << 6;
    }
}

/// Width and height of an element as applied by its behavior.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}
