//! # Behavior contract.
//!
//! A [`Behavior`] is the polymorphic implementation an element delegates its
//! lifecycle hooks to. The element controller decides **when** each hook
//! runs; the behavior decides **what** happens.
//!
//! ## Hook map
//! ```text
//! resolution ──► upgrade()
//! build      ──► consent_policy() ─► build()
//! new path   ──► mount(token) / unmount()
//! legacy     ──► layout() / unlayout() / first_layout_completed()
//! visibility ──► pause() / resume()
//! host tree  ──► attached() / detached()
//! actions    ──► execute_action(invocation, deferred)
//! ```
//!
//! Every hook except [`Behavior::build`] has a default, so a minimal behavior
//! only implements `build`.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use crate::core::ActionInvocation;
use crate::error::ElementError;

/// Shared handle to a behavior (`Arc<dyn Behavior>`).
pub type BehaviorRef = Arc<dyn Behavior>;

/// Future returned by hooks that complete asynchronously.
pub type HookFuture = BoxFuture<'static, Result<(), ElementError>>;

/// Outcome of the resolution hook.
pub enum Upgrade {
    /// Resolution is immediate; the constructed behavior stays active.
    Ready,
    /// Resolution is immediate; the given behavior replaces the constructed one.
    Replace(BehaviorRef),
    /// Resolution completes when the future settles. `Ok(Some(b))` replaces
    /// the behavior, `Ok(None)` keeps it, `Err` fails resolution for good.
    Deferred(BoxFuture<'static, Result<Option<BehaviorRef>, ElementError>>),
}

/// Outcome of the mount hook.
pub enum MountOutcome {
    /// Mounted synchronously; loading (if any) is reported separately.
    Mounted,
    /// Mounted; the element counts as loaded once the future settles.
    Loading(HookFuture),
}

/// # Element implementation.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use elementvisor::{Behavior, ElementError};
///
/// struct Banner;
///
/// #[async_trait]
/// impl Behavior for Banner {
///     async fn build(&self) -> Result<(), ElementError> {
///         Ok(())
///     }
///
///     fn is_new_execution_path(&self) -> bool {
///         true
///     }
/// }
/// ```
#[async_trait]
pub trait Behavior: Send + Sync + 'static {
    /// Resolution hook, called once when the element is upgraded.
    fn upgrade(&self) -> Upgrade {
        Upgrade::Ready
    }

    /// One-time setup, runs after the consent gate.
    async fn build(&self) -> Result<(), ElementError>;

    /// Attaches runtime behavior (new path). Must honor `token`.
    fn mount(&self, _token: CancellationToken) -> Result<MountOutcome, ElementError> {
        Ok(MountOutcome::Mounted)
    }

    /// Detaches runtime behavior (new path).
    fn unmount(&self) {}

    /// Performs a layout pass (legacy path).
    async fn layout(&self) -> Result<(), ElementError> {
        Ok(())
    }

    /// Reverses a layout pass. Returns `true` when a fresh layout is needed on next visibility.
    fn unlayout(&self) -> bool {
        false
    }

    /// Legacy path: whether the element must be unlaid out while paused.
    fn unlayout_on_pause(&self) -> bool {
        false
    }

    fn pause(&self) {}

    fn resume(&self) {}

    /// Element was connected to the host tree after being built.
    fn attached(&self) {}

    /// Element was disconnected from the host tree after being built.
    fn detached(&self) {}

    /// Called once, after the first successful layout pass.
    fn first_layout_completed(&self) {}

    /// Consent policy used when the element delegates the decision.
    fn consent_policy(&self) -> Option<String> {
        Some("default".to_string())
    }

    /// Whether the element reports loading separately from mounting.
    fn uses_loading(&self) -> bool {
        false
    }

    /// Whether build/mount are driven by the scheduler (new path) or by layout (legacy).
    fn is_new_execution_path(&self) -> bool {
        false
    }

    /// Connection warm-up hint.
    fn preconnect(&self, _on_layout: bool) {}

    /// Creates a default placeholder. Returns `true` if one was created.
    fn create_placeholder(&self) -> bool {
        false
    }

    /// Executes an action. `deferred` is `true` for actions flushed from the queue.
    fn execute_action(
        &self,
        _invocation: &ActionInvocation,
        _deferred: bool,
    ) -> Result<(), ElementError> {
        Ok(())
    }
}
