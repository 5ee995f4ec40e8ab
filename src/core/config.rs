//! # Host configuration.
//!
//! Provides [`HostConfig`] centralized settings for a [`Host`](crate::Host)
//! and the built-in collaborators it creates.
//!
//! ## Sentinel values
//! - `max_concurrent_mounts = 0` → unlimited (no scheduler semaphore)
//! - `bus_capacity = 0` → clamped to 1 by the bus

/// Configuration for a host and its built-in collaborators.
///
/// ## Field semantics
/// - `bus_capacity`: event bus ring buffer size (min 1)
/// - `max_concurrent_mounts`: concurrent mounts driven by the built-in scheduler (`0` = unlimited)
/// - `scheduler_queue_capacity`: built-in scheduler command channel size (min 1)
/// - `preconnect`: whether elements emit connection warm-up hints
#[derive(Clone, Debug)]
pub struct HostConfig {
    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Slow receivers that lag behind more than `bus_capacity` messages
    /// receive `Lagged` and skip older items.
    pub bus_capacity: usize,

    /// Maximum number of mounts the built-in scheduler runs at once.
    ///
    /// - `0` = unlimited (no semaphore)
    /// - `n > 0` = at most `n` mount pipelines in flight
    pub max_concurrent_mounts: usize,

    /// Capacity of the built-in scheduler command channel.
    ///
    /// Requests submitted while the channel is full are dropped with a warning.
    pub scheduler_queue_capacity: usize,

    /// Emit `Behavior::preconnect` hints when an element starts building or
    /// laying out.
    pub preconnect: bool,
}

impl HostConfig {
    /// Returns the mount concurrency limit as an `Option`.
    ///
    /// - `None` → unlimited
    /// - `Some(n)` → at most `n` concurrent mounts
    #[inline]
    pub fn mount_limit(&self) -> Option<usize> {
        if self.max_concurrent_mounts == 0 {
            None
        } else {
            Some(self.max_concurrent_mounts)
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for HostConfig {
    /// Default configuration:
    ///
    /// - `bus_capacity = 1024`
    /// - `max_concurrent_mounts = 0` (unlimited)
    /// - `scheduler_queue_capacity = 1024`
    /// - `preconnect = true`
    fn default() -> Self {
        Self {
            bus_capacity: 1024,
            max_concurrent_mounts: 0,
            scheduler_queue_capacity: 1024,
            preconnect: true,
        }
    }
}
