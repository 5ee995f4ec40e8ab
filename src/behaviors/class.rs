//! # Behavior classes.
//!
//! A [`BehaviorClass`] is a named constructor producing one [`BehaviorRef`]
//! per element. An element starts with [`ElementClass::Stub`] until the
//! registry supplies its class.

use std::fmt;
use std::sync::Arc;

use super::behavior::BehaviorRef;
use crate::core::ElementInfo;

type Constructor = dyn Fn(&ElementInfo) -> BehaviorRef + Send + Sync;

/// Named behavior constructor.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use async_trait::async_trait;
/// use elementvisor::{Behavior, BehaviorClass, BehaviorRef, ElementError};
///
/// struct Clock;
///
/// #[async_trait]
/// impl Behavior for Clock {
///     async fn build(&self) -> Result<(), ElementError> { Ok(()) }
/// }
///
/// let class = BehaviorClass::new("clock", |_info| Arc::new(Clock) as BehaviorRef);
/// assert_eq!(class.name(), "clock");
/// ```
#[derive(Clone)]
pub struct BehaviorClass {
    name: Arc<str>,
    ctor: Arc<Constructor>,
}

impl BehaviorClass {
    pub fn new<F>(name: impl Into<Arc<str>>, ctor: F) -> Self
    where
        F: Fn(&ElementInfo) -> BehaviorRef + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            ctor: Arc::new(ctor),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Constructs a behavior instance for `info`.
    pub fn construct(&self, info: &ElementInfo) -> BehaviorRef {
        (self.ctor)(info)
    }
}

impl fmt::Debug for BehaviorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BehaviorClass")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Class slot of an element.
#[derive(Clone, Debug, Default)]
pub enum ElementClass {
    /// Behavior has not loaded yet.
    #[default]
    Stub,
    Defined(BehaviorClass),
}

impl ElementClass {
    #[inline]
    pub fn is_stub(&self) -> bool {
        matches!(self, ElementClass::Stub)
    }
}
