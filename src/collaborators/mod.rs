//! # Collaborator contracts.
//!
//! The element lifecycle delegates four concerns to collaborators injected at
//! host construction:
//!
//! - [`Scheduler`]: decides when new-path elements are mounted.
//! - [`ResourceManager`]: legacy-path bookkeeping and layout driving.
//! - [`ErrorReporter`]: receives reportable failures.
//! - [`ConsentPolicy`]: gates the build pipeline.
//!
//! Built-in implementations: [`QueueScheduler`],
//! [`ResourceTable`] and [`TracingReporter`]. When no consent policy is
//! configured every element is allowed to build.

mod consent;
mod queue_scheduler;
mod reporter;
mod resources;
mod scheduler;

pub use consent::{ConsentPolicy, ConsentRequest};
pub use queue_scheduler::QueueScheduler;
pub use reporter::{ErrorReporter, TracingReporter};
pub use resources::{ResourceId, ResourceManager, ResourceTable};
pub use scheduler::Scheduler;
