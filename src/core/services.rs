use std::sync::Arc;

use super::config::HostConfig;
use crate::collaborators::{ConsentPolicy, ErrorReporter, ResourceManager, Scheduler};
use crate::events::{Bus, Event};

/// Collaborators and plumbing shared by every element of a host.
pub(crate) struct Services {
    pub bus: Bus,
    pub scheduler: Arc<dyn Scheduler>,
    pub resources: Arc<dyn ResourceManager>,
    /// `None` means every consent request is unblocked.
    pub consent: Option<Arc<dyn ConsentPolicy>>,
    pub reporter: Arc<dyn ErrorReporter>,
    pub config: HostConfig,
}

impl Services {
    #[inline]
    pub fn publish(&self, event: Event) {
        self.bus.publish(event);
    }
}
