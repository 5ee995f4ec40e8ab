//! # LogWriter: lifecycle events as `tracing` records.
//!
//! A minimal subscriber that writes every incoming [`Event`] through
//! `tracing`. Enabled via the `logging` feature; install a `tracing`
//! subscriber (e.g. `tracing-subscriber`) to see the output.
//!
//! ## Example output
//! ```text
//! DEBUG elementvisor: [ready-state-changed] element=#3 tag=x-video state=building
//! DEBUG elementvisor: [built] element=#3 tag=x-video
//! ERROR elementvisor: [error] element=#3 tag=x-video reason=mount_failed: no codec
//! WARN  elementvisor: [subscriber-overflow] reason=subscriber=metrics reason=full
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let kind = e.kind.as_str();
        let element = e.element.map(|id| id.to_string()).unwrap_or_default();
        let tag = e.tag.as_deref().unwrap_or("");
        let reason = e.reason.as_deref().unwrap_or("");

        match e.kind {
            EventKind::Error | EventKind::SubscriberPanicked => {
                tracing::error!(seq = e.seq, "[{kind}] element={element} tag={tag} reason={reason}");
            }
            EventKind::ActionFailed | EventKind::SubscriberOverflow => {
                tracing::warn!(seq = e.seq, "[{kind}] element={element} tag={tag} reason={reason}");
            }
            EventKind::ReadyStateChanged => {
                let state = e.ready_state.map(|s| s.as_str()).unwrap_or("");
                tracing::debug!(seq = e.seq, "[{kind}] element={element} tag={tag} state={state}");
            }
            EventKind::SizeChanged => {
                let (w, h) = e.size.map(|s| (s.width, s.height)).unwrap_or_default();
                tracing::debug!(seq = e.seq, "[{kind}] element={element} tag={tag} size={w}x{h}");
            }
            _ => {
                tracing::debug!(seq = e.seq, "[{kind}] element={element} tag={tag}");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
