//! Event publisher adapters.

use crate::events::AmendmentEvent;
use crate::ports::outbound::EventPublisher;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::{debug, info};

/// Default broadcast buffer.
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// Fan-out of workflow events to any number of subscribers.
///
/// Uses `tokio::sync::broadcast`; slow subscribers lag and lose the oldest events.
pub struct BroadcastEventBus {
    sender: broadcast::Sender<AmendmentEvent>,
    events_published: AtomicU64,
}

impl BroadcastEventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_EVENT_CAPACITY)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            events_published: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<AmendmentEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    pub fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }
}

impl Default for BroadcastEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventPublisher for BroadcastEventBus {
    fn publish(&self, event: AmendmentEvent) -> usize {
        self.events_published.fetch_add(1, Ordering::Relaxed);
        let kind = event.kind();
        match self.sender.send(event) {
            Ok(receivers) => receivers,
            Err(_) => {
                debug!(kind, "[events] no subscribers");
                0
            }
        }
    }
}

/// Writes every event to the log and nowhere else.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventSink;

impl EventPublisher for TracingEventSink {
    fn publish(&self, event: AmendmentEvent) -> usize {
        match &event {
            AmendmentEvent::StageChanged { from, checkpoint } => info!(
                workflow_id = %checkpoint.workflow_id,
                record_id = %checkpoint.record_id,
                from = %from,
                to = %checkpoint.stage,
                endorsements = checkpoint.endorsements.len(),
                "[events] stage changed"
            ),
            other => info!(
                workflow_id = %other.workflow_id(),
                kind = other.kind(),
                "[events] workflow event"
            ),
        }
        0
    }
}
