//! Lifecycle event broadcasting.
//!
//! Every state transition the manager makes is published here so
//! dashboards can follow service state without polling.

use devdeck_core::ServiceEvent;
use tokio::sync::broadcast;
use tracing::debug;

/// Broadcast channel capacity for lifecycle events
const CHANNEL_CAPACITY: usize = 64;

/// Fan-out of [`ServiceEvent`]s to any number of receivers.
pub struct ServiceEventBroadcaster {
    sender: broadcast::Sender<ServiceEvent>,
}

impl ServiceEventBroadcaster {
    /// Create a new broadcaster
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Publish an event to all current receivers.
    pub fn broadcast(&self, event: ServiceEvent) {
        // Only log if there are receivers (avoid spam when nobody listens)
        if self.sender.receiver_count() > 0 {
            debug!(service = %event.service, state = %event.state, "Broadcasting service event");
            let _ = self.sender.send(event);
        }
    }

    /// Subscribe to lifecycle events
    pub fn subscribe(&self) -> broadcast::Receiver<ServiceEvent> {
        self.sender.subscribe()
    }
}

impl Default for ServiceEventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}
