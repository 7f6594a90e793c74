//! Per-process log fan-out.
//!
//! Every line read from a child's stdout/stderr goes through its hub: into
//! the bounded last-output buffer, to the observer, and to each live
//! subscriber. Sends are non-blocking: a subscriber whose channel is full
//! misses that line, so a stalled consumer can never back up the child's
//! pipes. Each channel keeps one slot in reserve for the exit line, so even
//! a stalled subscriber learns why its stream ended.

use devdeck_core::SupervisorObserver;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::trace;

use super::buffer::OutputBuffer;

struct HubState {
    buffer: OutputBuffer,
    subscribers: HashMap<u64, mpsc::Sender<String>>,
    next_id: u64,
    sealed: bool,
}

/// Log hub for one process instance.
pub struct LogHub {
    service: String,
    subscriber_capacity: usize,
    observer: Arc<dyn SupervisorObserver>,
    state: Mutex<HubState>,
}

/// Handle that removes a subscription from its hub.
#[derive(Debug)]
#[must_use = "dropping the handle keeps the subscription alive; call unsubscribe()"]
pub struct Unsubscribe {
    hub: Weak<LogHub>,
    id: Option<u64>,
}

impl Unsubscribe {
    /// Handle for a stream that was never registered.
    const fn detached() -> Self {
        Self {
            hub: Weak::new(),
            id: None,
        }
    }

    /// Stop receiving lines. The receiver sees end-of-stream once it has
    /// drained what was already queued.
    pub fn unsubscribe(self) {
        if let (Some(hub), Some(id)) = (self.hub.upgrade(), self.id) {
            hub.remove(id);
        }
    }
}

impl LogHub {
    pub fn new(
        service: impl Into<String>,
        buffer_capacity: usize,
        subscriber_capacity: usize,
        observer: Arc<dyn SupervisorObserver>,
    ) -> Self {
        Self {
            service: service.into(),
            subscriber_capacity: subscriber_capacity.max(1),
            observer,
            state: Mutex::new(HubState {
                buffer: OutputBuffer::new(buffer_capacity),
                subscribers: HashMap::new(),
                next_id: 0,
                sealed: false,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HubState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// An already-closed stream with a no-op unsubscribe handle.
    pub fn closed_stream() -> (mpsc::Receiver<String>, Unsubscribe) {
        let (_, rx) = mpsc::channel(1);
        (rx, Unsubscribe::detached())
    }

    /// Register a new subscriber.
    ///
    /// Subscribing to a sealed hub yields an already-closed stream.
    pub fn subscribe(self: &Arc<Self>) -> (mpsc::Receiver<String>, Unsubscribe) {
        let mut state = self.lock();
        if state.sealed {
            return Self::closed_stream();
        }

        // One extra slot reserved for the exit line
        let (tx, rx) = mpsc::channel(self.subscriber_capacity + 1);
        let id = state.next_id;
        state.next_id += 1;
        state.subscribers.insert(id, tx);

        (
            rx,
            Unsubscribe {
                hub: Arc::downgrade(self),
                id: Some(id),
            },
        )
    }

    fn remove(&self, id: u64) {
        self.lock().subscribers.remove(&id);
    }

    /// Record a line and fan it out without blocking.
    pub fn broadcast(&self, line: String) {
        {
            let mut state = self.lock();
            if state.sealed {
                return;
            }
            state.buffer.push(line.clone());
            Self::fan_out(&self.service, &mut state, &line, 1);
        }
        self.observer.on_output_line(&self.service, &line);
    }

    /// Send `line` to every subscriber with more than `reserve` free slots.
    ///
    /// Only the hub holds the senders, so the capacity check cannot race.
    fn fan_out(service: &str, state: &mut HubState, line: &str, reserve: usize) {
        state.subscribers.retain(|id, tx| {
            // Receiver dropped without unsubscribing
            if tx.is_closed() {
                return false;
            }
            if tx.capacity() <= reserve {
                trace!(service = %service, subscriber = %id, "Subscriber full, dropping line");
                return true;
            }
            match tx.try_send(line.to_owned()) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) => true,
                Err(TrySendError::Closed(_)) => false,
            }
        });
    }

    /// Deliver a final line to every subscriber, then close all streams.
    ///
    /// Later broadcasts and subscriptions are ignored. The sentinel is not
    /// recorded in the last-output buffer.
    pub fn seal(&self, sentinel: &str) {
        let mut state = self.lock();
        if state.sealed {
            return;
        }
        Self::fan_out(&self.service, &mut state, sentinel, 0);
        state.subscribers.clear();
        state.sealed = true;
    }

    /// Copy of the last-output buffer, oldest first.
    pub fn snapshot(&self) -> Vec<String> {
        self.lock().buffer.snapshot()
    }

    #[cfg(test)]
    fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }
}
