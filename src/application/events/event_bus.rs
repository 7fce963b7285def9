//! In-process broadcast of engine events
//!
//! Services publish after each committed step. Subscribers read whatever is
//! queued with `try_recv` or `drain`; a slow subscriber loses the oldest
//! events rather than holding up the engine.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, warn};

use super::types::{EngineEvent, EventMessage};

const QUEUE_DEPTH: usize = 1024;

/// Fan-out bus; publishing never blocks and never fails
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EventMessage>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(QUEUE_DEPTH);
        Self { sender }
    }

    pub fn publish(&self, event: EngineEvent) {
        let message = EventMessage::new(event);
        let event_type = message.event.event_type();
        let location_id = message.event.location_id();
        // Err only means nobody is listening
        let delivered = self.sender.send(message).unwrap_or(0);
        debug!(event_type, ?location_id, delivered, "Event published");
    }

    pub fn subscribe(&self) -> EventSubscriber {
        EventSubscriber {
            receiver: self.sender.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

pub struct EventSubscriber {
    receiver: broadcast::Receiver<EventMessage>,
}

impl EventSubscriber {
    /// Next queued event, `None` if there is none
    pub fn try_recv(&mut self) -> Option<EventMessage> {
        loop {
            match self.receiver.try_recv() {
                Ok(msg) => return Some(msg),
                Err(broadcast::error::TryRecvError::Lagged(missed)) => {
                    warn!(missed, "Event subscriber fell behind");
                }
                Err(_) => return None,
            }
        }
    }

    /// Everything queued so far, oldest first
    pub fn drain(&mut self) -> Vec<EventMessage> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}

pub type SharedEventBus = Arc<EventBus>;

pub fn create_event_bus() -> SharedEventBus {
    Arc::new(EventBus::new())
}
