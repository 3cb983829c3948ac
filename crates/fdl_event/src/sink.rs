//! Event sinks
//!
//! The engine never talks to an event bus directly; it hands envelopes to an
//! [`EventSink`]. A bus adapter lives outside the engine and usually sits on
//! the receiving end of a [`ChannelSink`].

use crossbeam_channel::{Receiver, Sender, TrySendError};
use parking_lot::Mutex;

use crate::error::{EventError, Result};
use crate::event::{EventEnvelope, Priority};

/// Receiver of layout events
pub trait EventSink: Send + Sync {
    fn publish(&self, envelope: EventEnvelope) -> Result<()>;
}

/// Sink forwarding envelopes over a channel
#[derive(Clone)]
pub struct ChannelSink {
    sender: Sender<EventEnvelope>,
}

impl ChannelSink {
    /// Unbounded channel
    pub fn unbounded() -> (Self, Receiver<EventEnvelope>) {
        let (sender, receiver) = crossbeam_channel::unbounded();
        (Self { sender }, receiver)
    }

    /// Bounded channel; publishing to a full channel fails instead of blocking
    pub fn bounded(capacity: usize) -> (Self, Receiver<EventEnvelope>) {
        let (sender, receiver) = crossbeam_channel::bounded(capacity);
        (Self { sender }, receiver)
    }
}

impl EventSink for ChannelSink {
    fn publish(&self, envelope: EventEnvelope) -> Result<()> {
        self.sender.try_send(envelope).map_err(|e| match e {
            TrySendError::Full(_) => EventError::Full,
            TrySendError::Disconnected(_) => EventError::Disconnected,
        })
    }
}

/// Sink that keeps every envelope in memory
#[derive(Default)]
pub struct EventCollector {
    events: Mutex<Vec<EventEnvelope>>,
}

impl EventCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the collected envelopes in publish order
    pub fn events(&self) -> Vec<EventEnvelope> {
        self.events.lock().clone()
    }

    /// Take the collected envelopes
    pub fn drain(&self) -> Vec<EventEnvelope> {
        std::mem::take(&mut *self.events.lock())
    }

    /// Collected envelopes of a given type
    pub fn of_type(&self, event_type: &str) -> Vec<EventEnvelope> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.event_type() == event_type)
            .cloned()
            .collect()
    }

    /// Collected envelopes at or above a priority
    pub fn at_least(&self, priority: Priority) -> usize {
        self.events.lock().iter().filter(|e| e.priority >= priority).count()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl EventSink for EventCollector {
    fn publish(&self, envelope: EventEnvelope) -> Result<()> {
        self.events.lock().push(envelope);
        Ok(())
    }
}

impl<S: EventSink + ?Sized> EventSink for std::sync::Arc<S> {
    fn publish(&self, envelope: EventEnvelope) -> Result<()> {
        (**self).publish(envelope)
    }
}
