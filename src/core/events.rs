//! Per-client event listeners.

use parking_lot::RwLock;
use std::sync::Arc;

use crate::error::{ErrorCode, UnleashError};

/// Kind of event a listener subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Ready,
    Update,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// The first successful fetch of a run completed.
    Ready,
    /// A refresh changed the toggle table.
    Update,
    /// A background failure was reported.
    Error { code: ErrorCode, message: String },
}

impl ClientEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            ClientEvent::Ready => EventKind::Ready,
            ClientEvent::Update => EventKind::Update,
            ClientEvent::Error { .. } => EventKind::Error,
        }
    }
}

impl From<&UnleashError> for ClientEvent {
    fn from(error: &UnleashError) -> Self {
        ClientEvent::Error {
            code: error.code,
            message: error.message.clone(),
        }
    }
}

pub type EventCallback = Arc<dyn Fn(&ClientEvent) + Send + Sync>;

/// Listeners registered on one client.
#[derive(Default)]
pub struct EventRegistry {
    listeners: RwLock<Vec<(EventKind, EventCallback)>>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, kind: EventKind, callback: EventCallback) {
        self.listeners.write().push((kind, callback));
    }

    /// Call every listener for the event's kind.
    ///
    /// Callbacks run on the emitting task, outside the registry lock.
    pub fn emit(&self, event: &ClientEvent) {
        let kind = event.kind();
        let matching: Vec<EventCallback> = self
            .listeners
            .read()
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, cb)| Arc::clone(cb))
            .collect();

        for callback in matching {
            callback(event);
        }
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners.read().iter().filter(|(k, _)| *k == kind).count()
    }
}
