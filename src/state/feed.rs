use tokio::sync::broadcast;

use crate::state::change_detector::ChangeEvent;

/// Broadcast hub carrying non-empty change events to in-process subscribers.
pub struct ChangeFeed {
    sender: broadcast::Sender<ChangeEvent>,
}

impl ChangeFeed {
    /// Construct a new feed backed by a Tokio broadcast channel with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Register a new subscriber that will receive subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }

    /// Send an event to all current subscribers, ignoring delivery errors.
    pub fn publish(&self, event: ChangeEvent) {
        let _ = self.sender.send(event);
    }
}
