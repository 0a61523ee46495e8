//! Book event dispatch

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::models::BookEvent;

/// Receives domain events. Fire-and-forget: implementations deal with their
/// own failures and never report back to the collection.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventDispatcher: Send + Sync {
    async fn dispatch(&self, event: BookEvent);
}

/// In-process fan-out to any number of subscribers (e.g. the SSE feed).
#[derive(Clone)]
pub struct BroadcastDispatcher {
    sender: broadcast::Sender<BookEvent>,
}

impl BroadcastDispatcher {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BookEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[async_trait]
impl EventDispatcher for BroadcastDispatcher {
    async fn dispatch(&self, event: BookEvent) {
        tracing::debug!(book_id = %event.book_id(), event = event.kind(), "Dispatching book event");
        // No subscribers is fine
        let _ = self.sender.send(event);
    }
}

/// Forwards every event to each inner dispatcher, in order
#[derive(Clone, Default)]
pub struct FanOutDispatcher {
    targets: Vec<Arc<dyn EventDispatcher>>,
}

impl FanOutDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, target: Arc<dyn EventDispatcher>) -> Self {
        self.targets.push(target);
        self
    }
}

#[async_trait]
impl EventDispatcher for FanOutDispatcher {
    async fn dispatch(&self, event: BookEvent) {
        for target in &self.targets {
            target.dispatch(event.clone()).await;
        }
    }
}
