//! In-process message store
//!
//! Backs the local-only mode and the test suite. Messages live in a plain
//! vector; notifications go out over a broadcast channel to every live
//! subscriber.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::broadcast;

use super::{
    ChangeAction, ChangeEvent, MessageStore, StoreError, Subscription, MESSAGES_COLLECTION,
};
use crate::models::{Message, RoomCode};

/// Broadcast buffer size. A slow subscriber that falls further behind than
/// this sees a lagged error, which the subscription turns into a catch-up
/// event.
const NOTIFY_CAPACITY: usize = 64;

pub struct MemoryStore {
    messages: Mutex<Vec<Message>>,
    notify: broadcast::Sender<ChangeEvent>,
    subscribers: Arc<AtomicUsize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (notify, _) = broadcast::channel(NOTIFY_CAPACITY);
        Self {
            messages: Mutex::new(Vec::new()),
            notify,
            subscribers: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of live subscriptions. Observable so lifecycle tests can
    /// verify that repeated join/leave cycles release every handle.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.load(Ordering::SeqCst)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn insert(&self, message: &Message) -> Result<(), StoreError> {
        self.messages
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(message.clone());

        // No receivers is fine; send only fails when nobody is listening.
        let _ = self.notify.send(ChangeEvent {
            collection: MESSAGES_COLLECTION.to_string(),
            action: ChangeAction::Create,
        });
        Ok(())
    }

    async fn messages_in_room(&self, room: &RoomCode) -> Result<Vec<Message>, StoreError> {
        let mut scoped: Vec<Message> = self
            .messages
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|m| m.room_code == room.as_str())
            .cloned()
            .collect();
        scoped.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Ok(scoped)
    }

    fn subscribe(&self) -> Subscription {
        self.subscribers.fetch_add(1, Ordering::SeqCst);
        let subscribers = Arc::clone(&self.subscribers);
        Subscription::new(
            self.notify.subscribe(),
            Box::new(move || {
                subscribers.fetch_sub(1, Ordering::SeqCst);
            }),
        )
    }
}
