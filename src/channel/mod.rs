//! Room channel: the message synchronization flow
//!
//! Owns the joined room's message snapshot. The snapshot is a cache of the
//! backend's scoped, timestamp-ordered read, rebuilt wholesale on every
//! change notification (reconcile-from-source; no incremental merge, no
//! dedup). Sends are fire-and-forget: the sender's own message becomes
//! visible only through the notification/re-fetch round trip.

use std::sync::Arc;

use crate::models::Message;
use crate::session::Participant;
use crate::store::{ChangeEvent, MessageStore, Subscription};

pub struct RoomChannel {
    store: Arc<dyn MessageStore>,
    participant: Participant,
    messages: Vec<Message>,
    subscription: Option<Subscription>,
}

impl RoomChannel {
    /// Enter the joined state: register the live subscription, then run the
    /// initial scoped load.
    ///
    /// Subscribing first means an insert racing the initial load still
    /// produces a notification, so nothing is missed in the gap.
    pub async fn join(store: Arc<dyn MessageStore>, participant: Participant) -> Self {
        let subscription = store.subscribe();
        let mut channel = Self {
            store,
            participant,
            messages: Vec::new(),
            subscription: Some(subscription),
        };
        channel.refresh().await;
        channel
    }

    pub fn participant(&self) -> &Participant {
        &self.participant
    }

    /// Current snapshot, oldest first.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Re-run the scoped read and replace the snapshot with the full result.
    ///
    /// On failure the snapshot is left unchanged; the error is logged and
    /// swallowed (no retry, nothing surfaced).
    pub async fn refresh(&mut self) {
        match self.store.messages_in_room(&self.participant.room).await {
            Ok(messages) => self.messages = messages,
            Err(e) => {
                tracing::warn!(
                    "Fetch for room {} failed, keeping current list: {:#}",
                    self.participant.room,
                    e
                );
            }
        }
    }

    /// Dispatch a message insert for `input`.
    ///
    /// Whitespace-only input is a no-op and returns `false`. Otherwise the
    /// insert runs on a background task and `true` is returned immediately;
    /// the completion is consumed only for logging. Callers clear their
    /// input on `true` without waiting for the network.
    pub fn send(&self, input: &str) -> bool {
        let text = input.trim();
        if text.is_empty() {
            return false;
        }

        let message = Message::new(text, &self.participant.room, &self.participant.name);
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            if let Err(e) = store.insert(&message).await {
                tracing::warn!("Send to room {} failed: {:#}", message.room_code, e);
            }
        });
        true
    }

    /// Wait for the next change notification on the message collection.
    ///
    /// Returns `None` once the channel has been left. Every yielded event,
    /// whatever room caused it, should be answered with [`refresh`].
    pub async fn next_change(&mut self) -> Option<ChangeEvent> {
        match self.subscription.as_mut() {
            Some(subscription) => subscription.next().await,
            None => None,
        }
    }

    /// Leave the joined state, releasing the subscription. Idempotent.
    pub fn leave(&mut self) {
        if let Some(mut subscription) = self.subscription.take() {
            subscription.close();
            tracing::debug!("Left room {}", self.participant.room);
        }
    }

    pub fn is_joined(&self) -> bool {
        self.subscription.is_some()
    }
}

impl Drop for RoomChannel {
    fn drop(&mut self) {
        self.leave();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::time::Duration;
    use tokio::time::timeout;

    use crate::models::RoomCode;
    use crate::session::Participant;
    use crate::store::{MemoryStore, StoreError, Subscription};

    fn participant(name: &str, code: &str) -> Participant {
        Participant {
            name: name.to_string(),
            room: RoomCode::parse(code).unwrap(),
        }
    }

    /// Waits for a change notification and re-fetches, with a test timeout.
    async fn sync_once(channel: &mut RoomChannel) {
        timeout(Duration::from_secs(2), channel.next_change())
            .await
            .expect("no change notification arrived")
            .expect("subscription closed unexpectedly");
        channel.refresh().await;
    }

    #[tokio::test]
    async fn test_initial_load_populates_scoped_snapshot() {
        let store = Arc::new(MemoryStore::new());
        let room = RoomCode::parse("123456").unwrap();
        store
            .insert(&Message::new("existing", &room, "Alice"))
            .await
            .unwrap();
        store
            .insert(&Message::new(
                "other room",
                &RoomCode::parse("654321").unwrap(),
                "Mallory",
            ))
            .await
            .unwrap();

        let channel = RoomChannel::join(store, participant("Bob", "123456")).await;
        let msgs = channel.messages();
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0].text, "existing");
    }

    #[tokio::test]
    async fn test_whitespace_send_is_noop() {
        let store = Arc::new(MemoryStore::new());
        let channel = RoomChannel::join(Arc::clone(&store) as Arc<dyn MessageStore>, participant("Ann", "123456")).await;

        assert!(!channel.send("   "));
        assert!(!channel.send(""));
        assert!(!channel.send("\n\t"));

        // Nothing was inserted.
        let room = RoomCode::parse("123456").unwrap();
        assert!(store.messages_in_room(&room).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_send_is_visible_only_after_round_trip() {
        let store = Arc::new(MemoryStore::new());
        let mut channel =
            RoomChannel::join(Arc::clone(&store) as Arc<dyn MessageStore>, participant("Alice", "123456")).await;

        assert!(channel.send("  hello  "));
        // No optimistic append: the snapshot is unchanged until the
        // notification round trip completes.
        assert!(channel.messages().is_empty());

        sync_once(&mut channel).await;
        let msgs = channel.messages();
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0].text, "hello"); // trimmed before insert
        assert_eq!(msgs[0].author, "Alice");
        assert_eq!(msgs[0].room_code, "123456");
    }

    #[tokio::test]
    async fn test_two_participants_converge() {
        let store = Arc::new(MemoryStore::new());
        let mut alice =
            RoomChannel::join(Arc::clone(&store) as Arc<dyn MessageStore>, participant("Alice", "123456")).await;
        let mut bob =
            RoomChannel::join(Arc::clone(&store) as Arc<dyn MessageStore>, participant("Bob", "123456")).await;

        assert!(alice.send("hi"));

        sync_once(&mut alice).await;
        sync_once(&mut bob).await;

        for view in [alice.messages(), bob.messages()] {
            assert_eq!(view.len(), 1);
            assert_eq!(view[0].text, "hi");
            assert_eq!(view[0].author, "Alice");
            assert_eq!(view[0].room_code, "123456");
        }
    }

    #[tokio::test]
    async fn test_snapshot_always_equals_scoped_read() {
        let store = Arc::new(MemoryStore::new());
        let room = RoomCode::parse("123456").unwrap();
        let mut channel =
            RoomChannel::join(Arc::clone(&store) as Arc<dyn MessageStore>, participant("Ann", "123456")).await;

        for text in ["one", "two", "three"] {
            assert!(channel.send(text));
            sync_once(&mut channel).await;
        }
        // Noise from another room triggers notifications but never appears.
        store
            .insert(&Message::new(
                "noise",
                &RoomCode::parse("999999").unwrap(),
                "Mallory",
            ))
            .await
            .unwrap();
        sync_once(&mut channel).await;

        let expected = store.messages_in_room(&room).await.unwrap();
        let expected_texts: Vec<&str> = expected.iter().map(|m| m.text.as_str()).collect();
        let actual_texts: Vec<&str> = channel.messages().iter().map(|m| m.text.as_str()).collect();
        assert_eq!(actual_texts, expected_texts);
        assert!(channel.messages().iter().all(|m| m.room_code == "123456"));
    }

    #[tokio::test]
    async fn test_leave_releases_subscription_once() {
        let store = Arc::new(MemoryStore::new());
        let mut channel =
            RoomChannel::join(Arc::clone(&store) as Arc<dyn MessageStore>, participant("Ann", "123456")).await;
        assert_eq!(store.subscriber_count(), 1);
        assert!(channel.is_joined());

        channel.leave();
        assert_eq!(store.subscriber_count(), 0);
        assert!(!channel.is_joined());

        // Second leave and the eventual drop are no-ops.
        channel.leave();
        drop(channel);
        assert_eq!(store.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_repeated_join_leave_does_not_leak() {
        let store = Arc::new(MemoryStore::new());
        for _ in 0..10 {
            let mut channel =
                RoomChannel::join(Arc::clone(&store) as Arc<dyn MessageStore>, participant("Ann", "123456")).await;
            channel.leave();
        }
        assert_eq!(store.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_next_change_ends_after_leave() {
        let store = Arc::new(MemoryStore::new());
        let mut channel =
            RoomChannel::join(Arc::clone(&store) as Arc<dyn MessageStore>, participant("Ann", "123456")).await;
        channel.leave();
        assert!(channel.next_change().await.is_none());
    }

    /// Store double whose reads always fail; used to verify the
    /// degrade-to-nothing error contract.
    struct FailingStore {
        inner: MemoryStore,
        fail_reads: std::sync::atomic::AtomicBool,
    }

    impl FailingStore {
        fn new() -> Self {
            Self {
                inner: MemoryStore::new(),
                fail_reads: std::sync::atomic::AtomicBool::new(false),
            }
        }

        fn set_fail_reads(&self, fail: bool) {
            self.fail_reads
                .store(fail, std::sync::atomic::Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl MessageStore for FailingStore {
        async fn insert(&self, message: &Message) -> Result<(), StoreError> {
            self.inner.insert(message).await
        }

        async fn messages_in_room(&self, room: &RoomCode) -> Result<Vec<Message>, StoreError> {
            if self.fail_reads.load(std::sync::atomic::Ordering::SeqCst) {
                return Err(StoreError::Status {
                    status: 503,
                    body: "unavailable".to_string(),
                });
            }
            self.inner.messages_in_room(room).await
        }

        fn subscribe(&self) -> Subscription {
            self.inner.subscribe()
        }
    }

    #[tokio::test]
    async fn test_failed_refresh_leaves_snapshot_unchanged() {
        let store = Arc::new(FailingStore::new());
        let room = RoomCode::parse("123456").unwrap();
        store
            .insert(&Message::new("kept", &room, "Alice"))
            .await
            .unwrap();

        let mut channel =
            RoomChannel::join(Arc::clone(&store) as Arc<dyn MessageStore>, participant("Bob", "123456")).await;
        assert_eq!(channel.messages().len(), 1);

        store.set_fail_reads(true);
        channel.refresh().await;
        assert_eq!(channel.messages().len(), 1);
        assert_eq!(channel.messages()[0].text, "kept");
    }
}
