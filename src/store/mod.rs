//! Message store boundary
//!
//! The only external collaborator of the client: a structured-storage
//! backend with change notifications, consumed through three operations
//! (insert, scoped ordered read, change subscription). Implementations are
//! constructed explicitly and passed in; there is no process-wide singleton.

mod http;
mod memory;
pub mod realtime;

pub use http::HttpStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;

use crate::models::{Message, RoomCode};

/// Name of the shared message collection.
pub const MESSAGES_COLLECTION: &str = "messages";

/// Errors from store operations.
///
/// Callers on the sync path swallow these after logging them; nothing here
/// is fatal to the session.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("backend request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode backend response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// What kind of change a notification describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeAction {
    Create,
    Update,
    Delete,
}

/// A change notification on a collection.
///
/// Notifications are not filtered by room; consumers re-run their own scoped
/// read on every event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    pub collection: String,
    pub action: ChangeAction,
}

impl ChangeEvent {
    /// Synthetic create event on the message collection. Emitted when the
    /// feed (re)connects so consumers re-fetch and catch up on anything
    /// missed while disconnected.
    pub fn catch_up() -> Self {
        Self {
            collection: MESSAGES_COLLECTION.to_string(),
            action: ChangeAction::Create,
        }
    }
}

/// Live handle on the change feed.
///
/// Releasing the handle (explicitly via [`close`](Self::close) or by
/// dropping it) is what stops notifications; release is idempotent, so
/// repeated join/leave cycles never double-release or leak.
pub struct Subscription {
    events: broadcast::Receiver<ChangeEvent>,
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub(crate) fn new(
        events: broadcast::Receiver<ChangeEvent>,
        release: Box<dyn FnOnce() + Send>,
    ) -> Self {
        Self {
            events,
            release: Some(release),
        }
    }

    /// Wait for the next change notification.
    ///
    /// Returns `None` once the subscription is closed (locally or because
    /// the store went away). A lagged receiver is reported as a catch-up
    /// event: the consumer re-fetches the full list anyway, so dropped
    /// intermediate notifications are harmless.
    pub async fn next(&mut self) -> Option<ChangeEvent> {
        if self.release.is_none() {
            return None;
        }
        match self.events.recv().await {
            Ok(event) => Some(event),
            Err(broadcast::error::RecvError::Lagged(_)) => Some(ChangeEvent::catch_up()),
            Err(broadcast::error::RecvError::Closed) => None,
        }
    }

    /// Release the subscription. Safe to call more than once.
    pub fn close(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }

    /// Whether the handle has been released.
    #[allow(dead_code)]
    pub fn is_closed(&self) -> bool {
        self.release.is_none()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.close();
    }
}

/// Generic structured-storage-with-pubsub interface.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Append one message record to the shared collection.
    async fn insert(&self, message: &Message) -> Result<(), StoreError>;

    /// All messages whose `roomCode` matches `room`, sorted by timestamp
    /// ascending.
    async fn messages_in_room(&self, room: &RoomCode) -> Result<Vec<Message>, StoreError>;

    /// Register interest in every create/update/delete on the message
    /// collection. The feed carries no room filter; scoping happens in the
    /// re-fetch.
    fn subscribe(&self) -> Subscription;
}
