//! Hosted-backend message store
//!
//! Talks to the InboX backend's generic collection API: JSON REST for
//! insert and scoped reads, plus a websocket changes feed for the live
//! subscription. The feed listener is started lazily with the first
//! subscription and stopped when the last handle is released.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use super::realtime;
use super::{ChangeEvent, MessageStore, StoreError, Subscription, MESSAGES_COLLECTION};
use crate::models::{Message, RoomCode};

/// Same buffer size as the in-memory store; lag resolves to a catch-up
/// re-fetch on the consumer side.
const NOTIFY_CAPACITY: usize = 64;

#[derive(Debug, Deserialize)]
struct RecordsResponse {
    items: Option<Vec<Message>>,
}

pub struct HttpStore {
    http: reqwest::Client,
    base: String,
    notify: broadcast::Sender<ChangeEvent>,
    subscribers: Arc<AtomicUsize>,
    listener: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl HttpStore {
    /// Build a store client for the backend at `base` (e.g.
    /// `http://localhost:8090`). No connection is made until the first
    /// operation.
    pub fn new(base: &str) -> Self {
        let (notify, _) = broadcast::channel(NOTIFY_CAPACITY);
        Self {
            http: reqwest::Client::new(),
            base: base.trim_end_matches('/').to_string(),
            notify,
            subscribers: Arc::new(AtomicUsize::new(0)),
            listener: Arc::new(Mutex::new(None)),
        }
    }

    fn records_url(&self) -> String {
        format!("{}/api/collections/{}/records", self.base, MESSAGES_COLLECTION)
    }

    /// Websocket endpoint for the changes feed, derived from the REST base.
    fn realtime_url(&self) -> String {
        let ws_base = self
            .base
            .replace("https://", "wss://")
            .replace("http://", "ws://");
        format!("{}/api/realtime", ws_base)
    }

    /// Spawn the feed listener if it is not already running.
    fn ensure_listener(&self) {
        let mut guard = self.listener.lock().unwrap_or_else(|e| e.into_inner());
        let running = guard.as_ref().map(|h| !h.is_finished()).unwrap_or(false);
        if !running {
            let url = self.realtime_url();
            let notify = self.notify.clone();
            *guard = Some(tokio::spawn(realtime::run(url, notify)));
        }
    }

    fn stop_listener(listener: &Mutex<Option<JoinHandle<()>>>) {
        if let Some(handle) = listener
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        {
            handle.abort();
            tracing::debug!("Changes feed listener stopped");
        }
    }
}

impl Drop for HttpStore {
    fn drop(&mut self) {
        Self::stop_listener(&self.listener);
    }
}

#[async_trait]
impl MessageStore for HttpStore {
    async fn insert(&self, message: &Message) -> Result<(), StoreError> {
        let url = self.records_url();
        tracing::debug!("POST {}", url);

        let resp = self.http.post(&url).json(message).send().await?;
        check_response(resp).await?;
        Ok(())
    }

    async fn messages_in_room(&self, room: &RoomCode) -> Result<Vec<Message>, StoreError> {
        let url = self.records_url();
        tracing::debug!("GET {} roomCode={}", url, room);

        let resp = self
            .http
            .get(&url)
            .query(&[("roomCode", room.as_str()), ("sort", "timestamp")])
            .send()
            .await?;
        let resp = check_response(resp).await?;

        let text = resp.text().await?;
        let body: RecordsResponse = serde_json::from_str(&text)?;
        let mut items = body.items.unwrap_or_default();
        items.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Ok(items)
    }

    fn subscribe(&self) -> Subscription {
        self.ensure_listener();
        self.subscribers.fetch_add(1, Ordering::SeqCst);

        let subscribers = Arc::clone(&self.subscribers);
        let listener = Arc::clone(&self.listener);
        Subscription::new(
            self.notify.subscribe(),
            Box::new(move || {
                // Last handle out stops the websocket listener.
                if subscribers.fetch_sub(1, Ordering::SeqCst) == 1 {
                    Self::stop_listener(&listener);
                }
            }),
        )
    }
}

/// Map non-success HTTP statuses to a store error.
async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, StoreError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(StoreError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(resp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_from_base() {
        let store = HttpStore::new("http://localhost:8090/");
        assert_eq!(
            store.records_url(),
            "http://localhost:8090/api/collections/messages/records"
        );
        assert_eq!(
            store.realtime_url(),
            "ws://localhost:8090/api/realtime"
        );
    }

    #[test]
    fn test_realtime_url_upgrades_tls() {
        let store = HttpStore::new("https://inbox.example.com");
        assert_eq!(
            store.realtime_url(),
            "wss://inbox.example.com/api/realtime"
        );
    }

    #[tokio::test]
    async fn test_release_stops_listener_after_last_handle() {
        let store = HttpStore::new("http://localhost:1"); // never reachable; listener just retries
        let mut a = store.subscribe();
        let mut b = store.subscribe();
        assert!(store.listener.lock().unwrap().is_some());

        a.close();
        assert!(store.listener.lock().unwrap().is_some());
        b.close();
        assert!(store.listener.lock().unwrap().is_none());
    }
}
