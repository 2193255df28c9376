//! Async backend: bridges the TUI event loop with the store work.
//!
//! Uses an mpsc channel pair. The TUI sends `BackendCommand` values; a
//! background tokio task owns the room channel, executes them, and sends
//! `BackendResponse` values back. Change notifications from the live
//! subscription are turned into refreshed message snapshots on the same
//! loop.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::channel::RoomChannel;
use crate::models::Message;
use crate::session::Participant;
use crate::store::{ChangeEvent, MessageStore};

/// Commands sent from the TUI event loop to the async backend.
pub enum BackendCommand {
    /// Enter the joined state for the given participant.
    Join { participant: Participant },
    /// Fire-and-forget message send.
    Send { text: String },
    /// Leave the joined state, releasing the subscription.
    Leave,
}

/// Responses from the async backend to the TUI.
pub enum BackendResponse {
    /// The joined state is active.
    Joined { participant: Participant },
    /// A replaced message snapshot (initial load or post-notification
    /// re-fetch).
    Messages(Vec<Message>),
    /// The joined state has ended.
    Left,
}

/// Handle for interacting with the backend from the TUI side.
pub struct Backend {
    cmd_tx: mpsc::UnboundedSender<BackendCommand>,
    resp_rx: mpsc::UnboundedReceiver<BackendResponse>,
}

impl Backend {
    /// Start the backend task against the injected store.
    pub fn start(store: Arc<dyn MessageStore>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (resp_tx, resp_rx) = mpsc::unbounded_channel();

        tokio::spawn(backend_loop(store, cmd_rx, resp_tx));

        Self { cmd_tx, resp_rx }
    }

    /// Send a command to the backend (non-blocking).
    pub fn send(&self, cmd: BackendCommand) {
        if self.cmd_tx.send(cmd).is_err() {
            tracing::error!("Backend channel closed -- command dropped");
        }
    }

    /// Receive a response from the backend. Designed for `tokio::select!`.
    pub async fn recv(&mut self) -> Option<BackendResponse> {
        self.resp_rx.recv().await
    }
}

/// Resolve the next change notification, or park forever while not joined.
async fn next_change(channel: &mut Option<RoomChannel>) -> Option<ChangeEvent> {
    match channel.as_mut() {
        Some(channel) => channel.next_change().await,
        None => std::future::pending().await,
    }
}

async fn backend_loop(
    store: Arc<dyn MessageStore>,
    mut cmd_rx: mpsc::UnboundedReceiver<BackendCommand>,
    resp_tx: mpsc::UnboundedSender<BackendResponse>,
) {
    let mut channel: Option<RoomChannel> = None;

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => match cmd {
                Some(BackendCommand::Join { participant }) => {
                    let joined =
                        RoomChannel::join(Arc::clone(&store), participant.clone()).await;
                    let _ = resp_tx.send(BackendResponse::Joined { participant });
                    let _ = resp_tx.send(BackendResponse::Messages(joined.messages().to_vec()));
                    channel = Some(joined);
                }
                Some(BackendCommand::Send { text }) => {
                    if let Some(channel) = &channel {
                        channel.send(&text);
                    }
                }
                Some(BackendCommand::Leave) => {
                    if let Some(mut channel) = channel.take() {
                        channel.leave();
                    }
                    let _ = resp_tx.send(BackendResponse::Left);
                }
                None => {
                    // TUI side dropped the handle; release and stop.
                    if let Some(mut channel) = channel.take() {
                        channel.leave();
                    }
                    break;
                }
            },
            Some(_event) = next_change(&mut channel) => {
                if let Some(channel) = channel.as_mut() {
                    channel.refresh().await;
                    let _ = resp_tx.send(BackendResponse::Messages(channel.messages().to_vec()));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    use crate::models::RoomCode;
    use crate::store::MemoryStore;

    fn participant(name: &str, code: &str) -> Participant {
        Participant {
            name: name.to_string(),
            room: RoomCode::parse(code).unwrap(),
        }
    }

    async fn recv(backend: &mut Backend) -> BackendResponse {
        timeout(Duration::from_secs(2), backend.recv())
            .await
            .expect("no backend response")
            .expect("backend stopped")
    }

    #[tokio::test]
    async fn test_join_send_and_sync_round_trip() {
        let store = Arc::new(MemoryStore::new());
        let mut backend = Backend::start(Arc::clone(&store) as Arc<dyn MessageStore>);

        backend.send(BackendCommand::Join {
            participant: participant("Alice", "123456"),
        });
        assert!(matches!(recv(&mut backend).await, BackendResponse::Joined { .. }));
        match recv(&mut backend).await {
            BackendResponse::Messages(msgs) => assert!(msgs.is_empty()),
            _ => panic!("expected initial snapshot"),
        }

        backend.send(BackendCommand::Send {
            text: "hi".to_string(),
        });
        match recv(&mut backend).await {
            BackendResponse::Messages(msgs) => {
                assert_eq!(msgs.len(), 1);
                assert_eq!(msgs[0].text, "hi");
                assert_eq!(msgs[0].author, "Alice");
            }
            _ => panic!("expected refreshed snapshot"),
        }
    }

    #[tokio::test]
    async fn test_leave_releases_subscription() {
        let store = Arc::new(MemoryStore::new());
        let mut backend = Backend::start(Arc::clone(&store) as Arc<dyn MessageStore>);

        backend.send(BackendCommand::Join {
            participant: participant("Ann", "123456"),
        });
        assert!(matches!(recv(&mut backend).await, BackendResponse::Joined { .. }));
        let _ = recv(&mut backend).await; // initial snapshot

        backend.send(BackendCommand::Leave);
        assert!(matches!(recv(&mut backend).await, BackendResponse::Left));
        assert_eq!(store.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_dropping_backend_releases_subscription() {
        let store = Arc::new(MemoryStore::new());
        let mut backend = Backend::start(Arc::clone(&store) as Arc<dyn MessageStore>);

        backend.send(BackendCommand::Join {
            participant: participant("Ann", "123456"),
        });
        assert!(matches!(recv(&mut backend).await, BackendResponse::Joined { .. }));
        let _ = recv(&mut backend).await;

        drop(backend);
        // The backend loop notices the closed channel and releases.
        for _ in 0..50 {
            if store.subscriber_count() == 0 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("subscription leaked after backend drop");
    }
}
