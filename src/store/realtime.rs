//! Changes-feed websocket listener
//!
//! Maintains the connection to the backend's realtime endpoint and forwards
//! change notifications to subscribers. Reconnects with exponential backoff
//! (1s, 2s, 4s, ... capped at 64s); a successful connect resets the backoff
//! and emits a synthetic catch-up event so consumers re-fetch whatever they
//! missed while disconnected.

use std::time::Duration;

use anyhow::{Context, Result};
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast;
use tokio::time;
use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage};

use super::{ChangeEvent, MESSAGES_COLLECTION};

/// Client-side heartbeat period.
const HEARTBEAT_SECS: u64 = 30;

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// Run the feed until the owning task is cancelled.
pub(crate) async fn run(ws_url: String, notify: broadcast::Sender<ChangeEvent>) {
    let mut backoff = 1u64;

    loop {
        match run_session(&ws_url, &notify).await {
            Ok(()) => {
                // Server closed the connection cleanly; reconnect promptly.
                backoff = 1;
                tracing::warn!("Changes feed closed by server. Reconnecting in 1s...");
                time::sleep(Duration::from_secs(1)).await;
            }
            Err(e) => {
                tracing::warn!("Changes feed disconnected: {:#}. Reconnecting in {}s...", e, backoff);
                time::sleep(Duration::from_secs(backoff)).await;
                backoff = (backoff * 2).min(64);
            }
        }
    }
}

/// One full feed session: connect, subscribe, pump frames.
///
/// Returns `Ok(())` on a clean server close, `Err` on anything that should
/// be retried.
async fn run_session(ws_url: &str, notify: &broadcast::Sender<ChangeEvent>) -> Result<()> {
    let mut socket = ChangesSocket::connect(ws_url).await?;

    let subscribe = serde_json::json!({
        "clientId": uuid::Uuid::new_v4().to_string(),
        "subscribe": [MESSAGES_COLLECTION],
    });
    socket.send_text(&subscribe.to_string()).await?;

    // Catch up on anything that changed while we were not connected.
    let _ = notify.send(ChangeEvent::catch_up());

    let mut heartbeat = time::interval(Duration::from_secs(HEARTBEAT_SECS));
    heartbeat.tick().await; // skip first immediate tick

    loop {
        tokio::select! {
            frame = socket.recv_frame() => {
                match frame? {
                    Some(text) => {
                        if let Some(event) = parse_change_event(&text) {
                            // No receivers is fine; the feed outlives idle spells.
                            let _ = notify.send(event);
                        }
                    }
                    None => return Ok(()),
                }
            }
            _ = heartbeat.tick() => {
                socket.send_text(r#"{"action":"ping"}"#).await?;
            }
        }
    }
}

/// Websocket connection to the changes endpoint.
pub struct ChangesSocket {
    stream: WsStream,
}

impl ChangesSocket {
    pub async fn connect(ws_url: &str) -> Result<Self> {
        tracing::info!("Connecting changes feed to {}", ws_url);

        let (stream, response) = connect_async(ws_url)
            .await
            .context("WebSocket connection failed")?;

        tracing::info!("Changes feed connected (status={})", response.status());
        Ok(Self { stream })
    }

    /// Send a text frame.
    pub async fn send_text(&mut self, msg: &str) -> Result<()> {
        tracing::debug!("WS send: {}", msg);
        self.stream
            .send(WsMessage::Text(msg.to_string()))
            .await
            .context("Failed to send WebSocket message")
    }

    /// Receive the next text frame, answering pings along the way.
    ///
    /// Returns `Ok(None)` when the server closes the connection.
    pub async fn recv_frame(&mut self) -> Result<Option<String>> {
        loop {
            match self.stream.next().await {
                Some(Ok(WsMessage::Text(text))) => {
                    tracing::debug!("WS recv: {}", text);
                    return Ok(Some(text));
                }
                Some(Ok(WsMessage::Ping(data))) => {
                    self.stream
                        .send(WsMessage::Pong(data))
                        .await
                        .context("Failed to send pong")?;
                }
                Some(Ok(WsMessage::Close(frame))) => {
                    tracing::info!("WebSocket closed: {:?}", frame);
                    return Ok(None);
                }
                Some(Ok(other)) => {
                    tracing::debug!("WS frame (ignored): {:?}", other);
                }
                Some(Err(e)) => {
                    return Err(e).context("WebSocket receive error");
                }
                None => {
                    return Ok(None);
                }
            }
        }
    }
}

/// Parse a feed frame into a change event.
///
/// Frames that are not change events (heartbeat pongs, acks, malformed
/// payloads) yield `None` and are dropped.
fn parse_change_event(frame: &str) -> Option<ChangeEvent> {
    serde_json::from_str::<ChangeEvent>(frame).ok()
}
