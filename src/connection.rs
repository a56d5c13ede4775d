//! Outbound connection handles and the per-socket pump.

use axum::extract::ws::{Message, WebSocket};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Process-unique connection identifier.
pub type ConnectionId = u64;

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// A live client connection that accepts messages of type `M`.
///
/// Sending is fire-and-forget: a dead or slow peer never blocks the caller
/// and no delivery result is reported.
pub trait Connection<M>: Send + Sync + std::fmt::Debug {
    /// Identifier used to tell a reconnect apart from the socket it replaced.
    fn id(&self) -> ConnectionId;

    /// Queues a message for delivery.
    fn send(&self, message: M);
}

/// Connection backed by an unbounded channel drained by a socket task.
#[derive(Debug, Clone)]
pub struct ChannelConnection<M> {
    id: ConnectionId,
    tx: mpsc::UnboundedSender<M>,
}

impl<M> ChannelConnection<M> {
    /// Creates a connection with a fresh id, returning the receiving half.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<M>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed);
        (Self { id, tx }, rx)
    }
}

impl<M: Send + std::fmt::Debug> Connection<M> for ChannelConnection<M> {
    fn id(&self) -> ConnectionId {
        self.id
    }

    fn send(&self, message: M) {
        if self.tx.send(message).is_err() {
            debug!(connection_id = self.id, "Dropped message for closed connection");
        }
    }
}

/// Runs one WebSocket until the peer goes away.
///
/// Messages queued on `outbound` are written as JSON text frames; every
/// inbound text frame is handed to `on_text`. Returns when the socket
/// closes or a write fails.
pub async fn pump_socket<M, F>(
    mut socket: WebSocket,
    connection_id: ConnectionId,
    mut outbound: mpsc::UnboundedReceiver<M>,
    mut on_text: F,
) where
    M: Serialize,
    F: FnMut(&str),
{
    loop {
        tokio::select! {
            Some(message) = outbound.recv() => {
                let json = match serde_json::to_string(&message) {
                    Ok(json) => json,
                    Err(e) => {
                        warn!(connection_id, error = %e, "Failed to encode outbound message");
                        continue;
                    }
                };
                if socket.send(Message::Text(json.into())).await.is_err() {
                    debug!(connection_id, "Socket write failed");
                    break;
                }
            }
            inbound = socket.recv() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => on_text(text.as_str()),
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        debug!(connection_id, error = %e, "Socket read failed");
                        break;
                    }
                    Some(Ok(_)) => continue,
                }
            }
        }
    }
    debug!(connection_id, "Socket closed");
}
