//! Resilient outbound connection from the matchmaker to the game host.

use super::MatchCommandSink;
use crate::protocol::{ClientMessage, MatchId, ServerMessage};
use derive_more::{Display, Error};
use futures::{SinkExt, StreamExt};
use std::collections::VecDeque;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, instrument, warn};

type HostStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Why a link session ended.
#[derive(Debug, Display, Error)]
pub enum LinkError {
    /// Transport failure.
    #[display("WebSocket error: {_0}")]
    Socket(tokio_tungstenite::tungstenite::Error),
    /// The game host closed the connection.
    #[display("Game host closed the connection")]
    Closed,
}

impl From<tokio_tungstenite::tungstenite::Error> for LinkError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::Socket(err)
    }
}

/// Handle to the background link task.
///
/// Commands submitted while the game host is unreachable are buffered and
/// flushed in order once the link reconnects. A `GAME_START` stays in
/// flight until the host answers `GAME_STARTED` for its match id; if the
/// link drops first it is sent again after reconnecting.
#[derive(Debug)]
pub struct GameHostLink {
    commands: mpsc::UnboundedSender<ClientMessage>,
    task: JoinHandle<()>,
}

impl GameHostLink {
    /// Starts the link on the current runtime, retrying every `backoff`.
    #[instrument]
    pub fn spawn(url: String, backoff: Duration) -> Self {
        info!("Starting game host link");
        let (commands, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_link(url, backoff, rx));
        Self { commands, task }
    }

    /// Stops the link. Unsent commands are discarded.
    pub fn stop(self) {
        self.task.abort();
        info!("Game host link stopped");
    }
}

impl MatchCommandSink for GameHostLink {
    fn submit(&self, command: ClientMessage) {
        if self.commands.send(command).is_err() {
            warn!("Game host link is not running, command dropped");
        }
    }
}

async fn run_link(url: String, backoff: Duration, mut commands: mpsc::UnboundedReceiver<ClientMessage>) {
    let mut pending = VecDeque::new();
    let mut in_flight = VecDeque::new();
    loop {
        match connect_async(url.as_str()).await {
            Ok((stream, _)) => {
                info!(%url, pending = pending.len(), "Connected to game host");
                match drive(stream, &mut pending, &mut in_flight, &mut commands).await {
                    Ok(()) => {
                        debug!(
                            unacknowledged = in_flight.len(),
                            "All command senders dropped, link exiting"
                        );
                        return;
                    }
                    Err(e) => {
                        requeue_in_flight(&mut pending, &mut in_flight);
                        warn!(error = %e, pending = pending.len(), "Game host link lost");
                    }
                }
            }
            Err(e) => warn!(%url, error = %e, "Failed to reach game host"),
        }

        // Keep buffering while waiting to retry.
        let retry = tokio::time::sleep(backoff);
        tokio::pin!(retry);
        loop {
            tokio::select! {
                _ = &mut retry => break,
                command = commands.recv() => match command {
                    Some(command) => pending.push_back(command),
                    None => {
                        debug!(dropped = pending.len(), "All command senders dropped, link exiting");
                        return;
                    }
                },
            }
        }
    }
}

/// Match id a command waits on for acknowledgement, if any.
fn ack_key(command: &ClientMessage) -> Option<&MatchId> {
    match command {
        ClientMessage::GameStart { game_id, .. } => Some(game_id),
        ClientMessage::JoinGame { .. } | ClientMessage::TurnMove { .. } => None,
    }
}

/// Moves unacknowledged commands back to the front of `pending`, oldest first.
fn requeue_in_flight(pending: &mut VecDeque<ClientMessage>, in_flight: &mut VecDeque<ClientMessage>) {
    while let Some(command) = in_flight.pop_back() {
        pending.push_front(command);
    }
}

/// Flushes `pending`, then forwards new commands until the socket fails.
///
/// Returns `Ok` only when every command sender is gone.
async fn drive(
    stream: HostStream,
    pending: &mut VecDeque<ClientMessage>,
    in_flight: &mut VecDeque<ClientMessage>,
    commands: &mut mpsc::UnboundedReceiver<ClientMessage>,
) -> Result<(), LinkError> {
    let (mut sink, mut source) = stream.split();

    while let Some(command) = pending.pop_front() {
        deliver(&mut sink, pending, in_flight, command).await?;
    }

    loop {
        tokio::select! {
            command = commands.recv() => {
                let Some(command) = command else {
                    return Ok(());
                };
                deliver(&mut sink, pending, in_flight, command).await?;
            }
            frame = source.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    match serde_json::from_str::<ServerMessage>(text.as_str()) {
                        Ok(ServerMessage::GameStarted { game_id }) => {
                            in_flight.retain(|command| ack_key(command) != Some(&game_id));
                            debug!(%game_id, in_flight = in_flight.len(), "Game host confirmed match");
                        }
                        Ok(other) => debug!(reply = ?other, "Game host replied"),
                        Err(e) => warn!(error = %e, "Unreadable game host reply"),
                    }
                }
                Some(Ok(Message::Close(_))) | None => return Err(LinkError::Closed),
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
            },
        }
    }
}

/// Writes one command. On a transport failure the command is put back at
/// the front of `pending`; a command that cannot be encoded is dropped.
/// A written command that expects an acknowledgement joins `in_flight`.
async fn deliver<S>(
    sink: &mut S,
    pending: &mut VecDeque<ClientMessage>,
    in_flight: &mut VecDeque<ClientMessage>,
    command: ClientMessage,
) -> Result<(), LinkError>
where
    S: futures::Sink<Message, Error = tokio_tungstenite::tungstenite::Error> + Unpin,
{
    let text = match serde_json::to_string(&command) {
        Ok(text) => text,
        Err(e) => {
            warn!(error = %e, command = ?command, "Dropping unencodable command");
            return Ok(());
        }
    };
    if let Err(e) = sink.send(Message::text(text)).await {
        pending.push_front(command);
        return Err(e.into());
    }
    debug!(command = ?command, "Command sent to game host");
    if ack_key(&command).is_some() {
        in_flight.push_back(command);
    }
    Ok(())
}
