//! The matchmaking service: queue ownership, sweeps and the socket surface.

use super::MatchCommandSink;
use super::queue::{MatchmakingConfig, QueueEntry, find_pair};
use super::wire::{MatchFound, MatchmakerMessage, QueueRequest};
use crate::connection::{ChannelConnection, Connection, ConnectionId, pump_socket};
use crate::host::log_request;
use crate::protocol::{ClientMessage, MatchId, PlayerId};
use axum::{
    Json, Router,
    extract::{
        State,
        ws::{WebSocket, WebSocketUpgrade},
    },
    response::Response,
    routing::get,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use strictly_chess::Color;
use tokio::task::JoinHandle;
use tower::ServiceBuilder;
use tracing::{debug, info, instrument, warn};

/// Outbound handle for a queued player.
pub type MatchConnection = Arc<dyn Connection<MatchmakerMessage>>;

/// Two players taken off the queue together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pairing {
    /// Match id sent to the game host.
    pub game_id: MatchId,
    /// Earlier-queued player.
    pub white: PlayerId,
    /// Later-queued player.
    pub black: PlayerId,
}

/// Owns the waiting queue and pairs players on each sweep.
///
/// Cloning yields another handle to the same queue.
#[derive(Debug, Clone)]
pub struct Matchmaker {
    queue: Arc<Mutex<Vec<QueueEntry>>>,
    config: MatchmakingConfig,
    sink: Arc<dyn MatchCommandSink>,
}

impl Matchmaker {
    /// Creates a matchmaker that sends match-creation commands to `sink`.
    #[instrument(skip(sink))]
    pub fn new(config: MatchmakingConfig, sink: Arc<dyn MatchCommandSink>) -> Self {
        info!("Creating matchmaker");
        Self {
            queue: Arc::new(Mutex::new(Vec::new())),
            config,
            sink,
        }
    }

    fn queue(&self) -> MutexGuard<'_, Vec<QueueEntry>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Tolerance schedule in use.
    pub fn config(&self) -> &MatchmakingConfig {
        &self.config
    }

    /// Appends a player. A later join from the same connection, or from
    /// another connection of the same player, replaces the earlier entry.
    #[instrument(skip(self, entry), fields(player_id = %entry.player_id, rating = entry.rating))]
    pub fn join(&self, entry: QueueEntry) {
        let mut queue = self.queue();
        let connection_id = entry.connection.id();
        let before = queue.len();
        queue.retain(|queued| {
            queued.connection.id() != connection_id && queued.player_id != entry.player_id
        });
        if queue.len() != before {
            debug!("Replaced earlier queue entry");
        }
        queue.push(entry);
        info!(queued = queue.len(), "Player entered the queue");
    }

    /// Removes the entry owned by `connection_id`. Returns whether one existed.
    #[instrument(skip(self))]
    pub fn leave(&self, connection_id: ConnectionId) -> bool {
        let mut queue = self.queue();
        let before = queue.len();
        queue.retain(|queued| queued.connection.id() != connection_id);
        let removed = queue.len() != before;
        if removed {
            info!(queued = queue.len(), "Player left the queue");
        }
        removed
    }

    /// Number of waiting players.
    pub fn len(&self) -> usize {
        self.queue().len()
    }

    /// Whether nobody is waiting.
    pub fn is_empty(&self) -> bool {
        self.queue().is_empty()
    }

    /// Whether `player` is waiting.
    pub fn is_queued(&self, player: &PlayerId) -> bool {
        self.queue().iter().any(|queued| queued.player_id == *player)
    }

    /// Handles one decoded request from `connection`.
    #[instrument(skip(self, connection), fields(connection_id = connection.id()))]
    pub fn handle(&self, connection: &MatchConnection, request: QueueRequest) {
        match request {
            QueueRequest::JoinQueue(join) => self.join(QueueEntry {
                connection: connection.clone(),
                player_id: join.usn,
                nick: join.nick,
                rating: join.rating,
                joined_at: Utc::now(),
                max_diff: join.max_diff.unwrap_or(*self.config.default_max_diff()),
                skin_setting: join.skin_setting,
            }),
            QueueRequest::LeaveQueue => {
                self.leave(connection.id());
            }
        }
    }

    /// Parses and handles one text frame. Unparseable frames get an `ERROR`.
    pub fn handle_text(&self, connection: &MatchConnection, text: &str) {
        match serde_json::from_str::<QueueRequest>(text) {
            Ok(request) => self.handle(connection, request),
            Err(e) => {
                warn!(connection_id = connection.id(), error = %e, "Malformed frame");
                connection.send(MatchmakerMessage::Error {
                    message: format!("Invalid message: {}", e),
                });
            }
        }
    }

    /// Sweeps the queue as of now.
    pub fn sweep(&self) -> Option<Pairing> {
        self.sweep_at(Utc::now())
    }

    /// Pairs at most one couple as of `now`.
    ///
    /// Both entries leave the queue, the game host gets `GAME_START` and
    /// each player gets `MATCH_FOUND`. The earlier-queued player is white.
    #[instrument(skip(self))]
    pub fn sweep_at(&self, now: DateTime<Utc>) -> Option<Pairing> {
        let (white, black) = {
            let mut queue = self.queue();
            let (i, j) = find_pair(&queue, now, &self.config)?;
            let black = queue.remove(j);
            let white = queue.remove(i);
            (white, black)
        };

        let game_id = format!("match_{}", now.timestamp_millis());
        info!(
            %game_id,
            white = %white.player_id,
            white_rating = white.rating,
            white_waited_s = white.waited(now).as_secs(),
            black = %black.player_id,
            black_rating = black.rating,
            black_waited_s = black.waited(now).as_secs(),
            "Match made"
        );

        self.sink.submit(ClientMessage::GameStart {
            game_id: game_id.clone(),
            white: white.player_id.clone(),
            black: black.player_id.clone(),
            white_skin: Some(white.skin_setting.clone()),
            black_skin: Some(black.skin_setting.clone()),
        });

        notify(&white, &black, Color::White, &game_id);
        notify(&black, &white, Color::Black, &game_id);

        Some(Pairing {
            game_id,
            white: white.player_id,
            black: black.player_id,
        })
    }

    /// Starts the periodic sweep on the current runtime.
    pub fn start(&self) -> MatchmakerHandle {
        let matchmaker = self.clone();
        let interval = self.config.sweep_interval();
        info!(interval_ms = interval.as_millis() as u64, "Starting matchmaking sweeps");
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                matchmaker.sweep();
            }
        });
        MatchmakerHandle { task }
    }

    /// HTTP surface: WebSocket on `/` and `/ws`, plus `/queue` and `/health`.
    pub fn router(self) -> Router {
        Router::new()
            .route("/", get(upgrade))
            .route("/ws", get(upgrade))
            .route("/queue", get(queue_status))
            .route("/health", get(health))
            .layer(ServiceBuilder::new().map_request(log_request))
            .with_state(self)
    }
}

fn notify(recipient: &QueueEntry, opponent: &QueueEntry, color: Color, game_id: &MatchId) {
    recipient
        .connection
        .send(MatchmakerMessage::MatchFound(MatchFound {
            game_id: game_id.clone(),
            your_color: color,
            opponent_nick: opponent.nick.clone(),
            user_skin_setting: recipient.skin_setting.clone(),
            opponent_skin_setting: opponent.skin_setting.clone(),
        }));
}

/// Running sweep task.
#[derive(Debug)]
pub struct MatchmakerHandle {
    task: JoinHandle<()>,
}

impl MatchmakerHandle {
    /// Stops sweeping. Queued players stay queued.
    pub fn stop(self) {
        self.task.abort();
        info!("Matchmaking sweeps stopped");
    }

    /// Whether the sweep task has ended.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

async fn upgrade(State(matchmaker): State<Matchmaker>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| serve_socket(matchmaker, socket))
}

async fn serve_socket(matchmaker: Matchmaker, socket: WebSocket) {
    let (connection, outbound) = ChannelConnection::<MatchmakerMessage>::new();
    let connection_id = connection.id();
    let connection: MatchConnection = Arc::new(connection);
    debug!(connection_id, "Matchmaking client connected");

    pump_socket(socket, connection_id, outbound, |text| {
        matchmaker.handle_text(&connection, text)
    })
    .await;

    matchmaker.leave(connection_id);
}

#[derive(Debug, Serialize)]
struct QueueStatus {
    queued: usize,
}

async fn queue_status(State(matchmaker): State<Matchmaker>) -> Json<QueueStatus> {
    Json(QueueStatus {
        queued: matchmaker.len(),
    })
}

async fn health() -> &'static str {
    "ok"
}
