//! Game host: routes client frames to match sessions.

use crate::connection::{ChannelConnection, Connection, ConnectionId, pump_socket};
use crate::matchmaking::MatchCommandSink;
use crate::protocol::{ClientMessage, MatchId, PlayerId, ServerMessage};
use crate::registry::{SessionRegistry, lock_session};
use crate::session::PlayerConnection;
use axum::{
    Json, Router,
    body::Body,
    extract::{
        State,
        ws::{WebSocket, WebSocketUpgrade},
    },
    http::Request,
    response::Response,
    routing::get,
};
use derive_new::new;
use serde::Serialize;
use std::sync::Arc;
use tower::ServiceBuilder;
use tracing::{debug, info, instrument, warn};

/// The match seat a connection is bound to.
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct Seat {
    /// Match the connection joined.
    pub match_id: MatchId,
    /// Player the connection speaks for.
    pub player: PlayerId,
}

/// Transport-agnostic handler for game host frames.
#[derive(Debug, Clone)]
pub struct GameHost {
    registry: SessionRegistry,
}

impl GameHost {
    /// Creates a host over `registry`.
    pub fn new(registry: SessionRegistry) -> Self {
        Self { registry }
    }

    /// The sessions this host serves.
    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Parses and handles one text frame. Unparseable frames get an `ERROR`.
    pub fn handle_text(&self, connection: &PlayerConnection, seat: &mut Option<Seat>, text: &str) {
        match serde_json::from_str::<ClientMessage>(text) {
            Ok(message) => self.handle(connection, seat, message),
            Err(e) => {
                warn!(connection_id = connection.id(), error = %e, "Malformed frame");
                connection.send(ServerMessage::error(format!("Invalid message: {}", e)));
            }
        }
    }

    /// Handles one client message.
    ///
    /// `seat` tracks which player the connection is bound to, so the close
    /// handler can unbind it later.
    #[instrument(skip(self, connection, seat), fields(connection_id = connection.id()))]
    pub fn handle(
        &self,
        connection: &PlayerConnection,
        seat: &mut Option<Seat>,
        message: ClientMessage,
    ) {
        match message {
            ClientMessage::JoinGame { game_id, user_id } => {
                let Some(session) = self.registry.get(&game_id) else {
                    connection.send(ServerMessage::error(format!("Game not found: {}", game_id)));
                    return;
                };

                let new_seat = Seat::new(game_id, user_id);
                if let Some(old) = seat.take().filter(|old| *old != new_seat) {
                    self.handle_close(connection.id(), Some(old));
                }

                let bound = lock_session(&session).bind(new_seat.player.clone(), connection.clone());
                match bound {
                    Ok(()) => *seat = Some(new_seat),
                    Err(e) => connection.send(ServerMessage::error(e.to_string())),
                }
            }
            ClientMessage::TurnMove {
                game_id,
                from,
                to,
                promotion,
            } => {
                let Some(session) = self.registry.get(&game_id) else {
                    connection.send(ServerMessage::error(format!("Game not found: {}", game_id)));
                    return;
                };
                let mut session = lock_session(&session);
                let player = seat
                    .as_ref()
                    .filter(|s| s.match_id == game_id)
                    .map(|s| &s.player)
                    .filter(|player| session.connection_id_of(player) == Some(connection.id()));
                let Some(player) = player else {
                    warn!(match_id = %game_id, "Move from a connection not bound in the match");
                    connection.send(ServerMessage::error(format!(
                        "Join game {} before moving",
                        game_id
                    )));
                    return;
                };
                if let Err(e) = session.apply_player_move(player, from, to, promotion) {
                    info!(match_id = %game_id, %player, %from, %to, reason = %e, "Move rejected");
                }
            }
            ClientMessage::GameStart {
                game_id,
                white,
                black,
                ..
            } => {
                self.registry.create(game_id.clone(), white, black);
                connection.send(ServerMessage::GameStarted { game_id });
            }
        }
    }

    /// Close handler: unbinds the connection from its seat, if any.
    #[instrument(skip(self))]
    pub fn handle_close(&self, connection_id: ConnectionId, seat: Option<Seat>) {
        let Some(seat) = seat else {
            debug!("Unbound connection closed");
            return;
        };
        if let Some(session) = self.registry.get(&seat.match_id) {
            lock_session(&session).disconnect(&seat.player, connection_id);
        }
    }

    /// HTTP surface: WebSocket on `/` and `/ws`, plus `/sessions` and `/health`.
    pub fn router(self) -> Router {
        Router::new()
            .route("/", get(upgrade))
            .route("/ws", get(upgrade))
            .route("/sessions", get(list_sessions))
            .route("/health", get(health))
            .layer(ServiceBuilder::new().map_request(log_request))
            .with_state(self)
    }
}

impl MatchCommandSink for GameHost {
    /// In-process delivery, used when the matchmaker and host share a process.
    fn submit(&self, command: ClientMessage) {
        match command {
            ClientMessage::GameStart {
                game_id,
                white,
                black,
                ..
            } => {
                self.registry.create(game_id, white, black);
            }
            other => warn!(command = ?other, "Ignoring non-start command"),
        }
    }
}

pub(crate) fn log_request(req: Request<Body>) -> Request<Body> {
    info!(method = %req.method(), uri = %req.uri(), "Incoming HTTP request");
    req
}

async fn upgrade(State(host): State<GameHost>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| serve_socket(host, socket))
}

async fn serve_socket(host: GameHost, socket: WebSocket) {
    let (connection, outbound) = ChannelConnection::<ServerMessage>::new();
    let connection_id = connection.id();
    let connection: PlayerConnection = Arc::new(connection);
    info!(connection_id, "Player connected");

    let mut seat = None;
    pump_socket(socket, connection_id, outbound, |text| {
        host.handle_text(&connection, &mut seat, text)
    })
    .await;

    host.handle_close(connection_id, seat);
}

#[derive(Debug, Serialize)]
struct SessionList {
    sessions: Vec<MatchId>,
}

async fn list_sessions(State(host): State<GameHost>) -> Json<SessionList> {
    Json(SessionList {
        sessions: host.registry.list_ids(),
    })
}

async fn health() -> &'static str {
    "ok"
}
