//! Reporting finished games to the match-log service.

use crate::{GameResult, MatchId, PlayerId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// A completed match as stored by the match log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinishedGame {
    /// Match identifier.
    pub match_id: MatchId,
    /// Player with the white pieces.
    pub white_player: PlayerId,
    /// Player with the black pieces.
    pub black_player: PlayerId,
    /// Terminal result.
    pub result: GameResult,
    /// Annotations in play order.
    pub move_log: Vec<String>,
    /// When the final move was applied.
    pub finished_at: DateTime<Utc>,
}

/// Receives every game that reaches a terminal result.
///
/// Implementations must not block: the call happens while the session is
/// locked.
pub trait MatchRecorder: Send + Sync + std::fmt::Debug {
    /// Records one finished game. Failures are the implementation's concern.
    fn record(&self, game: FinishedGame);
}

/// Posts finished games as JSON to an HTTP endpoint.
#[derive(Debug, Clone)]
pub struct HttpMatchRecorder {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpMatchRecorder {
    /// Creates a recorder posting to `endpoint`.
    #[instrument]
    pub fn new(endpoint: String) -> Self {
        info!("Match log recorder configured");
        Self {
            client: reqwest::Client::new(),
            endpoint,
        }
    }

    /// Target URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl MatchRecorder for HttpMatchRecorder {
    #[instrument(skip(self, game), fields(match_id = %game.match_id, result = %game.result))]
    fn record(&self, game: FinishedGame) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("No async runtime available, finished game not recorded");
            return;
        };

        let client = self.client.clone();
        let endpoint = self.endpoint.clone();
        runtime.spawn(async move {
            let response = client.post(&endpoint).json(&game).send().await;
            match response.and_then(reqwest::Response::error_for_status) {
                Ok(resp) => debug!(
                    match_id = %game.match_id,
                    status = %resp.status(),
                    "Finished game recorded"
                ),
                Err(e) => warn!(
                    match_id = %game.match_id,
                    error = %e,
                    "Failed to record finished game"
                ),
            }
        });
    }
}

/// Logs finished games without sending them anywhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogOnlyRecorder;

impl MatchRecorder for LogOnlyRecorder {
    fn record(&self, game: FinishedGame) {
        info!(
            match_id = %game.match_id,
            white = %game.white_player,
            black = %game.black_player,
            result = %game.result,
            plies = game.move_log.len(),
            "Game finished"
        );
    }
}

/// Recorder for an optional match-log endpoint.
pub fn recorder_for(endpoint: Option<&str>) -> Arc<dyn MatchRecorder> {
    match endpoint {
        Some(url) => Arc::new(HttpMatchRecorder::new(url.to_string())),
        None => Arc::new(LogOnlyRecorder),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finished_game_wire_shape() {
        let game = FinishedGame {
            match_id: "match_1".to_string(),
            white_player: PlayerId::from("alice"),
            black_player: PlayerId::from("bob"),
            result: GameResult::Draw,
            move_log: vec!["e4".to_string()],
            finished_at: DateTime::from_timestamp(0, 0).unwrap(),
        };
        let json = serde_json::to_value(&game).unwrap();
        assert_eq!(json["matchId"], "match_1");
        assert_eq!(json["whitePlayer"], "alice");
        assert_eq!(json["result"], "draw");
        assert_eq!(json["moveLog"][0], "e4");
        assert!(json["finishedAt"].is_string());
    }

    #[test]
    fn test_recorder_for_endpoint() {
        let recorder = recorder_for(Some("http://logs.local/matches"));
        assert!(format!("{:?}", recorder).contains("logs.local"));
    }
}
