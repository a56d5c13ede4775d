//! Queue entries and the pairing rule.

use super::service::MatchConnection;
use crate::protocol::PlayerId;
use chrono::{DateTime, Utc};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A player waiting for an opponent.
#[derive(Debug, Clone)]
pub struct QueueEntry {
    /// Where `MATCH_FOUND` is delivered.
    pub connection: MatchConnection,
    /// Account number.
    pub player_id: PlayerId,
    /// Display name.
    pub nick: String,
    /// Current rating.
    pub rating: i32,
    /// When the player entered the queue.
    pub joined_at: DateTime<Utc>,
    /// Largest rating gap the player accepts.
    pub max_diff: u32,
    /// Cosmetic settings forwarded to the opponent and the game host.
    pub skin_setting: serde_json::Value,
}

impl QueueEntry {
    /// Time spent in the queue at `now`; zero if `now` precedes the join.
    pub fn waited(&self, now: DateTime<Utc>) -> Duration {
        (now - self.joined_at).to_std().unwrap_or_default()
    }
}

/// Tolerance schedule and sweep cadence.
#[derive(Debug, Clone, Getters, Serialize, Deserialize)]
pub struct MatchmakingConfig {
    /// Tolerance the moment a player joins.
    #[serde(default = "default_base_tolerance")]
    base_tolerance: u32,

    /// Tolerance added per completed step.
    #[serde(default = "default_tolerance_step")]
    tolerance_step: u32,

    /// Seconds of waiting per step.
    #[serde(default = "default_step_seconds")]
    step_seconds: u64,

    /// Ceiling used when a player sends no `maxDiff`.
    #[serde(default = "default_max_diff")]
    default_max_diff: u32,

    /// Milliseconds between sweeps.
    #[serde(default = "default_sweep_interval_ms")]
    sweep_interval_ms: u64,
}

fn default_base_tolerance() -> u32 {
    50
}

fn default_tolerance_step() -> u32 {
    20
}

fn default_step_seconds() -> u64 {
    2
}

fn default_max_diff() -> u32 {
    300
}

fn default_sweep_interval_ms() -> u64 {
    1000
}

impl Default for MatchmakingConfig {
    fn default() -> Self {
        Self {
            base_tolerance: default_base_tolerance(),
            tolerance_step: default_tolerance_step(),
            step_seconds: default_step_seconds(),
            default_max_diff: default_max_diff(),
            sweep_interval_ms: default_sweep_interval_ms(),
        }
    }
}

impl MatchmakingConfig {
    /// Time between sweeps.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }
}

/// Rating gap a player accepts after waiting `wait`.
///
/// Grows by `tolerance_step` for every full `step_seconds` waited, capped by
/// the player's own `max_diff`.
pub fn allowed_tolerance(wait: Duration, max_diff: u32, config: &MatchmakingConfig) -> u32 {
    let steps = wait.as_secs() / config.step_seconds.max(1);
    let widened = u64::from(config.base_tolerance)
        .saturating_add(steps.saturating_mul(u64::from(config.tolerance_step)));
    let widened = u32::try_from(widened).unwrap_or(u32::MAX);
    widened.min(max_diff)
}

/// First pair `(i, j)`, `i < j`, whose rating gap fits both tolerances.
///
/// Scans in queue order, so earlier-queued players are paired first.
/// Two entries for the same player never pair.
pub fn find_pair(
    queue: &[QueueEntry],
    now: DateTime<Utc>,
    config: &MatchmakingConfig,
) -> Option<(usize, usize)> {
    for (i, first) in queue.iter().enumerate() {
        let first_allowed = allowed_tolerance(first.waited(now), first.max_diff, config);
        for (offset, second) in queue[i + 1..].iter().enumerate() {
            if first.player_id == second.player_id {
                continue;
            }
            let second_allowed = allowed_tolerance(second.waited(now), second.max_diff, config);
            let gap = first.rating.abs_diff(second.rating);
            if gap <= first_allowed && gap <= second_allowed {
                return Some((i, i + 1 + offset));
            }
        }
    }
    None
}
