//! Tests for rating-based pairing.

use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use std::sync::{Arc, Mutex};
use strictly_arena::{
    ChannelConnection, ClientMessage, Connection, MatchCommandSink, MatchConnection, MatchFound,
    Matchmaker, MatchmakerMessage, MatchmakingConfig, PlayerId, QueueEntry, QueueRequest,
    find_pair,
};
use strictly_chess::Color;
use tokio::sync::mpsc::UnboundedReceiver;

#[derive(Debug, Default)]
struct RecordingSink {
    commands: Mutex<Vec<ClientMessage>>,
}

impl MatchCommandSink for RecordingSink {
    fn submit(&self, command: ClientMessage) {
        self.commands.lock().unwrap().push(command);
    }
}

fn matchmaker() -> (Matchmaker, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::default());
    (
        Matchmaker::new(MatchmakingConfig::default(), sink.clone()),
        sink,
    )
}

fn epoch() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap()
}

fn entry(
    player: &str,
    rating: i32,
    joined_at: DateTime<Utc>,
) -> (QueueEntry, UnboundedReceiver<MatchmakerMessage>) {
    let (connection, rx) = ChannelConnection::new();
    let connection: MatchConnection = Arc::new(connection);
    let entry = QueueEntry {
        connection,
        player_id: PlayerId::from(player),
        nick: format!("{}-nick", player),
        rating,
        joined_at,
        max_diff: 300,
        skin_setting: json!({ "owner": player }),
    };
    (entry, rx)
}

#[test]
fn test_close_ratings_pair_immediately() {
    let (matchmaker, sink) = matchmaker();
    let (a, mut a_rx) = entry("alice", 1200, epoch());
    let (b, mut b_rx) = entry("bob", 1240, epoch() + Duration::milliseconds(300));
    matchmaker.join(a);
    matchmaker.join(b);

    let now = epoch() + Duration::milliseconds(500);
    let pairing = matchmaker.sweep_at(now).expect("players within 50 pair");

    assert_eq!(pairing.white, PlayerId::from("alice"));
    assert_eq!(pairing.black, PlayerId::from("bob"));
    assert_eq!(pairing.game_id, format!("match_{}", now.timestamp_millis()));
    assert!(matchmaker.is_empty());

    let white_found = a_rx.try_recv().unwrap();
    assert_eq!(
        white_found,
        MatchmakerMessage::MatchFound(MatchFound {
            game_id: pairing.game_id.clone(),
            your_color: Color::White,
            opponent_nick: "bob-nick".to_string(),
            user_skin_setting: json!({ "owner": "alice" }),
            opponent_skin_setting: json!({ "owner": "bob" }),
        })
    );
    let MatchmakerMessage::MatchFound(black_found) = b_rx.try_recv().unwrap() else {
        panic!("expected MATCH_FOUND");
    };
    assert_eq!(black_found.your_color, Color::Black);
    assert_eq!(black_found.opponent_nick, "alice-nick");

    let commands = sink.commands.lock().unwrap();
    assert_eq!(
        *commands,
        vec![ClientMessage::GameStart {
            game_id: pairing.game_id,
            white: PlayerId::from("alice"),
            black: PlayerId::from("bob"),
            white_skin: Some(json!({ "owner": "alice" })),
            black_skin: Some(json!({ "owner": "bob" })),
        }]
    );
}

#[test]
fn test_tolerance_widens_while_waiting() {
    let (matchmaker, sink) = matchmaker();
    let (a, _a_rx) = entry("alice", 1200, epoch());
    let (b, _b_rx) = entry("bob", 1300, epoch());
    matchmaker.join(a);
    matchmaker.join(b);

    // gap 100 needs three steps: 50 + 3 * 20 = 110
    assert!(matchmaker.sweep_at(epoch()).is_none());
    assert!(matchmaker.sweep_at(epoch() + Duration::seconds(5)).is_none());
    assert_eq!(matchmaker.len(), 2);
    assert!(sink.commands.lock().unwrap().is_empty());

    assert!(matchmaker.sweep_at(epoch() + Duration::seconds(6)).is_some());
    assert!(matchmaker.is_empty());
}

#[test]
fn test_newcomer_limits_pairing() {
    let (matchmaker, _) = matchmaker();
    let (a, _a_rx) = entry("alice", 1200, epoch());
    let (b, _b_rx) = entry("bob", 1300, epoch() + Duration::seconds(30));
    matchmaker.join(a);
    matchmaker.join(b);

    // alice tolerates 300 by now, bob only 50
    assert!(matchmaker.sweep_at(epoch() + Duration::seconds(30)).is_none());
}

#[test]
fn test_max_diff_caps_tolerance() {
    let (matchmaker, _) = matchmaker();
    let (mut a, _a_rx) = entry("alice", 1200, epoch());
    a.max_diff = 80;
    let (b, _b_rx) = entry("bob", 1300, epoch());
    matchmaker.join(a);
    matchmaker.join(b);

    assert!(matchmaker.sweep_at(epoch() + Duration::minutes(10)).is_none());
}

#[test]
fn test_one_pair_per_sweep_in_queue_order() {
    let (matchmaker, _) = matchmaker();
    let (a, _a) = entry("alice", 1500, epoch());
    let (b, _b) = entry("bob", 1000, epoch() + Duration::seconds(1));
    let (c, _c) = entry("carol", 1010, epoch() + Duration::seconds(2));
    let (d, _d) = entry("dave", 1490, epoch() + Duration::seconds(3));
    for e in [a, b, c, d] {
        matchmaker.join(e);
    }

    let now = epoch() + Duration::seconds(3);
    let first = matchmaker.sweep_at(now).unwrap();
    assert_eq!(
        (first.white, first.black),
        (PlayerId::from("alice"), PlayerId::from("dave"))
    );
    assert_eq!(matchmaker.len(), 2);

    let second = matchmaker.sweep_at(now).unwrap();
    assert_eq!(
        (second.white, second.black),
        (PlayerId::from("bob"), PlayerId::from("carol"))
    );
}

#[test]
fn test_leave_and_rejoin() {
    let (matchmaker, _) = matchmaker();
    let (a, _a_rx) = entry("alice", 1200, epoch());
    let connection = a.connection.clone();
    matchmaker.join(a.clone());
    matchmaker.join(QueueEntry { rating: 1250, ..a });

    assert_eq!(matchmaker.len(), 1);
    assert!(matchmaker.is_queued(&PlayerId::from("alice")));

    assert!(matchmaker.leave(connection.id()));
    assert!(!matchmaker.leave(connection.id()));
    assert!(matchmaker.is_empty());
}

#[test]
fn test_second_socket_replaces_player_entry() {
    let (matchmaker, sink) = matchmaker();
    let (first_tab, mut first_rx) = entry("alice", 1200, epoch());
    let (second_tab, mut second_rx) = entry("alice", 1200, epoch());
    let first_connection = first_tab.connection.clone();
    matchmaker.join(first_tab);
    matchmaker.join(second_tab);

    assert_eq!(matchmaker.len(), 1);
    assert!(matchmaker.sweep_at(epoch()).is_none());
    assert!(sink.commands.lock().unwrap().is_empty());

    // The replaced socket closing later does not remove the live entry.
    assert!(!matchmaker.leave(first_connection.id()));
    assert!(matchmaker.is_queued(&PlayerId::from("alice")));

    let (b, _b_rx) = entry("bob", 1210, epoch());
    matchmaker.join(b);
    let pairing = matchmaker.sweep_at(epoch()).unwrap();
    assert_eq!(pairing.white, PlayerId::from("alice"));
    assert_eq!(pairing.black, PlayerId::from("bob"));
    assert!(first_rx.try_recv().is_err());
    assert!(matches!(
        second_rx.try_recv(),
        Ok(MatchmakerMessage::MatchFound(_))
    ));
}

#[test]
fn test_find_pair_skips_same_player() {
    let (a, _a_rx) = entry("alice", 1200, epoch());
    let (again, _again_rx) = entry("alice", 1200, epoch());
    let (b, _b_rx) = entry("bob", 1220, epoch());
    let config = MatchmakingConfig::default();

    assert_eq!(find_pair(&[a.clone(), again.clone()], epoch(), &config), None);
    assert_eq!(find_pair(&[a, again, b], epoch(), &config), Some((0, 2)));
}

#[test]
fn test_text_frames() {
    let (matchmaker, _) = matchmaker();
    let (connection, mut rx) = ChannelConnection::new();
    let connection: MatchConnection = Arc::new(connection);

    matchmaker.handle_text(
        &connection,
        r#"{"type":"JOIN_QUEUE","payload":{"usn":42,"nick":"kim","rating":1400}}"#,
    );
    assert!(matchmaker.is_queued(&PlayerId::from("42")));

    matchmaker.handle(&connection, QueueRequest::LeaveQueue);
    assert!(matchmaker.is_empty());

    matchmaker.handle_text(&connection, "{}");
    assert!(matches!(
        rx.try_recv(),
        Ok(MatchmakerMessage::Error { .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn test_started_sweeps_pair_players() {
    let (matchmaker, sink) = matchmaker();
    let now = Utc::now();
    let (a, _a_rx) = entry("alice", 1200, now);
    let (b, _b_rx) = entry("bob", 1210, now);
    matchmaker.join(a);
    matchmaker.join(b);

    let handle = matchmaker.start();
    tokio::time::sleep(std::time::Duration::from_millis(1500)).await;

    assert!(matchmaker.is_empty());
    assert_eq!(sink.commands.lock().unwrap().len(), 1);
    handle.stop();
}
