//! Tests for the matchmaker's link to the game host.

use futures::{SinkExt, StreamExt};
use std::collections::BTreeSet;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use strictly_arena::{
    ClientMessage, GameHost, GameHostLink, LogOnlyRecorder, MatchCommandSink, PlayerId,
    ServerMessage, SessionRegistry,
};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{WebSocketStream, accept_async, tungstenite::Message};

fn game_start(game_id: &str) -> ClientMessage {
    ClientMessage::GameStart {
        game_id: game_id.to_string(),
        white: PlayerId::from("alice"),
        black: PlayerId::from("bob"),
        white_skin: None,
        black_skin: None,
    }
}

async fn serve_host(listener: TcpListener) -> SessionRegistry {
    let registry = SessionRegistry::new(Arc::new(LogOnlyRecorder));
    let app = GameHost::new(registry.clone()).router();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    registry
}

async fn wait_for(registry: &SessionRegistry, match_id: &str) -> bool {
    for _ in 0..100 {
        if registry.has(match_id) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}

#[tokio::test]
async fn test_link_creates_match_on_host() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let registry = serve_host(listener).await;

    let link = GameHostLink::spawn(format!("ws://{}/ws", addr), Duration::from_millis(50));
    link.submit(game_start("match_1"));
    link.submit(game_start("match_2"));

    assert!(wait_for(&registry, "match_1").await);
    assert!(wait_for(&registry, "match_2").await);
    link.stop();
}

#[tokio::test]
async fn test_commands_buffered_until_host_is_up() {
    let addr: SocketAddr = {
        let reserved = TcpListener::bind("127.0.0.1:0").await.unwrap();
        reserved.local_addr().unwrap()
    };

    let link = GameHostLink::spawn(format!("ws://{}/ws", addr), Duration::from_millis(50));
    link.submit(game_start("match_early"));
    tokio::time::sleep(Duration::from_millis(120)).await;

    let listener = TcpListener::bind(addr).await.unwrap();
    let registry = serve_host(listener).await;

    assert!(wait_for(&registry, "match_early").await);
    link.stop();
}

async fn accept_link(listener: &TcpListener) -> WebSocketStream<TcpStream> {
    let (stream, _) = tokio::time::timeout(Duration::from_secs(5), listener.accept())
        .await
        .expect("link connects")
        .unwrap();
    accept_async(stream).await.unwrap()
}

async fn next_game_id(socket: &mut WebSocketStream<TcpStream>) -> String {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), socket.next())
            .await
            .expect("frame arrives")
            .expect("socket open")
            .unwrap();
        if let Message::Text(text) = frame {
            match serde_json::from_str::<ClientMessage>(text.as_str()).unwrap() {
                ClientMessage::GameStart { game_id, .. } => return game_id,
                other => panic!("unexpected command {:?}", other),
            }
        }
    }
}

#[tokio::test]
async fn test_unacknowledged_start_resent_after_host_drops() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let link = GameHostLink::spawn(format!("ws://{}/ws", addr), Duration::from_millis(50));

    // First host reads the command, then dies without answering.
    link.submit(game_start("match_1"));
    let mut first = accept_link(&listener).await;
    assert_eq!(next_game_id(&mut first).await, "match_1");
    drop(first);

    link.submit(game_start("match_2"));

    let mut second = accept_link(&listener).await;
    let mut seen = BTreeSet::new();
    while seen.len() < 2 {
        let game_id = next_game_id(&mut second).await;
        let ack = serde_json::to_string(&ServerMessage::GameStarted {
            game_id: game_id.clone(),
        })
        .unwrap();
        second.send(Message::text(ack)).await.unwrap();
        seen.insert(game_id);
    }

    assert_eq!(
        seen.into_iter().collect::<Vec<_>>(),
        ["match_1", "match_2"]
    );
    link.stop();
}
