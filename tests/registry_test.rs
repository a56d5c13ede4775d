//! Tests for the session registry.

use std::sync::Arc;
use strictly_arena::{
    ChannelConnection, LogOnlyRecorder, PlayerConnection, PlayerId, SessionRegistry,
    lock_session,
};

fn registry() -> SessionRegistry {
    SessionRegistry::new(Arc::new(LogOnlyRecorder))
}

#[test]
fn test_create_is_idempotent() {
    let registry = registry();
    let first = registry.create(
        "match_1".to_string(),
        PlayerId::from("alice"),
        PlayerId::from("bob"),
    );
    lock_session(&first)
        .apply_move("e2".parse().unwrap(), "e4".parse().unwrap(), None)
        .unwrap();

    let second = registry.create(
        "match_1".to_string(),
        PlayerId::from("carol"),
        PlayerId::from("dave"),
    );

    assert!(Arc::ptr_eq(&first, &second));
    let session = lock_session(&second);
    assert_eq!(session.white(), &PlayerId::from("alice"));
    assert_eq!(session.log().len(), 1);
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_get_has_delete() {
    let registry = registry();
    assert!(registry.is_empty());
    assert!(registry.get("match_1").is_none());

    registry.create(
        "match_1".to_string(),
        PlayerId::from("alice"),
        PlayerId::from("bob"),
    );
    assert!(registry.has("match_1"));
    assert!(registry.get("match_1").is_some());

    assert!(registry.delete("match_1"));
    assert!(!registry.delete("match_1"));
    assert!(!registry.has("match_1"));
}

#[test]
fn test_list_ids_sorted() {
    let registry = registry();
    for id in ["match_3", "match_1", "match_2"] {
        registry.create(id.to_string(), PlayerId::from("a"), PlayerId::from("b"));
    }
    assert_eq!(registry.list_ids(), ["match_1", "match_2", "match_3"]);
}

#[test]
fn test_cleanup_removes_only_idle_sessions() {
    let registry = registry();
    let busy = registry.create(
        "busy".to_string(),
        PlayerId::from("alice"),
        PlayerId::from("bob"),
    );
    registry.create(
        "idle".to_string(),
        PlayerId::from("carol"),
        PlayerId::from("dave"),
    );

    let (connection, _rx) = ChannelConnection::new();
    let connection: PlayerConnection = Arc::new(connection);
    lock_session(&busy)
        .bind(PlayerId::from("alice"), connection)
        .unwrap();

    assert_eq!(registry.cleanup(), vec!["idle".to_string()]);
    assert_eq!(registry.list_ids(), ["busy"]);
    assert!(registry.cleanup().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_spawned_cleanup_runs_after_interval() {
    let registry = registry();
    registry.create(
        "idle".to_string(),
        PlayerId::from("alice"),
        PlayerId::from("bob"),
    );
    let task = registry.spawn_cleanup(std::time::Duration::from_secs(300));

    tokio::time::sleep(std::time::Duration::from_secs(10)).await;
    assert!(registry.has("idle"));

    tokio::time::sleep(std::time::Duration::from_secs(300)).await;
    assert!(!registry.has("idle"));
    task.abort();
}
