//! The tokio session loop: ticking, input forwarding and unmount.

use std::time::Duration;

use serde_json::json;

use unlock_core::game_registry::GameTypeId;
use unlock_core::game_trait::{GameEvent, GameInput};
use unlock_shell::config::ShellConfig;
use unlock_shell::game_loop::{SessionBroadcast, completion_channel, spawn_session};
use unlock_shell::mount_invite_game;

const WAIT: Duration = Duration::from_secs(5);

#[tokio::test]
async fn wheel_spin_completes_through_loop() {
    let (callback, done_rx) = completion_channel();
    let session = mount_invite_game(
        &ShellConfig::default(),
        Some("wheel"),
        &json!({"spin_ms": 200, "seed": 3}),
        callback,
    );
    let handle = spawn_session(session, 120.0);
    handle.input(GameInput::Tap).unwrap();

    let result = tokio::time::timeout(WAIT, done_rx)
        .await
        .expect("wheel should stop within the timeout")
        .unwrap()
        .unwrap();
    assert_eq!(result.game, GameTypeId::Wheel);
    assert!(!result.label.is_empty());
    handle.unmount().await;
}

#[tokio::test]
async fn completed_event_is_broadcast() {
    let (callback, _done_rx) = completion_channel();
    let session = mount_invite_game(
        &ShellConfig::default(),
        Some("lockpick"),
        &json!({"holdMs": 100}),
        callback,
    );
    let mut handle = spawn_session(session, 120.0);
    handle.input(GameInput::PointerDown { x: 0.0, y: 0.0 }).unwrap();

    let completed = tokio::time::timeout(WAIT, async {
        while let Some(msg) = handle.next_event().await {
            if let SessionBroadcast::Event(GameEvent::Completed { result }) = msg {
                return result;
            }
        }
        None
    })
    .await
    .unwrap();
    assert_eq!(completed.unwrap().label, "Unlocked");
}

#[tokio::test]
async fn unmount_ends_loop_without_completion() {
    let (callback, done_rx) = completion_channel();
    let session = mount_invite_game(
        &ShellConfig::default(),
        Some("wheel"),
        &json!({"spin_ms": 60000}),
        callback,
    );
    let mut handle = spawn_session(session, 60.0);
    handle.input(GameInput::Tap).unwrap();
    handle.send(unlock_shell::game_loop::SessionCommand::Unmount).unwrap();

    let ended = tokio::time::timeout(WAIT, async {
        while let Some(msg) = handle.next_event().await {
            if msg == SessionBroadcast::Ended {
                return true;
            }
        }
        false
    })
    .await
    .unwrap();
    assert!(ended);
    // The callback was dropped with the session, never invoked
    assert!(done_rx.await.is_err());
}

#[tokio::test]
async fn input_after_loop_exit_is_an_error() {
    let (callback, _done_rx) = completion_channel();
    let session = mount_invite_game(&ShellConfig::default(), Some("memory"), &json!({}), callback);
    let mut handle = spawn_session(session, 60.0);
    handle.send(unlock_shell::game_loop::SessionCommand::Unmount).unwrap();
    while let Some(msg) = tokio::time::timeout(WAIT, handle.next_event()).await.unwrap() {
        if msg == SessionBroadcast::Ended {
            break;
        }
    }
    // Give the task a moment to drop its receiver
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(handle.input(GameInput::Tap).is_err());
}
