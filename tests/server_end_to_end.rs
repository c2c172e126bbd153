// tests/server_end_to_end.rs

mod common;

use std::os::unix::fs::PermissionsExt;
use std::time::Duration;

use common::{
    init_tracing, stdout_of, with_timeout, SpawnParamsBuilder, TestClient, TestDaemon,
};
use execd::protocol::Event;
use execd::rpc::host_files::MAX_READ_FILE_BYTES;
use execd::server::listener;
use serde_json::json;

#[tokio::test]
async fn test_spawn_echo_scenario() {
    init_tracing();
    let daemon = TestDaemon::start().await.unwrap();
    let mut client = daemon.subscriber().await.unwrap();

    let response = with_timeout(client.call(
        "spawn",
        json!({ "id": "s1", "command": "/bin/echo", "args": ["hi"] }),
    ))
    .await
    .unwrap();
    assert!(response.success);
    assert_eq!(response.result, Some(json!({})));

    let events = with_timeout(client_events(&mut client, "s1")).await;
    assert_eq!(stdout_of(&events), "hi\n");
    assert_eq!(
        serde_json::to_value(events.last().unwrap()).unwrap(),
        json!({ "type": "exit", "id": "s1", "exitCode": 0, "signal": null })
    );

    daemon.stop().await.unwrap();
}

async fn client_events(client: &mut TestClient, id: &str) -> Vec<Event> {
    client.events_until_exit(id).await.unwrap()
}

#[tokio::test]
async fn test_unknown_method_keeps_connection_alive() {
    init_tracing();
    let daemon = TestDaemon::start().await.unwrap();
    let mut client = daemon.client().await.unwrap();

    let response = with_timeout(client.call("rebootHost", json!({}))).await.unwrap();
    assert!(!response.success);
    assert_eq!(response.error.as_deref(), Some("Unknown method: rebootHost"));

    let running = with_timeout(client.call_ok("isRunning", json!({}))).await.unwrap();
    assert_eq!(running, json!({ "running": false }));

    daemon.stop().await.unwrap();
}

#[tokio::test]
async fn test_handler_error_is_reported_as_failure() {
    init_tracing();
    let daemon = TestDaemon::start().await.unwrap();
    let mut client = daemon.client().await.unwrap();

    let response = with_timeout(client.call("kill", json!({ "id": "x", "signal": "SIGWHAT" })))
        .await
        .unwrap();
    assert!(!response.success);
    assert!(response.error.unwrap().contains("SIGWHAT"));

    let response = with_timeout(client.call("spawn", json!({ "id": "x" }))).await.unwrap();
    assert!(!response.success);
    assert!(response.error.unwrap().starts_with("Invalid params for spawn"));

    let ok = with_timeout(client.call_ok("isGuestConnected", json!({}))).await.unwrap();
    assert_eq!(ok, json!({ "connected": false }));

    daemon.stop().await.unwrap();
}

#[tokio::test]
async fn test_malformed_frame_is_skipped() {
    init_tracing();
    let daemon = TestDaemon::start().await.unwrap();
    let mut client = daemon.client().await.unwrap();

    client.send_payload(b"this is not json").await.unwrap();
    // Let the daemon consume the garbage on its own before the next frame.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let running = with_timeout(client.call_ok("isRunning", json!({}))).await.unwrap();
    assert_eq!(running, json!({ "running": false }));

    daemon.stop().await.unwrap();
}

#[tokio::test]
async fn test_vm_lifecycle_over_the_wire() {
    init_tracing();
    let daemon = TestDaemon::start().await.unwrap();
    let mut client = daemon.subscriber().await.unwrap();

    with_timeout(client.call_ok("configure", json!({ "memoryMB": 2048, "cpuCount": 4 })))
        .await
        .unwrap();
    with_timeout(client.call_ok("createVM", json!({ "bundlePath": "/b" })))
        .await
        .unwrap();
    with_timeout(client.call_ok("startVM", json!({ "bundlePath": "/b" })))
        .await
        .unwrap();

    let connected = with_timeout(client.next_event()).await.unwrap();
    assert_eq!(
        serde_json::to_value(connected).unwrap(),
        json!({ "type": "networkStatus", "status": "connected" })
    );
    let reachable = with_timeout(client.next_event()).await.unwrap();
    assert_eq!(
        serde_json::to_value(reachable).unwrap(),
        json!({ "type": "apiReachability", "status": "reachable" })
    );
    assert_eq!(
        with_timeout(client.call_ok("isGuestConnected", json!({}))).await.unwrap(),
        json!({ "connected": true })
    );

    with_timeout(client.call_ok("stopVM", json!({}))).await.unwrap();
    assert_eq!(
        with_timeout(client.call_ok("isRunning", json!({}))).await.unwrap(),
        json!({ "running": false })
    );
    assert_eq!(
        with_timeout(client.call_ok("isGuestConnected", json!({}))).await.unwrap(),
        json!({ "connected": false })
    );

    daemon.stop().await.unwrap();
}

#[tokio::test]
async fn test_not_found_spawn_over_the_wire() {
    init_tracing();
    let daemon = TestDaemon::start().await.unwrap();
    let mut client = daemon.subscriber().await.unwrap();

    let spawn = SpawnParamsBuilder::new("nf", "execd-no-such-command-xyz");
    with_timeout(client.call_ok("spawn", spawn.to_json())).await.unwrap();

    let events = with_timeout(client_events(&mut client, "nf")).await;
    assert_eq!(events.len(), 2);
    assert!(matches!(events[0], Event::Stderr { .. }));
    assert!(matches!(events[1], Event::Exit { exit_code: Some(127), .. }));

    let running = with_timeout(client.call_ok("isProcessRunning", json!({ "id": "nf" })))
        .await
        .unwrap();
    assert_eq!(running, json!({ "running": false }));

    daemon.stop().await.unwrap();
}

#[tokio::test]
async fn test_disconnected_subscriber_does_not_affect_others() {
    init_tracing();
    let daemon = TestDaemon::start().await.unwrap();
    let mut stays = daemon.subscriber().await.unwrap();
    let leaves = daemon.subscriber().await.unwrap();
    drop(leaves);

    with_timeout(stays.call_ok(
        "spawn",
        json!({ "id": "e", "command": "/bin/echo", "args": ["ok"] }),
    ))
    .await
    .unwrap();
    let events = with_timeout(client_events(&mut stays, "e")).await;
    assert_eq!(stdout_of(&events), "ok\n");

    // Eventually only the live subscriber remains.
    with_timeout(async {
        while daemon.daemon.hub.subscriber_count() != 1 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;

    daemon.stop().await.unwrap();
}

#[tokio::test]
async fn test_host_file_handlers() {
    init_tracing();
    let daemon = TestDaemon::start().await.unwrap();
    let mut client = daemon.client().await.unwrap();

    let notes = daemon.home().join("notes.txt");
    std::fs::write(&notes, "remember\n").unwrap();
    let tool = daemon.home().join("tool.sh");
    std::fs::write(&tool, "#!/bin/sh\necho tool \"$@\"\n").unwrap();
    std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755)).unwrap();

    let mounted = with_timeout(
        client.call_ok("mountPath", json!({ "name": "w", "subpath": "work" })),
    )
    .await
    .unwrap();
    assert_eq!(
        mounted,
        json!({ "name": "w", "hostPath": daemon.home().join("work").to_str().unwrap() })
    );

    let escape = with_timeout(client.call("mountPath", json!({ "name": "w", "subpath": "../x" })))
        .await
        .unwrap();
    assert!(!escape.success);

    let read = with_timeout(
        client.call_ok("readFile", json!({ "path": "/sessions/abc/mnt/notes.txt" })),
    )
    .await
    .unwrap();
    assert_eq!(read, json!({ "content": "remember\n" }));

    let installed = with_timeout(client.call_ok(
        "installSdk",
        json!({ "path": tool.to_str().unwrap(), "version": "2.0.0" }),
    ))
    .await
    .unwrap();
    let digest = blake3::hash(&std::fs::read(&tool).unwrap()).to_hex().to_string();
    assert_eq!(installed["digest"], json!(digest));
    assert_eq!(installed["version"], json!("2.0.0"));

    with_timeout(client.call_ok("addApprovedOauthToken", json!({ "token": "tok" })))
        .await
        .unwrap();
    assert!(daemon.daemon.credentials.is_approved("tok"));

    daemon.stop().await.unwrap();
}

#[tokio::test]
async fn test_read_file_too_large_for_one_frame_fails_instead_of_hanging() {
    init_tracing();
    let daemon = TestDaemon::start().await.unwrap();
    let mut client = daemon.client().await.unwrap();

    let big = daemon.home().join("big.bin");
    std::fs::write(&big, vec![b'a'; MAX_READ_FILE_BYTES as usize + 1024]).unwrap();
    let refused = with_timeout(client.call("readFile", json!({ "path": big.to_str().unwrap() })))
        .await
        .unwrap();
    assert!(!refused.success);
    assert!(refused.error.unwrap().contains("too large"));

    // Under the size limit, but every quote doubles once JSON-escaped.
    let quotes = daemon.home().join("quotes.txt");
    std::fs::write(&quotes, vec![b'"'; MAX_READ_FILE_BYTES as usize - 64]).unwrap();
    let overflow = with_timeout(
        client.call("readFile", json!({ "path": quotes.to_str().unwrap() })),
    )
    .await
    .unwrap();
    assert!(!overflow.success);
    assert!(overflow.error.unwrap().contains("Frame too large"));

    // The connection is still usable.
    let running = with_timeout(client.call_ok("isRunning", json!({}))).await.unwrap();
    assert_eq!(running, json!({ "running": false }));

    daemon.stop().await.unwrap();
}

#[tokio::test]
async fn test_shutdown_removes_socket_and_kills_sessions() {
    init_tracing();
    let daemon = TestDaemon::start().await.unwrap();
    let mut client = daemon.client().await.unwrap();
    with_timeout(client.call_ok("spawn", json!({ "id": "long", "command": "cat" })))
        .await
        .unwrap();

    let socket = daemon.socket_path().to_path_buf();
    let state = daemon.daemon.clone();
    assert!(socket.exists());
    assert_eq!(
        std::fs::metadata(&socket).unwrap().permissions().mode() & 0o777,
        0o600
    );

    daemon.stop().await.unwrap();
    assert!(!socket.exists());
    assert!(!state.supervisor.is_running("long"));
}

#[tokio::test]
async fn test_stale_socket_file_is_replaced() {
    init_tracing();
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("execd.sock");
    std::fs::write(&path, b"left over").unwrap();

    let listener = listener::bind(&path).unwrap();
    assert!(path.exists());
    drop(listener);
    listener::remove_socket_file(&path);
    assert!(!path.exists());
}
