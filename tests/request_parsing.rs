// tests/request_parsing.rs

use execd::protocol::request::{KillParams, SpawnParams};
use execd::protocol::{RawRequest, Request, RequestError};
use serde_json::json;

fn parse(method: &str, params: serde_json::Value) -> Result<Request, RequestError> {
    Request::from_raw(RawRequest::new(method, params))
}

#[test]
fn test_every_registered_method_parses_with_minimal_params() {
    let minimal = |method: &str| match method {
        "createVM" | "startVM" => json!({ "bundlePath": "/b" }),
        "spawn" => json!({ "id": "s", "command": "true" }),
        "kill" | "isProcessRunning" => json!({ "id": "s" }),
        "writeStdin" => json!({ "id": "s", "data": "x" }),
        "mountPath" => json!({ "name": "n", "subpath": "p" }),
        "readFile" | "installSdk" => json!({ "path": "/p" }),
        "addApprovedOauthToken" => json!({ "token": "t" }),
        _ => json!({}),
    };

    for method in execd::protocol::request::METHODS {
        let request = parse(method, minimal(method))
            .unwrap_or_else(|e| panic!("{method} should parse: {e}"));
        assert_eq!(request.method(), *method);
    }
}

#[test]
fn test_unknown_method_message() {
    let err = parse("rebootHost", json!({})).unwrap_err();
    assert_eq!(err.to_string(), "Unknown method: rebootHost");
}

#[test]
fn test_missing_params_default_to_empty_object() {
    let raw: RawRequest = serde_json::from_str(r#"{"method":"isRunning"}"#).unwrap();
    assert_eq!(Request::from_raw(raw).unwrap(), Request::IsRunning);

    let raw: RawRequest = serde_json::from_str(r#"{"method":"configure","params":null}"#).unwrap();
    assert!(matches!(Request::from_raw(raw).unwrap(), Request::Configure(_)));
}

#[test]
fn test_invalid_params_name_the_method() {
    let err = parse("spawn", json!({ "id": "s" })).unwrap_err();
    let msg = err.to_string();
    assert!(msg.starts_with("Invalid params for spawn: "), "got: {msg}");
    assert!(msg.contains("command"), "got: {msg}");
}

#[test]
fn test_spawn_params_use_camel_case_and_defaults() {
    let request = parse(
        "spawn",
        json!({
            "id": "s1",
            "command": "/bin/echo",
            "args": ["hi"],
            "sharedCwd": "work/repo",
            "oneShot": true,
            "env": { "A": "1" },
            "ignored": 42
        }),
    )
    .unwrap();

    let Request::Spawn(p) = request else {
        panic!("expected spawn");
    };
    assert_eq!(
        p,
        SpawnParams {
            id: "s1".into(),
            name: String::new(),
            command: "/bin/echo".into(),
            args: vec!["hi".into()],
            cwd: None,
            env: [("A".to_string(), "1".to_string())].into_iter().collect(),
            shared_cwd: Some("work/repo".into()),
            one_shot: true,
        }
    );
}

#[test]
fn test_configure_uses_wire_field_names() {
    let Request::Configure(p) = parse("configure", json!({ "memoryMB": 2048 })).unwrap() else {
        panic!("expected configure");
    };
    assert_eq!(p.memory_mb, Some(2048));
    assert_eq!(p.cpu_count, None);
}

#[test]
fn test_kill_signal_is_optional() {
    let Request::Kill(p) = parse("kill", json!({ "id": "x" })).unwrap() else {
        panic!("expected kill");
    };
    assert_eq!(
        p,
        KillParams {
            id: "x".into(),
            signal: None
        }
    );
}
