// tests/framing.rs

use execd::errors::DaemonError;
use execd::protocol::framing::encode_payload;
use execd::protocol::{encode_frame, Event, FrameDecoder, RawRequest, Response, MAX_FRAME_SIZE};
use execd::types::NetworkStatus;
use serde_json::json;

#[test]
fn test_multiple_frames_in_one_read_are_all_decoded() {
    let mut bytes = Vec::new();
    for i in 0..3 {
        bytes.extend(encode_frame(&RawRequest::new("isRunning", json!({ "n": i }))).unwrap());
    }

    let mut decoder = FrameDecoder::new();
    let decoded: Vec<RawRequest> = decoder.feed(&bytes);

    assert_eq!(decoded.len(), 3);
    assert_eq!(decoded[2].params["n"], 2);
    assert!(!decoder.has_partial());
}

#[test]
fn test_partial_header_and_payload_wait_for_more_bytes() {
    let frame = encode_frame(&RawRequest::new("stopVM", json!({}))).unwrap();
    let mut decoder = FrameDecoder::new();

    assert!(decoder.feed::<RawRequest>(&frame[..2]).is_empty());
    assert!(decoder.feed::<RawRequest>(&frame[2..7]).is_empty());
    assert!(decoder.has_partial());

    let decoded: Vec<RawRequest> = decoder.feed(&frame[7..]);
    assert_eq!(decoded, vec![RawRequest::new("stopVM", json!({}))]);
}

#[test]
fn test_malformed_payload_drops_buffer_and_resyncs() {
    let mut decoder = FrameDecoder::new();

    // Garbage frame followed by a valid one in the same read: both are lost.
    let mut bytes = encode_payload(b"{not json").unwrap();
    bytes.extend(encode_frame(&RawRequest::new("isRunning", json!({}))).unwrap());
    assert!(decoder.feed::<RawRequest>(&bytes).is_empty());
    assert_eq!(decoder.discarded(), 1);
    assert!(!decoder.has_partial());

    // The next frame decodes normally.
    let next = encode_frame(&RawRequest::new("isGuestConnected", json!({}))).unwrap();
    let decoded: Vec<RawRequest> = decoder.feed(&next);
    assert_eq!(decoded.len(), 1);
    assert_eq!(decoded[0].method, "isGuestConnected");
}

#[test]
fn test_request_without_method_is_malformed() {
    let mut decoder = FrameDecoder::new();
    let frame = encode_payload(br#"{"params":{}}"#).unwrap();
    let decoded: Vec<RawRequest> = decoder.feed(&frame);
    assert!(decoded.is_empty());
    assert_eq!(decoder.discarded(), 1);
}

#[test]
fn test_oversized_length_is_discarded() {
    let mut decoder = FrameDecoder::new();
    let mut bytes = (MAX_FRAME_SIZE + 1).to_be_bytes().to_vec();
    bytes.extend_from_slice(b"xxxx");

    assert!(decoder.feed::<RawRequest>(&bytes).is_empty());
    assert_eq!(decoder.discarded(), 1);
    assert!(!decoder.has_partial());
}

#[test]
fn test_encoder_refuses_what_the_decoder_would_drop() {
    let at_limit = vec![b' '; MAX_FRAME_SIZE as usize];
    let frame = encode_payload(&at_limit).unwrap();
    assert_eq!(frame.len(), MAX_FRAME_SIZE as usize + 4);

    let over = vec![b' '; MAX_FRAME_SIZE as usize + 1];
    let err = encode_payload(&over).unwrap_err();
    assert!(matches!(err, DaemonError::FrameTooLarge { .. }), "got {err:?}");

    let big = Response::ok(json!({ "content": "x".repeat(MAX_FRAME_SIZE as usize) }));
    assert!(matches!(
        encode_frame(&big),
        Err(DaemonError::FrameTooLarge { .. })
    ));
}

#[test]
fn test_response_and_event_wire_shapes() {
    let ok = serde_json::to_value(Response::ok(json!(null))).unwrap();
    assert_eq!(ok, json!({ "success": true, "result": {} }));

    let err = serde_json::to_value(Response::err("Unknown method: nope")).unwrap();
    assert_eq!(err, json!({ "success": false, "error": "Unknown method: nope" }));

    let exit = serde_json::to_value(Event::Exit {
        id: "s1".into(),
        exit_code: Some(0),
        signal: None,
    })
    .unwrap();
    assert_eq!(
        exit,
        json!({ "type": "exit", "id": "s1", "exitCode": 0, "signal": null })
    );

    let net = serde_json::to_value(Event::NetworkStatus {
        status: NetworkStatus::Connected,
    })
    .unwrap();
    assert_eq!(net, json!({ "type": "networkStatus", "status": "connected" }));
}

#[test]
fn test_event_frame_round_trips() {
    let event = Event::Stderr {
        id: "a".into(),
        data: "boom\n".into(),
    };
    let mut decoder = FrameDecoder::new();
    let decoded: Vec<Event> = decoder.feed(&encode_frame(&event).unwrap());
    assert_eq!(decoded, vec![event]);
}
