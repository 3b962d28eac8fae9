//! Integration tests for notifywire-client.
//!
//! These tests verify the integration between the framing and codec modules.

use notifywire_client::codec::{Envelope, EnvelopeKind, JsonCodec};
use notifywire_client::protocol::{encode_frame, FrameBuffer};
use serde_json::json;

/// Test full unit encode/decode cycle with a JSON envelope.
#[test]
fn test_unit_with_json_envelope() {
    #[derive(serde::Serialize, serde::Deserialize, PartialEq, Debug)]
    struct Release {
        name: String,
        build: u32,
    }

    let text = JsonCodec::encode(&json!({
        "type": "notification",
        "data": {"name": "nightly", "build": 42}
    }))
    .unwrap();
    let bytes = encode_frame(text.as_bytes());
    assert!(bytes.starts_with(format!("{}:", text.len()).as_bytes()));

    let mut buffer = FrameBuffer::new();
    let frames = buffer.push(&bytes).unwrap();
    assert_eq!(frames.len(), 1);

    let envelope = Envelope::decode(&frames[0].clone().into_text().unwrap()).unwrap();
    assert_eq!(envelope.kind, EnvelopeKind::Notification);

    let notification = envelope.into_notification().unwrap();
    let release: Release = notification.decode().unwrap();
    assert_eq!(
        release,
        Release {
            name: "nightly".to_string(),
            build: 42
        }
    );
}

/// Test several units arriving in one read.
#[test]
fn test_multiple_units_sequence() {
    let mut buffer = FrameBuffer::new();
    let mut all_bytes = Vec::new();

    for id in 1u64..=5 {
        let text = json!({"type": "rpcResult", "data": {"id": id, "result": id * 10}}).to_string();
        all_bytes.extend_from_slice(&encode_frame(text.as_bytes()));
    }

    let frames = buffer.push(&all_bytes).unwrap();
    assert_eq!(frames.len(), 5);

    for (i, frame) in frames.into_iter().enumerate() {
        let envelope = Envelope::decode(&frame.into_text().unwrap()).unwrap();
        let result = envelope.into_rpc_result().unwrap();
        assert_eq!(result.id, i as u64 + 1);
        assert_eq!(result.decode::<u64>().unwrap(), (i as u64 + 1) * 10);
    }
    assert!(buffer.is_empty());
}

/// Test an outgoing request as the server sees it.
#[test]
fn test_rpc_request_unit() {
    let frame = JsonCodec::rpc_frame(7, "getReleases", &[json!("stable"), json!(3)]).unwrap();

    let mut buffer = FrameBuffer::new();
    let frames = buffer.push(&frame.to_bytes()).unwrap();
    assert_eq!(frames.len(), 1);

    let request: serde_json::Value = JsonCodec::decode(&frames[0].clone().into_text().unwrap()).unwrap();
    assert_eq!(
        request,
        json!({"type": "rpc", "data": {"id": 7, "method": "getReleases", "params": ["stable", 3]}})
    );
}

/// Test unit lengths are counted in bytes, not characters.
#[test]
fn test_multibyte_payload() {
    let text = json!({"type": "notification", "data": {"title": "héllo wörld ✓"}}).to_string();
    let bytes = encode_frame(text.as_bytes());

    let mut buffer = FrameBuffer::new();
    let split = bytes.len() - 3;
    assert!(buffer.push(&bytes[..split]).unwrap().is_empty());
    let frames = buffer.push(&bytes[split..]).unwrap();

    let notification = Envelope::decode(&frames[0].clone().into_text().unwrap())
        .unwrap()
        .into_notification()
        .unwrap();
    assert_eq!(notification.get("title"), Some(&json!("héllo wörld ✓")));
}

/// Test fragmented unit parsing, one byte at a time.
#[test]
fn test_fragmented_unit_parsing() {
    let text = r#"{"type":"error","data":"denied"}"#;
    let bytes = encode_frame(text.as_bytes());

    let mut buffer = FrameBuffer::new();
    let mut frames = Vec::new();
    for byte in bytes.iter() {
        frames.extend(buffer.push(std::slice::from_ref(byte)).unwrap());
    }

    assert_eq!(frames.len(), 1);
    let envelope = Envelope::decode(&frames[0].clone().into_text().unwrap()).unwrap();
    assert_eq!(envelope.kind, EnvelopeKind::Error);
    assert_eq!(envelope.data_text(), r#""denied""#);
}

/// Test a bad unit length surfaces as a protocol error.
#[test]
fn test_malformed_length_prefix() {
    let mut buffer = FrameBuffer::new();
    let err = buffer.push(b"12a:{}").unwrap_err();
    assert!(err.to_string().contains("12a"));
}
