use super::*;

fn sample_frame() -> Frame {
    Frame {
        id: "id-1".to_owned(),
        parent_id: Some("parent-1".to_owned()),
        ts: 42,
        from: Some("client-1".to_owned()),
        syscall: CHAT_ENTRY.to_owned(),
        status: Status::Request,
        data: serde_json::json!({
            "username": "PixelPanda",
            "message": "gg",
            "badges": {"moderator": false, "subscriber": true, "member": false},
        }),
    }
}

#[test]
fn terminal_statuses() {
    assert!(Status::Done.is_terminal());
    assert!(Status::Error.is_terminal());
    assert!(!Status::Request.is_terminal());
}

#[test]
fn status_serializes_lowercase() {
    let json = serde_json::to_string(&Status::Done).expect("serialize");
    assert_eq!(json, "\"done\"");
}

#[test]
fn encode_decode_preserves_frame() {
    let frame = sample_frame();
    let text = encode_frame(&frame);
    let decoded = decode_frame(&text).expect("decode should succeed");
    assert_eq!(decoded, frame);
}

#[test]
fn decode_fills_optional_fields() {
    let text = r#"{"id":"a","syscall":"heart:send","status":"request"}"#;
    let frame = decode_frame(text).expect("minimal frame should decode");
    assert_eq!(frame.syscall, HEART_SEND);
    assert!(frame.parent_id.is_none());
    assert!(frame.from.is_none());
    assert_eq!(frame.ts, 0);
    assert!(frame.data.as_object().is_some_and(Map::is_empty));
}

#[test]
fn decode_normalizes_null_data() {
    let text = r#"{"id":"a","syscall":"heart:send","status":"request","data":null}"#;
    let frame = decode_frame(text).expect("null data should decode");
    assert!(frame.data.is_object());
}

#[test]
fn decode_rejects_non_object_data() {
    let text = r#"{"id":"a","syscall":"chat:send","status":"request","data":[1,2]}"#;
    let err = decode_frame(text).expect_err("array data should be rejected");
    assert!(matches!(err, CodecError::InvalidData("array")));
}

#[test]
fn decode_rejects_garbage() {
    let err = decode_frame("not json").expect_err("garbage should fail");
    assert!(matches!(err, CodecError::Decode(_)));
}

#[test]
fn decode_rejects_unknown_status() {
    let text = r#"{"id":"a","syscall":"chat:send","status":"bulk"}"#;
    assert!(decode_frame(text).is_err());
    let text = r#"{"id":"a","syscall":"chat:send","status":"cancel"}"#;
    assert!(decode_frame(text).is_err());
}

#[test]
fn data_str_reads_string_fields() {
    let frame = sample_frame();
    assert_eq!(frame.data_str("username"), Some("PixelPanda"));
    assert_eq!(frame.data_str("badges"), None);
    assert_eq!(frame.data_str("missing"), None);
}
