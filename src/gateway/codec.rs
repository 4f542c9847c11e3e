//! Wire codec for gateway frames: UTF-8 JSON text, one frame per message.

use crate::error::GatewayError;
use crate::gateway::events::Frame;

/// Serialize a frame to its wire text, exactly `{"op":op,"d":d}` (plus `s`/`t`
/// when present).
pub fn encode(frame: &Frame) -> String {
    // A Frame is plain data; serialization cannot fail.
    serde_json::to_string(frame).unwrap_or_default()
}

/// Decode inbound wire text into a frame. Malformed input is a decode error,
/// never a partially-filled structure.
pub fn decode(text: &str) -> Result<Frame, GatewayError> {
    serde_json::from_str(text).map_err(GatewayError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::events::opcode;
    use serde_json::json;

    #[test]
    fn encodes_exact_wire_shape() {
        let frame = Frame::new(opcode::HEARTBEAT, json!(42));
        assert_eq!(encode(&frame), r#"{"op":1,"d":42}"#);

        let frame = Frame::new(opcode::IDENTIFY, json!({ "token": "t" }));
        assert_eq!(encode(&frame), r#"{"op":2,"d":{"token":"t"}}"#);
    }

    #[test]
    fn round_trips_well_formed_frames() {
        let frame = Frame {
            op: opcode::DISPATCH,
            data: Some(json!({ "session_id": "abc" })),
            seq: Some(7),
            event_type: Some("READY".to_string()),
        };
        assert_eq!(decode(&encode(&frame)).unwrap(), frame);

        let bare = Frame::new(opcode::HEARTBEAT, json!(7));
        assert_eq!(decode(&encode(&bare)).unwrap(), bare);
    }

    #[test]
    fn malformed_input_is_a_decode_error() {
        assert!(matches!(
            decode("not json"),
            Err(GatewayError::Decode(_))
        ));
        // an empty object is missing the required op field
        assert!(matches!(decode("{}"), Err(GatewayError::Decode(_))));
    }

    #[test]
    fn decodes_envelope_without_interpreting_payload() {
        let frame = decode(r#"{"op":0,"d":{"anything":["goes",1]},"s":3,"t":"X"}"#).unwrap();
        assert_eq!(frame.op, 0);
        assert_eq!(frame.seq, Some(3));
        assert_eq!(frame.event_type.as_deref(), Some("X"));
        assert_eq!(frame.data.unwrap()["anything"][1], 1);
    }
}
