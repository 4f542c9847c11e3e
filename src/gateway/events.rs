use serde::{Deserialize, Serialize};

/// Opcodes for gateway frames.
pub mod opcode {
    pub const DISPATCH: u8 = 0;
    pub const HEARTBEAT: u8 = 1;
    pub const IDENTIFY: u8 = 2;
    pub const PRESENCE_UPDATE: u8 = 3;
    pub const RESUME: u8 = 6;
    pub const RECONNECT: u8 = 7;
    pub const INVALID_SESSION: u8 = 9;
    pub const HELLO: u8 = 10;
    pub const HEARTBEAT_ACK: u8 = 11;
}

/// Close codes from the published gateway catalog.
pub mod close_code {
    pub const NORMAL: u16 = 1000;
    pub const GOING_AWAY: u16 = 1001;
    pub const UNKNOWN_ERROR: u16 = 4000;
    pub const UNKNOWN_OPCODE: u16 = 4001;
    pub const DECODE_ERROR: u16 = 4002;
    pub const NOT_AUTHENTICATED: u16 = 4003;
    pub const AUTH_FAILED: u16 = 4004;
    pub const ALREADY_AUTHENTICATED: u16 = 4005;
    pub const INVALID_SEQ: u16 = 4007;
    pub const RATE_LIMITED: u16 = 4008;
    pub const SESSION_TIMED_OUT: u16 = 4009;
    pub const INVALID_SHARD: u16 = 4010;
    pub const SHARDING_REQUIRED: u16 = 4011;
    pub const INVALID_API_VERSION: u16 = 4012;
    pub const INVALID_INTENTS: u16 = 4013;
    pub const DISALLOWED_INTENTS: u16 = 4014;
}

/// Dispatch event names the connection itself reacts to.
pub mod event_type {
    pub const READY: &str = "READY";
    pub const RESUMED: &str = "RESUMED";
}

/// Gateway frame envelope. Outbound frames carry only `op` and `d`; inbound
/// dispatch frames additionally carry `s` and `t`. The payload shape under `d`
/// is not interpreted here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Frame {
    pub op: u8,
    #[serde(rename = "d", skip_serializing_if = "Option::is_none", default)]
    pub data: Option<serde_json::Value>,
    #[serde(rename = "s", skip_serializing_if = "Option::is_none", default)]
    pub seq: Option<u64>,
    #[serde(rename = "t", skip_serializing_if = "Option::is_none", default)]
    pub event_type: Option<String>,
}

impl Frame {
    pub fn new(op: u8, data: serde_json::Value) -> Self {
        Self {
            op,
            data: Some(data),
            seq: None,
            event_type: None,
        }
    }
}
