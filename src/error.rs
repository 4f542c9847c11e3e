use std::fmt;

/// Everything that can go wrong while driving a gateway connection.
///
/// `Decode` is local and non-terminal: the offending frame is dropped and the
/// connection keeps reading. `ProtocolClose` and `BudgetExhausted` end the
/// current connection lifecycle and are surfaced to the host with enough
/// structure for it to apply its own retry policy.
#[derive(Debug)]
pub enum GatewayError {
    /// Transport failure before or during frame exchange.
    Transport(String),
    /// Bootstrap request failed at the HTTP layer.
    Http(reqwest::Error),
    /// Bootstrap request reached the server but came back non-2xx.
    Api { status: u16, body: String },
    /// Malformed inbound frame.
    Decode(serde_json::Error),
    /// The gateway closed the connection with a code classified as fatal.
    ProtocolClose { code: u16, message: &'static str },
    /// The session-start budget ran out before an identify could be sent.
    BudgetExhausted { remaining: u64, total: u64 },
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayError::Transport(msg) => write!(f, "transport error: {msg}"),
            GatewayError::Http(e) => write!(f, "HTTP error: {e}"),
            GatewayError::Api { status, body } => {
                write!(f, "server returned {status}: {body}")
            }
            GatewayError::Decode(e) => write!(f, "malformed gateway frame: {e}"),
            GatewayError::ProtocolClose { code, message } => {
                write!(f, "gateway closed with code {code}: {message}")
            }
            GatewayError::BudgetExhausted { remaining, total } => {
                write!(f, "session start budget exhausted ({remaining}/{total} remaining)")
            }
        }
    }
}

impl std::error::Error for GatewayError {}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        GatewayError::Http(e)
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(e: serde_json::Error) -> Self {
        GatewayError::Decode(e)
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for GatewayError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        GatewayError::Transport(e.to_string())
    }
}
