//! Client-side gateway core: one persistent streaming session against a
//! push-based event gateway, with identify/resume handshake sequencing,
//! heartbeat liveness, close-code classification and reconnect supervision.

pub mod config;
pub mod error;
pub mod gateway;
pub mod intents;
pub mod permissions;
pub mod presence;
pub mod rest;
pub mod transport;

pub use config::{BudgetCallback, GatewayConfig};
pub use error::GatewayError;
pub use gateway::close::{classify, CloseAction, CloseOutcome};
pub use gateway::connection::ConnectionStatus;
pub use gateway::events::Frame;
pub use gateway::session::GatewaySession;
pub use gateway::supervisor::{GatewayHandle, GatewaySupervisor};
pub use intents::IntentSet;
pub use permissions::PermissionSet;
pub use presence::{Activity, Presence};
pub use rest::{GatewayBootstrap, RestClient, SessionStartLimit};
pub use transport::{Connector, Transport, TransportEvent, WsConnector};
