pub mod close;
pub mod codec;
pub mod connection;
pub mod events;
pub mod heartbeat;
pub mod session;
pub mod supervisor;
