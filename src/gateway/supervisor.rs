use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use tokio::sync::mpsc;

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::gateway::connection::{
    Command, ConnectionExit, ConnectionHandle, ConnectionStatus, GatewayConnection,
};
use crate::gateway::events::Frame;
use crate::gateway::session::GatewaySession;
use crate::rest::RestClient;
use crate::transport::{Connector, WsConnector};

/// Owns the reconnect loop and the single "current connection" reference.
///
/// Exactly one connection instance is current at any time. The reference is
/// installed after a new instance is established and cleared once the old one
/// has fully detached (its run loop returned and its timer is cancelled), so
/// two live transports never both deliver.
pub struct GatewaySupervisor {
    config: Arc<GatewayConfig>,
    connector: Arc<dyn Connector>,
    rest: RestClient,
    current: Arc<ArcSwapOption<ConnectionHandle>>,
    events: mpsc::UnboundedSender<Frame>,
    stopping: Arc<AtomicBool>,
}

/// Cloneable host-side handle onto whatever connection is current.
#[derive(Clone)]
pub struct GatewayHandle {
    current: Arc<ArcSwapOption<ConnectionHandle>>,
    stopping: Arc<AtomicBool>,
}

impl GatewaySupervisor {
    /// Supervisor speaking websocket to the real gateway. The returned
    /// receiver yields every decoded inbound frame in receipt order.
    pub fn new(config: GatewayConfig) -> (Self, mpsc::UnboundedReceiver<Frame>) {
        Self::with_connector(config, Arc::new(WsConnector))
    }

    /// Same, but over a caller-supplied transport factory.
    pub fn with_connector(
        config: GatewayConfig,
        connector: Arc<dyn Connector>,
    ) -> (Self, mpsc::UnboundedReceiver<Frame>) {
        let config = Arc::new(config);
        let rest =
            RestClient::new(&config.api_base, &config.token).with_timeout(config.request_timeout);
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        (
            Self {
                config,
                connector,
                rest,
                current: Arc::new(ArcSwapOption::from(None)),
                events: events_tx,
                stopping: Arc::new(AtomicBool::new(false)),
            },
            events_rx,
        )
    }

    pub fn handle(&self) -> GatewayHandle {
        GatewayHandle {
            current: self.current.clone(),
            stopping: self.stopping.clone(),
        }
    }

    /// Run connections until the host stops us or a fatal condition surfaces.
    /// Fatal exits are returned as-is and never auto-retried.
    pub async fn run(self) -> Result<(), GatewayError> {
        let mut session = GatewaySession::default();
        let mut continuation = false;

        loop {
            if self.stopping.load(Ordering::SeqCst) {
                self.current.store(None);
                return Ok(());
            }
            if continuation && session.resume_url.is_none() {
                tracing::debug!("no resume gateway url found, re-identifying");
                continuation = false;
            }
            if !continuation {
                // a fresh identify starts a brand-new logical session
                session.clear();
            }

            let established = GatewayConnection::establish(
                self.config.clone(),
                self.connector.as_ref(),
                &self.rest,
                session,
                continuation,
                self.events.clone(),
                &self.stopping,
            )
            .await;
            let (connection, handle) = match established {
                Ok(Some(pair)) => pair,
                // stopped while still waiting for a transport to open
                Ok(None) => {
                    self.current.store(None);
                    return Ok(());
                }
                Err(e) => {
                    self.current.store(None);
                    return Err(e);
                }
            };

            // the previous instance fully detached before we got here, so
            // swapping the handle is the whole ownership transfer
            let handle = Arc::new(handle);
            self.current.store(Some(handle.clone()));
            if self.stopping.load(Ordering::SeqCst) {
                // stop() raced the install and found no handle to signal
                let _ = handle.commands.send(Command::Stop);
            }
            let (exit, next_session) = connection.run().await;
            self.current.store(None);
            session = next_session;

            match exit {
                ConnectionExit::Stopped => return Ok(()),
                ConnectionExit::Fatal(e) => return Err(e),
                ConnectionExit::Resume => continuation = true,
                ConnectionExit::Reidentify => continuation = false,
            }
        }
    }
}

impl GatewayHandle {
    /// Hand a frame to the current connection. Returns false when no
    /// connection is current (for instance mid-reconnect).
    pub fn send(&self, frame: Frame) -> bool {
        match self.current.load_full() {
            Some(handle) => handle.commands.send(Command::Send(frame)).is_ok(),
            None => false,
        }
    }

    /// Ask the supervisor to wind down after the current connection closes.
    pub fn stop(&self) {
        self.stopping.store(true, Ordering::SeqCst);
        if let Some(handle) = self.current.load_full() {
            let _ = handle.commands.send(Command::Stop);
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        match self.current.load_full() {
            Some(handle) => *handle.status.borrow(),
            None => ConnectionStatus::Closed,
        }
    }
}
