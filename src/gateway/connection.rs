use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::sync::{mpsc, watch};

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::gateway::close::{self, CloseAction, CloseOutcome};
use crate::gateway::codec;
use crate::gateway::events::{event_type, opcode, Frame};
use crate::gateway::heartbeat::{HeartbeatTimer, DEFAULT_HEARTBEAT_INTERVAL};
use crate::gateway::session::GatewaySession;
use crate::rest::RestClient;
use crate::transport::{Connector, Transport, TransportEvent};

/// Close code sent when we tear a transport down for a clean reconnect.
const RECONNECT_CLOSE: u16 = 4000;

/// Lifecycle of one connection instance. An instance never leaves `Closed`;
/// reconnection is a new instance built by the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connecting,
    Open,
    Identifying,
    Ready,
    Reconnecting,
    Closed,
}

/// Why a connection instance stopped running.
#[derive(Debug)]
pub enum ConnectionExit {
    /// Build a replacement against the resume url and continue the session.
    Resume,
    /// Build a replacement with a fresh identify.
    Reidentify,
    /// Unrecoverable; surfaced to the host, never auto-retried.
    Fatal(GatewayError),
    /// The host asked us to stop.
    Stopped,
}

/// Host-to-connection instructions.
pub(crate) enum Command {
    Send(Frame),
    Stop,
}

/// Cheap handle the supervisor publishes as the "current connection".
pub(crate) struct ConnectionHandle {
    pub commands: mpsc::UnboundedSender<Command>,
    pub status: watch::Receiver<ConnectionStatus>,
}

/// What the select loop decided after one inbound frame.
enum Flow {
    Continue,
    NewHeartbeat(mpsc::UnboundedReceiver<()>),
    Exit(ConnectionExit),
}

/// One live gateway connection: owns the transport, the heartbeat timer and
/// the session state. Nothing outside its own loop mutates any of it.
pub struct GatewayConnection {
    config: Arc<GatewayConfig>,
    transport: Box<dyn Transport>,
    session: GatewaySession,
    /// True when this instance continues a prior session instead of opening a
    /// brand-new one; it resumes instead of identifying and is not announced
    /// as a fresh connection.
    continuation: bool,
    status_tx: watch::Sender<ConnectionStatus>,
    events: mpsc::UnboundedSender<Frame>,
    commands: Option<mpsc::UnboundedReceiver<Command>>,
    heartbeat: Option<HeartbeatTimer>,
    /// Whether the last heartbeat was acknowledged.
    acked: bool,
}

impl GatewayConnection {
    /// Open a transport (retrying until it opens or `stopping` is raised), run
    /// the bootstrap request and gate on the session-start budget. Returns
    /// `Ok(None)` when the host stopped us while still waiting for a
    /// transport. Continuation instances target the resume url and skip the
    /// bootstrap, since resuming does not consume session-start budget.
    pub(crate) async fn establish(
        config: Arc<GatewayConfig>,
        connector: &dyn Connector,
        rest: &RestClient,
        session: GatewaySession,
        continuation: bool,
        events: mpsc::UnboundedSender<Frame>,
        stopping: &AtomicBool,
    ) -> Result<Option<(Self, ConnectionHandle)>, GatewayError> {
        let url = if continuation {
            session
                .resume_url
                .clone()
                .unwrap_or_else(|| config.gateway_url.clone())
        } else {
            config.gateway_url.clone()
        };

        let (status_tx, status_rx) = watch::channel(ConnectionStatus::Connecting);
        let Some(transport) = open_transport(connector, &url, &config, stopping).await else {
            return Ok(None);
        };
        let _ = status_tx.send(ConnectionStatus::Open);

        if continuation {
            tracing::debug!("continuing a prior session, skipping gateway bootstrap");
        } else {
            let bootstrap = rest.gateway_bootstrap().await?;
            tracing::debug!(
                url = %bootstrap.url,
                shards = bootstrap.shards,
                "gateway bootstrap fetched"
            );
            if let Some(ref limit) = bootstrap.session_start_limit {
                tracing::debug!(
                    remaining = limit.remaining,
                    total = limit.total,
                    "session start budget"
                );
                if limit.remaining < 1 {
                    tracing::error!("daily session start budget exceeded");
                    if let Some(ref callback) = config.on_budget_exhausted {
                        callback(limit);
                    }
                    return Err(GatewayError::BudgetExhausted {
                        remaining: limit.remaining,
                        total: limit.total,
                    });
                }
            }
        }

        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let connection = Self {
            config,
            transport,
            session,
            continuation,
            status_tx: status_tx.clone(),
            events,
            commands: Some(commands_rx),
            heartbeat: None,
            acked: false,
        };
        Ok(Some((
            connection,
            ConnectionHandle {
                commands: commands_tx,
                status: status_rx,
            },
        )))
    }

    /// Drive the connection to completion, then detach everything this
    /// instance owns. The session is handed back for the replacement.
    pub(crate) async fn run(mut self) -> (ConnectionExit, GatewaySession) {
        let mut commands = self
            .commands
            .take()
            .unwrap_or_else(|| mpsc::unbounded_channel().1);
        let exit = self.drive(&mut commands).await;
        if let Some(heartbeat) = self.heartbeat.take() {
            heartbeat.cancel();
        }
        let _ = self.status_tx.send(ConnectionStatus::Closed);
        let session = std::mem::take(&mut self.session);
        (exit, session)
    }

    async fn drive(&mut self, commands: &mut mpsc::UnboundedReceiver<Command>) -> ConnectionExit {
        let mut heartbeat_rx: Option<mpsc::UnboundedReceiver<()>> = None;
        loop {
            tokio::select! {
                Some(command) = commands.recv() => match command {
                    Command::Send(frame) => {
                        if let Err(e) = self.send(Some(frame)).await {
                            tracing::warn!("send failed, transport presumed dead: {e}");
                            return ConnectionExit::Resume;
                        }
                    }
                    Command::Stop => return ConnectionExit::Stopped,
                },
                beat = async {
                    match heartbeat_rx.as_mut() {
                        Some(rx) => rx.recv().await,
                        None => std::future::pending().await,
                    }
                } => {
                    if beat.is_some() {
                        if let Some(exit) = self.handle_heartbeat_due().await {
                            return exit;
                        }
                    }
                },
                event = self.transport.recv() => match event {
                    Some(TransportEvent::Message(text)) => {
                        match self.handle_text(&text).await {
                            Flow::Continue => {}
                            Flow::NewHeartbeat(rx) => heartbeat_rx = Some(rx),
                            Flow::Exit(exit) => return exit,
                        }
                    }
                    Some(TransportEvent::Closed { code, reason }) => {
                        return self.handle_close(code, &reason);
                    }
                    None => return self.handle_close(None, "stream ended"),
                },
            }
        }
    }

    /// Serialize and write a frame. An absent payload is a no-op, never sent.
    async fn send(&mut self, payload: Option<Frame>) -> Result<(), GatewayError> {
        let Some(frame) = payload else {
            return Ok(());
        };
        self.transport.send(codec::encode(&frame)).await
    }

    async fn handle_heartbeat_due(&mut self) -> Option<ConnectionExit> {
        if !self.acked {
            tracing::warn!("heartbeat was never acknowledged, closing and resuming");
            let _ = self
                .transport
                .close(RECONNECT_CLOSE, "heartbeat ack missed")
                .await;
            return Some(ConnectionExit::Resume);
        }
        self.acked = false;
        let seq = self.session.sequence;
        match self.send(Some(Frame::new(opcode::HEARTBEAT, json!(seq)))).await {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!("heartbeat send failed: {e}");
                Some(ConnectionExit::Resume)
            }
        }
    }

    async fn handle_text(&mut self, text: &str) -> Flow {
        let frame = match codec::decode(text) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!("dropping malformed gateway frame: {e}");
                return Flow::Continue;
            }
        };

        // every decoded frame goes out verbatim, in receipt order
        let _ = self.events.send(frame.clone());

        match frame.op {
            opcode::HELLO => self.handle_hello(&frame).await,
            opcode::HEARTBEAT_ACK => {
                self.acked = true;
                Flow::Continue
            }
            opcode::HEARTBEAT => {
                // the gateway asked for an immediate beat
                let seq = self.session.sequence;
                match self.send(Some(Frame::new(opcode::HEARTBEAT, json!(seq)))).await {
                    Ok(()) => Flow::Continue,
                    Err(_) => Flow::Exit(ConnectionExit::Resume),
                }
            }
            opcode::DISPATCH => {
                self.handle_dispatch(&frame);
                Flow::Continue
            }
            opcode::RECONNECT => Flow::Exit(self.handle_reconnect().await),
            opcode::INVALID_SESSION => {
                let resumable = frame
                    .data
                    .as_ref()
                    .and_then(|d| d.as_bool())
                    .unwrap_or(false);
                if resumable && self.session.can_resume() {
                    tracing::debug!("session invalidated but resumable, reconnecting to resume");
                    Flow::Exit(ConnectionExit::Resume)
                } else {
                    tracing::debug!("session invalidated, re-identifying");
                    self.session.clear();
                    Flow::Exit(ConnectionExit::Reidentify)
                }
            }
            _ => Flow::Continue,
        }
    }

    async fn handle_hello(&mut self, frame: &Frame) -> Flow {
        let interval = frame
            .data
            .as_ref()
            .and_then(|d| d.get("heartbeat_interval"))
            .and_then(|v| v.as_u64())
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_HEARTBEAT_INTERVAL);

        // at most one heartbeat timer per connection instance
        if let Some(old) = self.heartbeat.take() {
            old.cancel();
        }
        let (ticks_tx, ticks_rx) = mpsc::unbounded_channel();
        self.heartbeat = Some(HeartbeatTimer::start(interval, ticks_tx));
        self.acked = true;

        let _ = self.status_tx.send(ConnectionStatus::Identifying);
        let sent = if self.continuation {
            self.handle_resume().await
        } else {
            self.identify().await
        };
        match sent {
            Ok(()) => Flow::NewHeartbeat(ticks_rx),
            Err(e) => {
                tracing::warn!("handshake send failed: {e}");
                Flow::Exit(ConnectionExit::Resume)
            }
        }
    }

    async fn identify(&mut self) -> Result<(), GatewayError> {
        let d = json!({
            "token": self.config.token,
            "intents": self.config.intents.to_string(),
            "presence": self.config.presence.to_payload(),
            "properties": {
                "$os": std::env::consts::OS,
                "$browser": "tether",
                "$device": "tether",
            },
        });
        self.send(Some(Frame::new(opcode::IDENTIFY, d))).await
    }

    /// Continue a prior session. Without a session id there is nothing to
    /// resume, so this falls back to a fresh identify.
    async fn handle_resume(&mut self) -> Result<(), GatewayError> {
        let Some(session_id) = self.session.session_id.clone() else {
            tracing::debug!("no session id found, cannot resume events, re-identifying");
            return self.identify().await;
        };
        let d = json!({
            "token": self.config.token,
            "session_id": session_id,
            "seq": self.session.sequence,
        });
        self.send(Some(Frame::new(opcode::RESUME, d))).await
    }

    fn handle_dispatch(&mut self, frame: &Frame) {
        if let Some(seq) = frame.seq {
            self.session.record_sequence(seq);
        }
        match frame.event_type.as_deref() {
            Some(event_type::READY) => {
                let session_id = frame
                    .data
                    .as_ref()
                    .and_then(|d| d.get("session_id"))
                    .and_then(|v| v.as_str())
                    .map(str::to_string);
                let resume_url = frame
                    .data
                    .as_ref()
                    .and_then(|d| d.get("resume_gateway_url"))
                    .and_then(|v| v.as_str())
                    .map(str::to_string);
                if let Some(id) = session_id {
                    self.session.mark_ready(id, resume_url);
                }
                let _ = self.status_tx.send(ConnectionStatus::Ready);
                tracing::debug!("connected to the gateway");
            }
            Some(event_type::RESUMED) => {
                let _ = self.status_tx.send(ConnectionStatus::Ready);
                tracing::debug!("successfully reconnected, resuming missed events");
            }
            _ => {}
        }
    }

    /// The gateway told us to reconnect now. The old transport gets a drain
    /// window before it is closed so in-flight frames are not cut off.
    async fn handle_reconnect(&mut self) -> ConnectionExit {
        if self.session.resume_url.is_none() {
            tracing::debug!("reconnect requested but no resume gateway url known, re-identifying");
            self.session.clear();
            return ConnectionExit::Reidentify;
        }
        tracing::debug!("gateway requested a reconnect");
        let _ = self.status_tx.send(ConnectionStatus::Reconnecting);
        if let Some(heartbeat) = self.heartbeat.take() {
            tracing::debug!("clearing the heartbeat timer");
            heartbeat.cancel();
        }
        tokio::time::sleep(self.config.drain_delay).await;
        let _ = self.transport.close(RECONNECT_CLOSE, "Reconnect").await;
        ConnectionExit::Resume
    }

    fn handle_close(&mut self, code: Option<u16>, reason: &str) -> ConnectionExit {
        let _ = self.status_tx.send(ConnectionStatus::Closed);
        let Some(code) = code else {
            tracing::warn!("transport closed without a close code ({reason}), re-identifying");
            self.session.clear();
            return ConnectionExit::Reidentify;
        };
        match close::classify(code) {
            CloseAction::Classified {
                outcome: CloseOutcome::Resume,
                message,
            } => {
                tracing::warn!("gateway closed ({code}): {message} resuming");
                ConnectionExit::Resume
            }
            CloseAction::Classified {
                outcome: CloseOutcome::Reidentify,
                message,
            } => {
                tracing::warn!("gateway closed ({code}): {message} re-identifying");
                self.session.clear();
                ConnectionExit::Reidentify
            }
            CloseAction::Classified {
                outcome: CloseOutcome::Fatal,
                message,
            } => ConnectionExit::Fatal(GatewayError::ProtocolClose { code, message }),
            CloseAction::Unclassified(code) => {
                tracing::warn!("gateway closed with unclassified code {code}, re-identifying");
                self.session.clear();
                ConnectionExit::Reidentify
            }
        }
    }
}

/// Wait for the transport to open, retrying on a fixed interval. Each attempt
/// is bounded by the configured request timeout. Gives up with `None` once the
/// host raises the stop flag, so a stop during an outage does not hang.
async fn open_transport(
    connector: &dyn Connector,
    url: &str,
    config: &GatewayConfig,
    stopping: &AtomicBool,
) -> Option<Box<dyn Transport>> {
    loop {
        if stopping.load(Ordering::SeqCst) {
            tracing::debug!("stop requested while waiting for a transport");
            return None;
        }
        match tokio::time::timeout(config.request_timeout, connector.connect(url)).await {
            Ok(Ok(transport)) => return Some(transport),
            Ok(Err(e)) => tracing::warn!("gateway connect failed: {e}, retrying"),
            Err(_) => tracing::warn!("gateway connect timed out, retrying"),
        }
        tokio::time::sleep(config.retry_interval.min(config.request_timeout)).await;
    }
}
