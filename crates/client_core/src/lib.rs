use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock},
    time::Duration,
};

use serde::Serialize;
use shared::{
    domain::ConnectionStatus,
    protocol::{CommandMessage, StatusEvent},
};
use tokio::{
    sync::{broadcast, mpsc, watch},
    task::JoinHandle,
};
use tracing::{debug, error, info, warn};
use url::Url;

pub mod error;
pub mod transport;

pub use error::TransportError;
pub use transport::{Connector, Frame, Transport, WsConnector};

pub const DEFAULT_ENDPOINT: &str = "ws://localhost:8765";
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 5;
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(2000);
const EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSettings {
    pub endpoint: String,
    pub max_reconnect_attempts: u32,
    pub reconnect_delay: Duration,
}

impl Default for ChannelSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.into(),
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
        }
    }
}

impl ChannelSettings {
    pub fn endpoint_url(&self) -> Result<Url, TransportError> {
        let url = Url::parse(self.endpoint.trim()).map_err(|err| {
            TransportError::InvalidEndpoint {
                endpoint: self.endpoint.clone(),
                reason: err.to_string(),
            }
        })?;
        match url.scheme() {
            "ws" | "wss" => Ok(url),
            other => Err(TransportError::InvalidEndpoint {
                endpoint: self.endpoint.clone(),
                reason: format!("unsupported scheme '{other}', expected ws:// or wss://"),
            }),
        }
    }
}

/// Read-only view of everything the channel emits, in emission order.
#[derive(Debug, Clone)]
pub enum ChannelEvent {
    Command(CommandMessage),
    Status(StatusEvent),
}

type CommandHandler = Arc<dyn Fn(CommandMessage) + Send + Sync>;
type StatusHandler = Arc<dyn Fn(StatusEvent) + Send + Sync>;

#[derive(Default)]
struct Handlers {
    command: Option<CommandHandler>,
    status: Option<StatusHandler>,
}

struct ChannelState {
    status: ConnectionStatus,
    reconnect_attempts: u32,
    next_generation: u64,
    supervisor: Option<JoinHandle<()>>,
    outbound: Option<mpsc::UnboundedSender<String>>,
}

/// Best-effort persistent connection to a command source with bounded
/// reconnection.
///
/// Every `connect()` opens a new generation and its own supervisor task; a
/// newer supervisor first waits for the previous one to finish, so at most one
/// connection attempt is ever in flight. The live generation sits in a `watch`
/// cell and a supervisor only emits while its generation is still the live
/// one, which is what makes [`CommandChannel::disconnect`] suppress an
/// already scheduled retry.
///
/// Handlers run while status emission is serialized and must not call back
/// into `connect` or `disconnect`.
pub struct CommandChannel {
    settings: ChannelSettings,
    endpoint: Url,
    connector: Arc<dyn Connector>,
    inner: Mutex<ChannelState>,
    handlers: RwLock<Handlers>,
    intent: watch::Sender<Option<u64>>,
    emission: Mutex<()>,
    events: broadcast::Sender<ChannelEvent>,
}

impl CommandChannel {
    pub fn new(
        settings: ChannelSettings,
        connector: Arc<dyn Connector>,
    ) -> Result<Arc<Self>, TransportError> {
        let endpoint = settings.endpoint_url()?;
        let (intent, _) = watch::channel(None);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Ok(Arc::new(Self {
            settings,
            endpoint,
            connector,
            inner: Mutex::new(ChannelState {
                status: ConnectionStatus::Disconnected,
                reconnect_attempts: 0,
                next_generation: 0,
                supervisor: None,
                outbound: None,
            }),
            handlers: RwLock::new(Handlers::default()),
            intent,
            emission: Mutex::new(()),
            events,
        }))
    }

    pub fn websocket(settings: ChannelSettings) -> Result<Arc<Self>, TransportError> {
        Self::new(settings, Arc::new(WsConnector))
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn status(&self) -> ConnectionStatus {
        self.state().status
    }

    pub fn reconnect_attempts(&self) -> u32 {
        self.state().reconnect_attempts
    }

    /// Registers the command handler, replacing any earlier one.
    pub fn on_command(&self, handler: impl Fn(CommandMessage) + Send + Sync + 'static) {
        self.handlers_mut().command = Some(Arc::new(handler));
    }

    /// Registers the status handler, replacing any earlier one.
    pub fn on_status(&self, handler: impl Fn(StatusEvent) + Send + Sync + 'static) {
        self.handlers_mut().status = Some(Arc::new(handler));
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ChannelEvent> {
        self.events.subscribe()
    }

    /// Starts connecting. Emits `connecting` before returning; the attempt
    /// itself resolves on a spawned supervisor task.
    ///
    /// Ignored while an earlier `connect()` is still active. After
    /// `disconnect()` the winding-down supervisor is superseded, not reused.
    ///
    /// Must be called from within a tokio runtime.
    pub fn connect(self: &Arc<Self>) {
        let _emitting = self.emission_lock();
        let (generation, previous) = {
            let mut state = self.state();
            let running = state
                .supervisor
                .as_ref()
                .is_some_and(|task| !task.is_finished());
            if running && self.intent.borrow().is_some() {
                warn!(endpoint = %self.endpoint, "command channel: connect ignored, supervisor already running");
                return;
            }
            state.next_generation += 1;
            state.reconnect_attempts = 0;
            (state.next_generation, state.supervisor.take())
        };

        self.intent.send_replace(Some(generation));
        self.emit_status(StatusEvent::connecting(self.endpoint.as_str()));

        let channel = Arc::clone(self);
        let task = tokio::spawn(async move { channel.supervise(generation, previous).await });
        self.state().supervisor = Some(task);
    }

    /// Best-effort outbound send. Dropped with a diagnostic unless connected.
    pub fn send<T: Serialize>(&self, payload: &T) {
        let state = self.state();
        let outbound = match (&state.outbound, state.status) {
            (Some(outbound), ConnectionStatus::Connected) => outbound,
            (_, status) => {
                warn!(%status, "command channel: send skipped, not connected");
                return;
            }
        };
        match serde_json::to_string(payload) {
            Ok(text) => {
                if outbound.send(text).is_err() {
                    warn!("command channel: send skipped, session already closed");
                }
            }
            Err(err) => warn!(%err, "command channel: failed to encode outbound payload"),
        }
    }

    /// Closes the transport and stops any further reconnection. Emits
    /// `disconnected` when a connection, attempt or scheduled retry was live.
    pub fn disconnect(&self) {
        info!(endpoint = %self.endpoint, "command channel: disconnect requested");
        let _emitting = self.emission_lock();
        let was_active = self.intent.send_replace(None).is_some();
        let status = {
            let mut state = self.state();
            state.outbound = None;
            state.status
        };
        if was_active && status != ConnectionStatus::Disconnected && !status.is_terminal() {
            self.emit_status(StatusEvent::disconnected());
        }
    }

    /// Disconnects and waits for the supervisor task to wind down.
    pub async fn shutdown(&self) {
        self.disconnect();
        let supervisor = self.state().supervisor.take();
        if let Some(task) = supervisor {
            if let Err(err) = task.await {
                warn!(%err, "command channel: supervisor task ended abnormally");
            }
        }
    }

    async fn supervise(self: Arc<Self>, generation: u64, previous: Option<JoinHandle<()>>) {
        if let Some(task) = previous {
            if let Err(err) = task.await {
                warn!(%err, "command channel: previous supervisor ended abnormally");
            }
        }
        let mut intent = self.intent.subscribe();
        let max_attempts = self.settings.max_reconnect_attempts;

        loop {
            let opened = tokio::select! {
                opened = self.connector.open(&self.endpoint) => opened,
                _ = stopped(&mut intent, generation) => break,
            };

            match opened {
                Ok(mut transport) => {
                    if !self.is_current(generation) {
                        transport.close().await;
                        break;
                    }
                    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
                    {
                        let mut state = self.state();
                        state.reconnect_attempts = 0;
                        state.outbound = Some(outbound_tx);
                    }
                    info!(endpoint = %self.endpoint, "command channel: connected");
                    self.emit_for(generation, StatusEvent::connected());
                    self.run_session(generation, transport, outbound_rx, &mut intent)
                        .await;
                    if self.is_current(generation) {
                        self.state().outbound = None;
                    }
                }
                Err(err) => {
                    warn!(endpoint = %self.endpoint, %err, "command channel: connection attempt failed");
                    self.emit_for(generation, StatusEvent::error(&err));
                }
            }

            if !self.emit_for(generation, StatusEvent::disconnected()) {
                break;
            }

            let attempt = {
                let mut state = self.state();
                if state.reconnect_attempts >= max_attempts {
                    None
                } else {
                    state.reconnect_attempts += 1;
                    Some(state.reconnect_attempts)
                }
            };
            let Some(attempt) = attempt else {
                error!(
                    endpoint = %self.endpoint,
                    max_attempts,
                    "command channel: reconnection attempts exhausted; restart the command source"
                );
                self.emit_for(generation, StatusEvent::failed(max_attempts));
                break;
            };

            info!(attempt, max_attempts, "command channel: scheduling reconnect");
            if !self.emit_for(generation, StatusEvent::reconnecting(attempt, max_attempts)) {
                break;
            }
            tokio::select! {
                _ = tokio::time::sleep(self.settings.reconnect_delay) => {}
                _ = stopped(&mut intent, generation) => {}
            }
            if !self.emit_for(generation, StatusEvent::connecting(self.endpoint.as_str())) {
                debug!("command channel: reconnect suppressed by disconnect");
                break;
            }
        }
    }

    async fn run_session(
        &self,
        generation: u64,
        mut transport: Box<dyn Transport>,
        mut outbound_rx: mpsc::UnboundedReceiver<String>,
        intent: &mut watch::Receiver<Option<u64>>,
    ) {
        loop {
            tokio::select! {
                frame = transport.next_frame() => match frame {
                    Some(Ok(Frame::Text(text))) => self.handle_inbound(&text),
                    Some(Ok(Frame::Binary(bytes))) => {
                        warn!(len = bytes.len(), "command channel: dropping binary frame");
                    }
                    Some(Ok(Frame::Close)) | None => {
                        info!("command channel: closed by command source");
                        break;
                    }
                    Some(Err(err)) => {
                        warn!(%err, "command channel: transport error");
                        self.emit_for(generation, StatusEvent::error(&err));
                        break;
                    }
                },
                Some(text) = outbound_rx.recv() => {
                    if let Err(err) = transport.send_text(text).await {
                        warn!(%err, "command channel: outbound send failed");
                    }
                }
                _ = stopped(intent, generation) => break,
            }
        }
        transport.close().await;
    }

    fn handle_inbound(&self, text: &str) {
        let message = match CommandMessage::parse(text) {
            Ok(message) => message,
            Err(err) => {
                warn!(%err, payload = text, "command channel: dropping malformed message");
                return;
            }
        };
        debug!(command = %message.command, "command channel: command received");

        let handler = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .command
            .clone();
        if let Some(handler) = handler {
            handler(message.clone());
        }
        let _ = self.events.send(ChannelEvent::Command(message));
    }

    fn emit_status(&self, event: StatusEvent) {
        self.state().status = event.status;
        debug!(status = %event.status, message = %event.message, "command channel: status");

        let handler = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .status
            .clone();
        if let Some(handler) = handler {
            handler(event.clone());
        }
        let _ = self.events.send(ChannelEvent::Status(event));
    }

    /// Emits on behalf of supervisor `generation`; returns false, emitting
    /// nothing, once that generation has been disconnected or superseded.
    fn emit_for(&self, generation: u64, event: StatusEvent) -> bool {
        let _emitting = self.emission_lock();
        if !self.is_current(generation) {
            return false;
        }
        self.emit_status(event);
        true
    }

    fn is_current(&self, generation: u64) -> bool {
        *self.intent.borrow() == Some(generation)
    }

    fn emission_lock(&self) -> MutexGuard<'_, ()> {
        self.emission.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn state(&self) -> MutexGuard<'_, ChannelState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn handlers_mut(&self) -> std::sync::RwLockWriteGuard<'_, Handlers> {
        self.handlers.write().unwrap_or_else(PoisonError::into_inner)
    }
}

async fn stopped(intent: &mut watch::Receiver<Option<u64>>, generation: u64) {
    let _ = intent.wait_for(|live| *live != Some(generation)).await;
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
