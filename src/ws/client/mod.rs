mod config;
mod event;
mod inner;
mod state;
mod transport;

pub use config::{
    ClientConfig, HeartbeatConfig, ReconnectPolicy, PING_INTERVAL, PONG_TIMEOUT,
    RECONNECT_BACKOFF_MULTIPLIER, RECONNECT_INITIAL_DELAY, RECONNECT_MAX_ATTEMPTS,
    RECONNECT_MAX_DELAY,
};
pub use event::{ClientEvent, EventStream};
pub use state::ConnectionState;
pub use transport::{BoxTransport, ConnectError, Connector, Transport, TungsteniteConnector};

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite as websocket;
use url::Url;

use crate::{
    endpoint::ActivityEndpoint,
    ws::message::{ActivityPayload, Message},
};
use inner::{Command, Worker};

pub(crate) type WebsocketClient =
    websocket::WebSocketStream<websocket::MaybeTlsStream<tokio::net::TcpStream>>;

/// Resilient activity feed websocket client.
///
/// Owns one logical connection: opens it, watches liveness with a ping/pong heartbeat and
/// reconnects with exponential backoff until [`ReconnectPolicy::max_attempts`] is reached.
/// Every failure becomes a [`ConnectionState`] change, no method returns an error.
///
/// All work happens in a background task spawned on the current tokio runtime, methods
/// only queue commands and return immediately. Dropping the client shuts the task down.
#[derive(Debug)]
pub struct Client {
    url: Url,
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<ConnectionState>,
}

impl Client {
    /// Create a client for the endpoint, opening transports with `connector`.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a tokio runtime.
    pub fn new<C>(endpoint: &ActivityEndpoint, connector: C, config: ClientConfig) -> Self
    where
        C: Connector + 'static,
    {
        let url = endpoint.url().clone();
        let (commands, commands_rx) = mpsc::unbounded_channel();
        let (state_notifier, state) = watch::channel(ConnectionState::Disconnected);

        let worker = Worker::new(
            url.clone(),
            Arc::new(connector),
            config,
            commands_rx,
            state_notifier,
        );
        tokio::spawn(worker.run());

        log::debug!("Create client for {} with config {:?}", url, config);

        Self {
            url,
            commands,
            state,
        }
    }

    /// Create a client using [`TungsteniteConnector`]
    pub fn with_tungstenite(endpoint: &ActivityEndpoint, config: ClientConfig) -> Self {
        Self::new(endpoint, TungsteniteConnector, config)
    }

    fn command(&self, cmd: Command) {
        if self.commands.send(cmd).is_err() {
            log::warn!("Client worker for {} is gone, command dropped", self.url);
        }
    }

    /// Start connecting.
    ///
    /// No-op while connecting or open. From [`ConnectionState::Failed`] or
    /// [`ConnectionState::Disconnected`] it starts a fresh reconnect cycle.
    pub fn connect(&self) {
        self.command(Command::Connect)
    }

    /// Close connection and cancel every pending reconnect/heartbeat timer.
    ///
    /// Nothing reconnects automatically afterwards. Safe to call in any state.
    pub fn disconnect(&self) {
        self.command(Command::Disconnect)
    }

    /// Send a json message.
    ///
    /// The message is silently dropped unless the connection is [open](ConnectionState::Open)
    /// when the client processes it, there is no queue for later delivery.
    pub fn send<T: Serialize + ?Sized>(&self, message: &T) {
        match serde_json::to_value(message) {
            Ok(value) => self.command(Command::Send(Message::Data(ActivityPayload::new(value)))),
            Err(err) => log::warn!("Serialize message failed, drop it: {}", err),
        }
    }

    /// Subscribe client events, drop the stream to unsubscribe
    pub fn subscribe(&self) -> EventStream {
        let (tx, rx) = mpsc::unbounded_channel();
        self.command(Command::Subscribe(tx));
        EventStream { rx }
    }

    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Watch channel of connection state, for consumers only interested in the latest value
    pub fn state_changes(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    /// Connected websocket url
    pub fn url(&self) -> &Url {
        &self.url
    }
}
