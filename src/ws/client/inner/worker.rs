use std::{sync::Arc, time::Duration};

use futures_util::{future, future::BoxFuture, FutureExt, SinkExt, StreamExt};
use tokio::sync::{mpsc, watch};
use url::Url;

use super::{
    backoff::Backoff,
    heartbeat::{Heartbeat, HeartbeatTick},
    timer::Timer,
};
use crate::ws::{
    client::{
        event::Subscribers, BoxTransport, ClientConfig, ClientEvent, ConnectError, ConnectionState,
        Connector,
    },
    message::{Message, MessageStreamSinkError},
};

/// Longest time to wait close handshake before dropping the transport
const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

type Opening = BoxFuture<'static, Result<BoxTransport, ConnectError>>;

#[derive(Debug)]
pub(crate) enum Command {
    Connect,
    Disconnect,
    Send(Message),
    Subscribe(mpsc::UnboundedSender<ClientEvent>),
}

enum Input {
    Command(Option<Command>),
    Opened(Result<BoxTransport, ConnectError>),
    ReconnectDue,
    Heartbeat(HeartbeatTick),
    Received(Option<Result<Message, MessageStreamSinkError>>),
}

/// Owns the connection and every timer of one client, processes one input at a time.
pub(crate) struct Worker {
    url: Url,
    connector: Arc<dyn Connector>,
    commands: mpsc::UnboundedReceiver<Command>,
    state: ConnectionState,
    state_notifier: watch::Sender<ConnectionState>,
    subscribers: Subscribers,
    backoff: Backoff,
    heartbeat: Heartbeat,
    reconnect: Timer,
    write_timeout: Duration,
    opening: Option<Opening>,
    transport: Option<BoxTransport>,
}

impl Worker {
    pub fn new(
        url: Url,
        connector: Arc<dyn Connector>,
        config: ClientConfig,
        commands: mpsc::UnboundedReceiver<Command>,
        state_notifier: watch::Sender<ConnectionState>,
    ) -> Self {
        Self {
            url,
            connector,
            commands,
            state: ConnectionState::Disconnected,
            state_notifier,
            subscribers: Subscribers::default(),
            backoff: Backoff::new(config.reconnect),
            heartbeat: Heartbeat::new(config.heartbeat),
            reconnect: Timer::default(),
            write_timeout: config.heartbeat.timeout,
            opening: None,
            transport: None,
        }
    }

    pub async fn run(mut self) {
        log::debug!("Client worker for {} start", self.url);

        loop {
            match self.next_input().await {
                Input::Command(Some(cmd)) => self.on_command(cmd).await,
                Input::Command(None) => {
                    log::debug!("Client handle dropped, shutdown");
                    self.teardown().await;
                    self.set_state(ConnectionState::Disconnected);
                    break;
                }
                Input::Opened(result) => self.on_opened(result),
                Input::ReconnectDue => self.on_reconnect_due(),
                Input::Heartbeat(HeartbeatTick::SendPing) => self.on_send_ping().await,
                Input::Heartbeat(HeartbeatTick::PongOverdue) => self.on_pong_overdue().await,
                Input::Received(Some(Ok(message))) => self.on_message(message),
                Input::Received(Some(Err(err))) => self.on_stream_error(err),
                Input::Received(None) => {
                    log::warn!("Transport closed by peer");
                    self.on_closed();
                }
            }
        }

        log::debug!("Client worker for {} stopped", self.url);
    }

    async fn next_input(&mut self) -> Input {
        tokio::select! {
            biased;

            cmd = self.commands.recv() => Input::Command(cmd),
            result = Self::opened(&mut self.opening) => Input::Opened(result),
            _ = self.reconnect.fired() => Input::ReconnectDue,
            tick = self.heartbeat.tick() => Input::Heartbeat(tick),
            frame = Self::received(&mut self.transport) => Input::Received(frame),
        }
    }

    async fn opened(opening: &mut Option<Opening>) -> Result<BoxTransport, ConnectError> {
        match opening {
            Some(fut) => fut.await,
            None => future::pending().await,
        }
    }

    async fn received(
        transport: &mut Option<BoxTransport>,
    ) -> Option<Result<Message, MessageStreamSinkError>> {
        match transport {
            Some(t) => t.next().await,
            None => future::pending().await,
        }
    }

    fn set_state(&mut self, state: ConnectionState) {
        if self.state == state {
            return;
        }

        log::debug!("Connection state {:?} -> {:?}", self.state, state);

        self.state = state;
        self.state_notifier.send_replace(state);
        self.subscribers.send(ClientEvent::StateChanged(state));
    }

    async fn on_command(&mut self, cmd: Command) {
        match cmd {
            Command::Connect => self.connect(),
            Command::Disconnect => {
                log::info!("Disconnect from {}", self.url);
                self.teardown().await;
                self.set_state(ConnectionState::Disconnected);
            }
            Command::Send(message) => self.send(message).await,
            Command::Subscribe(tx) => {
                // a new subscriber always starts from current state
                if tx.send(ClientEvent::StateChanged(self.state)).is_ok() {
                    self.subscribers.add(tx);
                    log::trace!("New subscriber, total {}", self.subscribers.len());
                }
            }
        }
    }

    fn connect(&mut self) {
        if self.opening.is_some() || self.transport.is_some() {
            log::debug!("Already {}, ignore connect", self.state);
            return;
        }

        if matches!(
            self.state,
            ConnectionState::Disconnected | ConnectionState::Failed
        ) {
            self.backoff.reset();
        }

        if self.reconnect.cancel() {
            log::debug!("Pending reconnect replaced by explicit connect");
        }

        self.start_connect();
    }

    fn start_connect(&mut self) {
        log::info!(
            "Connecting {}, reconnect attempts {}",
            self.url,
            self.backoff.attempts()
        );

        let connector = Arc::clone(&self.connector);
        let url = self.url.clone();
        self.opening = Some(async move { connector.connect(&url).await }.boxed());

        self.set_state(ConnectionState::Connecting);
    }

    fn on_opened(&mut self, result: Result<BoxTransport, ConnectError>) {
        self.opening = None;

        match result {
            Ok(transport) => {
                log::info!("Connected to {}", self.url);

                self.transport = Some(transport);
                self.backoff.reset();
                self.heartbeat.start();
                self.set_state(ConnectionState::Open);
            }
            Err(err) => {
                log::warn!("Open transport failed: {}", err);

                self.set_state(ConnectionState::Error);
                self.schedule_reconnect();
            }
        }
    }

    fn schedule_reconnect(&mut self) {
        if self.backoff.is_exhausted() {
            log::warn!(
                "Reached reconnect attempts limit {}, give up",
                self.backoff.attempts()
            );
            self.set_state(ConnectionState::Failed);
            return;
        }

        let delay = self.backoff.current_delay();
        log::info!(
            "Reconnect in {:?}, attempt {}",
            delay,
            self.backoff.attempts() + 1
        );

        self.reconnect.arm(delay);
    }

    fn on_reconnect_due(&mut self) {
        self.backoff.advance();
        self.start_connect();
    }

    async fn send(&mut self, message: Message) {
        if !self.state.is_open() {
            log::debug!("Connection is {}, drop {} message", self.state, message.type_name());
            return;
        }

        self.write(message).await;
    }

    /// Write one message, a failed or stalled write tears the transport down
    async fn write(&mut self, message: Message) {
        let transport = match self.transport.as_mut() {
            Some(transport) => transport,
            None => return,
        };

        log::trace!("Send {} message", message.type_name());

        match tokio::time::timeout(self.write_timeout, transport.send(message)).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => self.on_stream_error(err),
            Err(_) => {
                log::warn!(
                    "Write not finished in {:?}, close transport",
                    self.write_timeout
                );
                self.force_close().await;
            }
        }
    }

    async fn on_send_ping(&mut self) {
        // deadline runs from now even if the write itself hangs
        self.heartbeat.ping_sent();
        self.write(Message::Ping).await;
    }

    async fn on_pong_overdue(&mut self) {
        log::warn!("Pong timeout, close transport");
        self.force_close().await;
    }

    async fn force_close(&mut self) {
        self.set_state(ConnectionState::Closing);
        self.heartbeat.stop();
        self.close_transport().await;
        self.on_closed();
    }

    fn on_message(&mut self, message: Message) {
        log::trace!("Received new {} message", message.type_name());

        match message {
            Message::Pong(pong) => {
                if self.heartbeat.pong_received() {
                    log::trace!("Pong received, server time {:?}", pong.timestamp);
                } else {
                    log::debug!("Received pong while no ping waiting, ignore");
                }
            }
            Message::Data(payload) => {
                self.subscribers.send(ClientEvent::Activity(payload));
            }
            Message::Ping => {
                log::debug!("Ignore ping message from server");
            }
        }
    }

    fn on_stream_error(&mut self, err: MessageStreamSinkError) {
        if !err.is_fatal() {
            log::warn!("Drop malformed message: {}", err);
            return;
        }

        log::warn!("Find transport broken: {}", err);

        self.set_state(ConnectionState::Error);
        self.transport = None;
        self.on_closed();
    }

    fn on_closed(&mut self) {
        self.heartbeat.stop();
        self.transport = None;
        self.set_state(ConnectionState::Closed);
        self.schedule_reconnect();
    }

    async fn close_transport(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            match tokio::time::timeout(CLOSE_TIMEOUT, transport.close()).await {
                Ok(Ok(())) => log::debug!("Transport closed"),
                Ok(Err(err)) => log::debug!("Close transport failed: {}", err),
                Err(_) => log::debug!("Close transport timeout, drop it"),
            }
        }
    }

    /// Cancel everything armed and release the transport, schedule nothing
    async fn teardown(&mut self) {
        if self.reconnect.cancel() {
            log::debug!("Pending reconnect cancelled");
        }

        self.heartbeat.stop();

        if self.opening.take().is_some() {
            log::debug!("Pending transport open abandoned");
        }

        self.close_transport().await;
    }
}
