//! Activity feed websocket client implement

mod client;
pub mod message;

pub use client::{
    BoxTransport, Client, ClientConfig, ClientEvent, ConnectError, ConnectionState, Connector,
    EventStream, HeartbeatConfig, ReconnectPolicy, Transport, TungsteniteConnector,
    PING_INTERVAL, PONG_TIMEOUT, RECONNECT_BACKOFF_MULTIPLIER, RECONNECT_INITIAL_DELAY,
    RECONNECT_MAX_ATTEMPTS, RECONNECT_MAX_DELAY,
};
pub use message::{ActivityPayload, ActivityRecord, Message};
