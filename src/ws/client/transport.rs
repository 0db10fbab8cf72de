use std::fmt::Debug;

use futures_util::{Sink, Stream};
use snafu::prelude::*;
use tokio_tungstenite as websocket;
use url::Url;

use crate::ws::message::{Message, MessageStreamSink, MessageStreamSinkError};

/// Error when open transport to activity endpoint
#[derive(Debug, Snafu)]
#[snafu(
    display("connect activity endpoint {url} failed: {source}"),
    visibility(pub(crate)),
    module(error),
    context(suffix(false))
)]
pub struct ConnectError {
    /// connected url
    pub url: String,
    /// source error
    pub source: websocket::tungstenite::Error,
}

/// A full-duplex, message oriented persistent connection.
///
/// The stream ending means the connection is closed, a [fatal](MessageStreamSinkError::is_fatal)
/// error means it is broken.
pub trait Transport:
    Stream<Item = Result<Message, MessageStreamSinkError>>
    + Sink<Message, Error = MessageStreamSinkError>
    + Debug
    + Send
    + Unpin
{
}

impl<T> Transport for T where
    T: Stream<Item = Result<Message, MessageStreamSinkError>>
        + Sink<Message, Error = MessageStreamSinkError>
        + Debug
        + Send
        + Unpin
{
}

/// Boxed transport owned by client
pub type BoxTransport = Box<dyn Transport>;

/// Open new transport to a url
#[async_trait::async_trait]
pub trait Connector: Debug + Send + Sync {
    /// connect to url, return the opened transport
    async fn connect(&self, url: &Url) -> Result<BoxTransport, ConnectError>;
}

/// Production connector using tokio-tungstenite
#[derive(Debug, Clone, Copy, Default)]
pub struct TungsteniteConnector;

#[async_trait::async_trait]
impl Connector for TungsteniteConnector {
    async fn connect(&self, url: &Url) -> Result<BoxTransport, ConnectError> {
        log::debug!("Connecting activity endpoint: {}", url);

        let ws = websocket::connect_async(url)
            .await
            .map(|(client, _)| client)
            .with_context(|_| error::Connect {
                url: url.to_string(),
            })?;

        log::debug!("Activity endpoint {} connected", url);

        Ok(Box::new(MessageStreamSink::new(ws)))
    }
}
