use std::task::Poll;

use futures_util::{Sink, SinkExt, Stream, StreamExt};
use snafu::prelude::*;
use tokio_tungstenite::tungstenite as websocket;

use super::{Message, ParseMessageError};
use crate::ws::client::WebsocketClient;

/// Error when read/write message stream/sink
#[derive(Debug, Snafu)]
#[snafu(module(error), context(suffix(false)))]
pub enum MessageStreamSinkError {
    /// underlying websocket stream broken
    #[snafu(display("underlying websocket stream broken: {source}"))]
    Websocket {
        /// source error
        source: websocket::Error,
    },

    /// parse frame data to message failed
    #[snafu(display("parse frame to message failed: {source}"))]
    ParseMessageFailed {
        /// source error
        source: ParseMessageError,
    },
}

impl MessageStreamSinkError {
    /// Check if this error will make the stream/sink stop
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Websocket { .. } => true,
            Self::ParseMessageFailed { .. } => false,
        }
    }
}

/// Activity feed message stream/sink over a websocket connection.
///
/// Text and binary frames are decoded as json messages, websocket level ping/pong frames are
/// answered by tungstenite and skipped here, a close frame ends the stream.
#[derive(Debug)]
pub struct MessageStreamSink<S = WebsocketClient> {
    ws: S,
}

impl<S> MessageStreamSink<S> {
    /// Construct a new stream with underlying websocket connection.
    pub fn new(ws: S) -> Self {
        Self { ws }
    }
}

impl<S> Stream for MessageStreamSink<S>
where
    S: Stream<Item = Result<websocket::Message, websocket::Error>> + Unpin,
{
    type Item = Result<Message, MessageStreamSinkError>;

    fn poll_next(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> Poll<Option<Self::Item>> {
        loop {
            let frame = match self.ws.poll_next_unpin(cx) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Ready(Some(frame)) => frame,
            };

            let result = match frame.context(error::Websocket) {
                Ok(websocket::Message::Text(text)) => {
                    Message::decode(&text).map_err(|e| {
                        log::trace!("Parse failed message data: {}", text);
                        MessageStreamSinkError::ParseMessageFailed { source: e }
                    })
                }
                Ok(websocket::Message::Binary(data)) => Message::decode_binary(data)
                    .map_err(|e| MessageStreamSinkError::ParseMessageFailed { source: e }),
                Ok(websocket::Message::Close(frame)) => {
                    log::debug!("Received close frame: {:?}", frame);
                    return Poll::Ready(None);
                }
                Ok(other) => {
                    log::trace!("Skip control frame: {:?}", other);
                    continue;
                }
                Err(err) => Err(err),
            };

            return Poll::Ready(Some(result));
        }
    }
}

fn broken(source: websocket::Error) -> MessageStreamSinkError {
    MessageStreamSinkError::Websocket { source }
}

/// Messages go out as text frames holding their json encoding
impl<S> Sink<Message> for MessageStreamSink<S>
where
    S: Sink<websocket::Message, Error = websocket::Error> + Unpin,
{
    type Error = MessageStreamSinkError;

    fn poll_ready(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> Poll<Result<(), Self::Error>> {
        self.ws.poll_ready_unpin(cx).map_err(broken)
    }

    fn start_send(mut self: std::pin::Pin<&mut Self>, item: Message) -> Result<(), Self::Error> {
        let frame = websocket::Message::Text(item.encode());
        self.ws.start_send_unpin(frame).map_err(broken)
    }

    fn poll_flush(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> Poll<Result<(), Self::Error>> {
        self.ws.poll_flush_unpin(cx).map_err(broken)
    }

    fn poll_close(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> Poll<Result<(), Self::Error>> {
        self.ws.poll_close_unpin(cx).map_err(broken)
    }
}

#[cfg(test)]
mod test {
    use futures_util::stream;

    use super::*;

    type Frame = Result<websocket::Message, websocket::Error>;

    fn frames(items: Vec<Frame>) -> MessageStreamSink<stream::Iter<std::vec::IntoIter<Frame>>> {
        MessageStreamSink::new(stream::iter(items))
    }

    #[tokio::test]
    async fn test_text_and_binary_frames_are_decoded() {
        let mut s = frames(vec![
            Ok(websocket::Message::Text(r#"{"type":"pong"}"#.to_string())),
            Ok(websocket::Message::Binary(br#"{"total_records":3}"#.to_vec())),
        ]);

        assert!(s.next().await.unwrap().unwrap().is_pong());
        let payload = s.next().await.unwrap().unwrap().into_data().unwrap();
        assert_eq!(payload.total_records(), Some(3));
        assert!(s.next().await.is_none());
    }

    #[tokio::test]
    async fn test_control_frames_are_skipped() {
        let mut s = frames(vec![
            Ok(websocket::Message::Ping(vec![1])),
            Ok(websocket::Message::Pong(vec![2])),
            Ok(websocket::Message::Text("{}".to_string())),
        ]);

        assert!(s.next().await.unwrap().unwrap().is_data());
    }

    #[tokio::test]
    async fn test_malformed_frame_is_not_fatal() {
        let mut s = frames(vec![
            Ok(websocket::Message::Text("oops".to_string())),
            Ok(websocket::Message::Text("{}".to_string())),
        ]);

        let err = s.next().await.unwrap().unwrap_err();
        assert!(!err.is_fatal());
        assert!(s.next().await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_close_frame_ends_stream() {
        let mut s = frames(vec![
            Ok(websocket::Message::Close(None)),
            Ok(websocket::Message::Text("{}".to_string())),
        ]);

        assert!(s.next().await.is_none());
    }

    #[tokio::test]
    async fn test_websocket_error_is_fatal() {
        let mut s = frames(vec![Err(websocket::Error::ConnectionClosed)]);

        let err = s.next().await.unwrap().unwrap_err();
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_messages_are_sent_as_text_frames() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let ws = futures_util::sink::unfold(tx, |tx, frame: websocket::Message| async move {
            tx.send(frame)
                .map_err(|_| websocket::Error::ConnectionClosed)?;
            Ok::<_, websocket::Error>(tx)
        });
        let mut s = MessageStreamSink::new(Box::pin(ws));

        s.send(Message::Ping).await.unwrap();

        let frame = rx.try_recv().unwrap();
        let value: serde_json::Value = serde_json::from_str(frame.to_text().unwrap()).unwrap();
        assert_eq!(value, serde_json::json!({"type": "ping"}));
        assert!(rx.try_recv().is_err());
    }
}
