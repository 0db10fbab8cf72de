use std::task::Poll;

use enum_as_inner::EnumAsInner;
use futures_util::Stream;
use tokio::sync::mpsc;

use super::ConnectionState;
use crate::ws::message::ActivityPayload;

/// Event produced by client
#[derive(Debug, Clone, PartialEq, EnumAsInner)]
pub enum ClientEvent {
    /// connection state changed to the new state
    StateChanged(ConnectionState),
    /// application data received
    Activity(ActivityPayload),
}

/// Client event stream, drop it to unsubscribe.
///
/// The first event is always the connection state at the moment of subscribing, then events
/// are delivered in the order they happened. The stream ends when the client is dropped.
#[derive(Debug)]
pub struct EventStream {
    pub(crate) rx: mpsc::UnboundedReceiver<ClientEvent>,
}

impl Stream for EventStream {
    type Item = ClientEvent;

    fn poll_next(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

/// Fan-out of client events to every live subscriber
#[derive(Debug, Default)]
pub(crate) struct Subscribers {
    txs: Vec<mpsc::UnboundedSender<ClientEvent>>,
}

impl Subscribers {
    pub fn add(&mut self, tx: mpsc::UnboundedSender<ClientEvent>) {
        self.txs.push(tx);
    }

    pub fn send(&mut self, event: ClientEvent) {
        let before = self.txs.len();
        self.txs.retain(|tx| tx.send(event.clone()).is_ok());

        if self.txs.len() < before {
            log::debug!("Drop {} closed subscriber(s)", before - self.txs.len());
        }
    }

    pub fn len(&self) -> usize {
        self.txs.len()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_dropped_subscriber_is_removed() {
        let mut subscribers = Subscribers::default();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, rx2) = mpsc::unbounded_channel();
        subscribers.add(tx1);
        subscribers.add(tx2);

        drop(rx2);
        subscribers.send(ClientEvent::StateChanged(ConnectionState::Connecting));

        assert_eq!(subscribers.len(), 1);
        assert_eq!(
            rx1.try_recv().unwrap(),
            ClientEvent::StateChanged(ConnectionState::Connecting)
        );
    }
}
