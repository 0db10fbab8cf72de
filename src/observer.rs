//! Presentation side mirror of a client: connection state, last activity payload and the
//! time it arrived.

use std::time::SystemTime;

use futures_util::StreamExt;
use tokio::{sync::watch, task::JoinHandle};

use crate::ws::{ActivityPayload, Client, ClientEvent, ConnectionState, EventStream};

/// Colored status dot for a connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    /// open
    Green,
    /// connecting or closing
    Yellow,
    /// error, or reconnect given up
    Red,
    /// not connected
    Gray,
}

impl From<ConnectionState> for Indicator {
    fn from(state: ConnectionState) -> Self {
        match state {
            ConnectionState::Open => Self::Green,
            ConnectionState::Connecting | ConnectionState::Closing => Self::Yellow,
            ConnectionState::Error | ConnectionState::Failed => Self::Red,
            ConnectionState::Closed | ConnectionState::Disconnected => Self::Gray,
        }
    }
}

/// Observed state at one moment
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    /// latest connection state
    pub connection_state: ConnectionState,
    /// latest activity payload
    pub activity: Option<ActivityPayload>,
    /// when the latest activity payload arrived
    pub last_update: Option<SystemTime>,
}

impl Snapshot {
    /// Fold one client event into the snapshot
    pub fn apply(&mut self, event: ClientEvent) {
        match event {
            ClientEvent::StateChanged(state) => {
                self.connection_state = state;
            }
            ClientEvent::Activity(payload) => {
                self.activity = Some(payload);
                self.last_update = Some(SystemTime::now());
            }
        }
    }

    /// connection is open
    pub fn is_connected(&self) -> bool {
        self.connection_state.is_open()
    }

    /// connection is being opened
    pub fn is_connecting(&self) -> bool {
        self.connection_state.is_connecting()
    }

    /// connection is in error or failed state
    pub fn has_error(&self) -> bool {
        self.connection_state.is_error()
    }

    /// status dot color
    pub fn indicator(&self) -> Indicator {
        self.connection_state.into()
    }
}

/// Keeps a [`Snapshot`] up to date from a client event stream.
///
/// It never reconnects or sends anything, it only mirrors what the client reports.
#[derive(Debug)]
pub struct ConnectionObserver {
    snapshot: watch::Receiver<Snapshot>,
    task: JoinHandle<()>,
}

impl ConnectionObserver {
    /// Observe a client
    pub fn new(client: &Client) -> Self {
        Self::from_stream(client.subscribe())
    }

    /// Observe an event stream
    pub fn from_stream(mut events: EventStream) -> Self {
        let (notifier, snapshot) = watch::channel(Snapshot::default());

        let task = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                log::trace!("Observer received event: {:?}", event);
                notifier.send_modify(|s| s.apply(event));
            }
            log::debug!("Observed event stream ended");
        });

        Self { snapshot, task }
    }

    /// Copy of current snapshot
    pub fn snapshot(&self) -> Snapshot {
        self.snapshot.borrow().clone()
    }

    /// Wait next snapshot change, returns false if the observed client is gone
    pub async fn changed(&mut self) -> bool {
        self.snapshot.changed().await.is_ok()
    }

    /// latest connection state
    pub fn connection_state(&self) -> ConnectionState {
        self.snapshot.borrow().connection_state
    }

    /// latest activity payload
    pub fn activity(&self) -> Option<ActivityPayload> {
        self.snapshot.borrow().activity.clone()
    }

    /// when the latest activity payload arrived
    pub fn last_update(&self) -> Option<SystemTime> {
        self.snapshot.borrow().last_update
    }

    /// connection is open
    pub fn is_connected(&self) -> bool {
        self.snapshot.borrow().is_connected()
    }

    /// connection is being opened
    pub fn is_connecting(&self) -> bool {
        self.snapshot.borrow().is_connecting()
    }

    /// connection is in error or failed state
    pub fn has_error(&self) -> bool {
        self.snapshot.borrow().has_error()
    }

    /// status dot color
    pub fn indicator(&self) -> Indicator {
        self.snapshot.borrow().indicator()
    }
}

impl Drop for ConnectionObserver {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;
    use tokio::sync::mpsc;

    use super::*;

    #[test]
    fn test_snapshot_apply() {
        let mut snapshot = Snapshot::default();
        assert_eq!(snapshot.indicator(), Indicator::Gray);

        snapshot.apply(ClientEvent::StateChanged(ConnectionState::Connecting));
        assert!(snapshot.is_connecting());
        assert_eq!(snapshot.indicator(), Indicator::Yellow);

        snapshot.apply(ClientEvent::StateChanged(ConnectionState::Open));
        assert!(snapshot.is_connected());
        assert!(snapshot.last_update.is_none());

        let payload = ActivityPayload::new(json!({"total_records": 0, "data": []}));
        snapshot.apply(ClientEvent::Activity(payload.clone()));
        assert_eq!(snapshot.activity, Some(payload));
        assert!(snapshot.last_update.is_some());
        assert!(snapshot.is_connected());
    }

    #[test]
    fn test_failed_is_distinct_from_closed() {
        let mut snapshot = Snapshot::default();

        snapshot.apply(ClientEvent::StateChanged(ConnectionState::Closed));
        assert!(!snapshot.has_error());
        assert_eq!(snapshot.indicator(), Indicator::Gray);

        snapshot.apply(ClientEvent::StateChanged(ConnectionState::Failed));
        assert!(snapshot.has_error());
        assert_eq!(snapshot.indicator(), Indicator::Red);
        assert_ne!(
            snapshot.connection_state.status_text(),
            ConnectionState::Closed.status_text()
        );
    }

    #[tokio::test]
    async fn test_observer_follows_stream() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut observer = ConnectionObserver::from_stream(EventStream { rx });

        tx.send(ClientEvent::StateChanged(ConnectionState::Open))
            .unwrap();
        assert!(observer.changed().await);
        assert!(observer.is_connected());

        tx.send(ClientEvent::Activity(ActivityPayload::new(json!({"total_records": 5}))))
            .unwrap();
        assert!(observer.changed().await);
        assert_eq!(observer.activity().unwrap().total_records(), Some(5));
        assert!(observer.last_update().is_some());

        drop(tx);
        assert!(!observer.changed().await);
        assert_eq!(observer.connection_state(), ConnectionState::Open);
    }
}
