use std::fmt::Display;

/// Connection state of a [Client](super::Client)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// not connected, no reconnect scheduled
    #[default]
    Disconnected,
    /// opening transport
    Connecting,
    /// transport open, heartbeat running
    Open,
    /// client is closing an unhealthy transport
    Closing,
    /// transport closed unexpectedly, reconnect scheduled
    Closed,
    /// transport failed to open or broke
    Error,
    /// reconnect attempts exhausted, only an explicit connect recovers
    Failed,
}

impl ConnectionState {
    /// true if messages can be sent
    pub fn is_open(&self) -> bool {
        *self == Self::Open
    }

    /// true if transport is being opened
    pub fn is_connecting(&self) -> bool {
        *self == Self::Connecting
    }

    /// true for error and failed
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error | Self::Failed)
    }

    /// human readable status text
    pub fn status_text(&self) -> &'static str {
        match self {
            Self::Disconnected => "Disconnected",
            Self::Connecting => "Connecting...",
            Self::Open => "Connected",
            Self::Closing => "Closing...",
            Self::Closed => "Closed",
            Self::Error => "Error",
            Self::Failed => "Connection failed",
        }
    }
}

impl Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.status_text())
    }
}
