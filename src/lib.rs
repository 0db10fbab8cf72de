//! # activity-socket
//!
//! Resilient websocket client for the school dashboard activity feed.
//!
//! The [`Client`](ws::Client) keeps one connection alive with a ping/pong heartbeat and
//! reconnects with exponential backoff, the [`ConnectionObserver`](observer::ConnectionObserver)
//! mirrors what it reports for display.

#![deny(clippy::all)]
#![deny(missing_debug_implementations, missing_docs)]
#![forbid(unsafe_code)]

pub mod endpoint;
pub mod observer;
pub mod ws;

mod error;
pub use error::{Error, Result};

use snafu::prelude::*;

use endpoint::ActivityEndpoint;
use ws::{Client, ClientConfig};

/// Create a client for the activity feed of the dashboard api at `api_base`.
///
/// The returned client is not connected yet, call [`Client::connect`] to start.
pub fn activity_client<S: AsRef<str> + ?Sized>(api_base: &S, config: ClientConfig) -> Result<Client> {
    let api_base = api_base.as_ref();

    let endpoint = ActivityEndpoint::from_api_base(api_base)
        .with_context(|_| error::InvalidEndpoint { url: api_base })?;

    log::info!("Activity endpoint: {}", endpoint);

    Ok(Client::with_tungstenite(&endpoint, config))
}
