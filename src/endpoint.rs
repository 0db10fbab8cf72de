//! Activity feed endpoint derivation from the dashboard REST API base url.

use std::{fmt::Display, str::FromStr};

use snafu::prelude::*;
use url::Url;

/// Path appended to the api base url to reach the activity feed
pub static ACTIVITY_PATH: &str = "/ws/activity";

/// Parse string as activity endpoint error
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)), module(error), context(suffix(false)))]
pub enum ParseEndpointError {
    /// the str is not a valid url
    #[snafu(display("{s} is an invalid url: {source}"))]
    InvalidURL {
        /// string be parsed
        s: String,
        /// source error
        source: url::ParseError,
    },

    /// the parsed url schema can't be mapped to a websocket schema
    #[snafu(display("the url {s} has invalid schema {schema}, only http(s) or ws(s) is ok"))]
    InvalidSchema {
        /// the url
        s: String,
        /// invalid schema
        schema: String,
    },

    /// the parsed url has no host
    #[snafu(display("the url {s} has no host"))]
    NoHost {
        /// the url
        s: String,
    },
}

/// Websocket endpoint of the activity feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityEndpoint {
    url: Url,
}

impl ActivityEndpoint {
    /// Derive the endpoint from REST api base url.
    ///
    /// `https` becomes `wss` (and `http` becomes `ws`), then [`ACTIVITY_PATH`] is appended
    /// to the base path. A url that already has a websocket schema is used as the base as is.
    pub fn from_api_base<S: AsRef<str> + ?Sized>(base: &S) -> Result<Self, ParseEndpointError> {
        let s = base.as_ref();
        let mut url = Url::parse(s).context(error::InvalidURL { s })?;

        let schema = match url.scheme() {
            "https" | "wss" => "wss",
            "http" | "ws" => "ws",
            other => {
                return error::InvalidSchema { s, schema: other }.fail();
            }
        };

        ensure!(url.host().is_some(), error::NoHost { s });

        switch_schema(&mut url, schema, s)?;

        let path = format!("{}{}", url.path().trim_end_matches('/'), ACTIVITY_PATH);
        url.set_path(&path);

        log::trace!("Derived activity endpoint {} from api base {}", url, s);

        Ok(Self { url })
    }

    /// final websocket url
    pub fn url(&self) -> &Url {
        &self.url
    }
}

fn switch_schema(url: &mut Url, schema: &str, s: &str) -> Result<(), ParseEndpointError> {
    url.set_scheme(schema).ok().context(error::InvalidSchema {
        s,
        schema: url.scheme(),
    })
}

impl FromStr for ActivityEndpoint {
    type Err = ParseEndpointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_api_base(s)
    }
}

impl Display for ActivityEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.url.fmt(f)
    }
}
