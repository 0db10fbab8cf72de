//! crate error types

use snafu::prelude::*;

use super::endpoint::ParseEndpointError;

/// crate result type
pub type Result<T> = std::result::Result<T, Error>;

/// crate error type
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)), context(suffix(false)))]
pub enum Error {
    /// Received invalid api base url, can't derive activity endpoint from it
    #[snafu(display("invalid api base url {url}: {source}"))]
    InvalidEndpoint {
        /// received url
        url: String,
        /// source error
        source: ParseEndpointError,
    },
}
