use thiserror::Error;

use crate::{paginate::Marker, version::ApiVersion};

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0} is not a valid API version")]
    InvalidApiVersion(String),
    #[error("The server requires at least API version {server_min} but this client supports up to {client_max}")]
    UnsupportedApiVersion {
        server_min: ApiVersion,
        client_max: ApiVersion,
    },
    #[error("{0} is not a valid page size, it must be a strictly positive integer")]
    InvalidPageSize(String),
    #[error("Paging settings could not be parsed: {0}")]
    MalformedSettings(#[from] serde_json::Error),
    #[error("No server with id {0}")]
    UnknownServer(String),
    #[error("No flavor with id {0}")]
    UnknownFlavor(String),
    #[error("Marker {0} could not be found")]
    UnknownMarker(Marker),
}
