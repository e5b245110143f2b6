use core::fmt::Display;

use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Client(#[from] compute_api_client::Error),
    #[error(transparent)]
    Paging(#[from] compute_paging::Error),
    #[error("Could not read the paging settings file: {0}")]
    SettingsFile(#[from] std::io::Error),
    #[error("{0}")]
    Generic(String),
}

impl Error {
    pub fn generic(e: impl Display) -> Self {
        Self::Generic(e.to_string())
    }
}
