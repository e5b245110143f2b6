mod auth;
mod client;
mod errors;

pub use auth::{AuthToken, PasswordCredentials};
pub use client::ComputeServiceClient;
pub use errors::{Error, Result};
