use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("The identity service did not return a token")]
    MissingSubjectToken,
    #[error("The authentication token expired and no credentials are available to renew it")]
    TokenExpired,
    #[error("The client received an unexpected response that could not be parsed: {source}")]
    MalformedJsonResponse {
        #[from]
        source: serde_json::Error,
    },
    #[error("The response does not contain the expected `{0}` field")]
    MissingResponseField(&'static str),
    #[error("Could not send the request: {source}")]
    SendRequestError {
        #[from]
        source: reqwest::Error,
    },
    #[error("Cannot retrieve the response body string")]
    UnretrievableBodyResponse,
    #[error("Compute API responded with error {code}: {message}")]
    ApiErrorResponse { code: u16, message: String },
    #[error(transparent)]
    Paging(#[from] compute_paging::Error),
}
