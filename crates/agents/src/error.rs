use parley_core::AgentError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Provider API error: {message} (status: {status_code:?})")]
    Api {
        message: String,
        status_code: Option<u16>,
    },

    #[error("Rate limited (retry after {retry_after:?}s)")]
    RateLimited { retry_after: Option<u64> },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Empty completion from provider")]
    EmptyCompletion,
}

impl From<ClientError> for AgentError {
    fn from(err: ClientError) -> Self {
        AgentError::Provider(err.to_string())
    }
}
