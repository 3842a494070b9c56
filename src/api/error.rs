use reqwest::StatusCode;
use thiserror::Error;

use crate::calendar::EventId;

/// Failures talking to the events backend.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("event {0} not found")]
    NotFound(EventId),

    #[error("server responded {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("unexpected response body: {0}")]
    Decode(#[source] reqwest::Error),
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_))
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
