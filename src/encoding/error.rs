//! Error types produced while decoding request bodies.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    BoxError,
};
use thiserror::Error;

/// Why a JSON request body was rejected.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Content-Type header is not application/json")]
    UnsupportedMediaType,

    #[error("Request body contains badly-formed JSON (at position {offset})")]
    Syntax { offset: usize },

    #[error("Request body contains badly-formed JSON")]
    UnexpectedEof,

    #[error("Request body contains an invalid value for the \"{field}\" field (at position {offset})")]
    InvalidValue { field: String, offset: usize },

    #[error("Request body contains unknown field \"{field}\"")]
    UnknownField { field: String },

    #[error("Request body is missing the \"{field}\" field")]
    MissingField { field: String },

    #[error("Request body must not be empty")]
    Empty,

    #[error("Request body must not be larger than 1MB")]
    TooLarge,

    #[error("Request body must only contain a single JSON object")]
    MultipleValues,

    /// Anything the classifier does not recognise. The cause is for logs only.
    #[error("unable to decode json request: {0}")]
    Internal(#[source] BoxError),
}

impl DecodeError {
    /// HTTP status the client receives for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            DecodeError::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            DecodeError::TooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            DecodeError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            DecodeError::Syntax { .. }
            | DecodeError::UnexpectedEof
            | DecodeError::InvalidValue { .. }
            | DecodeError::UnknownField { .. }
            | DecodeError::MissingField { .. }
            | DecodeError::Empty
            | DecodeError::MultipleValues => StatusCode::BAD_REQUEST,
        }
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, DecodeError::Internal(_))
    }
}

/// An invalid HTTP request: the status to reply with and a message
/// describing what was wrong.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct BadRequestError {
    pub status: StatusCode,
    pub message: String,
}

impl BadRequestError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<DecodeError> for BadRequestError {
    fn from(err: DecodeError) -> Self {
        let status = err.status();
        let message = if err.is_internal() {
            status
                .canonical_reason()
                .unwrap_or("Internal Server Error")
                .to_string()
        } else {
            err.to_string()
        };
        Self { status, message }
    }
}

impl IntoResponse for BadRequestError {
    fn into_response(self) -> Response {
        (self.status, self.message).into_response()
    }
}
