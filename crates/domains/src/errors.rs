//! # Errors
//!
//! Failures the board client distinguishes. Validation and privilege
//! failures are raised before any request leaves the client; `ApiError`
//! covers everything that happens once one does.

use thiserror::Error;

/// Failure talking to the remote posts API.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Connection refused, DNS failure, reset, timeout...
    #[error("transport failure: {0}")]
    Transport(String),

    /// The server answered with a non-2xx status.
    #[error("server responded with status {0}")]
    Status(u16),

    /// The response body was not the expected JSON shape.
    #[error("malformed response: {0}")]
    Decode(String),

    /// The request URL could not be built from the configured base.
    #[error("invalid request url: {0}")]
    InvalidUrl(String),
}

/// The error type returned by board client mutations.
///
/// By the time a caller sees one of these, the user has already been
/// notified through the `Interaction` port.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Input rejected locally (e.g. empty post body).
    #[error("validation error: {0}")]
    Validation(String),

    /// The action needs a logged-in session.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The action needs an admin session.
    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl ClientError {
    /// True when the request never left the client.
    pub fn is_local(&self) -> bool {
        !matches!(self, ClientError::Api(_))
    }
}

/// A specialized Result type for board client mutations.
pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_errors_are_distinguished_from_api_errors() {
        assert!(ClientError::Validation("empty".into()).is_local());
        assert!(ClientError::Forbidden("admin only".into()).is_local());
        assert!(!ClientError::from(ApiError::Status(500)).is_local());
    }

    #[test]
    fn api_error_display_is_transparent() {
        let err = ClientError::from(ApiError::Status(404));
        assert_eq!(err.to_string(), "server responded with status 404");
    }
}
