//! Error types for authenticated API calls.

use thiserror::Error;

/// Error type for all API operations.
///
/// `Unauthorized` is kept distinct from other non-2xx statuses so callers
/// can route the user back to sign-in instead of showing a generic failure.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server rejected the bearer credential (HTTP 401).
    #[error("Unauthorized")]
    Unauthorized,

    /// Any other non-success HTTP status.
    #[error("Request failed: {status}")]
    RequestFailed {
        /// The HTTP status code returned by the server.
        status: u16,
    },

    /// Network or transport-level HTTP error from reqwest.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body did not parse as the expected JSON shape.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience Result type alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_display() {
        let err = ApiError::Unauthorized;
        assert_eq!(format!("{}", err), "Unauthorized");
    }

    #[test]
    fn request_failed_display() {
        let err = ApiError::RequestFailed { status: 503 };
        assert_eq!(format!("{}", err), "Request failed: 503");
    }

    #[test]
    fn json_error_from_serde() {
        let bad_json = "not json at all {{{";
        let serde_err = serde_json::from_str::<serde_json::Value>(bad_json).unwrap_err();
        let err: ApiError = serde_err.into();
        let display = format!("{}", err);
        assert!(display.starts_with("JSON error:"));
    }

    #[test]
    fn request_failed_is_debug() {
        let err = ApiError::RequestFailed { status: 500 };
        let debug = format!("{:?}", err);
        assert!(debug.contains("500"));
    }
}
