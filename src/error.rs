//! Error types carried by failure responses.

use thiserror::Error;

/// Underlying causes attached to failed [`ApiResponse`](crate::ApiResponse) values.
///
/// Callers branch on the response itself; this type exists for diagnostics
/// (logging, debugging provider misbehavior), not for control flow.
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed at the transport level (DNS, connect, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// Server returned a non-success status. The raw body is preserved.
    #[error("API returned status {status}: {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body, truncated only by the server.
        body: String,
    },

    /// Failed to parse session tokens out of a provider's bootstrap response.
    #[error("failed to parse session tokens: {0}")]
    SessionParse(String),

    /// A provider implementation panicked mid-call.
    #[error("provider panicked: {0}")]
    ProviderPanic(String),
}
