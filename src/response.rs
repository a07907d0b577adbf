//! The uniform result envelope returned by every operation.

use crate::Error;

/// Outcome of a provider or bucket operation.
///
/// Every public operation in this crate returns an `ApiResponse` instead of
/// propagating errors: transport failures, non-success statuses, and local
/// validation problems (unknown provider, unsupported capability) all arrive
/// as [`ApiResponse::Failure`]. The two-variant shape guarantees a payload
/// exists exactly when the call succeeded.
///
/// `status` is populated only when an HTTP exchange actually took place;
/// local validation failures leave it as `None`.
#[derive(Debug)]
pub enum ApiResponse<T> {
    /// The operation succeeded and produced a payload.
    Success {
        /// HTTP status of the underlying exchange, if one occurred.
        status: Option<u16>,
        /// The operation's payload.
        data: T,
    },
    /// The operation failed.
    Failure {
        /// HTTP status of the underlying exchange, if one occurred.
        status: Option<u16>,
        /// Human-readable explanation of the failure.
        message: String,
        /// Underlying cause, when one is available.
        error: Option<Error>,
    },
}

impl<T> ApiResponse<T> {
    /// Successful response without an associated HTTP status.
    pub fn success(data: T) -> Self {
        Self::Success { status: None, data }
    }

    /// Successful response recording the HTTP status of the exchange.
    pub fn success_with_status(status: u16, data: T) -> Self {
        Self::Success {
            status: Some(status),
            data,
        }
    }

    /// Failure with a message only (local validation, no transport call).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure {
            status: None,
            message: message.into(),
            error: None,
        }
    }

    /// Failure carrying an underlying cause.
    pub fn failure_with(message: impl Into<String>, error: Error) -> Self {
        Self::Failure {
            status: None,
            message: message.into(),
            error: Some(error),
        }
    }

    /// Failure recording the HTTP status of the exchange.
    pub fn failure_with_status(status: u16, message: impl Into<String>, error: Option<Error>) -> Self {
        Self::Failure {
            status: Some(status),
            message: message.into(),
            error,
        }
    }

    /// Whether the operation succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// HTTP status of the underlying exchange, if one occurred.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Success { status, .. } | Self::Failure { status, .. } => *status,
        }
    }

    /// Failure message, if this is a failure.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Failure { message, .. } => Some(message),
            Self::Success { .. } => None,
        }
    }

    /// Payload reference, if this is a success.
    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Success { data, .. } => Some(data),
            Self::Failure { .. } => None,
        }
    }

    /// Consume the response and return the payload, if this is a success.
    pub fn into_data(self) -> Option<T> {
        match self {
            Self::Success { data, .. } => Some(data),
            Self::Failure { .. } => None,
        }
    }

    /// Underlying cause, if this is a failure that recorded one.
    pub fn error(&self) -> Option<&Error> {
        match self {
            Self::Failure { error, .. } => error.as_ref(),
            Self::Success { .. } => None,
        }
    }

    /// Map the success payload, leaving failures untouched.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiResponse<U> {
        match self {
            Self::Success { status, data } => ApiResponse::Success {
                status,
                data: f(data),
            },
            Self::Failure {
                status,
                message,
                error,
            } => ApiResponse::Failure {
                status,
                message,
                error,
            },
        }
    }
}
