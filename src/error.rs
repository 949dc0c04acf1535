//! Error taxonomy for route guidance.

use thiserror::Error;

/// Code used for provider failures that never produced a provider status
/// (transport errors, unreadable bodies).
pub const TRANSPORT_FAILURE_CODE: i64 = -1;

/// Classification of a routing provider status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteStatus {
    Ok,
    NoRouteFound,
    InvalidInput,
    ProviderError,
}

impl RouteStatus {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => RouteStatus::Ok,
            442 => RouteStatus::NoRouteFound,
            100..=199 => RouteStatus::InvalidInput,
            _ => RouteStatus::ProviderError,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NavError {
    #[error("Malformed polyline: truncated or invalid byte at offset {offset}")]
    MalformedPolyline { offset: usize },

    #[error("Route contains no maneuvers")]
    EmptyRoute,

    #[error("Routing provider error (code {code}): {message}")]
    RouteProvider {
        status: RouteStatus,
        code: i64,
        message: String,
    },

    #[error("Location unavailable: {0}")]
    LocationUnavailable(String),

    #[error("No speech output available")]
    SpeechUnsupported,

    #[error("Route request was superseded by a newer request")]
    RequestSuperseded,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl NavError {
    /// Builds a provider error from the provider's own status code and message.
    pub fn provider(code: i64, message: impl Into<String>) -> Self {
        NavError::RouteProvider {
            status: RouteStatus::from_code(code),
            code,
            message: message.into(),
        }
    }

    /// Builds a provider error for failures below the provider protocol.
    pub fn transport(message: impl Into<String>) -> Self {
        NavError::RouteProvider {
            status: RouteStatus::ProviderError,
            code: TRANSPORT_FAILURE_CODE,
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for NavError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => NavError::RouteProvider {
                status: RouteStatus::ProviderError,
                code: i64::from(status.as_u16()),
                message: err.to_string(),
            },
            None => NavError::transport(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for NavError {
    fn from(err: serde_json::Error) -> Self {
        NavError::transport(format!("unreadable provider response: {err}"))
    }
}
