use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Outcome of a single call to the route aggregator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UpstreamError {
    /// Connection refused, timeout, broken framing. Eligible for retry.
    #[error("transient network failure: {0}")]
    Transient(String),

    /// The aggregator answered with a non-2xx status.
    #[error("aggregator responded {status}: {body}")]
    Rejected { status: u16, body: String },

    /// 2xx response whose body is not JSON.
    #[error("aggregator returned an unreadable body: {0}")]
    Malformed(String),
}

impl UpstreamError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

/// Every way a quote request can fail, as seen by the HTTP caller.
#[derive(Error, Debug)]
pub enum QuoteError {
    // -- Caller ------------------------------------------------------------
    #[error("invalid parameter `{field}`: {reason}")]
    Validation { field: &'static str, reason: String },

    // -- Lifecycle ---------------------------------------------------------
    #[error("quote service is not ready")]
    NotReady,

    // -- Aggregator --------------------------------------------------------
    #[error("aggregator rejected the request with status {status}")]
    UpstreamRejected { status: u16, body: String },

    #[error("aggregator unreachable after {attempts} attempts")]
    UpstreamTimeout { attempts: u32, reason: String },

    #[error("aggregator failure")]
    UpstreamFailure(String),

    // -- Narration ---------------------------------------------------------
    #[error("failed to generate route summary")]
    Narration(#[source] anyhow::Error),
}

impl QuoteError {
    pub(crate) fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// Translate the last aggregator error into the caller-facing class.
    pub(crate) fn from_upstream(err: UpstreamError, attempts: u32) -> Self {
        match err {
            UpstreamError::Transient(reason) => Self::UpstreamTimeout { attempts, reason },
            UpstreamError::Rejected { status, body } => Self::UpstreamRejected { status, body },
            UpstreamError::Malformed(reason) => Self::UpstreamFailure(reason),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotReady => StatusCode::SERVICE_UNAVAILABLE,
            Self::UpstreamRejected { .. } | Self::UpstreamFailure(_) => StatusCode::BAD_GATEWAY,
            Self::UpstreamTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            Self::Narration(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn details(&self) -> Option<String> {
        match self {
            Self::Validation { .. } | Self::NotReady | Self::Narration(_) => None,
            Self::UpstreamRejected { status, body } => {
                Some(format!("LI.FI error ({status}): {body}"))
            }
            Self::UpstreamTimeout { reason, .. } => Some(format!("Upstream timeout: {reason}")),
            Self::UpstreamFailure(reason) => Some(format!("Upstream failure: {reason}")),
        }
    }
}

/// Wire shape of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub details: Option<String>,
}

impl IntoResponse for QuoteError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if let Self::Narration(cause) = &self {
            tracing::error!(error = ?cause, "narration failed");
        }
        let body = ErrorBody {
            error: self.to_string(),
            details: self.details(),
        };
        (status, Json(body)).into_response()
    }
}
