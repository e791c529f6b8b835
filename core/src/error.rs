//! Error types for the invoices API client.
//!
//! # Design
//! Every non-2xx response lands in `Http` with the status code, reason
//! phrase and raw body text. Callers that care about "the invoice does not
//! exist" use `ApiError::is_not_found` instead of a dedicated variant, so the
//! HTTP failure stays a single kind regardless of status.

use thiserror::Error;

/// Errors returned by `InvoiceClient` parse methods and by `InvoiceApi`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server returned a non-2xx status.
    #[error("HTTP {status} {status_text} - {body}")]
    Http {
        status: u16,
        status_text: String,
        body: String,
    },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The body parsed but breaks an invariant of the list window.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The configured base URL cannot be parsed or cannot carry a path.
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),

    /// The invoice id cannot be used as a single path segment.
    #[error("invalid invoice id: {0:?}")]
    InvalidId(String),

    /// The request never produced a response.
    #[error("transport failed: {0}")]
    Transport(String),
}

impl ApiError {
    /// HTTP status carried by the error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Deserialization(err.to_string())
    }
}
