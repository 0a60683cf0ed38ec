use serde::Serialize;
use thiserror::Error;

/// Every failure the pipeline can surface to a transport.
#[derive(Debug, Error)]
pub enum KestrelError {
    /// Malformed request: missing or invalid location, non-numeric distance.
    #[error("{0}")]
    BadInput(String),

    /// Postal code with no known place, or no hotspots around the origin.
    #[error("{0}")]
    NotFound(String),

    /// Non-success response from eBird or the geocoder.
    #[error("upstream request failed with status {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("could not decode upstream response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Startup-only: the service cannot run without these.
    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, KestrelError>;

impl KestrelError {
    pub fn bad_input(message: impl Into<String>) -> Self {
        Self::BadInput(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// HTTP-equivalent status for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::BadInput(_) => 400,
            Self::NotFound(_) => 404,
            Self::Upstream { status, .. } => *status,
            Self::Http(_) | Self::Decode(_) | Self::Config(_) => 500,
        }
    }

    /// Failures that callers only see as a generic 500.
    pub fn is_internal(&self) -> bool {
        self.status_code() >= 500 && !matches!(self, Self::Upstream { .. })
    }
}

/// Structured error body handed to the transport layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorPayload {
    pub error: String,
    pub status: u16,
}

impl From<&KestrelError> for ErrorPayload {
    fn from(err: &KestrelError) -> Self {
        let error = if err.is_internal() {
            "Internal server error".to_string()
        } else {
            err.to_string()
        };
        Self {
            error,
            status: err.status_code(),
        }
    }
}
