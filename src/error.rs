//! Classified errors returned by every store-facing operation.
//!
//! The boundary layer maps these onto its own wire format; `AdminError::kind`
//! gives a stable code for that mapping.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AdminError>;

#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("unsupported backend kind: {0}")]
    BackendUnsupported(String),

    #[error("{0}")]
    Validation(String),

    #[error("failed to convert response: {0}")]
    DataConversion(String),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

impl AdminError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn conversion(msg: impl Into<String>) -> Self {
        Self::DataConversion(msg.into())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Session(_) => "session",
            Self::BackendUnsupported(_) => "backend_unsupported",
            Self::Validation(_) => "validation",
            Self::DataConversion(_) => "data_conversion",
            Self::Upstream(_) => "upstream",
        }
    }
}

/// Failure to obtain an authenticated handle to the store.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no store credentials provided")]
    MissingCredentials,

    #[error("session expired")]
    Expired,

    #[error("store rejected credentials ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("store unreachable: {0}")]
    Unreachable(String),
}

/// The store itself rejected or failed the operation.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("store responded with {status}: {}", .errors.join("; "))]
    Status { status: u16, errors: Vec<String> },

    #[error("store request timed out: {0}")]
    Timeout(String),

    #[error("store request failed: {0}")]
    Transport(String),
}

impl UpstreamError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<reqwest::Error> for AdminError {
    fn from(err: reqwest::Error) -> Self {
        Self::Upstream(err.into())
    }
}
