use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    InvalidArgument(String),
    #[error("Input file not found: {}", .path.display())]
    FileNotFound { path: PathBuf },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config file {}: {message}", .path.display())]
    Config { path: PathBuf, message: String },
    #[error(transparent)]
    Conversion(#[from] ConversionFailure),
}

impl Error {
    /// The conversion failure behind this error, if the remote workflow produced it.
    pub fn as_conversion(&self) -> Option<&ConversionFailure> {
        match self {
            Self::Conversion(failure) => Some(failure),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    RemoteRejected,
    Transport,
    JobFailed,
    JobExpired,
    PollTimeout,
    Io,
}

/// A failure reported by the remote conversion pipeline or the I/O around it.
///
/// Displays as the bare message, so a server-side `error_message` reaches the
/// caller unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ConversionFailure {
    kind: FailureKind,
    message: String,
}

impl ConversionFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn remote_rejected(message: impl Into<String>) -> Self {
        Self::new(FailureKind::RemoteRejected, message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Transport, message)
    }

    pub fn http_status(status: u16, detail: &str) -> Self {
        Self::transport(format!("HTTP {}: {}", status, detail))
    }

    pub fn job_failed(message: impl Into<String>) -> Self {
        Self::new(FailureKind::JobFailed, message)
    }

    pub fn job_expired() -> Self {
        Self::new(FailureKind::JobExpired, "Job expired")
    }

    pub fn poll_timeout() -> Self {
        Self::new(
            FailureKind::PollTimeout,
            "Conversion timeout - job did not complete in time",
        )
    }

    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<reqwest::Error> for ConversionFailure {
    fn from(err: reqwest::Error) -> Self {
        Self::transport(err.to_string())
    }
}

impl From<std::io::Error> for ConversionFailure {
    fn from(err: std::io::Error) -> Self {
        Self::new(FailureKind::Io, err.to_string())
    }
}

impl From<serde_json::Error> for ConversionFailure {
    fn from(err: serde_json::Error) -> Self {
        Self::transport(format!("Invalid response body: {}", err))
    }
}
