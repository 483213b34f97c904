use thiserror::Error;

/// Why a session was cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CancelReason {
    /// `abort()` was called.
    User,
    /// The configured timeout elapsed.
    Timeout,
}

impl std::fmt::Display for CancelReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "aborted"),
            Self::Timeout => write!(f, "timed out"),
        }
    }
}

/// Failures surfaced to error observers and from `execute`.
///
/// Parse failures inside a stream are not represented here; they are
/// recovered locally by the chunk processor.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request failed: {status} {status_text}")]
    Status { status: u16, status_text: String },

    #[error("Response did not include a body stream")]
    MissingBody,

    #[error("Request {0}")]
    Cancelled(CancelReason),

    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Stream request already executed")]
    AlreadyExecuted,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StreamError {
    /// True for user aborts and timeouts, which callers usually do not report.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Cancelled(CancelReason::Timeout))
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, StreamError>;
