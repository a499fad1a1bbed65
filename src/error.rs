use std::fmt;

/// Result of a single upstream call before it is converted into a view default.
pub type FetchResult<T> = Result<T, FetchError>;

#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("upstream unreachable: {0}")]
    Transport(String),
    #[error("upstream answered with HTTP {0}")]
    HttpStatus(u16),
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("upstream rejected request: {0}")]
    Upstream(String),
    #[error("{0} not found")]
    NotFound(String),
}

/// Coarse classification used for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Transport,
    Malformed,
    Absent,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Transport => write!(f, "transport"),
            FailureKind::Malformed => write!(f, "malformed"),
            FailureKind::Absent => write!(f, "absent"),
        }
    }
}

impl FetchError {
    pub fn kind(&self) -> FailureKind {
        match self {
            FetchError::Transport(_) | FetchError::HttpStatus(_) => FailureKind::Transport,
            FetchError::Malformed(_) | FetchError::Upstream(_) => FailureKind::Malformed,
            FetchError::NotFound(_) => FailureKind::Absent,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return FetchError::HttpStatus(status.as_u16());
        }
        if err.is_decode() {
            return FetchError::Malformed(err.to_string());
        }
        FetchError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Malformed(err.to_string())
    }
}

impl From<ethers_providers::ProviderError> for FetchError {
    fn from(err: ethers_providers::ProviderError) -> Self {
        match err {
            ethers_providers::ProviderError::SerdeJson(e) => FetchError::Malformed(e.to_string()),
            other => FetchError::Transport(other.to_string()),
        }
    }
}

/// Converts a failed fetch into the default the caller renders, logging the failure.
pub trait Fallback<T> {
    fn or_fallback(self, operation: &str, default: T) -> T;

    fn or_default_logged(self, operation: &str) -> T
    where
        T: Default,
        Self: Sized,
    {
        self.or_fallback(operation, T::default())
    }
}

impl<T> Fallback<T> for FetchResult<T> {
    fn or_fallback(self, operation: &str, default: T) -> T {
        match self {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!("{} failed ({}): {}", operation, err.kind(), err);
                default
            }
        }
    }
}
