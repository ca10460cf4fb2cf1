use std::fmt;

use serde::Serialize;

/// Errors raised while fetching ranking pages
#[derive(Debug, thiserror::Error)]
pub enum RankingError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP error! status: {status}: {message}")]
    Status { status: u16, message: String },

    /// The API answered with an `{"error": ...}` body
    #[error("{0}")]
    Api(String),

    #[error("Failed to parse response at `{path}`: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid page number {0}. Page must be a positive integer.")]
    InvalidPage(u32),

    #[error("Unknown genre: {0}")]
    UnknownGenre(String),

    #[error("Invalid base url: {0}")]
    Url(#[from] url::ParseError),

    #[error("Base url cannot hold a path: {0}")]
    BaseUrl(String),

    #[error("Invalid header value: {0}")]
    Header(#[from] reqwest::header::InvalidHeaderValue),

    #[error("Request cancelled")]
    Cancelled,
}

impl RankingError {
    /// HTTP-like status code attached to the failure, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            RankingError::Status { status, .. } => Some(*status),
            RankingError::Request(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Transport failures and 5xx answers may succeed when sent again
    pub fn is_transient(&self) -> bool {
        match self.status() {
            Some(status) => status >= 500,
            None => matches!(self, RankingError::Request(_)),
        }
    }
}

pub type Result<T> = std::result::Result<T, RankingError>;

/// Shown for every transport failure
pub const NETWORK_ERROR_MESSAGE: &str = "네트워크 오류가 발생했습니다.";

/// Failure recorded in a feed's state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl From<&RankingError> for FeedError {
    fn from(e: &RankingError) -> Self {
        let message = match e {
            RankingError::Request(e) => {
                tracing::debug!(error = %e, "ranking request failed");
                NETWORK_ERROR_MESSAGE.to_string()
            }
            e => e.to_string(),
        };
        FeedError {
            message,
            status: e.status(),
        }
    }
}

impl From<RankingError> for FeedError {
    fn from(e: RankingError) -> Self {
        FeedError::from(&e)
    }
}

impl fmt::Display for FeedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}
