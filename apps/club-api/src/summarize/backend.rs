use async_trait::async_trait;

/// Failure produced by a summarization backend. These never reach the HTTP
/// caller; the service recovers with the truncation fallback.
#[derive(Debug)]
pub enum BackendError {
    /// Transport-level failure reaching the inference API.
    Http(reqwest::Error),
    /// The API answered with a non-success status.
    Api { status: u16, message: String },
    /// The API answered 2xx but the payload had no usable summary.
    Malformed(String),
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::Http(e) => write!(f, "request failed: {e}"),
            BackendError::Api { status, message } => {
                write!(f, "inference API returned {status}: {message}")
            }
            BackendError::Malformed(detail) => write!(f, "unusable API response: {detail}"),
        }
    }
}

impl std::error::Error for BackendError {}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        BackendError::Http(e)
    }
}

/// A strategy that condenses text. Backends are tried in order by the
/// service until one succeeds.
#[async_trait]
pub trait SummaryBackend: Send + Sync {
    fn name(&self) -> &'static str;

    async fn summarize(&self, text: &str) -> Result<String, BackendError>;
}
