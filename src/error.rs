use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("GitHub API error: {0}")]
    GitHubApi(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<octocrab::Error> for AppError {
    fn from(e: octocrab::Error) -> Self {
        AppError::GitHubApi(e.to_string())
    }
}

/// Rejections reported back to the webhook caller as `ClientException`.
///
/// The display strings are part of the response contract and are asserted
/// verbatim by callers inspecting GitHub's recorded delivery responses.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("Signature not signed with sha256 (e.g. sha256=123456)")]
    SignatureNotSha256,

    #[error("Header signature and expected signature do not match")]
    SignatureMismatch,

    #[error("Payload does not fulfill trigger requirements")]
    FilterUnmatched,

    #[error("Missing X-GitHub-Event header")]
    MissingEvent,

    #[error("Payload is not valid JSON")]
    InvalidPayload,

    #[error("Repository is not configured for filtering")]
    UnknownRepository,
}

pub type Result<T> = std::result::Result<T, AppError>;
