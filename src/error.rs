/// Errors produced by the session core.
///
/// Most of these never reach rendering code: the client and the callback
/// handler turn them into session transitions or navigations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Backend endpoint unreachable or the response could not be read.
    #[error("network failure: {0}")]
    Network(#[from] reqwest::Error),

    /// A refresh token was needed but none is available (or it was rejected).
    #[error("authentication expired")]
    AuthExpired,

    /// The OAuth provider redirected back with an error.
    #[error("{}", .description.as_deref().unwrap_or(.error.as_str()))]
    Provider {
        error: String,
        description: Option<String>,
    },

    /// The callback carried none of the expected parameters.
    #[error("Invalid authentication redirect")]
    MalformedCallback,

    /// The callback `state` did not match the stored login nonce.
    #[error("state_mismatch")]
    StateMismatch,

    /// Backend answered with a non-success status.
    #[error("{operation} failed with status {status}: {detail}")]
    Status {
        operation: &'static str,
        status: u16,
        detail: String,
    },

    #[error("token storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("token record is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Missing or invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),
}
