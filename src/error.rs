#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("unknown role: {0}")]
    UnknownRole(String),
    #[error("invalid session ttl: {0}s (must be at least 1s)")]
    InvalidTtl(i64),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("token encoding error: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("handshake rejected: {0}")]
    HandshakeRejected(String),
    #[error("session rejected by backend")]
    SessionRejected,
    #[error("{operation} timed out")]
    Timeout { operation: &'static str },
    #[error("{operation} failed (status {status}): {detail}")]
    Backend {
        operation: &'static str,
        status: u16,
        detail: String,
    },
    #[cfg(feature = "client")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}
