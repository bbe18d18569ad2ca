use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::redirect::RedirectReason;
use crate::token::VerificationError;

/// Authentication errors for the edge layer and auth routes.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No session cookie. The ordinary "please sign in" case.
    #[error("Not authenticated")]
    MissingToken,

    #[error("Malformed session token")]
    MalformedToken,

    #[error("Invalid session token signature")]
    InvalidSignature,

    #[error("Session expired")]
    ExpiredToken,

    /// Valid session, role not permitted on the route.
    #[error("Insufficient role")]
    InsufficientRole,

    /// The host identity assertion was refused.
    #[error("Handshake rejected: {0}")]
    HandshakeRejected(String),

    /// Missing or invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<VerificationError> for AuthError {
    fn from(e: VerificationError) -> Self {
        match e {
            VerificationError::Malformed => Self::MalformedToken,
            VerificationError::SignatureInvalid => Self::InvalidSignature,
            VerificationError::Expired => Self::ExpiredToken,
        }
    }
}

/// Terminal answer for a request the edge will not redirect again.
impl From<RedirectReason> for AuthError {
    fn from(reason: RedirectReason) -> Self {
        match reason {
            RedirectReason::AuthRequired => Self::MissingToken,
            RedirectReason::SessionExpired => Self::ExpiredToken,
            RedirectReason::Forbidden => Self::InsufficientRole,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            Self::MissingToken
            | Self::MalformedToken
            | Self::InvalidSignature
            | Self::ExpiredToken
            | Self::HandshakeRejected(_) => {
                (StatusCode::UNAUTHORIZED, self.to_string()).into_response()
            }
            Self::InsufficientRole => (StatusCode::FORBIDDEN, self.to_string()).into_response(),
            Self::Config(_) | Self::Internal(_) => {
                tracing::error!(error = %self, "Auth internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response()
            }
        }
    }
}
