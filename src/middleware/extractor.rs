use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use super::error::AuthError;
use crate::types::Claims;

/// Verified claims of the current request, as placed there by the edge
/// interceptor.
///
/// Only available on routes behind [`Gatekeeper::protect`](super::Gatekeeper::protect)
/// under a protected prefix. Returns `401 Unauthorized` anywhere else.
///
/// # Example
///
/// ```rust,ignore
/// async fn billing(SessionClaims(claims): SessionClaims) -> impl IntoResponse {
///     format!("Billing for {} ({})", claims.subject_id, claims.role)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct SessionClaims(pub Claims);

impl<S: Send + Sync> FromRequestParts<S> for SessionClaims {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .map(Self)
            .ok_or(AuthError::MissingToken)
    }
}
