use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use axum_extra::extract::CookieJar;
use time::OffsetDateTime;

use super::cookies;
use super::error::AuthError;
use super::state::{AuthState, Gatekeeper};
use super::traits::AssertionVerifier;
use crate::types::{HandshakeRequest, HandshakeResponse, endpoints};

impl Gatekeeper {
    /// Router with the handshake, heartbeat and logout endpoints.
    pub fn auth_routes<V: AssertionVerifier>(&self, verifier: V) -> Router {
        let state = AuthState {
            gate: self.clone(),
            verifier: Arc::new(verifier),
        };

        Router::new()
            .route(endpoints::HANDSHAKE, post(handshake::<V>))
            .route(endpoints::HEARTBEAT, post(heartbeat::<V>))
            .route(endpoints::LOGOUT, post(logout::<V>))
            .with_state(state)
    }
}

// ── Handshake ──────────────────────────────────────────────────────

async fn handshake<V: AssertionVerifier>(
    State(state): State<AuthState<V>>,
    jar: CookieJar,
    Json(body): Json<HandshakeRequest>,
) -> Result<(CookieJar, Json<HandshakeResponse>), AuthError> {
    let settings = &state.gate.settings;

    let identity = state.verifier.verify(&body.assertion).await.map_err(|e| {
        tracing::warn!(error = %e, "Identity assertion rejected");
        AuthError::HandshakeRejected("invalid identity assertion".into())
    })?;

    let previous_role = cookies::session_token(&jar, settings)
        .and_then(|token| state.gate.codec.verify(&token).ok())
        .map(|claims| claims.role);
    match previous_role {
        Some(role) if role != identity.role => tracing::info!(
            subject_id = %identity.subject_id,
            from = %role,
            to = %identity.role,
            "Role changed; replacing session"
        ),
        _ => {}
    }

    let token = state
        .gate
        .codec
        .mint(identity.subject_id.clone(), identity.role, settings.session_ttl)
        .map_err(|e| AuthError::Internal(e.to_string()))?;

    tracing::info!(
        subject_id = %identity.subject_id,
        role = %identity.role,
        "Session established"
    );

    let jar = jar.add(cookies::session_cookie(settings, token));
    Ok((
        jar,
        Json(HandshakeResponse {
            role: identity.role,
            subject_id: identity.subject_id,
        }),
    ))
}

// ── Heartbeat ──────────────────────────────────────────────────────

/// Re-verify the cookie and replace it with a freshly minted token carrying
/// the same subject and role.
async fn heartbeat<V: AssertionVerifier>(
    State(state): State<AuthState<V>>,
    jar: CookieJar,
) -> Result<(CookieJar, StatusCode), (CookieJar, AuthError)> {
    let settings = &state.gate.settings;

    let Some(token) = cookies::session_token(&jar, settings) else {
        return Err((jar, AuthError::MissingToken));
    };

    let claims = match state.gate.codec.verify(&token) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::debug!(error = %e, "Heartbeat with dead session");
            let jar = jar.remove(cookies::clear_session_cookie(settings));
            return Err((jar, e.into()));
        }
    };

    tracing::debug!(
        subject_id = %claims.subject_id,
        remaining_secs = claims.remaining_secs(OffsetDateTime::now_utc()),
        "Refreshing session"
    );
    match state
        .gate
        .codec
        .mint(claims.subject_id, claims.role, settings.session_ttl)
    {
        Ok(token) => Ok((jar.add(cookies::session_cookie(settings, token)), StatusCode::OK)),
        Err(e) => Err((jar, AuthError::Internal(e.to_string()))),
    }
}

// ── Logout ─────────────────────────────────────────────────────────

async fn logout<V: AssertionVerifier>(
    State(state): State<AuthState<V>>,
    jar: CookieJar,
) -> (CookieJar, StatusCode) {
    let jar = jar.remove(cookies::clear_session_cookie(&state.gate.settings));
    (jar, StatusCode::OK)
}
