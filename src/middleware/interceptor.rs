use axum::Router;
use axum::extract::{Request, State};
use axum::http::HeaderValue;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::CookieJar;
use time::OffsetDateTime;

use super::cookies;
use super::error::AuthError;
use super::state::Gatekeeper;
use crate::policy::{self, matches_prefix};
use crate::redirect::{self, LOGIN_PATH, RedirectReason};
use crate::types::Claims;

/// Verdict for one inbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeDecision {
    /// Forward untouched: login surface, excluded asset/API path, or a path
    /// outside every protected prefix.
    Pass,
    /// Forward with the verified claims attached.
    Admit(Claims),
    /// Send the browser to `/login?reason=...`.
    Redirect {
        reason: RedirectReason,
        clear_cookie: bool,
    },
    /// The request already carries the redirect marker, so it is answered
    /// with a terminal 401/403 instead of another redirect.
    Reject {
        reason: RedirectReason,
        clear_cookie: bool,
    },
}

impl Gatekeeper {
    /// Put the edge access interceptor in front of every route of `router`.
    pub fn protect<S>(&self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        router.layer(middleware::from_fn_with_state(self.clone(), edge_access))
    }

    /// Login surface and configured exclusions (static assets, internal APIs).
    #[must_use]
    pub fn is_bypassed(&self, path: &str) -> bool {
        matches_prefix(path, LOGIN_PATH)
            || self
                .settings
                .excluded_prefixes
                .iter()
                .any(|prefix| matches_prefix(path, prefix))
    }

    #[must_use]
    pub fn evaluate(&self, path: &str, query: Option<&str>, token: Option<&str>) -> EdgeDecision {
        self.evaluate_at(path, query, token, OffsetDateTime::now_utc())
    }

    /// Decide what happens to a request for `path` carrying `token` (the raw
    /// session cookie value, if any).
    ///
    /// A request with the redirect marker is never redirected again. Marked
    /// requests to unprotected paths pass; marked requests to protected paths
    /// still need a valid, authorized token and get [`EdgeDecision::Reject`]
    /// otherwise.
    #[must_use]
    pub fn evaluate_at(
        &self,
        path: &str,
        query: Option<&str>,
        token: Option<&str>,
        now: OffsetDateTime,
    ) -> EdgeDecision {
        if self.is_bypassed(path) {
            return EdgeDecision::Pass;
        }
        let Some(rule) = policy::rule_for(path) else {
            return EdgeDecision::Pass;
        };

        let marked = redirect::carries_marker(query);
        let deny = |reason: RedirectReason, clear_cookie: bool| {
            if marked {
                EdgeDecision::Reject {
                    reason,
                    clear_cookie,
                }
            } else {
                EdgeDecision::Redirect {
                    reason,
                    clear_cookie,
                }
            }
        };

        let Some(token) = token else {
            return deny(RedirectReason::AuthRequired, false);
        };

        let claims = match self.codec.verify_at(token, now) {
            Ok(claims) => claims,
            Err(e) => {
                tracing::info!(path = %path, error = %e, "Session token refused");
                return deny(RedirectReason::SessionExpired, true);
            }
        };

        if !rule.allows(claims.role) {
            tracing::info!(
                path = %path,
                role = %claims.role,
                subject_id = %claims.subject_id,
                "Role not permitted on route"
            );
            return deny(RedirectReason::Forbidden, false);
        }

        EdgeDecision::Admit(claims)
    }
}

async fn edge_access(
    State(gate): State<Gatekeeper>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    let role_header = gate.settings.role_header.clone();
    // Downstream may only ever see the value set below.
    req.headers_mut().remove(&role_header);

    let token = cookies::session_token(&jar, &gate.settings);
    let decision = gate.evaluate(req.uri().path(), req.uri().query(), token.as_deref());

    match decision {
        EdgeDecision::Pass => next.run(req).await,
        EdgeDecision::Admit(claims) => {
            req.headers_mut()
                .insert(role_header, HeaderValue::from_static(claims.role.as_str()));
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        EdgeDecision::Redirect {
            reason,
            clear_cookie,
        } => {
            tracing::debug!(path = %req.uri().path(), reason = %reason, "Redirecting to login");
            let jar = clear_if(jar, &gate, clear_cookie);
            (jar, Redirect::to(&reason.login_url())).into_response()
        }
        EdgeDecision::Reject {
            reason,
            clear_cookie,
        } => {
            tracing::warn!(
                path = %req.uri().path(),
                reason = %reason,
                "Marked request failed auth; not redirecting again"
            );
            let jar = clear_if(jar, &gate, clear_cookie);
            (jar, AuthError::from(reason)).into_response()
        }
    }
}

fn clear_if(jar: CookieJar, gate: &Gatekeeper, clear: bool) -> CookieJar {
    if clear {
        jar.remove(cookies::clear_session_cookie(&gate.settings))
    } else {
        jar
    }
}
