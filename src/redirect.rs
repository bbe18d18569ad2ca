//! Redirect marker and the role-based redirect decision.
//!
//! Both sides of the gatekeeper go through here: the edge interceptor builds
//! its login redirects from [`RedirectReason::login_url`], and the client
//! decides navigation with [`decide_redirect`]. Both consult
//! [`crate::policy`] for authorization.

use serde::{Deserialize, Serialize};

use crate::policy;
use crate::types::Role;

/// The login surface.
pub const LOGIN_PATH: &str = "/login";

/// Query parameter that marks a request as the product of a redirect.
pub const MARKER_PARAM: &str = "reason";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedirectReason {
    /// No session cookie at all.
    AuthRequired,
    /// A cookie was present but did not verify.
    SessionExpired,
    /// Valid session, role not allowed on the route.
    Forbidden,
}

impl RedirectReason {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AuthRequired => "auth_required",
            Self::SessionExpired => "session_expired",
            Self::Forbidden => "forbidden",
        }
    }

    /// `/login?reason=<reason>`
    #[must_use]
    pub fn login_url(self) -> String {
        format!("{LOGIN_PATH}?{MARKER_PARAM}={}", self.as_str())
    }
}

impl std::fmt::Display for RedirectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// True if the query string carries the redirect marker, whatever its value.
#[must_use]
pub fn carries_marker(query: Option<&str>) -> bool {
    query.is_some_and(|q| {
        url::form_urlencoded::parse(q.as_bytes()).any(|(key, _)| key == MARKER_PARAM)
    })
}

/// The reason named by the marker in `query`, if it is one the edge issues.
#[must_use]
pub fn marker_reason(query: Option<&str>) -> Option<RedirectReason> {
    let q = query?;
    url::form_urlencoded::parse(q.as_bytes())
        .find(|(key, _)| key == MARKER_PARAM)
        .and_then(|(_, value)| match value.as_ref() {
            "auth_required" => Some(RedirectReason::AuthRequired),
            "session_expired" => Some(RedirectReason::SessionExpired),
            "forbidden" => Some(RedirectReason::Forbidden),
            _ => None,
        })
}

/// Split a client location into path and query.
#[must_use]
pub fn split_location(location: &str) -> (&str, Option<&str>) {
    match location.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (location, None),
    }
}

/// Gate routes are where a signed-in user should not linger: root and login.
#[must_use]
pub fn is_gate_path(path: &str) -> bool {
    let (path, _) = split_location(path);
    let trimmed = path.trim_end_matches('/');
    trimmed.is_empty() || trimmed == LOGIN_PATH
}

/// What the client knows about its own session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionView {
    Anonymous,
    Authenticated(Role),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectDecision {
    NavigateTo(String),
    Stay,
}

/// Decide client-side navigation for `current_path`.
///
/// - anonymous on a protected path: login with `reason=auth_required`
/// - signed in on a gate path: the role's home route
/// - signed in on a protected path the role may not reach: login with
///   `reason=forbidden`, the same verdict the edge gives
/// - anything else: stay
///
/// A location carrying the redirect marker always stays.
#[must_use]
pub fn decide_redirect(current_path: &str, session: SessionView) -> RedirectDecision {
    let (path, query) = split_location(current_path);
    if carries_marker(query) {
        return RedirectDecision::Stay;
    }
    match session {
        SessionView::Anonymous if policy::is_protected(path) => {
            RedirectDecision::NavigateTo(RedirectReason::AuthRequired.login_url())
        }
        SessionView::Anonymous => RedirectDecision::Stay,
        SessionView::Authenticated(role) if is_gate_path(path) => {
            RedirectDecision::NavigateTo(policy::home_route(role).to_owned())
        }
        SessionView::Authenticated(role) if !policy::is_authorized(role, path) => {
            RedirectDecision::NavigateTo(RedirectReason::Forbidden.login_url())
        }
        SessionView::Authenticated(_) => RedirectDecision::Stay,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_url_carries_marker() {
        assert_eq!(
            RedirectReason::AuthRequired.login_url(),
            "/login?reason=auth_required"
        );
        assert_eq!(
            RedirectReason::SessionExpired.login_url(),
            "/login?reason=session_expired"
        );
        for reason in [
            RedirectReason::AuthRequired,
            RedirectReason::SessionExpired,
            RedirectReason::Forbidden,
        ] {
            let url = reason.login_url();
            let (_, query) = url.split_once('?').unwrap();
            assert!(carries_marker(Some(query)));
        }
    }

    #[test]
    fn marker_detection() {
        assert!(carries_marker(Some("reason=auth_required")));
        assert!(carries_marker(Some("next=%2Fdashboard&reason=")));
        assert!(carries_marker(Some("reason")));
        assert!(!carries_marker(Some("treason=1")));
        assert!(!carries_marker(Some("")));
        assert!(!carries_marker(None));
    }

    #[test]
    fn marker_reason_reads_known_values() {
        assert_eq!(
            marker_reason(Some("reason=session_expired")),
            Some(RedirectReason::SessionExpired)
        );
        assert_eq!(
            marker_reason(Some("next=%2F&reason=auth_required")),
            Some(RedirectReason::AuthRequired)
        );
        assert_eq!(marker_reason(Some("reason=whatever")), None);
        assert_eq!(marker_reason(Some("x=1")), None);
        assert_eq!(marker_reason(None), None);
    }

    #[test]
    fn marked_locations_always_stay() {
        let views = [
            SessionView::Anonymous,
            SessionView::Authenticated(Role::SuperAdmin),
            SessionView::Authenticated(Role::Merchant),
        ];
        for location in [
            "/login?reason=session_expired",
            "/?reason=auth_required",
            "/admin?reason=forbidden",
            "/dashboard/billing?reason=",
        ] {
            for view in views {
                assert_eq!(
                    decide_redirect(location, view),
                    RedirectDecision::Stay,
                    "{location} as {view:?}"
                );
            }
        }
    }

    #[test]
    fn gate_paths() {
        assert!(is_gate_path("/"));
        assert!(is_gate_path(""));
        assert!(is_gate_path("/login"));
        assert!(is_gate_path("/login/"));
        assert!(is_gate_path("/login?reason=auth_required"));
        assert!(!is_gate_path("/login-help"));
        assert!(!is_gate_path("/dashboard"));
    }

    #[test]
    fn anonymous_on_protected_goes_to_login() {
        assert_eq!(
            decide_redirect("/dashboard/billing", SessionView::Anonymous),
            RedirectDecision::NavigateTo("/login?reason=auth_required".into())
        );
        assert_eq!(
            decide_redirect("/login", SessionView::Anonymous),
            RedirectDecision::Stay
        );
        assert_eq!(decide_redirect("/", SessionView::Anonymous), RedirectDecision::Stay);
    }

    #[test]
    fn authenticated_on_gate_goes_home() {
        assert_eq!(
            decide_redirect("/login", SessionView::Authenticated(Role::Merchant)),
            RedirectDecision::NavigateTo("/dashboard".into())
        );
        assert_eq!(
            decide_redirect("/", SessionView::Authenticated(Role::SuperAdmin)),
            RedirectDecision::NavigateTo("/admin".into())
        );
    }

    #[test]
    fn authenticated_on_allowed_route_stays() {
        assert_eq!(
            decide_redirect("/dashboard/orders", SessionView::Authenticated(Role::Merchant)),
            RedirectDecision::Stay
        );
        assert_eq!(
            decide_redirect("/pricing", SessionView::Authenticated(Role::User)),
            RedirectDecision::Stay
        );
    }

    #[test]
    fn authenticated_on_forbidden_route_goes_to_login_forbidden() {
        assert_eq!(
            decide_redirect("/admin", SessionView::Authenticated(Role::Merchant)),
            RedirectDecision::NavigateTo("/login?reason=forbidden".into())
        );
    }

    #[test]
    fn home_redirect_never_lands_on_a_redirecting_route() {
        for role in Role::ALL.iter().copied() {
            let RedirectDecision::NavigateTo(home) =
                decide_redirect("/", SessionView::Authenticated(role))
            else {
                panic!("{role} should be sent home");
            };
            assert_eq!(
                decide_redirect(&home, SessionView::Authenticated(role)),
                RedirectDecision::Stay,
                "{role} home must be terminal"
            );
        }
    }
}
