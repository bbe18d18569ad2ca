use axum::http::HeaderName;
use axum_extra::extract::cookie::SameSite;
use secrecy::SecretString;
use time::Duration;

use super::error::AuthError;
use crate::token::TokenCodec;

/// Settings shared by the interceptor and the auth routes.
#[derive(Debug, Clone)]
pub(crate) struct GateSettings {
    pub(crate) session_cookie_name: String,
    pub(crate) session_ttl: Duration,
    pub(crate) secure_cookies: bool,
    pub(crate) same_site: SameSite,
    pub(crate) role_header: HeaderName,
    pub(crate) excluded_prefixes: Vec<String>,
}

impl GateSettings {
    fn defaults() -> Self {
        Self {
            session_cookie_name: "auth_token".into(),
            session_ttl: Duration::days(1),
            secure_cookies: true,
            same_site: SameSite::Lax,
            role_header: HeaderName::from_static("x-user-role"),
            excluded_prefixes: vec![
                "/_next".into(),
                "/static".into(),
                "/assets".into(),
                "/favicon.ico".into(),
                "/robots.txt".into(),
                "/api".into(),
            ],
        }
    }
}

/// Gatekeeper configuration.
///
/// The signing key is the only required input, so it is taken by the
/// constructor. Use [`from_env()`](GatekeeperConfig::from_env) for
/// convention-based setup, or [`new()`](GatekeeperConfig::new) with `with_*`
/// methods for full control.
pub struct GatekeeperConfig {
    pub(super) codec: TokenCodec,
    pub(super) settings: GateSettings,
}

impl GatekeeperConfig {
    #[must_use]
    pub fn new(codec: TokenCodec) -> Self {
        Self {
            codec,
            settings: GateSettings::defaults(),
        }
    }

    /// Create config from environment variables.
    ///
    /// # Required env vars
    /// - `SESSION_SECRET`: HMAC signing key, at least 32 bytes
    ///
    /// # Optional env vars
    /// - `SESSION_TTL_SECS`: token lifetime in seconds (default 86400)
    /// - `SESSION_COOKIE_NAME`: cookie name (default `auth_token`)
    /// - `EMBEDDED_APP`: `"1"`/`"true"` when the app is framed by a host; cookies use `SameSite=None`
    /// - `DEV_AUTH`: `"1"`/`"true"` to drop the `Secure` cookie flag for local http
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Config`] if the secret is missing or too short, or
    /// if the TTL is not a positive integer.
    pub fn from_env() -> Result<Self, AuthError> {
        let secret = std::env::var("SESSION_SECRET")
            .map_err(|_| AuthError::Config("SESSION_SECRET is required".into()))?;
        let codec = TokenCodec::new(&SecretString::from(secret))
            .map_err(|e| AuthError::Config(e.to_string()))?;

        let mut config = Self::new(codec);

        if let Ok(ttl) = std::env::var("SESSION_TTL_SECS") {
            let secs: i64 = ttl
                .parse()
                .ok()
                .filter(|s| *s > 0)
                .ok_or_else(|| AuthError::Config(format!("SESSION_TTL_SECS: invalid value {ttl:?}")))?;
            config = config.with_session_ttl(Duration::seconds(secs));
        }
        if let Ok(name) = std::env::var("SESSION_COOKIE_NAME") {
            config = config.with_session_cookie_name(name);
        }

        let embedded = env_flag("EMBEDDED_APP");
        let dev_auth = env_flag("DEV_AUTH");

        Ok(config
            .with_secure_cookies(!dev_auth)
            .with_same_site(if embedded { SameSite::None } else { SameSite::Lax }))
    }

    #[must_use]
    pub fn with_session_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.settings.session_cookie_name = name.into();
        self
    }

    #[must_use]
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.settings.session_ttl = ttl;
        self
    }

    #[must_use]
    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.settings.secure_cookies = secure;
        self
    }

    /// `SameSite::None` is needed when a third-party host frames the app.
    #[must_use]
    pub fn with_same_site(mut self, same_site: SameSite) -> Self {
        self.settings.same_site = same_site;
        self
    }

    #[must_use]
    pub fn with_role_header(mut self, header: HeaderName) -> Self {
        self.settings.role_header = header;
        self
    }

    /// Replace the list of path prefixes (static assets, internal APIs) the
    /// interceptor never looks at.
    #[must_use]
    pub fn with_excluded_prefixes(mut self, prefixes: Vec<String>) -> Self {
        self.settings.excluded_prefixes = prefixes;
        self
    }
}

fn env_flag(name: &str) -> bool {
    matches!(std::env::var(name).as_deref(), Ok("1") | Ok("true"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{ROUTE_POLICY, matches_prefix};

    #[test]
    fn default_exclusions_never_shadow_protected_routes() {
        let settings = GateSettings::defaults();
        for rule in ROUTE_POLICY {
            for excluded in &settings.excluded_prefixes {
                assert!(
                    !matches_prefix(rule.prefix, excluded),
                    "{excluded} would bypass {}",
                    rule.prefix
                );
            }
        }
    }

    #[test]
    fn defaults_match_cookie_contract() {
        let settings = GateSettings::defaults();
        assert_eq!(settings.session_cookie_name, "auth_token");
        assert!(settings.secure_cookies);
        assert_eq!(settings.role_header.as_str(), "x-user-role");
    }
}
