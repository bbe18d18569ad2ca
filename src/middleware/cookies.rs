use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::Cookie;

use super::config::GateSettings;
use crate::token::SessionToken;

/// Create the HTTP-only session cookie carrying `token`.
pub(super) fn session_cookie(settings: &GateSettings, token: SessionToken) -> Cookie<'static> {
    Cookie::build((settings.session_cookie_name.clone(), token.into_string()))
        .http_only(true)
        .secure(settings.secure_cookies)
        .same_site(settings.same_site)
        .path("/")
        .max_age(settings.session_ttl)
        .build()
}

/// Create the removal cookie for the session. Attributes mirror
/// [`session_cookie`] so the browser matches and drops it.
pub(super) fn clear_session_cookie(settings: &GateSettings) -> Cookie<'static> {
    Cookie::build((settings.session_cookie_name.clone(), ""))
        .http_only(true)
        .secure(settings.secure_cookies)
        .same_site(settings.same_site)
        .path("/")
        .build()
}

/// Raw session token from the request cookies, if any.
pub(super) fn session_token(jar: &CookieJar, settings: &GateSettings) -> Option<String> {
    jar.get(&settings.session_cookie_name)
        .map(|c| c.value().to_owned())
}
