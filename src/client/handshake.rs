//! Identity handshake controller.
//!
//! Exchanges the host's identity assertion for a session cookie, at most once
//! at a time and once per client session, then decides the post-sign-in
//! navigation exactly once.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use super::backend::SessionBackend;
use super::config::ClientConfig;
use super::heartbeat::Heartbeat;
use super::status::{AuthStatus, LocalSession, SessionStatus};
use crate::error::Error;
use crate::redirect::{self, RedirectDecision, RedirectReason, SessionView};
use crate::types::{IdentityAssertion, Role};

/// The embedding host that can vouch for the current user.
pub trait IdentityHost: Send + Sync + 'static {
    /// The host's identity assertion, or `None` while the host is still
    /// initialising.
    fn assertion(&self) -> impl Future<Output = Option<IdentityAssertion>> + Send;
}

/// Result of one [`HandshakeController::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeOutcome {
    /// Another run holds the handshake lock; this one did nothing.
    Busy,
    /// The host has no assertion yet. Status stays `Idle`; try again on the
    /// next mount.
    Pending,
    /// Signed in. `navigate` is set the first time a signed-in run happens on
    /// a gate route (login or root) and never again until logout.
    Authenticated { navigate: Option<String> },
}

/// Holds the handshake lock for its lifetime.
///
/// Dropping it (normal return, error, or the run future being dropped on
/// unmount) releases the lock and puts an unfinished `InFlight` back to `Idle`.
struct LockGuard<'a> {
    lock: &'a AtomicBool,
    status: &'a SessionStatus,
}

impl<'a> LockGuard<'a> {
    fn acquire(lock: &'a AtomicBool, status: &'a SessionStatus) -> Option<Self> {
        lock.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { lock, status })
    }
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        self.status.abandon_in_flight();
        self.lock.store(false, Ordering::Release);
    }
}

pub struct HandshakeController<H, B> {
    host: H,
    backend: Arc<B>,
    status: Arc<SessionStatus>,
    lock: AtomicBool,
    redirected: AtomicBool,
    request_timeout: Duration,
    heartbeat_interval: Duration,
}

impl<H: IdentityHost, B: SessionBackend> HandshakeController<H, B> {
    #[must_use]
    pub fn new(host: H, backend: B, config: &ClientConfig) -> Self {
        Self {
            host,
            backend: Arc::new(backend),
            status: Arc::new(SessionStatus::default()),
            lock: AtomicBool::new(false),
            redirected: AtomicBool::new(false),
            request_timeout: config.request_timeout,
            heartbeat_interval: config.heartbeat_interval,
        }
    }

    /// Start from a session mirrored on the client (e.g. restored on reload),
    /// which makes [`run`](Self::run) skip the handshake.
    #[must_use]
    pub fn with_local_session(self, session: LocalSession) -> Self {
        self.status.set(AuthStatus::Authenticated(session));
        self
    }

    #[must_use]
    pub fn status(&self) -> Arc<SessionStatus> {
        self.status.clone()
    }

    /// Whether a handshake currently holds the lock.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.lock.load(Ordering::Acquire)
    }

    /// Run the handshake for a client mounted on `current_path`.
    ///
    /// Already signed in: no network call, only the one-time gate redirect.
    /// A second run while one is in flight returns [`HandshakeOutcome::Busy`]
    /// and never reaches the backend. A host that does not produce an
    /// assertion within the request timeout yields [`HandshakeOutcome::Pending`].
    ///
    /// An `auth_required` or `session_expired` marker on `current_path` means
    /// the edge refused the cookie, so any local session is discarded first.
    /// A marked location never navigates.
    ///
    /// # Errors
    ///
    /// [`Error::HandshakeRejected`], [`Error::Timeout`] or any transport error.
    /// The status becomes `Failed` and nothing retries on its own.
    pub async fn run(&self, current_path: &str) -> Result<HandshakeOutcome, Error> {
        let (_, query) = redirect::split_location(current_path);
        if let Some(reason @ (RedirectReason::AuthRequired | RedirectReason::SessionExpired)) =
            redirect::marker_reason(query)
        {
            // The edge already refused the cookie; the local mirror is stale.
            if self.status.drop_session() {
                tracing::info!(reason = %reason, "Edge refused the session; discarding local session");
            }
        }

        if let AuthStatus::Authenticated(session) = self.status.current() {
            tracing::debug!(role = %session.role, "Local session present; skipping handshake");
            return Ok(HandshakeOutcome::Authenticated {
                navigate: self.navigation_once(current_path, session.role),
            });
        }

        let Some(_guard) = LockGuard::acquire(&self.lock, &self.status) else {
            tracing::debug!("Handshake already in flight");
            return Ok(HandshakeOutcome::Busy);
        };

        let assertion = match tokio::time::timeout(self.request_timeout, self.host.assertion()).await {
            Ok(Some(assertion)) => assertion,
            Ok(None) => {
                tracing::debug!("Host assertion not available yet");
                return Ok(HandshakeOutcome::Pending);
            }
            Err(_) => {
                tracing::warn!("Host assertion timed out");
                return Ok(HandshakeOutcome::Pending);
            }
        };

        self.status.set(AuthStatus::InFlight);

        let result = tokio::time::timeout(self.request_timeout, self.backend.handshake(&assertion))
            .await
            .unwrap_or(Err(Error::Timeout {
                operation: "handshake",
            }));

        match result {
            Ok(response) => {
                tracing::info!(
                    subject_id = %response.subject_id,
                    role = %response.role,
                    "Handshake complete"
                );
                let role = response.role;
                self.status.set(AuthStatus::Authenticated(LocalSession {
                    subject_id: response.subject_id,
                    role,
                }));
                Ok(HandshakeOutcome::Authenticated {
                    navigate: self.navigation_once(current_path, role),
                })
            }
            Err(e) => {
                tracing::warn!(error = %e, "Handshake failed");
                self.status.set(AuthStatus::Failed(e.to_string()));
                Err(e)
            }
        }
    }

    /// Spawn the heartbeat for the current session.
    ///
    /// The returned task ends on its own once the status leaves
    /// `Authenticated`; dropping the handle stops it immediately.
    #[must_use]
    pub fn start_heartbeat(&self) -> Heartbeat {
        Heartbeat::spawn(
            self.backend.clone(),
            self.status.clone(),
            self.heartbeat_interval,
            self.request_timeout,
        )
    }

    /// Sign out: status goes to `Idle` first, which stops the heartbeat, then
    /// the backend clears the cookie.
    ///
    /// # Errors
    ///
    /// Any error from the logout call. The local state is cleared regardless.
    pub async fn logout(&self) -> Result<(), Error> {
        self.status.set(AuthStatus::Idle);
        self.redirected.store(false, Ordering::Release);

        tokio::time::timeout(self.request_timeout, self.backend.logout())
            .await
            .unwrap_or(Err(Error::Timeout { operation: "logout" }))
    }

    fn navigation_once(&self, current_path: &str, role: Role) -> Option<String> {
        if !redirect::is_gate_path(current_path) {
            return None;
        }
        match redirect::decide_redirect(current_path, SessionView::Authenticated(role)) {
            RedirectDecision::NavigateTo(target) if !self.redirected.swap(true, Ordering::AcqRel) => {
                Some(target)
            }
            _ => None,
        }
    }
}
