use tokio::sync::watch;

use crate::redirect::SessionView;
use crate::types::{Role, SubjectId};

/// Identity of the signed-in client, mirrored from the handshake answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalSession {
    pub subject_id: SubjectId,
    pub role: Role,
}

/// Client authentication state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthStatus {
    #[default]
    Idle,
    InFlight,
    Authenticated(LocalSession),
    Failed(String),
}

impl AuthStatus {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    #[must_use]
    pub fn view(&self) -> SessionView {
        match self {
            Self::Authenticated(session) => SessionView::Authenticated(session.role),
            _ => SessionView::Anonymous,
        }
    }
}

/// Observable [`AuthStatus`], shared by the handshake controller and the
/// heartbeat.
#[derive(Debug)]
pub struct SessionStatus {
    tx: watch::Sender<AuthStatus>,
}

impl Default for SessionStatus {
    fn default() -> Self {
        Self::new(AuthStatus::Idle)
    }
}

impl SessionStatus {
    #[must_use]
    pub fn new(initial: AuthStatus) -> Self {
        Self {
            tx: watch::Sender::new(initial),
        }
    }

    #[must_use]
    pub fn current(&self) -> AuthStatus {
        self.tx.borrow().clone()
    }

    pub fn set(&self, status: AuthStatus) {
        self.tx.send_replace(status);
    }

    /// Move `InFlight` back to `Idle`; leaves any other state alone.
    pub(crate) fn abandon_in_flight(&self) {
        self.tx.send_if_modified(|status| {
            if *status == AuthStatus::InFlight {
                *status = AuthStatus::Idle;
                true
            } else {
                false
            }
        });
    }

    /// Move `Authenticated` back to `Idle`; leaves any other state alone.
    /// Returns whether a session was dropped.
    pub(crate) fn drop_session(&self) -> bool {
        self.tx.send_if_modified(|status| {
            if status.is_authenticated() {
                *status = AuthStatus::Idle;
                true
            } else {
                false
            }
        })
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthStatus> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> LocalSession {
        LocalSession {
            subject_id: SubjectId::from("shop-1"),
            role: Role::Merchant,
        }
    }

    #[test]
    fn view_reflects_role_only_when_authenticated() {
        assert_eq!(AuthStatus::Idle.view(), SessionView::Anonymous);
        assert_eq!(AuthStatus::Failed("x".into()).view(), SessionView::Anonymous);
        assert_eq!(
            AuthStatus::Authenticated(session()).view(),
            SessionView::Authenticated(Role::Merchant)
        );
    }

    #[test]
    fn abandon_only_touches_in_flight() {
        let status = SessionStatus::new(AuthStatus::InFlight);
        status.abandon_in_flight();
        assert_eq!(status.current(), AuthStatus::Idle);

        status.set(AuthStatus::Authenticated(session()));
        status.abandon_in_flight();
        assert!(status.current().is_authenticated());
    }

    #[test]
    fn drop_session_only_touches_authenticated() {
        let status = SessionStatus::new(AuthStatus::Authenticated(session()));
        assert!(status.drop_session());
        assert_eq!(status.current(), AuthStatus::Idle);

        status.set(AuthStatus::InFlight);
        assert!(!status.drop_session());
        assert_eq!(status.current(), AuthStatus::InFlight);
    }

    #[tokio::test]
    async fn subscribers_see_updates() {
        let status = SessionStatus::default();
        let mut rx = status.subscribe();
        status.set(AuthStatus::Authenticated(session()));
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_authenticated());
    }
}
