use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use super::backend::SessionBackend;
use super::status::{AuthStatus, SessionStatus};
use crate::error::Error;

/// Periodic session keep-alive.
///
/// Touches the backend every `interval` while the status is `Authenticated`.
/// One touch at a time: a tick that comes due while a touch is still running
/// is skipped. Leaving `Authenticated` ends the task, cancelling any touch in
/// flight; dropping the handle aborts it.
#[derive(Debug)]
pub struct Heartbeat {
    handle: JoinHandle<()>,
}

impl Heartbeat {
    pub fn spawn<B: SessionBackend>(
        backend: Arc<B>,
        status: Arc<SessionStatus>,
        interval: Duration,
        request_timeout: Duration,
    ) -> Self {
        let handle = tokio::spawn(run(backend, status, interval, request_timeout));
        Self { handle }
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Stop the heartbeat now.
    pub fn stop(self) {
        self.handle.abort();
    }
}

impl Drop for Heartbeat {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn run<B: SessionBackend>(
    backend: Arc<B>,
    status: Arc<SessionStatus>,
    interval: Duration,
    request_timeout: Duration,
) {
    let mut status_rx = status.subscribe();
    if !status_rx.borrow_and_update().is_authenticated() {
        tracing::debug!("Not authenticated; heartbeat not started");
        return;
    }

    let mut ticker = time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            () = signed_out(&mut status_rx) => break,
            _ = ticker.tick() => {
                let touch = time::timeout(request_timeout, backend.touch());
                tokio::select! {
                    biased;
                    () = signed_out(&mut status_rx) => break,
                    outcome = touch => {
                        match outcome {
                            Ok(Ok(())) => tracing::debug!("Heartbeat ok"),
                            Ok(Err(Error::SessionRejected)) => {
                                tracing::warn!("Heartbeat rejected; session is gone");
                                status.set(AuthStatus::Failed("session rejected".into()));
                                break;
                            }
                            Ok(Err(e)) => tracing::warn!(error = %e, "Heartbeat failed; retrying next tick"),
                            Err(_) => tracing::warn!("Heartbeat timed out; retrying next tick"),
                        }
                    }
                }
            }
        }
    }

    tracing::debug!("Heartbeat stopped");
}

/// Resolves once the status leaves `Authenticated`. The status guard is
/// released here so `select!` arms never hold a borrow of the receiver.
async fn signed_out(status_rx: &mut watch::Receiver<AuthStatus>) {
    // Err only if the sender is gone, which also means stop.
    let _ = status_rx.wait_for(|s| !s.is_authenticated()).await;
}
