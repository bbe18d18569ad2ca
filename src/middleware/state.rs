use std::sync::Arc;

use super::config::{GateSettings, GatekeeperConfig};
use crate::token::TokenCodec;

/// Edge gatekeeper: the token codec plus cookie and header settings.
///
/// Cheap to clone; every clone shares the same codec. Use
/// [`protect`](Gatekeeper::protect) to put the interceptor in front of a
/// router and [`auth_routes`](Gatekeeper::auth_routes) to mount the
/// handshake, heartbeat and logout endpoints.
#[derive(Debug, Clone)]
pub struct Gatekeeper {
    pub(super) codec: Arc<TokenCodec>,
    pub(super) settings: Arc<GateSettings>,
}

impl Gatekeeper {
    #[must_use]
    pub fn new(config: GatekeeperConfig) -> Self {
        Self {
            codec: Arc::new(config.codec),
            settings: Arc::new(config.settings),
        }
    }

    #[must_use]
    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }
}

/// Shared state for auth route handlers.
pub(super) struct AuthState<V> {
    pub(super) gate: Gatekeeper,
    pub(super) verifier: Arc<V>,
}

// Manual Clone: avoid derive adding a `V: Clone` bound.
impl<V> Clone for AuthState<V> {
    fn clone(&self) -> Self {
        Self {
            gate: self.gate.clone(),
            verifier: self.verifier.clone(),
        }
    }
}
