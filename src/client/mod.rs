//! Client side of the gatekeeper: the identity handshake and the session
//! heartbeat.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use merchant_gate::client::{ClientConfig, HandshakeController, HandshakeOutcome, HttpBackend};
//!
//! let config = ClientConfig::new("https://merchant.example.com".parse()?);
//! let controller = HandshakeController::new(host_sdk, HttpBackend::new(&config)?, &config);
//!
//! // On mount:
//! if let HandshakeOutcome::Authenticated { navigate } = controller.run(current_path).await? {
//!     let heartbeat = controller.start_heartbeat();
//!     if let Some(target) = navigate {
//!         router.push(&target);
//!     }
//! }
//! ```

mod backend;
mod config;
mod handshake;
mod heartbeat;
mod status;

pub use backend::{HttpBackend, SessionBackend};
pub use config::{ClientConfig, DEFAULT_HEARTBEAT_INTERVAL, DEFAULT_REQUEST_TIMEOUT};
pub use handshake::{HandshakeController, HandshakeOutcome, IdentityHost};
pub use heartbeat::Heartbeat;
pub use status::{AuthStatus, LocalSession, SessionStatus};
