//! Edge access interceptor and session endpoints for Axum.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use merchant_gate::middleware::{Gatekeeper, GatekeeperConfig};
//!
//! // 1. Implement AssertionVerifier for the host identity SDK
//! // 2. Configure from environment (SESSION_SECRET, ...)
//! let gate = Gatekeeper::new(GatekeeperConfig::from_env()?);
//!
//! // 3. Protect the pages and mount the auth endpoints
//! let app = gate
//!     .protect(pages)
//!     .merge(gate.auth_routes(host_verifier));
//! ```

mod config;
mod cookies;
mod error;
mod extractor;
mod interceptor;
mod routes;
mod state;
mod traits;
mod types;

pub use config::GatekeeperConfig;
pub use error::AuthError;
pub use extractor::SessionClaims;
pub use interceptor::EdgeDecision;
pub use state::Gatekeeper;
pub use traits::AssertionVerifier;
pub use types::VerifiedIdentity;

/// Re-export for [`GatekeeperConfig::with_same_site`].
pub use axum_extra::extract::cookie::SameSite;
