#![doc = include_str!("../README.md")]

#[cfg(feature = "client")]
pub mod client;
pub mod error;
#[cfg(feature = "axum")]
pub mod middleware;
pub mod policy;
pub mod redirect;
pub mod token;
pub mod types;

// Re-exports for convenient access
pub use error::Error;
pub use policy::{RouteRule, home_route, is_authorized, policy_document};
pub use redirect::{RedirectDecision, RedirectReason, SessionView, decide_redirect};
pub use token::{SessionToken, TokenCodec, VerificationError};
pub use types::{Claims, HandshakeRequest, HandshakeResponse, IdentityAssertion, Role, SubjectId};
