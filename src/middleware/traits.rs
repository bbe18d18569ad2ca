use std::future::Future;

use super::types::VerifiedIdentity;
use crate::types::IdentityAssertion;

/// Consumer-provided check of the host's identity assertion.
///
/// Called once per handshake. Return `Err` to reject the assertion; the
/// handshake endpoint then answers `401` and mints nothing.
///
/// # Example
///
/// ```rust,ignore
/// impl AssertionVerifier for HostSdk {
///     async fn verify(
///         &self,
///         assertion: &IdentityAssertion,
///     ) -> Result<VerifiedIdentity, Box<dyn std::error::Error + Send + Sync>> {
///         let profile = self.client.decode_session(assertion.as_str()).await?;
///         let role = self.repo.role_for(&profile.user_id).await?;
///         Ok(VerifiedIdentity::new(profile.user_id, role))
///     }
/// }
/// ```
pub trait AssertionVerifier: Send + Sync + 'static {
    fn verify(
        &self,
        assertion: &IdentityAssertion,
    ) -> impl Future<Output = Result<VerifiedIdentity, Box<dyn std::error::Error + Send + Sync>>> + Send;
}
