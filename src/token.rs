use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use time::{Duration, OffsetDateTime};

use crate::error::Error;
use crate::types::{Claims, Role, SubjectId};

type HmacSha256 = Hmac<Sha256>;

/// Minimum accepted length of the signing secret, in bytes.
pub const MIN_SECRET_LEN: usize = 32;

const TOKEN_PREFIX: &str = "v1.";

/// Why a token was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum VerificationError {
    #[error("malformed token")]
    Malformed,
    #[error("invalid token signature")]
    SignatureInvalid,
    #[error("token expired")]
    Expired,
}

/// Serialized, signed session token: `v1.<claims>.<mac>`, both segments
/// base64url without padding.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionToken(<redacted>)")
    }
}

/// Mints and verifies HMAC-SHA256 signed session tokens.
///
/// The key is fixed at construction and never changes; the codec holds no
/// other state, so one instance is shared by every request.
#[derive(Clone)]
pub struct TokenCodec {
    mac: HmacSha256,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec").finish_non_exhaustive()
    }
}

impl TokenCodec {
    /// Create a codec keyed with `secret`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the secret is shorter than [`MIN_SECRET_LEN`] bytes.
    pub fn new(secret: &SecretString) -> Result<Self, Error> {
        let key = secret.expose_secret().as_bytes();
        if key.len() < MIN_SECRET_LEN {
            return Err(Error::Config(format!(
                "session secret must be at least {MIN_SECRET_LEN} bytes, got {}",
                key.len()
            )));
        }
        let mac = HmacSha256::new_from_slice(key)
            .map_err(|e| Error::Config(format!("session secret: {e}")))?;
        Ok(Self { mac })
    }

    /// Mint a token for `subject_id` valid for `ttl` from now.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTtl`] if `ttl` is shorter than one second.
    pub fn mint(&self, subject_id: SubjectId, role: Role, ttl: Duration) -> Result<SessionToken, Error> {
        self.mint_at(subject_id, role, ttl, OffsetDateTime::now_utc())
    }

    /// [`mint`](Self::mint) against an explicit clock. Same inputs, same token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTtl`] if `ttl` is shorter than one second.
    pub fn mint_at(
        &self,
        subject_id: SubjectId,
        role: Role,
        ttl: Duration,
        now: OffsetDateTime,
    ) -> Result<SessionToken, Error> {
        // Timestamps are whole seconds; anything shorter would mint a dead token.
        let ttl_secs = ttl.whole_seconds();
        if ttl_secs < 1 {
            return Err(Error::InvalidTtl(ttl_secs));
        }
        let issued_at = now.unix_timestamp();
        let expires_at = issued_at
            .checked_add(ttl_secs)
            .ok_or(Error::InvalidTtl(ttl_secs))?;

        let claims = Claims {
            subject_id,
            role,
            issued_at,
            expires_at,
        };
        let payload = serde_json::to_vec(&claims)?;

        let signed = format!("{TOKEN_PREFIX}{}", URL_SAFE_NO_PAD.encode(payload));
        let signature = self.sign(signed.as_bytes());
        Ok(SessionToken(format!(
            "{signed}.{}",
            URL_SAFE_NO_PAD.encode(signature)
        )))
    }

    /// Verify a serialized token and return its claims.
    ///
    /// # Errors
    ///
    /// [`VerificationError::Malformed`] for anything that is not a well-formed
    /// token, [`VerificationError::SignatureInvalid`] when the MAC does not
    /// match, [`VerificationError::Expired`] once `expiresAt` has passed.
    pub fn verify(&self, token: &str) -> Result<Claims, VerificationError> {
        self.verify_at(token, OffsetDateTime::now_utc())
    }

    /// [`verify`](Self::verify) against an explicit clock.
    ///
    /// # Errors
    ///
    /// See [`verify`](Self::verify).
    pub fn verify_at(&self, token: &str, now: OffsetDateTime) -> Result<Claims, VerificationError> {
        let rest = token
            .strip_prefix(TOKEN_PREFIX)
            .ok_or(VerificationError::Malformed)?;
        let (payload_b64, signature_b64) = rest.split_once('.').ok_or(VerificationError::Malformed)?;
        if payload_b64.is_empty() || signature_b64.contains('.') {
            return Err(VerificationError::Malformed);
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| VerificationError::Malformed)?;

        // The payload is not looked at until the MAC over `v1.<payload>` checks out.
        let signed = &token[..TOKEN_PREFIX.len() + payload_b64.len()];
        let expected = self.sign(signed.as_bytes());
        if !bool::from(expected.as_slice().ct_eq(signature.as_slice())) {
            return Err(VerificationError::SignatureInvalid);
        }

        let payload = URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|_| VerificationError::Malformed)?;
        let claims: Claims =
            serde_json::from_slice(&payload).map_err(|_| VerificationError::Malformed)?;

        if claims.expires_at <= now.unix_timestamp() {
            return Err(VerificationError::Expired);
        }
        Ok(claims)
    }

    fn sign(&self, data: &[u8]) -> Vec<u8> {
        let mut mac = self.mac.clone();
        mac.update(data);
        mac.finalize().into_bytes().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn codec() -> TokenCodec {
        TokenCodec::new(&SecretString::from(SECRET)).unwrap()
    }

    fn epoch(secs: i64) -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(secs).unwrap()
    }

    #[test]
    fn mint_then_verify_returns_claims() {
        let codec = codec();
        let now = epoch(1_700_000_000);
        let token = codec
            .mint_at(SubjectId::from("shop-1"), Role::Merchant, Duration::hours(1), now)
            .unwrap();

        let claims = codec.verify_at(token.as_str(), now).unwrap();
        assert_eq!(claims.subject_id, SubjectId::from("shop-1"));
        assert_eq!(claims.role, Role::Merchant);
        assert_eq!(claims.issued_at, 1_700_000_000);
        assert_eq!(claims.expires_at, 1_700_003_600);
    }

    #[test]
    fn mint_is_deterministic_for_fixed_clock() {
        let codec = codec();
        let now = epoch(1_700_000_000);
        let a = codec
            .mint_at(SubjectId::from("s"), Role::Agent, Duration::minutes(5), now)
            .unwrap();
        let b = codec
            .mint_at(SubjectId::from("s"), Role::Agent, Duration::minutes(5), now)
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn mint_rejects_non_positive_ttl() {
        let codec = codec();
        assert!(matches!(
            codec.mint(SubjectId::from("s"), Role::User, Duration::ZERO),
            Err(Error::InvalidTtl(0))
        ));
        assert!(matches!(
            codec.mint(SubjectId::from("s"), Role::User, Duration::seconds(-5)),
            Err(Error::InvalidTtl(-5))
        ));
    }

    #[test]
    fn mint_rejects_sub_second_ttl() {
        let codec = codec();
        assert!(matches!(
            codec.mint(SubjectId::from("s"), Role::User, Duration::milliseconds(500)),
            Err(Error::InvalidTtl(0))
        ));
        let token = codec
            .mint(SubjectId::from("s"), Role::User, Duration::milliseconds(1500))
            .unwrap();
        assert!(codec.verify(token.as_str()).is_ok());
    }

    #[test]
    fn short_secret_is_rejected() {
        let result = TokenCodec::new(&SecretString::from("too-short"));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn expired_after_ttl() {
        let codec = codec();
        let minted = epoch(1_700_000_000);
        let token = codec
            .mint_at(SubjectId::from("s"), Role::Merchant, Duration::seconds(1), minted)
            .unwrap();

        assert!(codec.verify_at(token.as_str(), minted).is_ok());
        assert_eq!(
            codec.verify_at(token.as_str(), epoch(1_700_000_002)),
            Err(VerificationError::Expired)
        );
        // expiresAt itself is already outside the window
        assert_eq!(
            codec.verify_at(token.as_str(), epoch(1_700_000_001)),
            Err(VerificationError::Expired)
        );
    }

    #[test]
    fn wrong_key_is_signature_invalid() {
        let other = TokenCodec::new(&SecretString::from("ffffffffffffffffffffffffffffffff")).unwrap();
        let token = other
            .mint(SubjectId::from("s"), Role::SuperAdmin, Duration::hours(1))
            .unwrap();
        assert_eq!(
            codec().verify(token.as_str()),
            Err(VerificationError::SignatureInvalid)
        );
    }

    #[test]
    fn tampered_payload_is_signature_invalid() {
        let codec = codec();
        let token = codec
            .mint(SubjectId::from("s"), Role::Merchant, Duration::hours(1))
            .unwrap();

        // Re-encode the payload with an escalated role, keep the old MAC.
        let parts: Vec<&str> = token.as_str().split('.').collect();
        let mut claims: serde_json::Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(parts[1]).unwrap()).unwrap();
        claims["role"] = "super_admin".into();
        let forged_payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims).unwrap());
        let forged = format!("v1.{forged_payload}.{}", parts[2]);

        assert_eq!(codec.verify(&forged), Err(VerificationError::SignatureInvalid));
    }

    #[test]
    fn unsigned_token_is_refused() {
        let codec = codec();
        let payload = URL_SAFE_NO_PAD.encode(br#"{"sub":"x","role":"super_admin","iat":0,"exp":9999999999}"#);
        assert_eq!(
            codec.verify(&format!("v1.{payload}.")),
            Err(VerificationError::SignatureInvalid)
        );
    }

    #[test]
    fn garbage_is_malformed() {
        let codec = codec();
        for input in ["", "v1.", "v1.abc", "v2.abc.def", "not-a-token", "v1.abc.d.e", "v1.abc.!!!"] {
            assert_eq!(
                codec.verify(input),
                Err(VerificationError::Malformed),
                "input: {input:?}"
            );
        }
    }

    #[test]
    fn signed_but_unparseable_payload_is_malformed() {
        let codec = codec();
        let signed = format!("v1.{}", URL_SAFE_NO_PAD.encode(b"not json"));
        let signature = URL_SAFE_NO_PAD.encode(codec.sign(signed.as_bytes()));
        assert_eq!(
            codec.verify(&format!("{signed}.{signature}")),
            Err(VerificationError::Malformed)
        );
    }

    #[test]
    fn debug_output_hides_token() {
        let token = codec()
            .mint(SubjectId::from("s"), Role::User, Duration::hours(1))
            .unwrap();
        assert!(!format!("{token:?}").contains(token.as_str()));
    }
}
