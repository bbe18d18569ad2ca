use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Stable identifier of the authenticated principal (token `sub` claim).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Into)]
#[serde(transparent)]
pub struct SubjectId(pub String);

impl From<&str> for SubjectId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Closed set of roles a session token may carry.
///
/// Parsing is case-insensitive: the role is lowercased once, at the boundary,
/// so `"Merchant"` and `"MERCHANT"` both become [`Role::Merchant`]. Every
/// comparison after that is an enum comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Role {
    SuperAdmin,
    PlatformManager,
    PlatformSupport,
    Merchant,
    Agent,
    User,
}

impl Role {
    pub const ALL: &'static [Role] = &[
        Role::SuperAdmin,
        Role::PlatformManager,
        Role::PlatformSupport,
        Role::Merchant,
        Role::Agent,
        Role::User,
    ];

    /// Canonical lowercase claim value.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SuperAdmin => "super_admin",
            Self::PlatformManager => "platform_manager",
            Self::PlatformSupport => "platform_support",
            Self::Merchant => "merchant",
            Self::Agent => "agent",
            Self::User => "user",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Role::ALL
            .iter()
            .copied()
            .find(|role| role.as_str() == normalized)
            .ok_or_else(|| Error::UnknownRole(s.to_owned()))
    }
}

impl TryFrom<String> for Role {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_owned()
    }
}

/// Verified payload of a session token.
///
/// Timestamps are unix seconds. Only [`TokenCodec::verify`](crate::TokenCodec::verify)
/// hands these out; nothing else in the crate reads role or subject from
/// anywhere but a verified token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "sub")]
    pub subject_id: SubjectId,
    pub role: Role,
    #[serde(rename = "iat")]
    pub issued_at: i64,
    #[serde(rename = "exp")]
    pub expires_at: i64,
}

impl Claims {
    /// Seconds of validity left at `now` (0 once expired).
    #[must_use]
    pub fn remaining_secs(&self, now: time::OffsetDateTime) -> i64 {
        (self.expires_at - now.unix_timestamp()).max(0)
    }
}

/// Single-use identity blob issued by the embedding host.
///
/// Never logged and never persisted past the handshake call.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityAssertion(String);

impl IdentityAssertion {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for IdentityAssertion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("IdentityAssertion(<redacted>)")
    }
}

/// Body of `POST /api/auth/handshake`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandshakeRequest {
    pub assertion: IdentityAssertion,
}

/// Successful handshake answer. The token itself travels in `Set-Cookie`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandshakeResponse {
    pub role: Role,
    pub subject_id: SubjectId,
}

/// Backend endpoint paths shared by the edge router and the client.
pub mod endpoints {
    pub const HANDSHAKE: &str = "/api/auth/handshake";
    pub const HEARTBEAT: &str = "/api/auth/heartbeat";
    pub const LOGOUT: &str = "/api/auth/logout";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parse_is_case_insensitive() {
        assert_eq!("merchant".parse::<Role>().unwrap(), Role::Merchant);
        assert_eq!("Merchant".parse::<Role>().unwrap(), Role::Merchant);
        assert_eq!("SUPER_ADMIN".parse::<Role>().unwrap(), Role::SuperAdmin);
        assert_eq!(" platform_support ".parse::<Role>().unwrap(), Role::PlatformSupport);
    }

    #[test]
    fn role_parse_rejects_unknown() {
        assert!(matches!("owner".parse::<Role>(), Err(Error::UnknownRole(_))));
        assert!("".parse::<Role>().is_err());
        assert!("super-admin".parse::<Role>().is_err());
    }

    #[test]
    fn role_serializes_lowercase_and_normalizes_on_read() {
        let json = serde_json::to_string(&Role::PlatformManager).unwrap();
        assert_eq!(json, "\"platform_manager\"");
        let parsed: Role = serde_json::from_str("\"Platform_Manager\"").unwrap();
        assert_eq!(parsed, Role::PlatformManager);
    }

    #[test]
    fn claims_use_short_claim_names() {
        let claims = Claims {
            subject_id: SubjectId::from("shop-42"),
            role: Role::Merchant,
            issued_at: 100,
            expires_at: 200,
        };
        let value = serde_json::to_value(&claims).unwrap();
        assert_eq!(value["sub"], "shop-42");
        assert_eq!(value["role"], "merchant");
        assert_eq!(value["iat"], 100);
        assert_eq!(value["exp"], 200);
    }

    #[test]
    fn handshake_response_is_camel_case() {
        let resp = HandshakeResponse {
            role: Role::Agent,
            subject_id: SubjectId::from("agent-1"),
        };
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value["subjectId"], "agent-1");
        assert_eq!(value["role"], "agent");
    }

    #[test]
    fn assertion_debug_is_redacted() {
        let assertion = IdentityAssertion::new("very-secret-blob");
        assert!(!format!("{assertion:?}").contains("very-secret-blob"));
    }
}
