use crate::types::{Role, SubjectId};

/// Identity established from a host assertion.
///
/// Returned by [`AssertionVerifier::verify`](super::AssertionVerifier::verify);
/// becomes the claims of the minted session token.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct VerifiedIdentity {
    pub subject_id: SubjectId,
    pub role: Role,
}

impl VerifiedIdentity {
    #[must_use]
    pub fn new(subject_id: impl Into<SubjectId>, role: Role) -> Self {
        Self {
            subject_id: subject_id.into(),
            role,
        }
    }
}
