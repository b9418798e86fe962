use serde::Serialize;
use thiserror::Error;

use backoffice_core::DomainError;

use crate::store::StoreError;

/// Message shown to callers on every authorization denial.
///
/// The caller never learns which token was missing.
pub const DENIED_MESSAGE: &str = "insufficient access, request denied";

/// Why an authorization check failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialKind {
    /// The principal holds no roles while the operation is protected.
    NoRoles,
    /// The principal's capabilities do not satisfy the requirement.
    MissingCapability,
}

#[derive(Debug, Error)]
pub enum AccessError {
    #[error("insufficient access, request denied")]
    Authorization(DenialKind),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The department hierarchy is corrupted (cycle or runaway depth).
    #[error("data integrity violation: {0}")]
    DataIntegrity(String),

    #[error("retrieval failed: {0}")]
    Retrieval(#[from] StoreError),

    /// An administrative request broke a hierarchy rule (e.g. moving a unit under itself).
    #[error(transparent)]
    Invalid(#[from] DomainError),
}

impl AccessError {
    pub fn not_found(entity: &'static str, id: impl core::fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            AccessError::Authorization(_) => "forbidden",
            AccessError::NotFound { .. } => "not_found",
            AccessError::DataIntegrity(_) => "data_integrity",
            AccessError::Retrieval(_) => "retrieval_failed",
            AccessError::Invalid(_) => "invalid_request",
        }
    }

    /// Message safe to show to the end user.
    pub fn public_message(&self) -> String {
        match self {
            AccessError::Authorization(_) => DENIED_MESSAGE.to_string(),
            AccessError::NotFound { entity, .. } => format!("{entity} not found"),
            AccessError::Invalid(e) => e.to_string(),
            AccessError::DataIntegrity(_) | AccessError::Retrieval(_) => {
                "internal error while resolving access".to_string()
            }
        }
    }

    pub fn is_denial(&self) -> bool {
        matches!(self, AccessError::Authorization(_))
    }

    /// Whether the caller (rather than the server) is at fault.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AccessError::Authorization(_) | AccessError::NotFound { .. } | AccessError::Invalid(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn denial_message_is_fixed_for_both_reasons() {
        let no_roles = AccessError::Authorization(DenialKind::NoRoles);
        let missing = AccessError::Authorization(DenialKind::MissingCapability);
        assert_eq!(no_roles.to_string(), DENIED_MESSAGE);
        assert_eq!(missing.to_string(), DENIED_MESSAGE);
        assert_eq!(missing.code(), "forbidden");
    }

    #[test]
    fn server_side_details_stay_out_of_public_message() {
        let err = AccessError::DataIntegrity("cycle at D7".to_string());
        assert!(!err.public_message().contains("D7"));
        assert!(!err.is_client_error());
        assert_eq!(err.code(), "data_integrity");
    }

    #[test]
    fn store_errors_convert_to_retrieval() {
        let err: AccessError = StoreError::Timeout.into();
        assert_eq!(err.code(), "retrieval_failed");
    }
}
