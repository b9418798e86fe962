use serde::{Deserialize, Serialize};

use backoffice_core::{UserId, ValueObject};

use crate::catalog::Capability;
use crate::error::{AccessError, DenialKind};
use crate::principal::{Principal, PrincipalKind, StandardPrincipal};

/// How several required tokens combine into one decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Combinator {
    /// Every token is required.
    #[default]
    All,
    /// One token is enough.
    Any,
}

/// Capabilities an operation requires, declared next to the operation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CapabilityRequirement {
    pub tokens: Vec<Capability>,
    #[serde(default)]
    pub combinator: Combinator,
}

impl ValueObject for CapabilityRequirement {}

impl CapabilityRequirement {
    /// No protection at all.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn all(tokens: impl IntoIterator<Item = Capability>) -> Self {
        Self {
            tokens: tokens.into_iter().collect(),
            combinator: Combinator::All,
        }
    }

    pub fn any(tokens: impl IntoIterator<Item = Capability>) -> Self {
        Self {
            tokens: tokens.into_iter().collect(),
            combinator: Combinator::Any,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    fn satisfied_by(&self, principal: &StandardPrincipal) -> bool {
        match self.combinator {
            Combinator::All => self.tokens.iter().all(|t| principal.has_capability(t)),
            Combinator::Any => self.tokens.iter().any(|t| principal.has_capability(t)),
        }
    }
}

/// Operation-side authorization contract.
///
/// Implement this on operations that require capabilities; the routing layer
/// checks it before dispatching.
pub trait Protected {
    fn requirement(&self) -> CapabilityRequirement;
}

/// Gate an operation on the principal's capabilities.
///
/// - No IO
/// - No panics
/// - Denials carry the reason kind only, never the missing token
pub fn authorize(principal: &Principal, requirement: &CapabilityRequirement) -> Result<(), AccessError> {
    let standard = match principal {
        Principal::Superuser { .. } => return Ok(()),
        Principal::Standard(p) => p,
    };

    if requirement.is_empty() {
        return Ok(());
    }

    if !standard.has_roles() {
        tracing::debug!(principal = %standard.id(), "denied: principal has no roles");
        return Err(AccessError::Authorization(DenialKind::NoRoles));
    }

    if requirement.satisfied_by(standard) {
        Ok(())
    } else {
        tracing::debug!(
            principal = %standard.id(),
            combinator = ?requirement.combinator,
            "denied: capability requirement not met"
        );
        Err(AccessError::Authorization(DenialKind::MissingCapability))
    }
}

/// Boolean form of [`authorize`]; the no-roles case still surfaces as an error.
pub fn allow(principal: &Principal, requirement: &CapabilityRequirement) -> Result<bool, AccessError> {
    match authorize(principal, requirement) {
        Ok(()) => Ok(true),
        Err(AccessError::Authorization(DenialKind::MissingCapability)) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Convenience gate for a [`Protected`] operation.
pub fn authorize_operation<O: Protected + ?Sized>(principal: &Principal, operation: &O) -> Result<(), AccessError> {
    authorize(principal, &operation.requirement())
}

// ─────────────────────────────────────────────────────────────────────────────
// Authorization Explanation (Audit Trail)
// ─────────────────────────────────────────────────────────────────────────────

/// Operator-facing explanation of an authorization decision.
///
/// Unlike [`AccessError`], this names the missing tokens. It goes to audit
/// logs, never back to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizationExplanation {
    pub principal_id: UserId,
    pub principal_kind: PrincipalKind,
    pub required: Vec<String>,
    pub combinator: Combinator,
    pub granted: bool,
    pub reason: String,
    pub denial: Option<DenialKind>,
    /// Required tokens the principal lacks (empty when granted or bypassed).
    pub missing: Vec<String>,
    pub roles: Vec<String>,
}

pub fn explain_authorization(
    principal: &Principal,
    requirement: &CapabilityRequirement,
) -> AuthorizationExplanation {
    let required: Vec<String> = requirement.tokens.iter().map(|t| t.to_string()).collect();
    let mut explanation = AuthorizationExplanation {
        principal_id: principal.id().clone(),
        principal_kind: principal.kind(),
        required,
        combinator: requirement.combinator,
        granted: true,
        reason: String::new(),
        denial: None,
        missing: Vec::new(),
        roles: Vec::new(),
    };

    let standard = match principal {
        Principal::Superuser { .. } => {
            explanation.reason = "superuser bypasses capability checks".to_string();
            return explanation;
        }
        Principal::Standard(p) => p,
    };

    explanation.roles = standard.roles().iter().map(|r| r.key.clone()).collect();

    if requirement.is_empty() {
        explanation.reason = "operation carries no capability requirement".to_string();
        return explanation;
    }

    if !standard.has_roles() {
        explanation.granted = false;
        explanation.denial = Some(DenialKind::NoRoles);
        explanation.reason = "principal holds no roles".to_string();
        return explanation;
    }

    explanation.missing = requirement
        .tokens
        .iter()
        .filter(|t| !standard.has_capability(t))
        .map(|t| t.to_string())
        .collect();

    explanation.granted = requirement.satisfied_by(standard);
    if explanation.granted {
        explanation.reason = match requirement.combinator {
            Combinator::All => "principal holds every required capability".to_string(),
            Combinator::Any => "principal holds at least one required capability".to_string(),
        };
    } else {
        explanation.denial = Some(DenialKind::MissingCapability);
        explanation.reason = format!(
            "missing {} of {} required capabilities",
            explanation.missing.len(),
            requirement.tokens.len()
        );
    }

    explanation
}
