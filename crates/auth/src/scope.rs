//! Data-scope predicates: which records a principal may see.
//!
//! The builder turns a principal plus [`ScopeOptions`] into a [`DataScope`].
//! The scope renders as a document-store style JSON filter that the data
//! access layer AND-s with its own base filter, or evaluates records in memory.

use std::collections::BTreeSet;

use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use backoffice_core::{DepartmentId, UserId, ValueObject};

use crate::department::Department;
use crate::error::AccessError;
use crate::hierarchy::{HierarchyResolver, WalkLimits};
use crate::principal::{Principal, StandardPrincipal};
use crate::store::DepartmentStore;

/// Per-call scope flags. Unknown fields are rejected at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ScopeOptions {
    #[serde(default)]
    pub include_subdepartments: bool,
    /// Also match records owned by, or identified as, the principal.
    #[serde(default)]
    pub include_own_record_fallback: bool,
}

impl ScopeOptions {
    pub fn subdepartments() -> Self {
        Self {
            include_subdepartments: true,
            include_own_record_fallback: false,
        }
    }

    pub fn own_record_fallback(mut self) -> Self {
        self.include_own_record_fallback = true;
        self
    }
}

/// Record field names the filter refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScopeFields {
    pub department_field: String,
    pub owner_field: String,
    pub identity_field: String,
}

impl Default for ScopeFields {
    fn default() -> Self {
        Self {
            department_field: "deptId".to_string(),
            owner_field: "userId".to_string(),
            identity_field: "_id".to_string(),
        }
    }
}

/// What an empty predicate means for a standard principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopePolicy {
    /// No clauses means no restriction beyond the caller's base filter.
    #[default]
    FailOpen,
    /// No clauses means nothing is visible.
    FailClosed,
}

impl core::str::FromStr for ScopePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "fail_open" | "open" => Ok(Self::FailOpen),
            "fail_closed" | "closed" => Ok(Self::FailClosed),
            other => Err(format!("unknown scope policy: {other}")),
        }
    }
}

/// Deployment-wide builder settings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScopeSettings {
    pub policy: ScopePolicy,
    /// Expand role-granted departments to their subtrees as well.
    pub expand_role_grants: bool,
    pub fields: ScopeFields,
    pub limits: WalkLimits,
}

/// A restricted scope as an OR of membership clauses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScopePredicate {
    pub allowed_departments: BTreeSet<DepartmentId>,
    /// Principal whose own records stay visible, if requested.
    pub own_record: Option<UserId>,
    pub fields: ScopeFields,
}

impl ValueObject for ScopePredicate {}

impl ScopePredicate {
    pub fn is_empty(&self) -> bool {
        self.allowed_departments.is_empty() && self.own_record.is_none()
    }

    /// Disjunction clauses in a fixed order: department ∈ S, identity ∈ S,
    /// owner = principal, identity = principal.
    pub fn clauses(&self) -> Vec<Value> {
        let mut clauses = Vec::with_capacity(4);
        if !self.allowed_departments.is_empty() {
            let set: Vec<&str> = self.allowed_departments.iter().map(|d| d.as_str()).collect();
            clauses.push(field(&self.fields.department_field, json!({ "$in": set })));
            clauses.push(field(&self.fields.identity_field, json!({ "$in": set })));
        }
        if let Some(uid) = &self.own_record {
            clauses.push(field(&self.fields.owner_field, json!({ "$in": [uid.as_str()] })));
            clauses.push(field(&self.fields.identity_field, json!(uid.as_str())));
        }
        clauses
    }

    fn matches<R: ScopedRecord + ?Sized>(&self, record: &R) -> bool {
        let in_set = |value: Option<&str>| {
            value.is_some_and(|v| self.allowed_departments.iter().any(|d| d.as_str() == v))
        };
        if in_set(record.department()) || in_set(Some(record.identity())) {
            return true;
        }
        match &self.own_record {
            Some(uid) => record.owner() == Some(uid.as_str()) || record.identity() == uid.as_str(),
            None => false,
        }
    }
}

fn field(name: &str, condition: Value) -> Value {
    let mut map = Map::new();
    map.insert(name.to_string(), condition);
    Value::Object(map)
}

/// Outcome of scope construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "predicate", rename_all = "snake_case")]
pub enum DataScope {
    /// Match everything the base filter matches.
    Unrestricted,
    Restricted(ScopePredicate),
    /// Match nothing (fail-closed policy only).
    Denied { fields: ScopeFields },
}

impl DataScope {
    pub fn is_unrestricted(&self) -> bool {
        matches!(self, DataScope::Unrestricted)
    }

    pub fn predicate(&self) -> Option<&ScopePredicate> {
        match self {
            DataScope::Restricted(p) => Some(p),
            _ => None,
        }
    }

    /// Render as a JSON filter document, using the field names the scope was
    /// built with.
    ///
    /// `Unrestricted` renders `{}`. `Denied` renders an identity membership
    /// test against the empty set.
    pub fn to_filter(&self) -> Value {
        match self {
            DataScope::Unrestricted => Value::Object(Map::new()),
            DataScope::Restricted(p) => json!({ "$or": p.clauses() }),
            DataScope::Denied { fields } => field(&fields.identity_field, json!({ "$in": [] })),
        }
    }

    /// AND the scope with a caller's base filter. A `null` base counts as `{}`.
    pub fn apply(&self, base: Value) -> Value {
        let base = if base.is_null() { Value::Object(Map::new()) } else { base };
        let scope = self.to_filter();
        let is_empty = |v: &Value| v.as_object().is_some_and(Map::is_empty);
        match (is_empty(&base), is_empty(&scope)) {
            (_, true) => base,
            (true, false) => scope,
            (false, false) => json!({ "$and": [base, scope] }),
        }
    }

    /// Evaluate a record in memory.
    pub fn permits<R: ScopedRecord + ?Sized>(&self, record: &R) -> bool {
        match self {
            DataScope::Unrestricted => true,
            DataScope::Restricted(p) => p.matches(record),
            DataScope::Denied { .. } => false,
        }
    }
}

/// A record the scope can be evaluated against without a store round trip.
pub trait ScopedRecord {
    fn identity(&self) -> &str;

    fn department(&self) -> Option<&str> {
        None
    }

    fn owner(&self) -> Option<&str> {
        None
    }
}

impl ScopedRecord for Department {
    fn identity(&self) -> &str {
        self.id.as_str()
    }
}

/// Builds a [`DataScope`] for a principal.
pub struct ScopeBuilder<S> {
    resolver: HierarchyResolver<S>,
    settings: ScopeSettings,
}

impl<S> ScopeBuilder<S>
where
    S: DepartmentStore,
{
    pub fn new(store: S) -> Self {
        Self::with_settings(store, ScopeSettings::default())
    }

    pub fn with_settings(store: S, settings: ScopeSettings) -> Self {
        Self {
            resolver: HierarchyResolver::with_limits(store, settings.limits),
            settings,
        }
    }

    pub fn settings(&self) -> &ScopeSettings {
        &self.settings
    }

    pub fn resolver(&self) -> &HierarchyResolver<S> {
        &self.resolver
    }

    /// Compute the scope for `principal`.
    ///
    /// Resolver errors propagate unchanged; no partial scope is ever returned.
    pub async fn build(&self, principal: &Principal, options: ScopeOptions) -> Result<DataScope, AccessError> {
        let standard = match principal {
            Principal::Superuser { .. } => return Ok(DataScope::Unrestricted),
            Principal::Standard(p) => p,
        };

        let allowed = self.allowed_departments(standard, options).await?;
        let predicate = ScopePredicate {
            allowed_departments: allowed,
            own_record: options.include_own_record_fallback.then(|| standard.id().clone()),
            fields: self.settings.fields.clone(),
        };

        if !predicate.is_empty() {
            tracing::debug!(
                principal = %standard.id(),
                departments = predicate.allowed_departments.len(),
                own_record = predicate.own_record.is_some(),
                "built restricted data scope"
            );
            return Ok(DataScope::Restricted(predicate));
        }

        match self.settings.policy {
            ScopePolicy::FailOpen => {
                tracing::warn!(
                    principal = %standard.id(),
                    "principal has no department, no granted departments and no own-record fallback; scope is unrestricted"
                );
                Ok(DataScope::Unrestricted)
            }
            ScopePolicy::FailClosed => {
                tracing::debug!(principal = %standard.id(), "empty data scope denied");
                Ok(DataScope::Denied {
                    fields: self.settings.fields.clone(),
                })
            }
        }
    }

    async fn allowed_departments(
        &self,
        principal: &StandardPrincipal,
        options: ScopeOptions,
    ) -> Result<BTreeSet<DepartmentId>, AccessError> {
        let own = principal.department().filter(|d| !d.is_root());
        let granted = principal.granted_departments();

        let mut allowed: BTreeSet<DepartmentId> = own.into_iter().cloned().collect();
        allowed.extend(granted.iter().map(|d| (*d).clone()));

        if options.include_subdepartments {
            let mut roots: Vec<&DepartmentId> = own.into_iter().collect();
            if self.settings.expand_role_grants {
                roots.extend(granted.iter().copied().filter(|d| Some(*d) != own));
            }
            let expanded = try_join_all(roots.into_iter().map(|root| self.resolver.descendants(root))).await?;
            allowed.extend(expanded.into_iter().flatten());
        }

        Ok(allowed)
    }
}
