use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use backoffice_core::{DepartmentId, UserId};

use crate::catalog::Capability;
use crate::flatten::{FlattenedGrants, flatten};
use crate::menu::MenuItem;
use crate::roles::Role;

/// Account type as stored on the user record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PrincipalKind {
    #[default]
    Standard,
    Superuser,
}

/// A fully resolved principal for access decisions.
///
/// Built once per authenticated request and never mutated afterwards. Every
/// gate matches on the variant, so the superuser bypass lives in exactly one
/// arm per gate.
#[derive(Debug, Clone)]
pub enum Principal {
    Superuser {
        id: UserId,
        department: Option<DepartmentId>,
    },
    Standard(StandardPrincipal),
}

/// A non-superuser principal with its role grants flattened.
#[derive(Debug, Clone)]
pub struct StandardPrincipal {
    id: UserId,
    department: Option<DepartmentId>,
    roles: Vec<Arc<Role>>,
    grants: FlattenedGrants,
}

impl StandardPrincipal {
    pub fn new(id: UserId, department: Option<DepartmentId>, roles: Vec<Arc<Role>>) -> Self {
        let grants = flatten(roles.iter().map(Arc::as_ref));
        Self {
            id,
            department,
            roles,
            grants,
        }
    }

    pub fn id(&self) -> &UserId {
        &self.id
    }

    pub fn department(&self) -> Option<&DepartmentId> {
        self.department.as_ref()
    }

    pub fn roles(&self) -> &[Arc<Role>] {
        &self.roles
    }

    pub fn has_roles(&self) -> bool {
        !self.roles.is_empty()
    }

    pub fn capabilities(&self) -> &BTreeSet<Capability> {
        &self.grants.permissions
    }

    pub fn has_capability(&self, token: &Capability) -> bool {
        self.grants.has(token)
    }

    pub fn menu_items(&self) -> &[MenuItem] {
        &self.grants.menu_items
    }

    pub fn routes(&self) -> &[MenuItem] {
        &self.grants.routes
    }

    /// Departments granted through roles (not including the principal's own).
    pub fn granted_departments(&self) -> BTreeSet<&DepartmentId> {
        self.roles.iter().flat_map(|r| r.departments.iter()).collect()
    }
}

impl Principal {
    pub fn superuser(id: impl Into<UserId>, department: Option<DepartmentId>) -> Self {
        Principal::Superuser {
            id: id.into(),
            department,
        }
    }

    pub fn standard(
        id: impl Into<UserId>,
        department: Option<DepartmentId>,
        roles: Vec<Arc<Role>>,
    ) -> Self {
        Principal::Standard(StandardPrincipal::new(id.into(), department, roles))
    }

    pub fn id(&self) -> &UserId {
        match self {
            Principal::Superuser { id, .. } => id,
            Principal::Standard(p) => p.id(),
        }
    }

    pub fn department(&self) -> Option<&DepartmentId> {
        match self {
            Principal::Superuser { department, .. } => department.as_ref(),
            Principal::Standard(p) => p.department(),
        }
    }

    pub fn kind(&self) -> PrincipalKind {
        match self {
            Principal::Superuser { .. } => PrincipalKind::Superuser,
            Principal::Standard(_) => PrincipalKind::Standard,
        }
    }

    pub fn is_superuser(&self) -> bool {
        matches!(self, Principal::Superuser { .. })
    }
}
