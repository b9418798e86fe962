use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use backoffice_core::{DepartmentId, Entity, RoleId, Status};

use crate::menu::MenuItem;

/// Role as loaded from the role store, with its menu grants populated.
///
/// Roles are owned by the store and shared with principals by reference
/// (`Arc<Role>`); a principal never copies or mutates them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    /// Stable machine key (e.g. "auditor").
    pub key: String,
    /// Granted menu nodes, in grant order.
    #[serde(default)]
    pub menus: Vec<MenuItem>,
    /// Departments whose records this role may see in addition to the holder's own.
    #[serde(default)]
    pub departments: BTreeSet<DepartmentId>,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub order: i32,
}

impl Role {
    pub fn new(id: impl Into<RoleId>, name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            key: key.into(),
            menus: Vec::new(),
            departments: BTreeSet::new(),
            status: Status::Enabled,
            order: 0,
        }
    }

    pub fn with_menus(mut self, menus: impl IntoIterator<Item = MenuItem>) -> Self {
        self.menus.extend(menus);
        self
    }

    pub fn with_departments<I, D>(mut self, departments: I) -> Self
    where
        I: IntoIterator<Item = D>,
        D: Into<DepartmentId>,
    {
        self.departments.extend(departments.into_iter().map(Into::into));
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.status.is_enabled()
    }
}

impl Entity for Role {
    type Id = RoleId;

    fn id(&self) -> &RoleId {
        &self.id
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} ({})", self.name, self.key)
    }
}
