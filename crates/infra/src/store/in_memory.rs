use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use backoffice_auth::{Department, DepartmentStore, MenuItem, MenuStore, Role, RoleStore, StoreError};
use backoffice_core::{DepartmentId, MenuId, RoleId, Status, UserId};

use crate::principal_loader::UserRecord;

/// Role as persisted: menu grants are references, populated on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRecord {
    pub id: RoleId,
    pub name: String,
    pub key: String,
    #[serde(default)]
    pub menu_ids: Vec<MenuId>,
    #[serde(default)]
    pub department_ids: BTreeSet<DepartmentId>,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub order: i32,
}

/// Serializable content of a directory (fixtures, seeding).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DirectorySnapshot {
    pub departments: Vec<Department>,
    pub menus: Vec<MenuItem>,
    pub roles: Vec<RoleRecord>,
    pub users: Vec<UserRecord>,
}

impl DirectorySnapshot {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

#[derive(Debug, Default)]
struct Tables {
    departments: HashMap<DepartmentId, Department>,
    menus: HashMap<MenuId, MenuItem>,
    roles: HashMap<RoleId, RoleRecord>,
    users: HashMap<UserId, UserRecord>,
}

/// In-memory administrative directory (departments, menus, roles, users).
///
/// Intended for tests/dev. Not optimized for performance: child lookups scan
/// the whole department table.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    tables: RwLock<Tables>,
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Backend("lock poisoned".to_string())
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: DirectorySnapshot) -> Result<Self, StoreError> {
        let directory = Self::new();
        for d in snapshot.departments {
            directory.insert_department(d)?;
        }
        for m in snapshot.menus {
            directory.insert_menu(m)?;
        }
        for r in snapshot.roles {
            directory.insert_role(r)?;
        }
        for u in snapshot.users {
            directory.insert_user(u)?;
        }
        Ok(directory)
    }

    pub fn insert_department(&self, department: Department) -> Result<(), StoreError> {
        let mut tables = self.tables.write().map_err(poisoned)?;
        tables.departments.insert(department.id.clone(), department);
        Ok(())
    }

    pub fn remove_department(&self, id: &DepartmentId) -> Result<Option<Department>, StoreError> {
        let mut tables = self.tables.write().map_err(poisoned)?;
        Ok(tables.departments.remove(id))
    }

    pub fn insert_menu(&self, menu: MenuItem) -> Result<(), StoreError> {
        let mut tables = self.tables.write().map_err(poisoned)?;
        tables.menus.insert(menu.id.clone(), menu);
        Ok(())
    }

    pub fn insert_role(&self, role: RoleRecord) -> Result<(), StoreError> {
        let mut tables = self.tables.write().map_err(poisoned)?;
        tables.roles.insert(role.id.clone(), role);
        Ok(())
    }

    pub fn insert_user(&self, user: UserRecord) -> Result<(), StoreError> {
        let mut tables = self.tables.write().map_err(poisoned)?;
        tables.users.insert(user.id.clone(), user);
        Ok(())
    }

    pub fn role(&self, id: &RoleId) -> Result<Option<RoleRecord>, StoreError> {
        let tables = self.tables.read().map_err(poisoned)?;
        Ok(tables.roles.get(id).cloned())
    }

    pub fn user(&self, id: &UserId) -> Result<Option<UserRecord>, StoreError> {
        let tables = self.tables.read().map_err(poisoned)?;
        Ok(tables.users.get(id).cloned())
    }

    fn sorted_departments<'a>(iter: impl Iterator<Item = &'a Department>) -> Vec<Department> {
        let mut out: Vec<Department> = iter.cloned().collect();
        out.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.id.cmp(&b.id)));
        out
    }
}

#[async_trait::async_trait]
impl DepartmentStore for InMemoryDirectory {
    async fn find_by_id(&self, id: &DepartmentId) -> Result<Option<Department>, StoreError> {
        let tables = self.tables.read().map_err(poisoned)?;
        Ok(tables.departments.get(id).cloned())
    }

    async fn find_children(&self, parent_id: &DepartmentId) -> Result<Vec<Department>, StoreError> {
        let tables = self.tables.read().map_err(poisoned)?;
        Ok(Self::sorted_departments(
            tables.departments.values().filter(|d| &d.parent_id == parent_id),
        ))
    }

    async fn find_all(&self) -> Result<Vec<Department>, StoreError> {
        let tables = self.tables.read().map_err(poisoned)?;
        Ok(Self::sorted_departments(tables.departments.values()))
    }
}

#[async_trait::async_trait]
impl RoleStore for InMemoryDirectory {
    async fn find_roles_with_menus(&self, ids: &[RoleId]) -> Result<Vec<Role>, StoreError> {
        let tables = self.tables.read().map_err(poisoned)?;

        let mut seen = HashSet::new();
        let mut records: Vec<&RoleRecord> = ids
            .iter()
            .filter(|id| seen.insert(*id))
            .filter_map(|id| tables.roles.get(id))
            .collect();
        records.sort_by_key(|r| r.order);

        let roles = records
            .into_iter()
            .map(|record| {
                // Dangling menu references are skipped, like a populate on a deleted document.
                let menus = record
                    .menu_ids
                    .iter()
                    .filter_map(|id| tables.menus.get(id).cloned());
                let mut role = Role::new(record.id.clone(), record.name.clone(), record.key.clone())
                    .with_menus(menus)
                    .with_departments(record.department_ids.iter().cloned());
                role.status = record.status;
                role.order = record.order;
                role
            })
            .collect();
        Ok(roles)
    }
}

#[async_trait::async_trait]
impl MenuStore for InMemoryDirectory {
    async fn find_all_menus(&self) -> Result<Vec<MenuItem>, StoreError> {
        let tables = self.tables.read().map_err(poisoned)?;
        let mut menus: Vec<MenuItem> = tables.menus.values().cloned().collect();
        menus.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.id.cmp(&b.id)));
        Ok(menus)
    }
}
