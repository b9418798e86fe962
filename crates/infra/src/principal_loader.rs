//! Builds the request principal from an authenticated user record.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use backoffice_auth::{AccessError, Principal, PrincipalKind, RoleStore, ScopedRecord};
use backoffice_core::{DepartmentId, RoleId, Status, UserId};

/// The fields of a stored user that access decisions depend on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    #[serde(default)]
    pub department: Option<DepartmentId>,
    #[serde(default)]
    pub kind: PrincipalKind,
    #[serde(default)]
    pub role_ids: Vec<RoleId>,
    #[serde(default)]
    pub status: Status,
}

impl UserRecord {
    pub fn new(id: impl Into<UserId>) -> Self {
        Self {
            id: id.into(),
            department: None,
            kind: PrincipalKind::Standard,
            role_ids: Vec::new(),
            status: Status::Enabled,
        }
    }

    pub fn in_department(mut self, department: impl Into<DepartmentId>) -> Self {
        self.department = Some(department.into());
        self
    }

    pub fn with_roles<I, R>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<RoleId>,
    {
        self.role_ids.extend(roles.into_iter().map(Into::into));
        self
    }

    pub fn superuser(mut self) -> Self {
        self.kind = PrincipalKind::Superuser;
        self
    }
}

/// User records are scoped by their own id and their department.
impl ScopedRecord for UserRecord {
    fn identity(&self) -> &str {
        self.id.as_str()
    }

    fn department(&self) -> Option<&str> {
        self.department.as_ref().map(DepartmentId::as_str)
    }

    fn owner(&self) -> Option<&str> {
        Some(self.id.as_str())
    }
}

pub struct PrincipalLoader<R> {
    roles: R,
}

impl<R> PrincipalLoader<R>
where
    R: RoleStore,
{
    pub fn new(roles: R) -> Self {
        Self { roles }
    }

    /// Resolve `user` into a principal.
    ///
    /// Superusers skip the role lookup. Disabled roles grant nothing and are
    /// left out, so a user whose roles are all disabled has no roles.
    pub async fn load(&self, user: &UserRecord) -> Result<Principal, AccessError> {
        if user.kind == PrincipalKind::Superuser {
            return Ok(Principal::superuser(user.id.clone(), user.department.clone()));
        }

        let roles: Vec<Arc<_>> = if user.role_ids.is_empty() {
            Vec::new()
        } else {
            self.roles
                .find_roles_with_menus(&user.role_ids)
                .await?
                .into_iter()
                .filter(|r| r.is_enabled())
                .map(Arc::new)
                .collect()
        };

        tracing::debug!(
            principal = %user.id,
            requested = user.role_ids.len(),
            loaded = roles.len(),
            "loaded principal roles"
        );
        Ok(Principal::standard(user.id.clone(), user.department.clone(), roles))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use backoffice_auth::catalog::system;
    use backoffice_auth::{MenuItem, MenuKind};
    use backoffice_core::MenuId;

    use super::*;
    use crate::store::{InMemoryDirectory, RoleRecord};

    fn directory() -> InMemoryDirectory {
        let dir = InMemoryDirectory::new();
        dir.insert_menu(MenuItem {
            id: MenuId::new("users"),
            parent_id: MenuId::root(),
            name: "Users".to_string(),
            kind: MenuKind::Page,
            path: Some("/users".to_string()),
            permission: Some(system::user::LIST),
            order: 0,
            status: Status::Enabled,
        })
        .unwrap();
        for (id, status) in [("clerk", Status::Enabled), ("retired", Status::Disabled)] {
            dir.insert_role(RoleRecord {
                id: RoleId::new(id),
                name: id.to_string(),
                key: id.to_string(),
                menu_ids: vec![MenuId::new("users")],
                department_ids: BTreeSet::new(),
                status,
                order: 0,
            })
            .unwrap();
        }
        dir
    }

    #[tokio::test]
    async fn standard_user_gets_enabled_roles_only() {
        let loader = PrincipalLoader::new(directory());
        let user = UserRecord::new("u1").in_department("D1").with_roles(["clerk", "retired"]);
        let Principal::Standard(p) = loader.load(&user).await.unwrap() else {
            panic!("expected a standard principal");
        };
        assert_eq!(p.roles().len(), 1);
        assert!(p.has_capability(&system::user::LIST));
        assert_eq!(p.department().map(|d| d.as_str()), Some("D1"));
    }

    #[tokio::test]
    async fn all_roles_disabled_means_no_roles() {
        let loader = PrincipalLoader::new(directory());
        let user = UserRecord::new("u2").with_roles(["retired"]);
        let Principal::Standard(p) = loader.load(&user).await.unwrap() else {
            panic!("expected a standard principal");
        };
        assert!(!p.has_roles());
    }

    #[tokio::test]
    async fn superuser_skips_role_lookup() {
        let loader = PrincipalLoader::new(directory());
        let principal = loader.load(&UserRecord::new("root").superuser()).await.unwrap();
        assert!(principal.is_superuser());
    }
}
