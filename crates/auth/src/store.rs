//! Read-side store seams consumed by the access engine.
//!
//! The engine never writes. Implementations live in `backoffice-infra`
//! (in-memory for tests/dev) or in whatever persistence layer hosts the
//! administrative data.

use std::sync::Arc;

use thiserror::Error;

use backoffice_core::{DepartmentId, RoleId};

use crate::department::Department;
use crate::menu::MenuItem;
use crate::roles::Role;

/// Store read failure.
///
/// Propagated as-is; retry policy belongs to the store implementation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store read timed out")]
    Timeout,

    #[error("store backend error: {0}")]
    Backend(String),
}

#[async_trait::async_trait]
pub trait DepartmentStore: Send + Sync {
    async fn find_by_id(&self, id: &DepartmentId) -> Result<Option<Department>, StoreError>;

    /// Direct children of `parent_id` (one level only).
    async fn find_children(&self, parent_id: &DepartmentId) -> Result<Vec<Department>, StoreError>;

    async fn find_all(&self) -> Result<Vec<Department>, StoreError>;
}

#[async_trait::async_trait]
pub trait RoleStore: Send + Sync {
    /// Roles by id with their granted menu items populated.
    ///
    /// Unknown ids are skipped; the result follows role `order`.
    async fn find_roles_with_menus(&self, ids: &[RoleId]) -> Result<Vec<Role>, StoreError>;
}

#[async_trait::async_trait]
pub trait MenuStore: Send + Sync {
    async fn find_all_menus(&self) -> Result<Vec<MenuItem>, StoreError>;
}

#[async_trait::async_trait]
impl<S> DepartmentStore for Arc<S>
where
    S: DepartmentStore + ?Sized,
{
    async fn find_by_id(&self, id: &DepartmentId) -> Result<Option<Department>, StoreError> {
        (**self).find_by_id(id).await
    }

    async fn find_children(&self, parent_id: &DepartmentId) -> Result<Vec<Department>, StoreError> {
        (**self).find_children(parent_id).await
    }

    async fn find_all(&self) -> Result<Vec<Department>, StoreError> {
        (**self).find_all().await
    }
}

#[async_trait::async_trait]
impl<S> RoleStore for Arc<S>
where
    S: RoleStore + ?Sized,
{
    async fn find_roles_with_menus(&self, ids: &[RoleId]) -> Result<Vec<Role>, StoreError> {
        (**self).find_roles_with_menus(ids).await
    }
}

#[async_trait::async_trait]
impl<S> MenuStore for Arc<S>
where
    S: MenuStore + ?Sized,
{
    async fn find_all_menus(&self) -> Result<Vec<MenuItem>, StoreError> {
        (**self).find_all_menus().await
    }
}
