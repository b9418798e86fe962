//! Read timeouts for store implementations.
//!
//! The access engine never retries or degrades: an elapsed read surfaces as
//! `StoreError::Timeout` and aborts the request's access computation.

use std::future::Future;
use std::time::Duration;

use backoffice_auth::{Department, DepartmentStore, MenuItem, MenuStore, Role, RoleStore, StoreError};
use backoffice_core::{DepartmentId, RoleId};

/// Wraps a store and bounds every read by `limit`.
#[derive(Debug, Clone)]
pub struct TimeoutStore<S> {
    inner: S,
    limit: Duration,
}

impl<S> TimeoutStore<S> {
    pub fn new(inner: S, limit: Duration) -> Self {
        Self { inner, limit }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }

    async fn bounded<T, F>(&self, op: &'static str, read: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        match tokio::time::timeout(self.limit, read).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(op, limit_ms = self.limit.as_millis() as u64, "store read timed out");
                Err(StoreError::Timeout)
            }
        }
    }
}

#[async_trait::async_trait]
impl<S> DepartmentStore for TimeoutStore<S>
where
    S: DepartmentStore,
{
    async fn find_by_id(&self, id: &DepartmentId) -> Result<Option<Department>, StoreError> {
        self.bounded("find_by_id", self.inner.find_by_id(id)).await
    }

    async fn find_children(&self, parent_id: &DepartmentId) -> Result<Vec<Department>, StoreError> {
        self.bounded("find_children", self.inner.find_children(parent_id)).await
    }

    async fn find_all(&self) -> Result<Vec<Department>, StoreError> {
        self.bounded("find_all", self.inner.find_all()).await
    }
}

#[async_trait::async_trait]
impl<S> RoleStore for TimeoutStore<S>
where
    S: RoleStore,
{
    async fn find_roles_with_menus(&self, ids: &[RoleId]) -> Result<Vec<Role>, StoreError> {
        self.bounded("find_roles_with_menus", self.inner.find_roles_with_menus(ids))
            .await
    }
}

#[async_trait::async_trait]
impl<S> MenuStore for TimeoutStore<S>
where
    S: MenuStore,
{
    async fn find_all_menus(&self) -> Result<Vec<MenuItem>, StoreError> {
        self.bounded("find_all_menus", self.inner.find_all_menus()).await
    }
}
