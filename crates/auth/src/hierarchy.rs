//! Department hierarchy resolution.
//!
//! Descendants are computed with an explicit level-by-level worklist and a
//! visited set keyed by department id; there is no recursion through the tree.
//! Siblings on one level are fetched concurrently, bounded by `max_fanout`.
//! A revisited id means the stored hierarchy contains a cycle and aborts the
//! walk; so does a tree deeper than `max_depth`. Either way no partial result
//! is returned.

use std::collections::HashSet;

use futures::{StreamExt, TryStreamExt, stream};
use serde::{Deserialize, Serialize};

use backoffice_core::{DepartmentId, DomainError};

use crate::department::Department;
use crate::error::AccessError;
use crate::store::DepartmentStore;

/// Bounds on a single descendant walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WalkLimits {
    /// Most levels a walk may descend below its starting unit.
    pub max_depth: usize,
    /// Concurrent child lookups per level.
    pub max_fanout: usize,
}

impl Default for WalkLimits {
    fn default() -> Self {
        Self {
            max_depth: 64,
            max_fanout: 8,
        }
    }
}

/// One entry of a parent picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParentChoice {
    /// Top of the tree (parent id `"0"`).
    Root,
    Department(Department),
}

impl ParentChoice {
    pub fn id(&self) -> DepartmentId {
        match self {
            ParentChoice::Root => DepartmentId::root(),
            ParentChoice::Department(d) => d.id.clone(),
        }
    }
}

pub struct HierarchyResolver<S> {
    store: S,
    limits: WalkLimits,
}

impl<S> HierarchyResolver<S>
where
    S: DepartmentStore,
{
    pub fn new(store: S) -> Self {
        Self::with_limits(store, WalkLimits::default())
    }

    pub fn with_limits(store: S, limits: WalkLimits) -> Self {
        Self { store, limits }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn limits(&self) -> WalkLimits {
        self.limits
    }

    /// Every unit below `root`, excluding `root` itself. Unordered.
    ///
    /// Fails with `NotFound` if `root` does not exist; a unit without children
    /// resolves to the empty set.
    pub async fn descendants(&self, root: &DepartmentId) -> Result<HashSet<DepartmentId>, AccessError> {
        self.require(root).await?;
        self.walk(root).await
    }

    async fn require(&self, id: &DepartmentId) -> Result<Department, AccessError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| AccessError::not_found("department", id))
    }

    async fn walk(&self, root: &DepartmentId) -> Result<HashSet<DepartmentId>, AccessError> {
        let mut visited: HashSet<DepartmentId> = HashSet::from([root.clone()]);
        let mut frontier: Vec<DepartmentId> = vec![root.clone()];
        let mut depth = 0usize;
        let fanout = self.limits.max_fanout.max(1);

        while !frontier.is_empty() {
            let levels: Vec<Vec<Department>> = stream::iter(frontier.iter())
                .map(|parent| self.store.find_children(parent))
                .buffer_unordered(fanout)
                .try_collect()
                .await?;

            let mut next = Vec::new();
            for child in levels.into_iter().flatten() {
                if !visited.insert(child.id.clone()) {
                    tracing::error!(
                        root = %root,
                        department = %child.id,
                        parent = %child.parent_id,
                        "cycle detected in department hierarchy"
                    );
                    return Err(AccessError::DataIntegrity(format!(
                        "department {} revisited while resolving descendants of {root}",
                        child.id
                    )));
                }
                next.push(child.id);
            }

            if !next.is_empty() {
                depth += 1;
                if depth > self.limits.max_depth {
                    tracing::error!(root = %root, max_depth = self.limits.max_depth, "department hierarchy too deep");
                    return Err(AccessError::DataIntegrity(format!(
                        "department hierarchy below {root} exceeds {} levels",
                        self.limits.max_depth
                    )));
                }
            }
            frontier = next;
        }

        visited.remove(root);
        tracing::debug!(root = %root, descendants = visited.len(), depth, "resolved department descendants");
        Ok(visited)
    }

    /// Reject a move that would make a unit its own ancestor.
    ///
    /// `new_parent` may be the root sentinel. Both units must exist.
    pub async fn ensure_can_reparent(
        &self,
        id: &DepartmentId,
        new_parent: &DepartmentId,
    ) -> Result<(), AccessError> {
        if id == new_parent {
            return Err(DomainError::invariant("department cannot be its own parent").into());
        }
        self.require(id).await?;
        if new_parent.is_root() {
            return Ok(());
        }
        self.require(new_parent).await?;

        if self.walk(id).await?.contains(new_parent) {
            return Err(DomainError::invariant(format!(
                "department {id} cannot be moved under its own descendant {new_parent}"
            ))
            .into());
        }
        Ok(())
    }

    /// Choices for the parent of `id`.
    ///
    /// A top-level unit only offers the root. Any other unit offers everything
    /// except itself and its descendants, ordered by `order`.
    pub async fn selectable_parents(&self, id: &DepartmentId) -> Result<Vec<ParentChoice>, AccessError> {
        let department = self.require(id).await?;
        if department.is_top_level() {
            return Ok(vec![ParentChoice::Root]);
        }

        let excluded = self.walk(id).await?;
        let mut candidates: Vec<Department> = self
            .store
            .find_all()
            .await?
            .into_iter()
            .filter(|d| &d.id != id && !excluded.contains(&d.id))
            .collect();
        candidates.sort_by_key(|d| d.order);
        Ok(candidates.into_iter().map(ParentChoice::Department).collect())
    }
}
