//! Entity trait: identity that survives attribute changes.

/// An administrative entity (role, menu item, department) identified by id.
///
/// De-duplication across role grants and tree assembly both key on this id,
/// never on the attribute values.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}

/// An entity that hangs off a parent of the same kind (menus, departments).
///
/// Top-level nodes carry the root sentinel (`"0"`) as their parent id.
pub trait Hierarchical: Entity {
    fn parent_id(&self) -> &Self::Id;

    /// Sort key among siblings.
    fn order(&self) -> i32;
}
