//! Value object trait: equality by value, not identity.

/// Marker trait for transient values compared by their contents.
///
/// Capability requirements and scope predicates are value objects: they are
/// built per request, never persisted, and two of them with the same fields
/// describe the same decision input.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
