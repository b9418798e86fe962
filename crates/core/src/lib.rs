//! `backoffice-core`: identifiers and domain building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod entity;
pub mod error;
pub mod id;
pub mod status;
pub mod value_object;

pub use entity::{Entity, Hierarchical};
pub use error::{DomainError, DomainResult};
pub use id::{DepartmentId, MenuId, ROOT_PARENT, RoleId, UserId};
pub use status::Status;
pub use value_object::ValueObject;
