//! `backoffice-auth`: capability checks and data-scope predicates.
//!
//! This crate is intentionally decoupled from HTTP and storage: stores are
//! async traits implemented elsewhere, and scopes render to JSON filters the
//! data-access layer executes.

pub mod authorize;
pub mod catalog;
pub mod department;
pub mod error;
pub mod flatten;
pub mod hierarchy;
pub mod menu;
pub mod navigation;
pub mod principal;
pub mod roles;
pub mod scope;
pub mod store;
pub mod tree;

pub use authorize::{
    AuthorizationExplanation, CapabilityRequirement, Combinator, Protected, allow, authorize,
    authorize_operation, explain_authorization,
};
pub use catalog::Capability;
pub use department::Department;
pub use error::{AccessError, DENIED_MESSAGE, DenialKind};
pub use flatten::{FlattenedGrants, flatten};
pub use hierarchy::{HierarchyResolver, ParentChoice, WalkLimits};
pub use menu::{MenuItem, MenuKind};
pub use principal::{Principal, PrincipalKind, StandardPrincipal};
pub use roles::Role;
pub use scope::{
    DataScope, ScopeBuilder, ScopeFields, ScopeOptions, ScopePolicy, ScopePredicate, ScopeSettings,
    ScopedRecord,
};
pub use store::{DepartmentStore, MenuStore, RoleStore, StoreError};
pub use tree::{TreeNode, build_tree};
