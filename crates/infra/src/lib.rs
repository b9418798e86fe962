//! Infrastructure layer: stores, configuration and service wiring for the
//! access engine.

pub mod access;
pub mod config;
pub mod principal_loader;
pub mod store;

mod integration_tests;

pub use access::AccessService;
pub use config::AccessConfig;
pub use principal_loader::{PrincipalLoader, UserRecord};
pub use store::{DirectorySnapshot, InMemoryDirectory, RoleRecord, TimeoutStore};
