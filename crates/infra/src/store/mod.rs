//! Store implementations for the access engine's read seams.

pub mod in_memory;
pub mod timeout;

pub use in_memory::{DirectorySnapshot, InMemoryDirectory, RoleRecord};
pub use timeout::TimeoutStore;
