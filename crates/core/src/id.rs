//! Strongly-typed identifiers used across the back office.
//!
//! Identifiers are opaque strings (document-store object ids). They are never
//! empty and never contain whitespace.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Parent id carried by top-level nodes of the menu and department trees.
pub const ROOT_PARENT: &str = "0";

/// Identifier of a back-office user (the authenticated principal).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

/// Identifier of an organizational unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DepartmentId(String);

/// Identifier of a role.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleId(String);

/// Identifier of a menu node (group, page or action button).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MenuId(String);

fn validate(raw: &str, name: &str) -> Result<(), DomainError> {
    if raw.is_empty() {
        return Err(DomainError::invalid_id(format!("{name}: empty")));
    }
    if raw.chars().any(char::is_whitespace) {
        return Err(DomainError::invalid_id(format!("{name}: contains whitespace")));
    }
    Ok(())
}

macro_rules! impl_string_id {
    ($t:ty, $name:literal) => {
        impl $t {
            /// Wrap a raw id.
            ///
            /// Used for trusted input (fixtures, store rows); untrusted input goes
            /// through `FromStr`.
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Whether this id is the root sentinel used as a parent reference.
            pub fn is_root(&self) -> bool {
                self.0 == ROOT_PARENT
            }

            pub fn root() -> Self {
                Self(ROOT_PARENT.to_string())
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $t {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                validate(s, $name)?;
                Ok(Self(s.to_string()))
            }
        }
    };
}

impl_string_id!(UserId, "UserId");
impl_string_id!(DepartmentId, "DepartmentId");
impl_string_id!(RoleId, "RoleId");
impl_string_id!(MenuId, "MenuId");
