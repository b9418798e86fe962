//! Capability catalog: the permission tokens the back office knows about.
//!
//! Tokens are `<module>:<resource>:<action>` strings (e.g. `system:user:list`).
//! The catalog is pure data; menus carry tokens and operations require them.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Capability token.
///
/// Modeled as an opaque string so stored menu tokens and catalogued constants
/// compare equal without conversion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Capability(Cow<'static, str>);

impl Capability {
    pub fn new(token: impl Into<Cow<'static, str>>) -> Self {
        Self(token.into())
    }

    pub const fn from_static(token: &'static str) -> Self {
        Self(Cow::Borrowed(token))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The resource segment (`user` in `system:user:list`).
    pub fn resource(&self) -> Option<&str> {
        let mut parts = self.0.split(':');
        let _module = parts.next()?;
        let resource = parts.next()?;
        parts.next().map(|_| resource)
    }

    /// The action segment (`list` in `system:user:list`).
    pub fn action(&self) -> Option<&str> {
        let (head, action) = self.0.rsplit_once(':')?;
        if head.is_empty() || action.is_empty() {
            None
        } else {
            Some(action)
        }
    }
}

impl core::fmt::Display for Capability {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for Capability {
    fn from(value: &'static str) -> Self {
        Self::from_static(value)
    }
}

macro_rules! catalog_group {
    ($module:ident, [$($name:ident => $token:literal),* $(,)?]) => {
        pub mod $module {
            use super::super::Capability;

            $(pub const $name: Capability = Capability::from_static($token);)*

            pub const ALL: &[Capability] = &[$($name),*];
        }
    };
}

/// Tokens of the `system` module, grouped by resource.
pub mod system {
    catalog_group!(user, [
        LIST => "system:user:list",
        INFO => "system:user:info",
        QUERY => "system:user:query",
        ADD => "system:user:add",
        UPDATE => "system:user:update",
        REMOVE => "system:user:remove",
        RESET_PASSWORD => "system:user:resetPwd",
    ]);

    catalog_group!(role, [
        LIST => "system:role:list",
        INFO => "system:role:info",
        QUERY => "system:role:query",
        ADD => "system:role:add",
        UPDATE => "system:role:update",
        REMOVE => "system:role:remove",
        DATA_SCOPE => "system:role:dataScope",
    ]);

    catalog_group!(menu, [
        LIST => "system:menu:list",
        INFO => "system:menu:info",
        QUERY => "system:menu:query",
        ADD => "system:menu:add",
        UPDATE => "system:menu:update",
        REMOVE => "system:menu:remove",
    ]);

    catalog_group!(dept, [
        LIST => "system:dept:list",
        INFO => "system:dept:info",
        QUERY => "system:dept:query",
        ADD => "system:dept:add",
        UPDATE => "system:dept:update",
        REMOVE => "system:dept:remove",
    ]);
}

/// Catalog entry (for audit/display).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapabilityDefinition {
    pub token: Capability,
    pub resource: Option<String>,
    pub action: Option<String>,
    pub description: Option<String>,
}

/// Every catalogued token, in declaration order.
pub fn all() -> impl Iterator<Item = &'static Capability> {
    system::user::ALL
        .iter()
        .chain(system::role::ALL)
        .chain(system::menu::ALL)
        .chain(system::dept::ALL)
}

pub fn is_catalogued(token: &str) -> bool {
    all().any(|c| c.as_str() == token)
}

/// Catalog listing with parsed resource/action metadata.
pub fn definitions() -> Vec<CapabilityDefinition> {
    all()
        .map(|c| CapabilityDefinition {
            token: c.clone(),
            resource: c.resource().map(str::to_string),
            action: c.action().map(str::to_string),
            description: describe(c),
        })
        .collect()
}

fn describe(cap: &Capability) -> Option<String> {
    let resource = cap.resource()?;
    let action = match cap.action()? {
        "list" => "List",
        "info" => "View details of",
        "query" => "Search",
        "add" => "Create",
        "update" => "Update",
        "remove" => "Delete",
        "resetPwd" => "Reset password of",
        "dataScope" => "Assign data scope to",
        other => other,
    };
    Some(format!("{action} {resource} records"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_resource_and_action() {
        assert_eq!(system::user::LIST.resource(), Some("user"));
        assert_eq!(system::user::LIST.action(), Some("list"));
        assert_eq!(Capability::new("flat").resource(), None);
        assert_eq!(Capability::new("flat").action(), None);
    }

    #[test]
    fn catalog_lists_every_group() {
        assert_eq!(all().count(), 26);
        assert!(is_catalogued("system:dept:remove"));
        assert!(!is_catalogued("system:dept:explode"));
    }

    #[test]
    fn definitions_carry_descriptions() {
        let defs = definitions();
        let reset = defs
            .iter()
            .find(|d| d.token == system::user::RESET_PASSWORD)
            .unwrap();
        assert_eq!(reset.description.as_deref(), Some("Reset password of user records"));
    }

    #[test]
    fn owned_and_static_tokens_compare_equal() {
        assert_eq!(Capability::new(String::from("system:role:add")), system::role::ADD);
    }
}
