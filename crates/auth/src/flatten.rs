//! Role → menu flattening.
//!
//! Reduces the menu grants of several roles to one de-duplicated view: the
//! granted nodes, the capability tokens they carry, and the navigable routes.

use std::collections::{BTreeSet, HashSet};

use serde::Serialize;

use backoffice_core::{Entity, MenuId};

use crate::catalog::Capability;
use crate::menu::MenuItem;
use crate::roles::Role;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FlattenedGrants {
    /// Union of granted nodes, first-seen order.
    pub menu_items: Vec<MenuItem>,
    /// Non-empty tokens across *all* granted nodes (action buttons included).
    pub permissions: BTreeSet<Capability>,
    /// Granted nodes that are navigable: no action buttons, no disabled nodes.
    pub routes: Vec<MenuItem>,
}

impl FlattenedGrants {
    pub fn has(&self, token: &Capability) -> bool {
        self.permissions.contains(token)
    }
}

/// Flatten the menu grants of `roles`.
///
/// A node granted by several roles appears once, at the position of its first
/// grant. Superusers never go through here; their routes come straight from
/// the menu store (see [`crate::navigation`]).
pub fn flatten<'a, I>(roles: I) -> FlattenedGrants
where
    I: IntoIterator<Item = &'a Role>,
{
    let mut seen: HashSet<&MenuId> = HashSet::new();
    let mut menu_items: Vec<MenuItem> = Vec::new();

    for role in roles {
        for item in &role.menus {
            if seen.insert(item.id()) {
                menu_items.push(item.clone());
            }
        }
    }

    let permissions = menu_items.iter().filter_map(|m| m.token()).cloned().collect();
    let routes = menu_items.iter().filter(|m| m.is_route()).cloned().collect();

    FlattenedGrants {
        menu_items,
        permissions,
        routes,
    }
}
