//! What a principal sees in the back-office shell: routes and capability list.

use std::collections::BTreeSet;

use crate::catalog::{self, Capability};
use crate::error::AccessError;
use crate::menu::MenuItem;
use crate::principal::Principal;
use crate::store::MenuStore;
use crate::tree::{TreeNode, build_tree};

/// Navigable menu items for `principal`, ordered by `order`.
///
/// Superusers get every enabled, non-action item from the menu store. Standard
/// principals get the route projection of their flattened grants.
pub async fn routes<M>(principal: &Principal, menus: &M) -> Result<Vec<MenuItem>, AccessError>
where
    M: MenuStore + ?Sized,
{
    let mut items = match principal {
        Principal::Superuser { .. } => menus
            .find_all_menus()
            .await?
            .into_iter()
            .filter(MenuItem::is_route)
            .collect(),
        Principal::Standard(p) => p.routes().to_vec(),
    };
    items.sort_by_key(|m| m.order);
    Ok(items)
}

/// [`routes`] nested by parent.
pub async fn route_tree<M>(principal: &Principal, menus: &M) -> Result<Vec<TreeNode<MenuItem>>, AccessError>
where
    M: MenuStore + ?Sized,
{
    Ok(build_tree(routes(principal, menus).await?))
}

/// Capability tokens to hand to the client for button-level rendering.
pub fn capabilities(principal: &Principal) -> BTreeSet<Capability> {
    match principal {
        Principal::Superuser { .. } => catalog::all().cloned().collect(),
        Principal::Standard(p) => p.capabilities().clone(),
    }
}
