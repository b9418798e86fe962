//! Menu nodes: navigation groups, pages and action buttons.
//!
//! Menus form a tree via `parent_id`. A node optionally carries the capability
//! token that unlocks it; roles grant access by referencing menu nodes.

use serde::{Deserialize, Serialize};

use backoffice_core::{DomainError, DomainResult, Entity, Hierarchical, MenuId, Status};

use crate::catalog::Capability;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuKind {
    /// Directory grouping other nodes.
    Group,
    /// Navigable page.
    Page,
    /// Fine-grained action inside a page; never a route.
    Action,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: MenuId,
    pub parent_id: MenuId,
    pub name: String,
    pub kind: MenuKind,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub permission: Option<Capability>,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub status: Status,
}

impl MenuItem {
    /// Whether this node is a navigable route (not a button, not disabled).
    pub fn is_route(&self) -> bool {
        self.kind != MenuKind::Action && self.status.is_enabled()
    }

    /// The permission token, if present and non-empty.
    pub fn token(&self) -> Option<&Capability> {
        self.permission.as_ref().filter(|p| !p.as_str().is_empty())
    }
}

impl Entity for MenuItem {
    type Id = MenuId;

    fn id(&self) -> &MenuId {
        &self.id
    }
}

impl Hierarchical for MenuItem {
    fn parent_id(&self) -> &MenuId {
        &self.parent_id
    }

    fn order(&self) -> i32 {
        self.order
    }
}

/// Check where a menu node may be attached.
///
/// - groups and pages sit at the root or under a group;
/// - action buttons sit under a page, never at the root.
///
/// `parent` is the resolved parent node, `None` when `item.parent_id` is the
/// root sentinel.
pub fn validate_placement(item: &MenuItem, parent: Option<&MenuItem>) -> DomainResult<()> {
    if item.parent_id == item.id {
        return Err(DomainError::invariant("menu cannot be its own parent"));
    }

    match (item.kind, parent) {
        (MenuKind::Group | MenuKind::Page, None) => Ok(()),
        (MenuKind::Group | MenuKind::Page, Some(p)) if p.kind == MenuKind::Group => Ok(()),
        (MenuKind::Group | MenuKind::Page, Some(_)) => {
            Err(DomainError::validation("parent of a group or page must be a group"))
        }
        (MenuKind::Action, Some(p)) if p.kind == MenuKind::Page => Ok(()),
        (MenuKind::Action, _) => Err(DomainError::validation("parent of an action must be a page")),
    }
}

/// Check that a menu's route path and permission token are not already taken.
///
/// Groups and pages need a unique path; pages and actions need a unique token.
pub fn validate_uniqueness<'a>(
    item: &MenuItem,
    existing: impl IntoIterator<Item = &'a MenuItem>,
) -> DomainResult<()> {
    for other in existing {
        if other.id == item.id {
            continue;
        }
        let needs_path = matches!(item.kind, MenuKind::Group | MenuKind::Page);
        if needs_path && item.path.is_some() && other.path == item.path {
            return Err(DomainError::conflict("menu path already exists"));
        }
        let needs_token = matches!(item.kind, MenuKind::Page | MenuKind::Action);
        if needs_token && item.token().is_some() && other.token() == item.token() {
            return Err(DomainError::conflict("menu permission already exists"));
        }
    }
    Ok(())
}

#[cfg(test)]
pub(crate) fn item(id: &str, parent: &str, kind: MenuKind, token: Option<&'static str>) -> MenuItem {
    MenuItem {
        id: MenuId::new(id),
        parent_id: MenuId::new(parent),
        name: id.to_string(),
        kind,
        path: match kind {
            MenuKind::Action => None,
            _ => Some(format!("/{id}")),
        },
        permission: token.map(Capability::from_static),
        order: 0,
        status: Status::Enabled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buttons_and_disabled_items_are_not_routes() {
        let button = item("b", "p", MenuKind::Action, Some("system:user:add"));
        let mut page = item("p", "0", MenuKind::Page, Some("system:user:list"));
        assert!(!button.is_route());
        assert!(page.is_route());
        page.status = Status::Disabled;
        assert!(!page.is_route());
    }

    #[test]
    fn empty_token_is_treated_as_absent() {
        let mut page = item("p", "0", MenuKind::Page, None);
        page.permission = Some(Capability::new(""));
        assert!(page.token().is_none());
    }

    #[test]
    fn placement_rules() {
        let group = item("g", "0", MenuKind::Group, None);
        let page = item("p", "g", MenuKind::Page, Some("system:user:list"));
        let action = item("a", "p", MenuKind::Action, Some("system:user:add"));

        assert!(validate_placement(&group, None).is_ok());
        assert!(validate_placement(&page, Some(&group)).is_ok());
        assert!(validate_placement(&action, Some(&page)).is_ok());

        assert!(validate_placement(&action, None).is_err());
        assert!(validate_placement(&action, Some(&group)).is_err());
        assert!(validate_placement(&page, Some(&page)).is_err());
    }

    #[test]
    fn self_parent_is_rejected() {
        let group = item("g", "g", MenuKind::Group, None);
        let err = validate_placement(&group, None).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn duplicate_path_or_token_conflicts() {
        let users = item("users", "0", MenuKind::Page, Some("system:user:list"));
        let mut copy = item("users2", "0", MenuKind::Page, Some("system:role:list"));
        copy.path = users.path.clone();
        assert!(validate_uniqueness(&copy, [&users]).is_err());

        let button = item("b2", "users", MenuKind::Action, Some("system:user:list"));
        assert!(validate_uniqueness(&button, [&users]).is_err());

        // Updating a node in place is not a conflict with itself.
        assert!(validate_uniqueness(&users, [&users]).is_ok());
    }
}
