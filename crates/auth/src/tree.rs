//! Nesting of flat parent-linked lists (menus, departments).

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use backoffice_core::Hierarchical;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeNode<T> {
    #[serde(flatten)]
    pub item: T,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeNode<T>>,
}

impl<T> TreeNode<T> {
    /// Number of nodes in this subtree, including this one.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(TreeNode::count).sum::<usize>()
    }
}

/// Nest `items` by parent id; siblings are sorted by `order`.
///
/// Items whose parent is the root sentinel, or whose parent is not in `items`,
/// become roots. Items caught in a parent cycle are dropped.
pub fn build_tree<T>(items: Vec<T>) -> Vec<TreeNode<T>>
where
    T: Hierarchical,
{
    let present: HashSet<T::Id> = items.iter().map(|i| i.id().clone()).collect();

    let mut roots = Vec::new();
    let mut by_parent: HashMap<T::Id, Vec<T>> = HashMap::new();
    for item in items {
        if present.contains(item.parent_id()) && item.parent_id() != item.id() {
            by_parent.entry(item.parent_id().clone()).or_default().push(item);
        } else {
            roots.push(item);
        }
    }

    let mut nodes = attach(roots, &mut by_parent);
    sort_level(&mut nodes);
    nodes
}

fn attach<T>(items: Vec<T>, by_parent: &mut HashMap<T::Id, Vec<T>>) -> Vec<TreeNode<T>>
where
    T: Hierarchical,
{
    items
        .into_iter()
        .map(|item| {
            let children = by_parent.remove(item.id()).unwrap_or_default();
            let mut children = attach(children, by_parent);
            sort_level(&mut children);
            TreeNode { item, children }
        })
        .collect()
}

fn sort_level<T: Hierarchical>(nodes: &mut [TreeNode<T>]) {
    nodes.sort_by_key(|n| n.item.order());
}
