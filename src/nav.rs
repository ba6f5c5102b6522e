//! Navigation: menu tree derived from page descriptors.
//!
//! DESIGN
//! ======
//! Every page gets at most one parent:
//!
//! 1. A page named in another page's non-empty `children` list belongs to
//!    that page. If several lists name it, the first owner in menu order wins.
//! 2. Otherwise a page declaring `parent = P` belongs to P, unless P keeps
//!    an explicit list, in which case the explicit list is authoritative and
//!    the page is promoted to the top level.
//! 3. Dangling, self-referencing and cyclic parents are promoted to the top
//!    level.
//!
//! Assignments therefore form a forest, so no page appears twice and no
//! branch revisits a page. Each sibling list is sorted by order; sorting is
//! stable, so ties keep registration order (or list position for explicit
//! children). Every irregularity is logged with `tracing::warn!` and never
//! aborts the build.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::pages::{GroupType, PageDescriptor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Group,
    Divider,
}

/// One entry of the navigation menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuItem {
    pub key: String,
    pub label: String,
    /// Icon family prefix followed by the icon name.
    pub icon: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<ItemKind>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<MenuItem>,
}

impl MenuItem {
    fn leaf(desc: &PageDescriptor) -> Self {
        let kind = match desc.group_type {
            GroupType::Group => Some(ItemKind::Group),
            GroupType::Leaf if desc.divider_before => Some(ItemKind::Divider),
            GroupType::Leaf => None,
        };
        Self {
            key: desc.key.clone(),
            label: desc.label.clone(),
            icon: format!("{}{}", desc.icon_type, desc.icon),
            kind,
            children: Vec::new(),
        }
    }

    /// Depth-first search for `key` in this item and its descendants.
    #[cfg(test)]
    pub fn find(&self, key: &str) -> Option<&MenuItem> {
        if self.key == key {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(key))
    }
}

/// Find `key` anywhere in a menu.
#[cfg(test)]
pub fn find_item<'a>(menu: &'a [MenuItem], key: &str) -> Option<&'a MenuItem> {
    menu.iter().find_map(|item| item.find(key))
}

// =============================================================================
// TREE BUILD
// =============================================================================

/// Build the nested menu from `descriptors`.
#[must_use]
pub fn build_menu(descriptors: &[PageDescriptor]) -> Vec<MenuItem> {
    let (sorted, index) = sorted_unique(descriptors);
    let n = descriptors.len();
    let mut parent: Vec<Option<usize>> = vec![None; n];
    let mut claimed = vec![false; n];

    // Explicit lists first so they take precedence over declared parents.
    for &p in &sorted {
        for child_key in &descriptors[p].children {
            let owner = descriptors[p].key.as_str();
            match index.get(child_key.as_str()) {
                None => tracing::warn!(page = owner, child = %child_key, "explicit child does not exist; skipping"),
                Some(&c) if c == p => tracing::warn!(page = owner, "page lists itself as a child; skipping"),
                Some(&c) if claimed[c] => {
                    tracing::warn!(page = owner, child = %child_key, "child already listed by another page; skipping");
                }
                Some(&c) => {
                    parent[c] = Some(p);
                    claimed[c] = true;
                }
            }
        }
    }

    for &i in &sorted {
        let desc = &descriptors[i];
        let Some(parent_key) = desc.parent.as_deref() else {
            continue;
        };
        if claimed[i] {
            if index.get(parent_key).copied() != parent[i] {
                tracing::warn!(page = %desc.key, parent = parent_key, "declared parent overridden by an explicit children list");
            }
            continue;
        }
        match index.get(parent_key) {
            None => tracing::warn!(page = %desc.key, parent = parent_key, "dangling parent; promoting to top level"),
            Some(&p) if p == i => tracing::warn!(page = %desc.key, "page is its own parent; promoting to top level"),
            Some(&p) if !descriptors[p].children.is_empty() => tracing::warn!(
                page = %desc.key,
                parent = parent_key,
                "parent lists its children explicitly without this page; promoting to top level"
            ),
            Some(&p) => parent[i] = Some(p),
        }
    }

    for i in cycle_members(&parent) {
        tracing::warn!(page = %descriptors[i].key, "parent cycle; promoting to top level");
        parent[i] = None;
    }

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); n];
    for &p in &sorted {
        if descriptors[p].children.is_empty() {
            continue;
        }
        let mut seen = HashSet::new();
        let mut listed: Vec<usize> = descriptors[p]
            .children
            .iter()
            .filter_map(|k| index.get(k.as_str()).copied())
            .filter(|&c| parent[c] == Some(p) && seen.insert(c))
            .collect();
        listed.sort_by_key(|&c| descriptors[c].order);
        children[p] = listed;
    }
    for &c in &sorted {
        if let Some(p) = parent[c] {
            if descriptors[p].children.is_empty() {
                children[p].push(c);
            }
        }
    }

    sorted
        .iter()
        .filter(|&&i| parent[i].is_none())
        .map(|&i| build_item(descriptors, &children, i))
        .collect()
}

/// Flat menu of every page by order, for clients without nested menus.
#[must_use]
pub fn flat_menu(descriptors: &[PageDescriptor]) -> Vec<MenuItem> {
    let (sorted, _) = sorted_unique(descriptors);
    sorted
        .into_iter()
        .map(|i| {
            let mut item = MenuItem::leaf(&descriptors[i]);
            item.kind = None;
            item
        })
        .collect()
}

/// Indices of the first descriptor per key, stably sorted by order.
fn sorted_unique(descriptors: &[PageDescriptor]) -> (Vec<usize>, HashMap<&str, usize>) {
    let mut index: HashMap<&str, usize> = HashMap::with_capacity(descriptors.len());
    let mut sorted = Vec::with_capacity(descriptors.len());
    for (i, desc) in descriptors.iter().enumerate() {
        if index.contains_key(desc.key.as_str()) {
            tracing::warn!(page = %desc.key, "duplicate page key in menu; keeping the first");
            continue;
        }
        index.insert(desc.key.as_str(), i);
        sorted.push(i);
    }
    sorted.sort_by_key(|&i| descriptors[i].order);
    (sorted, index)
}

/// Nodes whose parent chain leads back to themselves.
fn cycle_members(parent: &[Option<usize>]) -> Vec<usize> {
    let mut members = Vec::new();
    for start in 0..parent.len() {
        let mut cursor = parent[start];
        for _ in 0..parent.len() {
            match cursor {
                Some(c) if c == start => {
                    members.push(start);
                    break;
                }
                Some(c) => cursor = parent[c],
                None => break,
            }
        }
    }
    members
}

fn build_item(descriptors: &[PageDescriptor], children: &[Vec<usize>], i: usize) -> MenuItem {
    let mut item = MenuItem::leaf(&descriptors[i]);
    item.children = children[i].iter().map(|&c| build_item(descriptors, children, c)).collect();
    item
}

#[cfg(test)]
#[path = "nav_test.rs"]
mod tests;
