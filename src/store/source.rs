//! In-memory legacy store with published/draft views.
//!
//! One `LegacyStore` holds both copies of a course's tree: published nodes
//! (no revision) and their draft variants. The engine never reads it
//! directly; it works through [`PublishedView`] and [`DraftView`], which are
//! the two read-only source collaborators handed to the migration driver.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::{LegacyAddress, MigrateError, MigrateResult};

use super::{SourceNode, SourceStore};

/// In-memory legacy content tree (both revisions of every node).
#[derive(Debug, Default)]
pub struct LegacyStore {
    /// All nodes, in insertion order (enumeration order is stable).
    nodes: Vec<SourceNode>,
    /// Full address (revision included) -> index into `nodes`.
    index: HashMap<LegacyAddress, usize>,
}

impl LegacyStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node, replacing any existing node at the same full address.
    pub fn add_node(&mut self, node: SourceNode) {
        match self.index.get(&node.address) {
            Some(&i) => self.nodes[i] = node,
            None => {
                self.index.insert(node.address.clone(), self.nodes.len());
                self.nodes.push(node);
            }
        }
    }

    /// Number of stored nodes (both revisions counted).
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Addresses of every published course root held by this store, in
    /// insertion order.
    pub fn course_roots(&self) -> Vec<LegacyAddress> {
        self.nodes
            .iter()
            .filter(|n| n.category == "course" && !n.address.is_draft())
            .map(|n| n.address.clone())
            .collect()
    }

    /// The published-copy view (the legacy "direct" store).
    pub fn published_view(&self) -> PublishedView<'_> {
        PublishedView { store: self }
    }

    /// The draft-preferring view (the legacy "draft" store).
    pub fn draft_view(&self) -> DraftView<'_> {
        DraftView { store: self }
    }

    /// Build a store from a serialized dump.
    pub fn from_dump(dump: LegacyDump) -> Self {
        let mut store = Self::new();
        for node in dump.nodes {
            store.add_node(node);
        }
        store
    }

    fn get(&self, address: &LegacyAddress) -> Option<&SourceNode> {
        self.index.get(address).map(|&i| &self.nodes[i])
    }

    fn in_course(node: &SourceNode, course_address: &LegacyAddress) -> bool {
        node.address.org == course_address.org && node.address.course == course_address.course
    }
}

/// Serialized form of a legacy course tree, consumed by the CLI.
#[derive(Debug, Serialize, Deserialize)]
pub struct LegacyDump {
    /// Every node of the course, published and draft copies alike.
    pub nodes: Vec<SourceNode>,
}

/// Read-only view over the published copies only.
#[derive(Debug, Clone, Copy)]
pub struct PublishedView<'a> {
    store: &'a LegacyStore,
}

impl SourceStore for PublishedView<'_> {
    fn get_items(&self, course_address: &LegacyAddress) -> Vec<SourceNode> {
        self.store
            .nodes
            .iter()
            .filter(|n| LegacyStore::in_course(n, course_address) && !n.address.is_draft())
            .cloned()
            .collect()
    }

    fn get_item(&self, address: &LegacyAddress) -> MigrateResult<SourceNode> {
        self.store
            .get(&address.as_published())
            .cloned()
            .ok_or_else(|| MigrateError::SourceItemNotFound(address.clone()))
    }

    fn get_parent_addresses(&self, address: &LegacyAddress) -> Vec<LegacyAddress> {
        parents_among(self.get_items(&course_wildcard(address)), address)
    }
}

/// Read-only view preferring draft copies, falling back to published.
///
/// Enumeration yields the draft variant of any node that has one, and the
/// published copy otherwise — every returned node keeps its own revision
/// marker so callers can tell the two apart.
#[derive(Debug, Clone, Copy)]
pub struct DraftView<'a> {
    store: &'a LegacyStore,
}

impl SourceStore for DraftView<'_> {
    fn get_items(&self, course_address: &LegacyAddress) -> Vec<SourceNode> {
        self.store
            .nodes
            .iter()
            .filter(|n| {
                if !LegacyStore::in_course(n, course_address) {
                    return false;
                }
                if n.address.is_draft() {
                    true
                } else {
                    // Published copy shadowed by its draft twin.
                    self.store.get(&n.address.as_draft()).is_none()
                }
            })
            .cloned()
            .collect()
    }

    fn get_item(&self, address: &LegacyAddress) -> MigrateResult<SourceNode> {
        self.store
            .get(&address.as_draft())
            .or_else(|| self.store.get(&address.as_published()))
            .cloned()
            .ok_or_else(|| MigrateError::SourceItemNotFound(address.clone()))
    }

    fn get_parent_addresses(&self, address: &LegacyAddress) -> Vec<LegacyAddress> {
        parents_among(self.get_items(&course_wildcard(address)), address)
    }
}

/// Course-wildcard address for a node: same org/course, any category/name.
fn course_wildcard(address: &LegacyAddress) -> LegacyAddress {
    LegacyAddress::new(address.org.clone(), address.course.clone(), "course", "")
}

/// Filter `candidates` down to the ones whose child list names `address`.
fn parents_among(candidates: Vec<SourceNode>, address: &LegacyAddress) -> Vec<LegacyAddress> {
    candidates
        .into_iter()
        .filter(|node| {
            node.children()
                .map(|children| children.iter().any(|c| c.same_node(address)))
                .unwrap_or(false)
        })
        .map(|node| node.address)
        .collect()
}
