//! Kbuckets
use std::{
    fmt::{self, Debug, Formatter},
    slice::Iter,
};

use crate::common::{Id, Node};

/// K = the default maximum size of a k-bucket.
pub const DEFAULT_BUCKET_SIZE: usize = 3;

/// Bounded list of nodes sharing one distance class.
///
/// There is no eviction: once full, a bucket rejects new ids and leaves it
/// to the [crate::RoutingTable] to split.
#[derive(Clone)]
pub struct KBucket {
    /// K (as in k-bucket) is the maximum number of nodes in a k-bucket.
    k: usize,
    /// Nodes in insertion order.
    nodes: Vec<Node>,
}

impl KBucket {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BUCKET_SIZE)
    }

    pub fn with_capacity(k: usize) -> Self {
        KBucket {
            k,
            nodes: Vec::with_capacity(k),
        }
    }

    // === Getters ===

    pub fn capacity(&self) -> usize {
        self.k
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.nodes.len() >= self.k
    }

    pub fn iter(&self) -> Iter<'_, Node> {
        self.nodes.iter()
    }

    /// The first `n` nodes, in insertion order.
    pub fn first(&self, n: usize) -> &[Node] {
        &self.nodes[..n.min(self.nodes.len())]
    }

    // === Public Methods ===

    /// Insert a node, or refresh it if its id is already present.
    ///
    /// Returns `false` only if the node is new and the bucket is full.
    pub fn insert(&mut self, incoming: Node) -> bool {
        if let Some(existing) = self.nodes.iter_mut().find(|n| n.id() == incoming.id()) {
            existing.refresh(&incoming);

            true
        } else if self.nodes.len() < self.k {
            self.nodes.push(incoming);

            true
        } else {
            false
        }
    }

    /// Refresh the entry with the same id, no-op if absent.
    pub fn update(&mut self, incoming: &Node) {
        if let Some(existing) = self.nodes.iter_mut().find(|n| n.id() == incoming.id()) {
            existing.refresh(incoming);
        }
    }

    pub fn remove(&mut self, id: &Id) -> bool {
        match self.nodes.iter().position(|n| n.id() == id) {
            Some(index) => {
                self.nodes.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn find(&self, id: &Id) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id() == id)
    }

    pub fn contains(&self, id: &Id) -> bool {
        self.find(id).is_some()
    }

    /// Keep only the first `len` nodes, returning the ones cut off.
    pub(crate) fn truncate(&mut self, len: usize) -> Vec<Node> {
        if len >= self.nodes.len() {
            return Vec::new();
        }

        self.nodes.split_off(len)
    }
}

impl Default for KBucket {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for KBucket {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "KBucket{{ nodes: {}/{} }}", &self.nodes.len(), self.k)
    }
}
