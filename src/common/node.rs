//! Struct and implementation of the Node entry in the Kademlia routing table
use std::time::Instant;

use crate::common::Id;

#[derive(Debug, Clone)]
/// Node entry in Kademlia routing table.
///
/// Holds no handle to the peer itself, the owning [crate::Dht] resolves
/// the peer by [Id] when a lookup or a put is forwarded to it.
pub struct Node {
    id: Id,
    last_seen: Instant,
}

impl Node {
    /// Creates a new Node from an id, seen just now.
    pub fn new(id: Id) -> Node {
        Node {
            id,
            last_seen: Instant::now(),
        }
    }

    /// Creates a node with a random Id of `size` bytes.
    pub fn random_with_size(size: usize) -> Node {
        Node::new(Id::random_with_size(size))
    }

    // === Getters ===

    pub fn id(&self) -> &Id {
        &self.id
    }

    pub fn last_seen(&self) -> Instant {
        self.last_seen
    }

    // === Public Methods ===

    /// Overwrite the payload of this entry with the payload of `other`.
    pub(crate) fn refresh(&mut self, other: &Node) {
        self.last_seen = other.last_seen;
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Node {}
