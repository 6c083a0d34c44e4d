//! Registry of peers and the recursive put/get forwarding between them.

use std::collections::{HashMap, HashSet};

use bytes::Bytes;
use tracing::{debug, trace};

use crate::{
    common::{hash_immutable, Id, Node},
    peer::{Peer, StoreOutcome},
    Config, Error, Result,
};

#[derive(Debug, Default)]
/// Peers keyed by [Id].
///
/// Routing table entries only carry ids, forwarding resolves them to peers
/// through this registry at call time, so peers never own each other.
pub struct Dht {
    config: Config,
    peers: HashMap<Id, Peer>,
}

impl Dht {
    pub fn new(config: Config) -> Self {
        Dht {
            config,
            peers: HashMap::new(),
        }
    }

    // === Getters ===

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn peer(&self, id: &Id) -> Option<&Peer> {
        self.peers.get(id)
    }

    pub fn peer_mut(&mut self, id: &Id) -> Option<&mut Peer> {
        self.peers.get_mut(id)
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &Id> {
        self.peers.keys()
    }

    // === Public Methods ===

    /// Create and register a new [Peer].
    pub fn add_peer(&mut self, id: Id) -> Result<&mut Peer> {
        if id.len() != self.config.id_size {
            return Err(Error::InvalidIdSize {
                expected: self.config.id_size,
                got: id.len(),
            });
        }

        if self.peers.contains_key(&id) {
            return Err(Error::DuplicatePeer(id));
        }

        let peer = Peer::with_config(id.clone(), &self.config);

        Ok(self.peers.entry(id).or_insert(peer))
    }

    /// Drop a peer from the registry. Nodes referencing it in other routing
    /// tables stay, and are skipped when forwarding.
    pub fn remove_peer(&mut self, id: &Id) -> Option<Peer> {
        self.peers.remove(id)
    }

    /// Insert `to` into the routing table of `from`.
    pub fn connect(&mut self, from: &Id, to: &Id) -> Result<bool> {
        if !self.peers.contains_key(to) {
            return Err(Error::UnknownPeer(to.clone()));
        }

        let peer = self
            .peers
            .get_mut(from)
            .ok_or_else(|| Error::UnknownPeer(from.clone()))?;

        Ok(peer.routing_table_mut().insert(Node::new(to.clone())))
    }

    /// Let every peer try to insert every other peer into its routing table.
    ///
    /// Returns the number of successful inserts.
    pub fn connect_all(&mut self) -> usize {
        let mut ids: Vec<Id> = self.peers.keys().cloned().collect();
        ids.sort();

        let mut inserted = 0;

        for (id, peer) in self.peers.iter_mut() {
            for other in ids.iter().filter(|other| *other != id) {
                if peer.routing_table_mut().insert(Node::new(other.clone())) {
                    inserted += 1;
                }
            }
        }

        debug!(peers = ids.len(), inserted, "Connected all peers");

        inserted
    }

    /// Store `value` at `origin` and forward it to the first nodes of the
    /// bucket its hash maps to, recursively.
    ///
    /// Returns `Ok(false)` if `key` does not match the hash of `value`, and
    /// `Ok(true)` once the value is stored at `origin`, whatever happens
    /// further down.
    pub fn put(&mut self, origin: &Id, key: &[u8], value: impl Into<Bytes>) -> Result<bool> {
        let value = value.into();

        if key.is_empty() || value.is_empty() {
            return Err(Error::InvalidArgument("key or value is empty"));
        }

        if !self.peers.contains_key(origin) {
            return Err(Error::UnknownPeer(origin.clone()));
        }

        let target = Id::from_digest(&hash_immutable(&value), self.config.id_size);
        let mut traversal = Traversal::new(self.config.max_hops);

        self.put_at(origin, key, &value, &target, 0, &mut traversal)
    }

    /// Look `key` up at `origin`, then at the first nodes of the bucket the key
    /// maps to, recursively. The first value found wins.
    pub fn get(&self, origin: &Id, key: &Id) -> Result<Option<Bytes>> {
        if key.len() != self.config.id_size {
            return Err(Error::InvalidIdSize {
                expected: self.config.id_size,
                got: key.len(),
            });
        }

        if !self.peers.contains_key(origin) {
            return Err(Error::UnknownPeer(origin.clone()));
        }

        let mut traversal = Traversal::new(self.config.max_hops);

        Ok(self.get_at(origin, key, 0, &mut traversal))
    }

    // === Private Methods ===

    fn put_at(
        &mut self,
        id: &Id,
        key: &[u8],
        value: &Bytes,
        target: &Id,
        hops: usize,
        traversal: &mut Traversal,
    ) -> Result<bool> {
        if !traversal.enter(id, hops) {
            return Ok(false);
        }

        let peer = match self.peers.get_mut(id) {
            Some(peer) => peer,
            None => {
                trace!(peer = %id, "Skipping unknown peer");
                return Ok(false);
            }
        };

        match peer.store(key, value.clone())? {
            StoreOutcome::Mismatch => return Ok(false),
            // Reached again on a shorter path, forward with the larger budget.
            StoreOutcome::AlreadyStored if traversal.stored_by(id) => {}
            StoreOutcome::AlreadyStored => return Ok(true),
            StoreOutcome::Stored => {
                traversal.record_store(id);
                trace!(peer = %id, target = %target, hops, "Stored value");
            }
        }

        if !traversal.can_forward(hops) {
            return Ok(true);
        }

        for next in peer.next_hops(target) {
            if let Err(error) = self.put_at(&next, key, value, target, hops + 1, traversal) {
                debug!(?error, peer = %next, "Forwarded put failed");
            }
        }

        Ok(true)
    }

    fn get_at(&self, id: &Id, key: &Id, hops: usize, traversal: &mut Traversal) -> Option<Bytes> {
        if !traversal.enter(id, hops) {
            return None;
        }

        let peer = match self.peers.get(id) {
            Some(peer) => peer,
            None => {
                trace!(peer = %id, "Skipping unknown peer");
                return None;
            }
        };

        if let Some(value) = peer.value(key) {
            trace!(peer = %id, key = %key, hops, "Found value");
            return Some(value.clone());
        }

        if !traversal.can_forward(hops) {
            return None;
        }

        for next in peer.next_hops(key) {
            if let Some(value) = self.get_at(&next, key, hops + 1, traversal) {
                return Some(value);
            }
        }

        None
    }
}

/// Guards a single put or get against cycles in the peer graph.
///
/// A peer is entered again only when reached in fewer hops than before, so a
/// peer first cut off by the hop budget on a long path still forwards when a
/// shorter path reaches it. Hop counts only decrease, so every walk ends.
#[derive(Debug)]
struct Traversal {
    /// Fewest hops each peer was reached at.
    reached: HashMap<Id, usize>,
    /// Peers that stored the value during this put.
    stored: HashSet<Id>,
    max_hops: Option<usize>,
}

impl Traversal {
    fn new(max_hops: Option<usize>) -> Self {
        Traversal {
            reached: HashMap::new(),
            stored: HashSet::new(),
            max_hops,
        }
    }

    /// Returns `false` if `id` was already reached in `hops` or fewer.
    fn enter(&mut self, id: &Id, hops: usize) -> bool {
        match self.reached.get(id) {
            Some(fewest) if *fewest <= hops => false,
            _ => {
                self.reached.insert(id.clone(), hops);
                true
            }
        }
    }

    fn record_store(&mut self, id: &Id) {
        self.stored.insert(id.clone());
    }

    fn stored_by(&self, id: &Id) -> bool {
        self.stored.contains(id)
    }

    fn can_forward(&self, hops: usize) -> bool {
        match self.max_hops {
            Some(max_hops) => hops < max_hops,
            None => true,
        }
    }
}
