//! A single participant: routing table plus local content addressed store.

use std::collections::HashMap;

use bytes::Bytes;
use tracing::debug;

use crate::common::{hash_immutable, validate_immutable, Id, KeyValidation, RoutingTable};
use crate::{Config, Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Result of writing a value to a [Peer]'s local store.
pub enum StoreOutcome {
    /// The value was new and is now stored.
    Stored,
    /// A value with the same hash was already stored, nothing changed.
    AlreadyStored,
    /// The key does not match the hash of the value, nothing changed.
    Mismatch,
}

#[derive(Debug, Clone)]
/// A peer owns its [RoutingTable] and its local store exclusively.
///
/// Forwarding puts and gets to other peers is done by the [crate::Dht] that
/// owns this peer.
pub struct Peer {
    id: Id,
    routing_table: RoutingTable,
    store: HashMap<Id, Bytes>,

    // Options
    fan_out: usize,
    key_validation: KeyValidation,
}

impl Peer {
    /// Create a peer with an empty store and a routing table that only knows
    /// its own id, using the default [Config].
    pub fn new(id: Id) -> Self {
        Self::with_config(id, &Config::default())
    }

    pub fn with_config(id: Id, config: &Config) -> Self {
        Peer {
            routing_table: RoutingTable::with_bucket_size(id.clone(), config.bucket_size),
            id,
            store: HashMap::new(),
            fan_out: config.fan_out,
            key_validation: config.key_validation,
        }
    }

    // === Getters ===

    pub fn id(&self) -> &Id {
        &self.id
    }

    pub fn routing_table(&self) -> &RoutingTable {
        &self.routing_table
    }

    pub fn routing_table_mut(&mut self) -> &mut RoutingTable {
        &mut self.routing_table
    }

    /// Number of values in the local store.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    // === Public Methods ===

    /// The key a value with this hash is stored under, sized to this peer's [Id].
    pub fn content_key(&self, hash: &[u8]) -> Id {
        Id::from_digest(hash, self.id.len())
    }

    /// Validate `key` against the hash of `value` and write it to the local store.
    ///
    /// Empty keys or values are rejected with [Error::InvalidArgument].
    pub fn store(&mut self, key: &[u8], value: Bytes) -> Result<StoreOutcome> {
        if key.is_empty() || value.is_empty() {
            return Err(Error::InvalidArgument("key or value is empty"));
        }

        let hash = hash_immutable(&value);

        if !validate_immutable(key, &hash, self.key_validation) {
            debug!(peer = %self.id, "Key does not match the hash of the value");
            return Ok(StoreOutcome::Mismatch);
        }

        let content_key = self.content_key(&hash);

        if self.store.contains_key(&content_key) {
            return Ok(StoreOutcome::AlreadyStored);
        }

        self.store.insert(content_key, value);

        Ok(StoreOutcome::Stored)
    }

    /// Look up a value in the local store only.
    pub fn value(&self, key: &Id) -> Option<&Bytes> {
        self.store.get(key)
    }

    /// Ids of the nodes a put or a get for `target` is forwarded to: the first
    /// `fan_out` nodes of the target's bucket, in bucket order.
    pub fn next_hops(&self, target: &Id) -> Vec<Id> {
        match self.routing_table.bucket_for(target) {
            Some(bucket) => bucket
                .first(self.fan_out)
                .iter()
                .map(|node| node.id().clone())
                .collect(),
            None => Vec::new(),
        }
    }
}
