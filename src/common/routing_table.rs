//! Simplified Kademlia routing table

use std::fmt::{self, Display, Formatter};

use tracing::debug;

use crate::common::{Id, KBucket, Node, DEFAULT_BUCKET_SIZE};

#[derive(Debug, Clone)]
/// Simplified Kademlia routing table
///
/// One [KBucket] per bit of the owner's [Id], indexed by
/// [Id::distance_class]. Overflowing buckets are split, never evicted from.
pub struct RoutingTable {
    id: Id,
    k: usize,
    buckets: Vec<KBucket>,
    splits: usize,
}

impl RoutingTable {
    /// Create a new [RoutingTable] with a given id and the default bucket size.
    pub fn new(id: Id) -> Self {
        Self::with_bucket_size(id, DEFAULT_BUCKET_SIZE)
    }

    /// Create a new [RoutingTable] whose buckets hold at most `k` nodes.
    ///
    /// `k` is clamped to at least 1.
    pub fn with_bucket_size(id: Id, k: usize) -> Self {
        let k = k.max(1);
        let buckets = vec![KBucket::with_capacity(k); id.bits()];

        RoutingTable {
            id,
            k,
            buckets,
            splits: 0,
        }
    }

    // === Getters ===

    /// Returns the [Id] of this node.
    pub fn id(&self) -> &Id {
        &self.id
    }

    pub fn bucket_size(&self) -> usize {
        self.k
    }

    /// Number of bucket slots, one per bit of the owner's [Id].
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Returns the bucket at index `pos`, if `pos` is in range.
    pub fn bucket(&self, pos: usize) -> Option<&KBucket> {
        self.buckets.get(pos)
    }

    /// Returns the bucket that `target` maps to.
    pub fn bucket_for(&self, target: &Id) -> Option<&KBucket> {
        self.bucket(self.distance_class(target))
    }

    /// Number of splits performed since this table was created.
    pub fn splits(&self) -> usize {
        self.splits
    }

    // === Public Methods ===

    /// Bucket index of `id`.
    pub fn distance_class(&self, id: &Id) -> usize {
        id.distance_class()
    }

    /// Attempts to add a node to this routing table, and return `true` if it did,
    /// or if it is this table's own id.
    pub fn insert(&mut self, node: Node) -> bool {
        if node.id() == &self.id {
            return true;
        }

        if node.id().len() != self.id.len() {
            debug!(
                id = %node.id(),
                expected = self.id.len(),
                "Rejected node with mismatched id size"
            );
            return false;
        }

        let pos = self.distance_class(node.id());

        let bucket = &mut self.buckets[pos];
        if !bucket.is_full() || bucket.contains(node.id()) {
            return bucket.insert(node);
        }

        if pos == self.buckets.len() - 1 {
            debug!(id = %node.id(), pos, "Deepest k-bucket is full, dropping node");
            return false;
        }

        self.split(pos);

        if pos == self.distance_class(&self.id) {
            return self.insert(node);
        }

        self.buckets[pos + 1].insert(node)
    }

    /// Remove a node from this routing table.
    pub fn remove(&mut self, id: &Id) -> bool {
        match self.buckets.get_mut(id.distance_class()) {
            Some(bucket) => bucket.remove(id),
            None => false,
        }
    }

    pub fn find(&self, id: &Id) -> Option<&Node> {
        self.bucket_for(id).and_then(|bucket| bucket.find(id))
    }

    pub fn contains(&self, id: &Id) -> bool {
        self.find(id).is_some()
    }

    /// Returns `true` if this routing table is empty.
    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(|bucket| bucket.is_empty())
    }

    /// Return the number of nodes in this routing table.
    pub fn size(&self) -> usize {
        self.buckets.iter().map(KBucket::len).sum()
    }

    /// Returns an iterator over the nodes in this routing table, by bucket index.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.buckets.iter().flat_map(KBucket::iter)
    }

    // === Private Methods ===

    /// Replace the bucket at `pos + 1` with a fresh one, move the tail of
    /// bucket `pos` that belongs to class `pos + 1` into it and cut bucket
    /// `pos` down to half its capacity. Whatever is left of the tail is lost.
    fn split(&mut self, pos: usize) {
        let mut fresh = KBucket::with_capacity(self.k);

        let tail = self.buckets[pos].truncate(self.k / 2);
        let tail_len = tail.len();

        for node in tail {
            if node.id().distance_class() == pos + 1 {
                fresh.insert(node);
            }
        }

        let moved = fresh.len();
        let replaced = std::mem::replace(&mut self.buckets[pos + 1], fresh);
        self.splits += 1;

        debug!(
            pos,
            moved,
            discarded = tail_len - moved,
            replaced = replaced.len(),
            "Split k-bucket"
        );
    }
}

/// Human readable listing of all non-empty buckets, for debugging.
impl Display for RoutingTable {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "RoutingTable {}:", self.id)?;

        for (pos, bucket) in self.buckets.iter().enumerate() {
            if bucket.is_empty() {
                continue;
            }

            writeln!(f, "Bucket {pos}:")?;
            for (index, node) in bucket.iter().enumerate() {
                writeln!(f, "  {index}: {}", node.id())?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn id(byte: u8) -> Id {
        Id::from_bytes([byte]).unwrap()
    }

    fn node(byte: u8) -> Node {
        Node::new(id(byte))
    }

    fn assert_bounded(table: &RoutingTable) {
        for pos in 0..table.bucket_count() {
            let bucket = table.bucket(pos).unwrap();
            assert!(bucket.len() <= table.bucket_size(), "bucket {pos} overflowed");
        }
    }

    #[test]
    fn table_is_empty() {
        let mut table = RoutingTable::new(Id::random());
        assert!(table.is_empty());
        assert_eq!(table.bucket_count(), 160);
        assert_eq!(table.size(), 0);

        table.insert(Node::random_with_size(20));
        assert!(!table.is_empty());
        assert_eq!(table.size(), 1);
        assert_eq!(table.bucket_count(), 160);
    }

    #[test]
    fn nodes_in_bucket_order() {
        let mut table = RoutingTable::with_bucket_size(id(0x00), 2);

        for byte in [0x80, 0x03, 0x01, 0x02] {
            assert!(table.insert(node(byte)));
        }

        let ids: Vec<_> = table.nodes().map(|n| n.id().clone()).collect();
        assert_eq!(ids, vec![id(0x01), id(0x03), id(0x02), id(0x80)]);
        assert_eq!(table.nodes().count(), table.size());
    }

    #[test]
    fn should_not_store_self() {
        let mut table = RoutingTable::new(Id::random());
        let node = Node::new(table.id().clone());

        assert!(table.insert(node));
        assert!(table.is_empty());
    }

    #[test]
    fn should_reject_mismatched_id_size() {
        let mut table = RoutingTable::new(Id::random());

        assert!(!table.insert(Node::random_with_size(8)));
        assert!(table.is_empty());
    }

    #[test]
    fn contains() {
        let mut table = RoutingTable::new(Id::random());

        let node = Node::random_with_size(20);
        assert!(!table.contains(node.id()));

        table.insert(node.clone());
        assert!(table.contains(node.id()));
    }

    #[test]
    fn remove() {
        let mut table = RoutingTable::new(Id::random());

        let node = Node::random_with_size(20);

        table.insert(node.clone());
        assert!(table.remove(node.id()));
        assert!(!table.contains(node.id()));
        assert!(!table.remove(node.id()));
    }

    #[test]
    fn buckets_are_indexed_by_distance_class() {
        let mut table = RoutingTable::with_bucket_size(id(0x00), 2);

        for byte in [0x01, 0x02, 0x03, 0x04] {
            assert!(table.insert(node(byte)));
        }

        assert_bounded(&table);
        assert_eq!(table.splits(), 0);
        assert_eq!(table.size(), 4);
        assert_eq!(table.bucket(0).unwrap().len(), 1);
        assert_eq!(table.bucket(1).unwrap().len(), 2);
        assert_eq!(table.bucket(2).unwrap().len(), 1);
    }

    #[test]
    fn splits_once_on_third_colliding_node() {
        let mut table = RoutingTable::with_bucket_size(id(0x00), 2);

        assert!(table.insert(node(0x04)));
        assert!(table.insert(node(0x05)));
        assert_eq!(table.splits(), 0);

        assert!(table.insert(node(0x06)));
        assert_eq!(table.splits(), 1);
        assert_bounded(&table);

        // The source keeps the first k/2 entries, the rest of its tail does not
        // belong to class 3 and is dropped.
        let source: Vec<_> = table.bucket(2).unwrap().iter().map(|n| n.id()).collect();
        assert_eq!(source, vec![&id(0x04)]);
        assert!(!table.contains(&id(0x05)));

        // Not the owner's class, so the incoming node lands in the new bucket.
        assert!(table.bucket(3).unwrap().contains(&id(0x06)));
        assert_eq!(table.size(), 2);
    }

    #[test]
    fn split_in_own_class_retries_insert() {
        let mut table = RoutingTable::with_bucket_size(id(0x40), 2);

        assert!(table.insert(node(0x41)));
        assert!(table.insert(node(0x42)));
        assert!(table.insert(node(0x43)));

        assert_eq!(table.splits(), 1);
        assert_bounded(&table);

        let bucket = table.bucket(6).unwrap();
        assert!(bucket.contains(&id(0x41)));
        assert!(bucket.contains(&id(0x43)));
        assert!(!bucket.contains(&id(0x42)));
        assert!(table.bucket(7).unwrap().is_empty());
    }

    #[test]
    fn split_replaces_next_bucket() {
        let mut table = RoutingTable::with_bucket_size(id(0x00), 2);

        assert!(table.insert(node(0x08)));
        assert_eq!(table.bucket(3).unwrap().len(), 1);

        for byte in [0x04, 0x05, 0x06] {
            table.insert(node(byte));
        }

        assert!(!table.contains(&id(0x08)));
        assert_eq!(table.bucket(3).unwrap().len(), 1);
    }

    #[test]
    fn deepest_bucket_cannot_split() {
        let mut table = RoutingTable::with_bucket_size(id(0x00), 2);

        assert!(table.insert(node(0x80)));
        assert!(table.insert(node(0x81)));
        assert!(!table.insert(node(0x82)));

        assert_eq!(table.splits(), 0);
        assert_eq!(table.bucket(7).unwrap().len(), 2);
    }

    #[test]
    fn split_conservation() {
        let mut table = RoutingTable::with_bucket_size(id(0x00), 4);

        for byte in 0x20..0x40 {
            let before = table.size();
            let splits = table.splits();

            table.insert(node(byte));

            if table.splits() > splits {
                assert!(table.size() <= before + 1);
            }
        }

        assert_bounded(&table);
    }

    #[test]
    fn random_inserts_stay_bounded() {
        let mut table = RoutingTable::new(Id::random());

        for _ in 0..1000 {
            table.insert(Node::random_with_size(20));
        }

        assert_bounded(&table);
        assert!(table.size() <= table.bucket_count() * table.bucket_size());
    }

    #[test]
    fn bucket_size_is_at_least_one() {
        let mut table = RoutingTable::with_bucket_size(id(0x40), 0);

        assert_eq!(table.bucket_size(), 1);
        assert!(table.insert(node(0x41)));
        assert!(table.insert(node(0x42)));
        assert!(table.contains(&id(0x42)));
    }

    #[test]
    fn dump_lists_non_empty_buckets() {
        let mut table = RoutingTable::with_bucket_size(id(0x00), 2);
        table.insert(node(0x01));
        table.insert(node(0x80));

        let dump = table.to_string();

        assert!(dump.contains("Bucket 0:\n  0: 01\n"));
        assert!(dump.contains("Bucket 7:\n  0: 80\n"));
        assert!(!dump.contains("Bucket 1:"));
    }
}
