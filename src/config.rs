use crate::common::{KeyValidation, DEFAULT_BUCKET_SIZE, ID_SIZE};

/// Default number of nodes a put or a get is forwarded to at each hop.
pub const DEFAULT_FAN_OUT: usize = 2;
/// Default maximum depth of a forwarded put or get.
pub const DEFAULT_MAX_HOPS: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Peer Configurations
pub struct Config {
    /// Size of node Ids and content keys in bytes.
    ///
    /// Routing tables have one bucket per bit of this size.
    ///
    /// Defaults to [ID_SIZE]
    pub id_size: usize,
    /// Maximum number of nodes in each k-bucket.
    ///
    /// Defaults to [DEFAULT_BUCKET_SIZE]
    pub bucket_size: usize,
    /// Number of nodes, taken from the front of the target's bucket, that a
    /// put or a get is forwarded to.
    ///
    /// Defaults to [DEFAULT_FAN_OUT]
    pub fan_out: usize,
    /// Maximum number of hops a put or a get travels away from the peer it
    /// was issued at. `None` only relies on the per-peer hop record to terminate.
    ///
    /// Defaults to `Some(`[DEFAULT_MAX_HOPS]`)`
    pub max_hops: Option<usize>,
    /// How a key is checked against the hash of the value stored under it.
    ///
    /// Defaults to comparing the first 8 bytes, see [KeyValidation].
    pub key_validation: KeyValidation,
}

impl Config {
    // === Options ===

    pub fn with_id_size(mut self, id_size: usize) -> Self {
        self.id_size = id_size;
        self
    }

    pub fn with_bucket_size(mut self, bucket_size: usize) -> Self {
        self.bucket_size = bucket_size;
        self
    }

    pub fn with_fan_out(mut self, fan_out: usize) -> Self {
        self.fan_out = fan_out;
        self
    }

    pub fn with_max_hops(mut self, max_hops: Option<usize>) -> Self {
        self.max_hops = max_hops;
        self
    }

    pub fn with_key_validation(mut self, key_validation: KeyValidation) -> Self {
        self.key_validation = key_validation;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            id_size: ID_SIZE,
            bucket_size: DEFAULT_BUCKET_SIZE,
            fan_out: DEFAULT_FAN_OUT,
            max_hops: Some(DEFAULT_MAX_HOPS),
            key_validation: KeyValidation::default(),
        }
    }
}
