#![doc = include_str!("../README.md")]

// Public modules
mod common;

mod config;
mod dht;
mod error;
mod peer;
pub mod simulation;

pub use crate::common::{
    hash_immutable, validate_immutable, Id, KBucket, KeyValidation, Node, RoutingTable,
    DEFAULT_BUCKET_SIZE, DEFAULT_KEY_PREFIX, DIGEST_SIZE, ID_SIZE,
};
pub use bytes::Bytes;
pub use config::{Config, DEFAULT_FAN_OUT, DEFAULT_MAX_HOPS};
pub use dht::Dht;
pub use error::{Error, Result};
pub use peer::{Peer, StoreOutcome};
