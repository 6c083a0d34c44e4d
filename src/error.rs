//! Main Crate Error

use crate::common::Id;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
/// Kbucket-dht crate error enum.
pub enum Error {
    /// Caller misuse, such as an empty key or value passed to a put.
    #[error("Invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// An [Id] whose length does not match the configured identifier size.
    #[error("Invalid Id size, expected {expected} bytes, got {got}")]
    InvalidIdSize { expected: usize, got: usize },

    #[error("Invalid hex encoded Id: {0}")]
    InvalidHex(String),

    /// No peer with this [Id] is registered in the [crate::Dht].
    #[error("Unknown peer: {0}")]
    UnknownPeer(Id),

    /// A peer with this [Id] is already registered in the [crate::Dht].
    #[error("Duplicate peer: {0}")]
    DuplicatePeer(Id),
}

/// Alias for `Result<T, Error>`.
pub type Result<T, E = Error> = std::result::Result<T, E>;
