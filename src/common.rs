//! Miscellaneous common structs used throughout the library.

mod id;
mod immutable;
mod kbucket;
mod node;
mod routing_table;

pub use id::*;
pub use immutable::*;
pub use kbucket::*;
pub use node::*;
pub use routing_table::*;
