//! plantkeep storage - remote keyed store contract and keyed cache.
//!
//! The remote store only offers coarse file operations per container. This
//! crate defines that contract ([`KeyedStore`]), the write-through
//! [`KeyedCache`] that sits in front of it, and an in-memory store used by
//! tests and local runs.

pub mod cache;
pub mod memory;
pub mod store;

pub use cache::{CacheStats, KeyedCache};
pub use memory::{InMemoryKeyedStore, StoreOp};
pub use store::{KeyedStore, VersionToken};
