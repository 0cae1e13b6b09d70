//! Lazy, write-through cache over one object family.
//!
//! # Contract
//!
//! The cache never holds a value that differs from what was last
//! successfully written to, or read from, the remote store:
//!
//! - reads populate an entry only after a successful remote read;
//! - writes and deletes touch the entry only after the remote call succeeded;
//! - ids confirmed absent are never cached, the next lookup probes again;
//! - bulk hydration adds entries but never evicts them.
//!
//! # Concurrency
//!
//! Every id has its own async lock. A miss, a write and a delete for the same
//! id run one at a time, so two concurrent misses issue a single remote read
//! and a reader never sees a value that races an in-flight write. Different
//! ids proceed in parallel. A lock is dropped once no task holds or awaits
//! it, so probing absent ids leaves nothing behind.
//!
//! A full refetch excludes every single-id operation until its snapshot is
//! installed, so a write that succeeds during a refetch is never overwritten
//! by an older read.

pub mod keyed;
pub mod stats;

pub use keyed::KeyedCache;
pub use stats::CacheStats;
