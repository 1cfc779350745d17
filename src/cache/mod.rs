//! Cache Module
//!
//! Envelope format, TTL handling and the write-through cache facade.

mod entry;
mod store;
mod ttl;


// Re-export public types
pub use entry::{current_timestamp, CacheEntry};
pub use store::CacheStore;
pub use ttl::Ttl;
