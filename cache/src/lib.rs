//! A concurrent, in-process key/value cache table with per-item idle
//! expiration.
//!
//! # Features
//! - **Idle Expiration**: Every item carries its own life span; an item that is
//!   not accessed for that long is removed. A life span of zero never expires.
//! - **Self-Rescheduling Sweep**: Each table owns one timer, always armed for
//!   the soonest deadline it knows of and dormant when nothing can expire.
//! - **Fine-Grained Locking**: The table lock guards the item map, each item
//!   guards its own access metadata.
//! - **Callbacks**: Hooks for inserted items, items about to be removed, and a
//!   load-on-miss data loader.
//! - **Named Tables**: A process-wide registry hands out the same table for
//!   the same name.
//!
//! ```
//! use fibre_cachetable::CacheTable;
//! use std::time::Duration;
//!
//! let table = CacheTable::new("sessions").unwrap();
//! table.add("alice", Duration::from_secs(30), 42);
//!
//! let item = table.value(&"alice").unwrap();
//! assert_eq!(*item.data(), 42);
//! assert_eq!(item.access_count(), 1);
//! ```

// Public modules that form the API
pub mod builder;
pub mod error;
pub mod item;
pub mod listener;
pub mod logger;
pub mod metrics;
pub mod registry;
pub mod table;

// Internal, crate-only modules
mod loader;
mod shared;
mod task;

// Re-export the primary user-facing types for convenience
pub use builder::CacheTableBuilder;
pub use error::{BuildError, CacheError, RegistryError};
pub use item::CacheItem;
pub use listener::RemovalCause;
pub use logger::LogSink;
pub use metrics::MetricsSnapshot;
pub use registry::{cache, global, Registry};
pub use table::CacheTable;
