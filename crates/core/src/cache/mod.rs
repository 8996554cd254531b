//! Generation-scoped snapshot store.
//!
//! Request/response snapshots live in named generations, one per deployed
//! version. Two backends implement [`SnapshotStore`]:
//!
//! - [`CacheDb`]: SQLite with async access via tokio-rusqlite, WAL mode and
//!   automatic schema migrations
//! - [`MemoryStore`]: a shared in-memory map

pub mod connection;
pub mod generations;
pub mod hash;
pub mod memory;
pub mod migrations;
pub mod snapshot;
pub mod store;

pub use crate::Error;

pub use connection::CacheDb;
pub use hash::RequestKey;
pub use memory::MemoryStore;
pub use snapshot::ResponseSnapshot;
pub use store::SnapshotStore;
