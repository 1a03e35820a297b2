//! # lumen-store — Persistence for the Lumen trust engine.
//!
//! Two [`ReputationStore`](lumen_core::traits::ReputationStore)
//! implementations over the same data model:
//! - [`RocksStore`]: RocksDB with one column family per table.
//! - [`MemoryStore`]: lock-guarded maps for tests and demos.
//!
//! Both are populated from a JSON [`Snapshot`] of the ledger.

pub mod memory;
pub mod rocks;
pub mod snapshot;

mod rows;

use std::path::PathBuf;

pub use memory::MemoryStore;
pub use rocks::RocksStore;
pub use snapshot::{ImportReport, Snapshot, SnapshotError, StoredRelation};

/// Default database location: `<data dir>/lumen/db`.
pub fn default_db_path() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join("lumen").join("db"))
}
