//! Persistent store for the registry mirror
//!
//! This module defines the mirrored records, the `RecordStore` trait the reconciler writes
//! through, and its SQLite and in-memory implementations.

/// In-memory store
pub mod memory;
/// Store trait
pub mod repositories;
/// SQLite store
pub mod sqlite;
/// Record and error types
pub mod types;

pub use memory::MemoryStore;
pub use repositories::RecordStore;
pub use sqlite::SqliteStore;
pub use types::*;

use std::sync::Arc;
use tracing::info;

/// Open the store selected by the configured backend.
pub fn open_store(backend: &StoreBackend) -> Result<Arc<dyn RecordStore>, StoreError> {
	let store: Arc<dyn RecordStore> = match backend {
		StoreBackend::Sqlite(path) => Arc::new(SqliteStore::open(path)?),
		StoreBackend::Memory => Arc::new(MemoryStore::new()),
	};
	info!("Opened {} ({})", store.name(), backend);
	Ok(store)
}
