//! Content-addressed upload cache: a file is only sent to the remote service
//! when its SHA-256 differs from what was last uploaded under the same key.

mod hash;
mod manager;
#[cfg(feature = "store-sqlite")]
mod sqlite_store;
mod store;

pub use hash::{calculate_file_hash, content_hash, has_file_changed};
pub use manager::FileManager;
#[cfg(feature = "store-sqlite")]
pub use sqlite_store::{SqliteFileCacheStore, SqliteStoreError};
pub use store::{CacheEntry, FileCacheStore, MemoryFileCacheStore};
