pub mod mock_backend;
pub mod seed;
pub mod storage;

pub use mock_backend::{MockBackend, MockPortal};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
