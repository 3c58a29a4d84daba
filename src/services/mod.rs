//! Adapters and hosting services.

pub mod kv_store;
pub mod session;
pub mod storage;
pub mod workflow_registry;

pub use kv_store::{FileKvStore, MemoryKvStore};
pub use session::SessionWatch;
pub use storage::Storage;
pub use workflow_registry::{RunHandle, WorkflowRegistry, start_eviction_task};
