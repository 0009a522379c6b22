pub mod cache;
pub mod error;
pub mod record;

mod memory;
pub use memory::MemoryStore;

pub use cache::{LocalCache, MemoryCache};
pub use error::StoreError;
pub use record::{Record, RecordStore, WriteOptions};
