pub mod memory;
pub mod store;
pub mod valkey;

pub use memory::MemorySessionIndexStore;
pub use store::{SessionIndexError, SessionIndexStore};
pub use valkey::ValkeySessionIndexStore;
