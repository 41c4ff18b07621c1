//! Local application sessions created after a CAS ticket has been validated.

pub mod memory;
pub mod store;
pub mod valkey;

pub use memory::MemorySessionStore;
pub use store::{LocalSession, LocalSessionId, SessionResult, SessionStore, SessionStoreError};
pub use valkey::ValkeySessionStore;
