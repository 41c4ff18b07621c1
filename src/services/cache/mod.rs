pub mod client;
#[cfg(test)]
pub mod fake;
pub mod valkey;

pub use client::{CacheClient, CacheError, CacheResult};
pub use valkey::ValkeyClient;
