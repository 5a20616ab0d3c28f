//! Durable key-value persistence used by the observation store.

mod memory;

pub use memory::MemoryStore;

use anyhow::Result;
use async_trait::async_trait;

/// Minimal string key-value contract.
///
/// `set` must be atomic per key: after a failed `set` the previous value is
/// still the one `get` returns.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: String) -> Result<()>;
}
