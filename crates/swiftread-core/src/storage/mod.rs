//! Key-value persistence backends and the tiered session store on top.

pub mod memory;
mod session_store;

pub use memory::MemoryStore;
pub use session_store::{
    SESSION_KEY, SMALL_TIER_MAX_BYTES, SessionStore, StorageTier, TIER_FLAG_KEY,
};

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum StoreError {
    /// The backend refused the write for lack of space.
    QuotaExceeded,
    /// The backend cannot be reached at all.
    Unavailable,
    Backend(String),
}

impl core::fmt::Display for StoreError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::QuotaExceeded => f.write_str("storage quota exceeded"),
            Self::Unavailable => f.write_str("storage unavailable"),
            Self::Backend(reason) => write!(f, "storage backend error: {reason}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Fast synchronous store with a small capacity.
pub trait SmallStore {
    fn put(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn has(&self, key: &str) -> Result<bool, StoreError>;
    /// Removing a missing key succeeds.
    fn delete(&mut self, key: &str) -> Result<(), StoreError>;
}

/// Slower asynchronous store for payloads the small tier cannot hold.
#[allow(async_fn_in_trait)]
pub trait LargeStore {
    async fn put(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    async fn has(&self, key: &str) -> Result<bool, StoreError>;
    async fn delete(&mut self, key: &str) -> Result<(), StoreError>;
}
