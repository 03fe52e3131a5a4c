//! Pluggable token storage

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// Key-value storage for authentication tokens.
///
/// The client reads and writes tokens by string key and never caches them,
/// so whatever backs this trait (browser cookies, a keychain, a file) is the
/// single source of truth for the current token pair.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Look up a stored value by key.
    async fn get(&self, key: &str) -> Option<String>;

    /// Store a value under a key, replacing any previous value.
    async fn set(&self, key: &str, value: String);
}

/// In-memory [`TokenStore`] for native hosts and tests.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryTokenStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn get(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .expect("Failed to acquire token store lock")
            .get(key)
            .cloned()
    }

    async fn set(&self, key: &str, value: String) {
        self.values
            .lock()
            .expect("Failed to acquire token store lock")
            .insert(key.to_owned(), value);
    }
}

// Mock implementation for testing
#[cfg(test)]
pub mod mock {
    use super::*;
    use mockall::mock;

    mock! {
        pub TokenStore {}

        #[async_trait]
        impl TokenStore for TokenStore {
            async fn get(&self, key: &str) -> Option<String>;
            async fn set(&self, key: &str, value: String);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_get_and_set() {
        let store = MemoryTokenStore::new();
        assert_eq!(store.get("at").await, None);

        store.set("at", "token-1".to_string()).await;
        assert_eq!(store.get("at").await.as_deref(), Some("token-1"));
    }

    #[tokio::test]
    async fn test_memory_store_overwrites_by_key() {
        let store = MemoryTokenStore::new();
        store.set("rt", "old".to_string()).await;
        store.set("rt", "new".to_string()).await;

        assert_eq!(store.get("rt").await.as_deref(), Some("new"));
        assert_eq!(store.get("at").await, None);
    }

    #[tokio::test]
    async fn test_mock_store_through_trait_object() {
        let mut mock = mock::MockTokenStore::new();
        mock.expect_get()
            .withf(|key| key == "at")
            .returning(|_| Some("stubbed".to_string()));

        let store: &dyn TokenStore = &mock;
        assert_eq!(store.get("at").await.as_deref(), Some("stubbed"));
    }
}
