//! Host key-value and secret storage.
//!
//! The host platform provides two stores keyed by string: a plain key-value
//! store and an encrypted secret store. Both sit behind traits so the
//! service can run against any backend; [`MemoryStore`] backs tests and
//! single-node deployments.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::error::Result;

/// Secret store key holding an account's GitHub token.
#[must_use]
pub fn token_key(account_id: &str) -> String {
    format!("gh-token:{account_id}")
}

/// Key-value store key holding the GitHub login cached for an account.
#[must_use]
pub fn login_key(account_id: &str) -> String {
    format!("gh-login:{account_id}")
}

/// Encrypted storage for credentials.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Read a secret.
    async fn get_secret(&self, key: &str) -> Result<Option<String>>;

    /// Write a secret, replacing any previous value.
    async fn set_secret(&self, key: &str, value: &str) -> Result<()>;

    /// Delete a secret. Deleting a missing key is not an error.
    async fn delete_secret(&self, key: &str) -> Result<()>;
}

/// Plain key-value storage.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete a value. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;
}

/// In-process store implementing both traits.
///
/// Secrets and plain values live in separate maps.
#[derive(Debug, Default)]
pub struct MemoryStore {
    secrets: RwLock<HashMap<String, String>>,
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SecretStore for MemoryStore {
    async fn get_secret(&self, key: &str) -> Result<Option<String>> {
        Ok(self.secrets.read().await.get(key).cloned())
    }

    async fn set_secret(&self, key: &str, value: &str) -> Result<()> {
        self.secrets
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete_secret(&self, key: &str) -> Result<()> {
        self.secrets.write().await.remove(key);
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.values.write().await.remove(key);
        Ok(())
    }
}
