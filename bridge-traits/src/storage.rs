//! Credential Storage Abstraction
//!
//! Provides a platform-agnostic trait for persisting cached credential blobs
//! (e.g., a delegated OAuth token) between process runs.

use async_trait::async_trait;

use crate::error::Result;

/// Secure credential storage trait
///
/// Abstracts where cached credentials live:
/// - Desktop/server: a permission-restricted file next to the deployment
/// - Managed hosts: a secret manager or OS keychain
///
/// # Security Requirements
///
/// Implementations MUST:
/// - Restrict access to the owning process/user
/// - Never log or expose stored values
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::SecureStore;
///
/// async fn store_token(store: &dyn SecureStore, token: &str) -> Result<()> {
///     store.set_secret("oauth_token", token.as_bytes()).await?;
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait SecureStore: Send + Sync {
    /// Store a secret value
    ///
    /// # Arguments
    ///
    /// * `key` - Unique identifier for the secret
    /// * `value` - Secret data to store
    ///
    /// A previous value under the same key is replaced.
    async fn set_secret(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Retrieve a secret value
    ///
    /// # Returns
    ///
    /// Returns `Ok(None)` if the key doesn't exist.
    async fn get_secret(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Delete a secret
    ///
    /// Deleting a missing key is not an error.
    async fn delete_secret(&self, key: &str) -> Result<()>;

    /// Check if a secret exists without retrieving it
    async fn has_secret(&self, key: &str) -> Result<bool> {
        Ok(self.get_secret(key).await?.is_some())
    }
}
