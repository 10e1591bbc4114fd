//! Delegated Token Cache
//!
//! Persists the delegated credential between process runs through the
//! [`SecureStore`] bridge. Only the delegated strategy uses this; service
//! tokens are re-signed on demand and never written anywhere.
//!
//! ## Example
//!
//! ```no_run
//! use core_auth::{OAuthTokens, TokenStore};
//! use std::sync::Arc;
//! # use bridge_traits::storage::SecureStore;
//! # async fn example(secure_store: Arc<dyn SecureStore>) -> core_auth::Result<()> {
//! let token_store = TokenStore::new(secure_store);
//!
//! let tokens = OAuthTokens::new(
//!     "access_token_value".to_string(),
//!     Some("refresh_token_value".to_string()),
//!     3600,
//! );
//!
//! token_store.store_tokens(&tokens).await?;
//! let cached = token_store.retrieve_tokens().await?;
//! # Ok(())
//! # }
//! ```

use crate::error::{AuthError, Result};
use crate::types::OAuthTokens;
use bridge_traits::storage::SecureStore;
use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Key under which the delegated credential is cached
pub const DELEGATED_TOKEN_KEY: &str = "google_drive.delegated_token";

/// Cache for the delegated OAuth tokens
///
/// Token values are never logged; failures are reported without the payload.
#[derive(Clone)]
pub struct TokenStore {
    secure_store: Arc<dyn SecureStore>,
    key: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredTokens {
    access_token: String,
    refresh_token: Option<String>,
    expires_at: i64,
}

impl TokenStore {
    pub fn new(secure_store: Arc<dyn SecureStore>) -> Self {
        Self::with_key(secure_store, DELEGATED_TOKEN_KEY)
    }

    /// Use a custom cache key, e.g. when several deployments share a store
    pub fn with_key(secure_store: Arc<dyn SecureStore>, key: impl Into<String>) -> Self {
        Self {
            secure_store,
            key: key.into(),
        }
    }

    /// Store tokens, replacing any previous entry
    pub async fn store_tokens(&self, tokens: &OAuthTokens) -> Result<()> {
        let stored = StoredTokens {
            access_token: tokens.access_token().to_string(),
            refresh_token: tokens.refresh_token().map(|s| s.to_string()),
            expires_at: tokens.expires_at().timestamp(),
        };

        let json = serde_json::to_vec(&stored).map_err(|e| AuthError::SerializationFailed {
            context: "token serialization".to_string(),
            message: e.to_string(),
        })?;

        self.secure_store
            .set_secret(&self.key, &json)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to persist delegated tokens");
                AuthError::SecureStorageUnavailable(e.to_string())
            })?;

        info!(
            has_refresh_token = stored.refresh_token.is_some(),
            "Delegated tokens cached"
        );

        Ok(())
    }

    /// Retrieve cached tokens
    ///
    /// Returns `Ok(None)` when nothing is cached. A corrupted entry is deleted
    /// and reported as an error.
    pub async fn retrieve_tokens(&self) -> Result<Option<OAuthTokens>> {
        let data = self.secure_store.get_secret(&self.key).await.map_err(|e| {
            warn!(error = %e, "Failed to read delegated token cache");
            AuthError::SecureStorageUnavailable(e.to_string())
        })?;

        let Some(data) = data else {
            debug!("No cached delegated tokens");
            return Ok(None);
        };

        let stored: StoredTokens = match serde_json::from_slice(&data) {
            Ok(tokens) => tokens,
            Err(e) => {
                warn!(error = %e, "Cached delegated tokens are corrupted, discarding");

                if let Err(delete_err) = self.secure_store.delete_secret(&self.key).await {
                    warn!(error = %delete_err, "Failed to delete corrupted token cache");
                }

                return Err(AuthError::SerializationFailed {
                    context: "token cache".to_string(),
                    message: e.to_string(),
                });
            }
        };

        let expires_at = Utc
            .timestamp_opt(stored.expires_at, 0)
            .single()
            .ok_or_else(|| AuthError::SerializationFailed {
                context: "token cache".to_string(),
                message: format!("invalid expiry timestamp {}", stored.expires_at),
            })?;

        debug!(
            has_refresh_token = stored.refresh_token.is_some(),
            expires_at = stored.expires_at,
            "Loaded cached delegated tokens"
        );

        Ok(Some(OAuthTokens::from_parts(
            stored.access_token,
            stored.refresh_token,
            expires_at,
        )))
    }

    /// Remove cached tokens. Succeeds when nothing is cached.
    pub async fn delete_tokens(&self) -> Result<()> {
        self.secure_store
            .delete_secret(&self.key)
            .await
            .map_err(|e| AuthError::SecureStorageUnavailable(e.to_string()))?;

        info!("Delegated token cache cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryStore {
        data: Mutex<HashMap<String, Vec<u8>>>,
        fail: bool,
    }

    #[async_trait]
    impl SecureStore for MemoryStore {
        async fn set_secret(&self, key: &str, value: &[u8]) -> BridgeResult<()> {
            if self.fail {
                return Err(BridgeError::NotAvailable("store offline".to_string()));
            }
            self.data.lock().unwrap().insert(key.to_string(), value.to_vec());
            Ok(())
        }

        async fn get_secret(&self, key: &str) -> BridgeResult<Option<Vec<u8>>> {
            if self.fail {
                return Err(BridgeError::NotAvailable("store offline".to_string()));
            }
            Ok(self.data.lock().unwrap().get(key).cloned())
        }

        async fn delete_secret(&self, key: &str) -> BridgeResult<()> {
            self.data.lock().unwrap().remove(key);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_store_and_retrieve() {
        let store = TokenStore::new(Arc::new(MemoryStore::default()));
        let tokens = OAuthTokens::new("at".to_string(), Some("rt".to_string()), 3600);

        store.store_tokens(&tokens).await.unwrap();
        let cached = store.retrieve_tokens().await.unwrap().unwrap();

        assert_eq!(cached.access_token(), "at");
        assert_eq!(cached.refresh_token(), Some("rt"));
        assert_eq!(cached.expires_at().timestamp(), tokens.expires_at().timestamp());
    }

    #[tokio::test]
    async fn test_retrieve_empty() {
        let store = TokenStore::new(Arc::new(MemoryStore::default()));
        assert!(store.retrieve_tokens().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_corrupted_entry_is_deleted() {
        let backing = Arc::new(MemoryStore::default());
        backing
            .set_secret(DELEGATED_TOKEN_KEY, b"not json")
            .await
            .unwrap();

        let store = TokenStore::new(backing.clone());
        assert!(matches!(
            store.retrieve_tokens().await,
            Err(AuthError::SerializationFailed { .. })
        ));
        assert!(!backing.has_secret(DELEGATED_TOKEN_KEY).await.unwrap());
    }

    #[tokio::test]
    async fn test_storage_failure_surfaces() {
        let backing = Arc::new(MemoryStore {
            fail: true,
            ..Default::default()
        });
        let store = TokenStore::new(backing);
        let tokens = OAuthTokens::new("at".to_string(), None, 60);

        assert!(matches!(
            store.store_tokens(&tokens).await,
            Err(AuthError::SecureStorageUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_custom_key_and_delete() {
        let backing = Arc::new(MemoryStore::default());
        let store = TokenStore::with_key(backing.clone(), "custom");
        let tokens = OAuthTokens::new("at".to_string(), None, 60);

        store.store_tokens(&tokens).await.unwrap();
        assert!(backing.has_secret("custom").await.unwrap());

        store.delete_tokens().await.unwrap();
        assert!(store.retrieve_tokens().await.unwrap().is_none());
    }
}
