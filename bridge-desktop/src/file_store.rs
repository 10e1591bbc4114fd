//! File-backed credential cache
//!
//! Stores secrets in a single JSON document (`{"key": "<base64>"}`) at a
//! configured path, typically the delegated token cache `token.json`. Writes
//! go to a sibling temporary file that is renamed into place, and on Unix the
//! file is restricted to the owning user.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bridge_traits::{
    error::{BridgeError, Result},
    storage::SecureStore,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, warn};

type Entries = BTreeMap<String, String>;

/// [`SecureStore`] over one JSON file
pub struct FileSecureStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within the process
    lock: Mutex<()>,
}

impl FileSecureStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_entries(&self) -> Result<Entries> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(Entries::new()),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                warn!(error = %e, "Credential cache file is not valid JSON");
                BridgeError::OperationFailed(format!("Corrupted credential cache: {}", e))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Entries::new()),
            Err(e) => Err(BridgeError::Io(e)),
        }
    }

    async fn write_entries(&self, entries: &Entries) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_vec_pretty(entries).map_err(|e| {
            BridgeError::OperationFailed(format!("Failed to encode credential cache: {}", e))
        })?;

        let tmp_path = self.path.with_extension("tmp");
        tokio::fs::write(&tmp_path, &json).await?;
        restrict_permissions(&tmp_path).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;

        Ok(())
    }
}

#[async_trait]
impl SecureStore for FileSecureStore {
    async fn set_secret(&self, key: &str, value: &[u8]) -> Result<()> {
        let _guard = self.lock.lock().await;

        // A corrupted cache is replaced rather than blocking new credentials
        let mut entries = self.read_entries().await.unwrap_or_default();
        entries.insert(key.to_string(), STANDARD.encode(value));
        self.write_entries(&entries).await?;

        debug!(key = key, "Stored secret in credential cache file");
        Ok(())
    }

    async fn get_secret(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let _guard = self.lock.lock().await;

        let entries = self.read_entries().await?;
        match entries.get(key) {
            Some(encoded) => STANDARD.decode(encoded).map(Some).map_err(|e| {
                BridgeError::OperationFailed(format!("Failed to decode secret: {}", e))
            }),
            None => Ok(None),
        }
    }

    async fn delete_secret(&self, key: &str) -> Result<()> {
        let _guard = self.lock.lock().await;

        let mut entries = self.read_entries().await.unwrap_or_default();
        if entries.remove(key).is_some() {
            self.write_entries(&entries).await?;
        }

        debug!(key = key, "Deleted secret from credential cache file");
        Ok(())
    }
}

#[cfg(unix)]
async fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await?;
    Ok(())
}

#[cfg(not(unix))]
async fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}
