//! Shared-drive topology cache
//!
//! Remembers which shared drive (if any) owns a destination folder so the
//! metadata lookup happens once per folder for the life of the process.
//! Folders are not expected to move between drives, so entries never expire.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::{FailureClass, GoogleDriveError, Result};

/// Source of the folder → shared drive fact
#[async_trait]
pub trait SharedDriveLookup: Send + Sync {
    async fn shared_drive_of(&self, folder_id: &str) -> Result<Option<String>>;
}

/// Process-lifetime `folder → Option<drive id>` map
pub struct TopologyCache {
    lookup: Arc<dyn SharedDriveLookup>,
    entries: RwLock<HashMap<String, Option<String>>>,
}

impl TopologyCache {
    pub fn new(lookup: Arc<dyn SharedDriveLookup>) -> Self {
        Self {
            lookup,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Shared drive owning `folder_id`, or `None`
    ///
    /// Never fails. A folder that cannot be found or read resolves to `None`
    /// and that answer is cached; a transport or server failure also yields
    /// `None` but is looked up again next time.
    pub async fn resolve_shared_drive(&self, folder_id: &str) -> Option<String> {
        if let Some(cached) = self.entries.read().await.get(folder_id) {
            debug!(folder_id, drive_id = ?cached, "Topology cache hit");
            return cached.clone();
        }

        match self.lookup.shared_drive_of(folder_id).await {
            Ok(drive_id) => {
                info!(folder_id, drive_id = ?drive_id, "Resolved folder topology");
                self.remember(folder_id, drive_id).await
            }
            Err(e) if is_settled(&e) => {
                warn!(folder_id, error = %e, "Folder topology unavailable; treating as My Drive");
                self.remember(folder_id, None).await
            }
            Err(e) => {
                warn!(folder_id, error = %e, "Folder topology lookup failed; not caching");
                None
            }
        }
    }

    /// Cached answer for `folder_id` without touching the network
    pub async fn cached(&self, folder_id: &str) -> Option<Option<String>> {
        self.entries.read().await.get(folder_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    // Concurrent resolutions of one folder agree, so the first insert wins.
    async fn remember(&self, folder_id: &str, drive_id: Option<String>) -> Option<String> {
        self.entries
            .write()
            .await
            .entry(folder_id.to_string())
            .or_insert(drive_id)
            .clone()
    }
}

fn is_settled(error: &GoogleDriveError) -> bool {
    matches!(error, GoogleDriveError::ParseError(_))
        || error.classify() == FailureClass::DestinationInvalid
}
