//! Offline stand-in for Drive
//!
//! Produces ids and links with the same shape as real ones without any
//! network access. Used when the manager has no credentials and, per call,
//! when Drive rejects the destination.

use uuid::Uuid;

use crate::links;
use crate::types::{DriveFile, UploadResult};

/// Synthesizes upload results and metadata
pub struct MockAdapter;

impl MockAdapter {
    /// Fresh result with a random id
    pub fn synthesize() -> UploadResult {
        Self::from_seed(Uuid::new_v4())
    }

    /// Result derived only from `seed`; the same seed gives the same result
    pub fn from_seed(seed: Uuid) -> UploadResult {
        let external_id = seed.hyphenated().to_string();
        UploadResult {
            shareable_link: links::view_url(&external_id),
            external_id,
        }
    }

    /// Plausible metadata for a mock id
    pub fn file_info(file_id: &str) -> DriveFile {
        DriveFile {
            id: file_id.to_string(),
            name: Some(format!("file_{}.pdf", file_id)),
            mime_type: Some("application/pdf".to_string()),
            web_view_link: Some(links::view_url(file_id)),
            web_content_link: Some(links::direct_download_url(file_id)),
            ..Default::default()
        }
    }
}
