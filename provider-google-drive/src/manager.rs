//! Document storage manager
//!
//! Entry point used by request handlers: `upload`, `delete`, `info` and the
//! derived link helpers. The manager is constructed once in either `Live` or
//! `Mock` mode depending on whether credentials could be acquired.
//!
//! ## Upload protocol
//!
//! 1. Persistent `Mock` mode: answer from [`MockAdapter`], no network.
//! 2. Resolve the destination's shared drive through [`TopologyCache`].
//! 3. `files.create`, scoped to the drive when one was resolved.
//! 4. If create fails with a destination or quota error, answer from
//!    [`MockAdapter`] for this call only. Other failures surface as
//!    [`UploadError`].
//! 5. On success grant public read access; a failed grant is logged and the
//!    upload still counts.
//!
//! Every substitution is logged on [`MOCK_AUDIT_TARGET`].

use bridge_traits::http::HttpClient;
use bytes::Bytes;
use core_auth::{AccessTokenSource, CredentialProvider};
use core_runtime::config::{normalize_folder_id, DocumentFolders, StorageConfig};
use core_runtime::logging::MOCK_AUDIT_TARGET;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use crate::connector::GoogleDriveConnector;
use crate::error::{FailureClass, GoogleDriveError, Result, UploadError};
use crate::links;
use crate::mock::MockAdapter;
use crate::topology::TopologyCache;
use crate::types::{DriveFile, NewFile, UploadResult};

/// Persistent operating mode, fixed at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerMode {
    Live,
    Mock,
}

/// Kind of document, mapped to one of the configured folders
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentCategory {
    Paper,
    Textbook,
    Note,
}

impl DocumentCategory {
    pub const ALL: [DocumentCategory; 3] = [
        DocumentCategory::Paper,
        DocumentCategory::Textbook,
        DocumentCategory::Note,
    ];

    /// Configured destination folder for this category
    pub fn folder(self, folders: &DocumentFolders) -> Option<&str> {
        match self {
            DocumentCategory::Paper => folders.papers.as_deref(),
            DocumentCategory::Textbook => folders.textbooks.as_deref(),
            DocumentCategory::Note => folders.notes.as_deref(),
        }
    }

    /// Folder name used by [`DocumentStorageManager::provision_category_folders`]
    pub fn folder_name(self) -> &'static str {
        match self {
            DocumentCategory::Paper => "OL-Poddo-Papers",
            DocumentCategory::Textbook => "OL-Poddo-Textbooks",
            DocumentCategory::Note => "OL-Poddo-Study Notes",
        }
    }

    pub fn folder_description(self) -> &'static str {
        match self {
            DocumentCategory::Paper => "Contains exam papers and past papers",
            DocumentCategory::Textbook => "Contains textbooks and learning materials",
            DocumentCategory::Note => "Contains study notes and chapter summaries",
        }
    }
}

/// One document to store
///
/// The size ceiling is the caller's business; any length is accepted here.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub content: Bytes,
    pub filename: String,
    pub mime_type: String,
    pub destination_folder: Option<String>,
    pub description: Option<String>,
}

impl UploadRequest {
    pub fn new(
        content: impl Into<Bytes>,
        filename: impl Into<String>,
        mime_type: impl Into<String>,
    ) -> Self {
        Self {
            content: content.into(),
            filename: filename.into(),
            mime_type: mime_type.into(),
            destination_folder: None,
            description: None,
        }
    }

    /// Blank ids leave the destination unset
    pub fn destination_folder(mut self, folder_id: impl Into<String>) -> Self {
        self.destination_folder = normalize_folder_id(folder_id.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    fn validate(&self) -> std::result::Result<(), UploadError> {
        if self.filename.trim().is_empty() {
            return Err(UploadError::InvalidRequest("filename is empty".to_string()));
        }
        if self.mime_type.trim().is_empty() {
            return Err(UploadError::InvalidRequest("MIME type is empty".to_string()));
        }
        Ok(())
    }
}

/// How uploads were served since construction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadStats {
    /// Stored in Drive
    pub live: u64,
    /// Served by persistent mock mode
    pub mocked: u64,
    /// Served by the per-call mock fallback
    pub fallback: u64,
}

#[derive(Default)]
struct UploadCounters {
    live: AtomicU64,
    mocked: AtomicU64,
    fallback: AtomicU64,
}

impl UploadCounters {
    fn snapshot(&self) -> UploadStats {
        UploadStats {
            live: self.live.load(Ordering::Relaxed),
            mocked: self.mocked.load(Ordering::Relaxed),
            fallback: self.fallback.load(Ordering::Relaxed),
        }
    }
}

struct LiveBackend {
    connector: Arc<GoogleDriveConnector>,
    topology: TopologyCache,
}

/// Stores documents in Google Drive, or pretends to when it cannot
pub struct DocumentStorageManager {
    live: Option<LiveBackend>,
    folders: DocumentFolders,
    counters: UploadCounters,
}

impl DocumentStorageManager {
    /// Acquire credentials and choose the mode
    ///
    /// Never fails: without a credential the manager runs in `Mock` mode.
    pub async fn connect(
        config: &StorageConfig,
        http_client: Arc<dyn HttpClient>,
        credentials: Arc<CredentialProvider>,
    ) -> Self {
        match credentials.acquire().await {
            Some(_) => {
                info!(
                    strategy = credentials.strategy().as_str(),
                    "Google Drive storage is live"
                );
                Self::live(config, http_client, credentials)
            }
            None => {
                warn!(
                    target: MOCK_AUDIT_TARGET,
                    strategy = credentials.strategy().as_str(),
                    "No Google Drive credentials; document storage runs in mock mode"
                );
                Self::mock(config)
            }
        }
    }

    /// Live manager over an already-working token source
    pub fn live(
        config: &StorageConfig,
        http_client: Arc<dyn HttpClient>,
        token_source: Arc<dyn AccessTokenSource>,
    ) -> Self {
        let connector = Arc::new(
            GoogleDriveConnector::new(http_client, token_source)
                .with_supports_all_drives(config.supports_all_drives),
        );
        let topology = TopologyCache::new(connector.clone());

        Self {
            live: Some(LiveBackend {
                connector,
                topology,
            }),
            folders: config.folders.clone(),
            counters: UploadCounters::default(),
        }
    }

    /// Manager that never touches the network
    pub fn mock(config: &StorageConfig) -> Self {
        Self {
            live: None,
            folders: config.folders.clone(),
            counters: UploadCounters::default(),
        }
    }

    pub fn mode(&self) -> ManagerMode {
        if self.live.is_some() {
            ManagerMode::Live
        } else {
            ManagerMode::Mock
        }
    }

    pub fn folders(&self) -> &DocumentFolders {
        &self.folders
    }

    pub fn stats(&self) -> UploadStats {
        self.counters.snapshot()
    }

    /// Store one document
    #[instrument(
        skip(self, request),
        fields(
            filename = %request.filename,
            size = request.content.len(),
            folder = ?request.destination_folder
        )
    )]
    pub async fn upload(
        &self,
        request: UploadRequest,
    ) -> std::result::Result<UploadResult, UploadError> {
        request.validate()?;

        let Some(backend) = &self.live else {
            let result = MockAdapter::synthesize();
            self.counters.mocked.fetch_add(1, Ordering::Relaxed);
            info!(
                target: MOCK_AUDIT_TARGET,
                file_id = %result.external_id,
                filename = %request.filename,
                "Upload served by mock storage"
            );
            return Ok(result);
        };

        let folder = request
            .destination_folder
            .as_deref()
            .map(str::trim)
            .filter(|f| !f.is_empty());
        let drive_id = match folder {
            Some(folder) => backend.topology.resolve_shared_drive(folder).await,
            None => None,
        };

        let metadata = NewFile::new(request.filename.as_str())
            .parent(folder)
            .description(request.description.as_deref());

        let created = backend
            .connector
            .create(
                &metadata,
                &request.mime_type,
                request.content.clone(),
                drive_id.as_deref(),
            )
            .await;

        let file = match created {
            Ok(file) => file,
            Err(e) => return self.recover_create_failure(e, &request),
        };
        self.counters.live.fetch_add(1, Ordering::Relaxed);

        if let Err(e) = backend
            .connector
            .grant_public_read(&file.id, drive_id.as_deref())
            .await
        {
            warn!(file_id = %file.id, error = %e, "Could not share uploaded file; it stays private");
        }

        let result = UploadResult {
            shareable_link: links::shareable_link(&file),
            external_id: file.id,
        };
        info!(file_id = %result.external_id, drive_id = ?drive_id, "Uploaded document to Google Drive");
        Ok(result)
    }

    /// Store a document in the folder configured for `category`
    ///
    /// An explicit destination on `request` wins. With neither, the file
    /// lands in the account's root.
    pub async fn upload_document(
        &self,
        category: DocumentCategory,
        mut request: UploadRequest,
    ) -> std::result::Result<UploadResult, UploadError> {
        if request.destination_folder.is_none() {
            request.destination_folder = category.folder(&self.folders).map(str::to_string);
        }
        self.upload(request).await
    }

    /// Delete a stored document; `false` when Drive has no such file
    #[instrument(skip(self))]
    pub async fn delete(&self, external_id: &str) -> Result<bool> {
        match &self.live {
            Some(backend) => backend.connector.delete(external_id).await,
            None => {
                info!(target: MOCK_AUDIT_TARGET, file_id = external_id, "Delete served by mock storage");
                Ok(true)
            }
        }
    }

    /// Metadata of a stored document
    #[instrument(skip(self))]
    pub async fn info(&self, external_id: &str) -> Result<DriveFile> {
        match &self.live {
            Some(backend) => backend.connector.get(external_id).await,
            None => Ok(MockAdapter::file_info(external_id)),
        }
    }

    /// Stream a stored document's content
    #[instrument(skip(self))]
    pub async fn download(
        &self,
        external_id: &str,
    ) -> Result<Box<dyn tokio::io::AsyncRead + Send + Unpin>> {
        match &self.live {
            Some(backend) => backend.connector.media_get(external_id).await,
            None => Err(GoogleDriveError::NotAvailable(
                "downloads need live storage".to_string(),
            )),
        }
    }

    /// Documents in `folder_id`, optionally narrowed by a Drive query clause
    #[instrument(skip(self))]
    pub async fn list_folder(
        &self,
        folder_id: &str,
        filter: Option<&str>,
    ) -> Result<Vec<DriveFile>> {
        match &self.live {
            Some(backend) => {
                let drive_id = backend.topology.resolve_shared_drive(folder_id).await;
                backend
                    .connector
                    .list_children(folder_id, filter, drive_id.as_deref())
                    .await
            }
            None => Ok(Vec::new()),
        }
    }

    /// Create a folder and return its id
    #[instrument(skip(self, description))]
    pub async fn create_folder(
        &self,
        name: &str,
        parent: Option<&str>,
        description: Option<&str>,
    ) -> Result<String> {
        let backend = self.require_live("folder creation")?;
        let folder = backend
            .connector
            .create_folder(name, parent, description)
            .await?;
        Ok(folder.id)
    }

    /// Create one folder per [`DocumentCategory`] and return their ids
    ///
    /// The result is meant to be copied into configuration.
    pub async fn provision_category_folders(&self, parent: Option<&str>) -> Result<DocumentFolders> {
        self.require_live("folder provisioning")?;

        let mut folders = DocumentFolders::default();
        for category in DocumentCategory::ALL {
            let id = self
                .create_folder(
                    category.folder_name(),
                    parent,
                    Some(category.folder_description()),
                )
                .await?;
            info!(
                category = category.folder_name(),
                folder_id = %id,
                link = %links::folder_url(&id),
                "Provisioned category folder"
            );
            match category {
                DocumentCategory::Paper => folders.papers = Some(id),
                DocumentCategory::Textbook => folders.textbooks = Some(id),
                DocumentCategory::Note => folders.notes = Some(id),
            }
        }
        Ok(folders)
    }

    /// Shared drive owning `folder_id`; always `None` in mock mode
    pub async fn resolve_shared_drive(&self, folder_id: &str) -> Option<String> {
        match &self.live {
            Some(backend) => backend.topology.resolve_shared_drive(folder_id).await,
            None => None,
        }
    }

    pub fn direct_download_url(external_id: &str) -> String {
        links::direct_download_url(external_id)
    }

    pub fn preview_url(external_id: &str) -> String {
        links::preview_url(external_id)
    }

    pub fn thumbnail_url(external_id: &str, size: &str) -> String {
        links::thumbnail_url(external_id, size)
    }

    fn require_live(&self, operation: &str) -> Result<&LiveBackend> {
        self.live
            .as_ref()
            .ok_or_else(|| GoogleDriveError::NotAvailable(format!("{} needs live storage", operation)))
    }

    fn recover_create_failure(
        &self,
        e: GoogleDriveError,
        request: &UploadRequest,
    ) -> std::result::Result<UploadResult, UploadError> {
        match e.classify() {
            class @ (FailureClass::DestinationInvalid | FailureClass::QuotaExceeded) => {
                let result = MockAdapter::synthesize();
                self.counters.fallback.fetch_add(1, Ordering::Relaxed);
                warn!(
                    target: MOCK_AUDIT_TARGET,
                    file_id = %result.external_id,
                    filename = %request.filename,
                    folder = ?request.destination_folder,
                    class = ?class,
                    error = %e,
                    "Drive rejected upload; served by mock storage for this call"
                );
                Ok(result)
            }
            FailureClass::Transient => {
                error!(filename = %request.filename, error = %e, "Upload to Google Drive failed");
                Err(UploadError::Provider(e))
            }
        }
    }
}
