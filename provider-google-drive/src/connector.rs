//! Google Drive API connector implementation
//!
//! Thin typed wrapper over the Drive v3 endpoints the document store needs:
//! create, get, delete, list, permission grant, media download and the
//! shared-drive lookup behind [`crate::topology::TopologyCache`].
//!
//! Every request is sent once. `files.create` is not idempotent, so retrying
//! is left to callers that can deduplicate.

use async_trait::async_trait;
use bridge_traits::error::BridgeError;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use bytes::{Bytes, BytesMut};
use core_auth::AccessTokenSource;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::error::{GoogleDriveError, Result};
use crate::topology::SharedDriveLookup;
use crate::types::{DriveFile, FilesListResponse, NewFile, Permission, FOLDER_MIME_TYPE};

/// Google Drive API base URL
const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";

/// Upload endpoint for media + metadata
const DRIVE_UPLOAD_BASE: &str = "https://www.googleapis.com/upload/drive/v3";

/// Results per listing page
const PAGE_SIZE: u32 = 100;

/// Fields returned by `files.create`
const CREATE_FIELDS: &str = "id,webViewLink,webContentLink";

/// Fields to request for file resources
const FILE_FIELDS: &str =
    "id,name,size,mimeType,webViewLink,webContentLink,createdTime,modifiedTime";

/// Fields to request for listed children
const LIST_FIELDS: &str = "id,name,mimeType,size,createdTime,modifiedTime";

/// Google Drive API connector
///
/// Every request carries `supportsAllDrives=true` when the capability flag
/// is set (the default); without it Drive reports shared-drive content as
/// not found. `create` and `list_children` are additionally scoped to the
/// shared drive when one is known for the destination.
///
/// # Example
///
/// ```ignore
/// let connector = GoogleDriveConnector::new(http_client, token_source);
/// let file = connector
///     .create(&NewFile::new("notes.pdf").parent(Some("F1")), "application/pdf", bytes, None)
///     .await?;
/// ```
pub struct GoogleDriveConnector {
    http_client: Arc<dyn HttpClient>,
    token_source: Arc<dyn AccessTokenSource>,
    supports_all_drives: bool,
}

impl GoogleDriveConnector {
    pub fn new(http_client: Arc<dyn HttpClient>, token_source: Arc<dyn AccessTokenSource>) -> Self {
        Self {
            http_client,
            token_source,
            supports_all_drives: true,
        }
    }

    /// Override the cross shared-drive capability flag
    pub fn with_supports_all_drives(mut self, enabled: bool) -> Self {
        self.supports_all_drives = enabled;
        self
    }

    /// Upload content and metadata in one multipart request
    #[instrument(skip(self, metadata, content), fields(name = %metadata.name, size = content.len(), drive_id = ?drive_id))]
    pub async fn create(
        &self,
        metadata: &NewFile,
        mime_type: &str,
        content: Bytes,
        drive_id: Option<&str>,
    ) -> Result<DriveFile> {
        let mut params = vec![
            ("uploadType", "multipart".to_string()),
            ("fields", CREATE_FIELDS.to_string()),
        ];
        self.push_capability(&mut params);
        if let Some(drive_id) = drive_id {
            params.push(("corpora", "drive".to_string()));
            params.push(("driveId", drive_id.to_string()));
        }

        let boundary = format!("docstore-{}", Uuid::new_v4().simple());
        let body = multipart_related(&boundary, metadata, mime_type, &content)?;

        let url = format!("{}/files?{}", DRIVE_UPLOAD_BASE, encode_query(&params));
        let request = HttpRequest::new(HttpMethod::Post, url)
            .header(
                "Content-Type",
                format!("multipart/related; boundary={}", boundary),
            )
            .body(body);

        let response = self.send(request).await?;
        let file: DriveFile = parse_json(&response, "created file")?;

        info!(file_id = %file.id, "Created file in Google Drive");
        Ok(file)
    }

    /// Create a folder, optionally under `parent`
    #[instrument(skip(self, description))]
    pub async fn create_folder(
        &self,
        name: &str,
        parent: Option<&str>,
        description: Option<&str>,
    ) -> Result<DriveFile> {
        let metadata = NewFile::new(name)
            .mime_type(FOLDER_MIME_TYPE)
            .parent(parent)
            .description(description);

        let mut params = vec![("fields", "id,name,webViewLink".to_string())];
        self.push_capability(&mut params);

        let url = format!("{}/files?{}", DRIVE_API_BASE, encode_query(&params));
        let request = HttpRequest::new(HttpMethod::Post, url).json(&metadata)?;

        let response = self.send(request).await?;
        let folder: DriveFile = parse_json(&response, "created folder")?;

        info!(folder_id = %folder.id, "Created folder in Google Drive");
        Ok(folder)
    }

    /// Fetch file metadata
    #[instrument(skip(self), fields(file_id = %file_id))]
    pub async fn get(&self, file_id: &str) -> Result<DriveFile> {
        debug!("Getting metadata for file");

        let mut params = vec![("fields", FILE_FIELDS.to_string())];
        self.push_capability(&mut params);

        let url = format!(
            "{}/files/{}?{}",
            DRIVE_API_BASE,
            urlencoding::encode(file_id),
            encode_query(&params)
        );

        match self.send(HttpRequest::new(HttpMethod::Get, url)).await {
            Ok(response) => parse_json(&response, "file metadata"),
            Err(e) if e.status_code() == Some(404) => Err(GoogleDriveError::FileNotFound {
                file_id: file_id.to_string(),
            }),
            Err(e) => Err(e),
        }
    }

    /// Delete a file; `false` when it does not exist
    #[instrument(skip(self), fields(file_id = %file_id))]
    pub async fn delete(&self, file_id: &str) -> Result<bool> {
        let mut params = Vec::new();
        self.push_capability(&mut params);

        let url = format!(
            "{}/files/{}?{}",
            DRIVE_API_BASE,
            urlencoding::encode(file_id),
            encode_query(&params)
        );

        match self.send(HttpRequest::new(HttpMethod::Delete, url)).await {
            Ok(_) => {
                info!("Deleted file from Google Drive");
                Ok(true)
            }
            Err(e) if e.status_code() == Some(404) => {
                warn!("File to delete was not found");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// List non-trashed children of `folder_id`, following every page
    ///
    /// `filter` is appended to the query with `and`, e.g.
    /// `mimeType='application/pdf'`.
    #[instrument(skip(self), fields(folder_id = %folder_id))]
    pub async fn list_children(
        &self,
        folder_id: &str,
        filter: Option<&str>,
        drive_id: Option<&str>,
    ) -> Result<Vec<DriveFile>> {
        let mut query = format!(
            "'{}' in parents and trashed=false",
            folder_id.replace('\'', "\\'")
        );
        if let Some(filter) = filter.filter(|f| !f.trim().is_empty()) {
            query.push_str(" and ");
            query.push_str(filter);
        }

        let mut files = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut params = vec![
                ("q", query.clone()),
                ("spaces", "drive".to_string()),
                ("pageSize", PAGE_SIZE.to_string()),
                ("fields", format!("nextPageToken,files({})", LIST_FIELDS)),
            ];
            self.push_capability(&mut params);
            if let Some(drive_id) = drive_id {
                params.push(("corpora", "drive".to_string()));
                params.push(("driveId", drive_id.to_string()));
                params.push(("includeItemsFromAllDrives", "true".to_string()));
            }
            if let Some(token) = &page_token {
                params.push(("pageToken", token.clone()));
            }

            let url = format!("{}/files?{}", DRIVE_API_BASE, encode_query(&params));
            let response = self.send(HttpRequest::new(HttpMethod::Get, url)).await?;
            let page: FilesListResponse = parse_json(&response, "files list")?;

            files.extend(page.files);
            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        info!(count = files.len(), "Listed folder contents");
        Ok(files)
    }

    /// Make a file readable by anyone with the link
    ///
    /// `drive_id` only annotates logs; `supportsAllDrives` is what lets the
    /// call reach shared-drive files.
    #[instrument(skip(self), fields(file_id = %file_id, drive_id = ?drive_id))]
    pub async fn grant_public_read(&self, file_id: &str, drive_id: Option<&str>) -> Result<()> {
        let mut params = vec![("fields", "id".to_string())];
        self.push_capability(&mut params);

        let url = format!(
            "{}/files/{}/permissions?{}",
            DRIVE_API_BASE,
            urlencoding::encode(file_id),
            encode_query(&params)
        );
        let request =
            HttpRequest::new(HttpMethod::Post, url).json(&Permission::public_reader())?;

        self.send(request).await?;
        debug!("Granted public read access");
        Ok(())
    }

    /// Stream file content
    #[instrument(skip(self), fields(file_id = %file_id))]
    pub async fn media_get(
        &self,
        file_id: &str,
    ) -> Result<Box<dyn tokio::io::AsyncRead + Send + Unpin>> {
        let mut params = vec![("alt", "media".to_string())];
        self.push_capability(&mut params);

        let url = format!(
            "{}/files/{}?{}",
            DRIVE_API_BASE,
            urlencoding::encode(file_id),
            encode_query(&params)
        );
        let request = self.authorize(HttpRequest::new(HttpMethod::Get, url)).await?;

        let reader = match self.http_client.download_stream(request).await {
            Ok(reader) => reader,
            Err(BridgeError::HttpStatus { status: 404, .. }) => {
                return Err(GoogleDriveError::FileNotFound {
                    file_id: file_id.to_string(),
                })
            }
            Err(BridgeError::HttpStatus { status, body }) => {
                return Err(GoogleDriveError::from_response(status, body.as_bytes()))
            }
            Err(e) => return Err(e.into()),
        };
        info!("Opened download stream");
        Ok(reader)
    }

    /// Shared drive owning `folder_id`, `None` for My Drive folders
    #[instrument(skip(self), fields(folder_id = %folder_id))]
    pub async fn shared_drive_of(&self, folder_id: &str) -> Result<Option<String>> {
        let mut params = vec![("fields", "driveId".to_string())];
        self.push_capability(&mut params);

        let url = format!(
            "{}/files/{}?{}",
            DRIVE_API_BASE,
            urlencoding::encode(folder_id),
            encode_query(&params)
        );

        let response = self.send(HttpRequest::new(HttpMethod::Get, url)).await?;
        let file: DriveFile = parse_json(&response, "folder topology")?;
        Ok(file.drive_id.filter(|id| !id.is_empty()))
    }

    fn push_capability(&self, params: &mut Vec<(&'static str, String)>) {
        if self.supports_all_drives {
            params.push(("supportsAllDrives", "true".to_string()));
        }
    }

    async fn authorize(&self, request: HttpRequest) -> Result<HttpRequest> {
        let token = self.token_source.access_token().await?;
        Ok(request.bearer_token(token))
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let request = self
            .authorize(request.header("Accept", "application/json"))
            .await?;
        let response = self.http_client.execute(request).await?;

        if response.is_success() {
            debug!(status = response.status, "API request succeeded");
            Ok(response)
        } else {
            let error = GoogleDriveError::from_response(response.status, &response.body);
            warn!(status = response.status, error = %error, "API request failed");
            Err(error)
        }
    }
}

#[async_trait]
impl SharedDriveLookup for GoogleDriveConnector {
    async fn shared_drive_of(&self, folder_id: &str) -> Result<Option<String>> {
        GoogleDriveConnector::shared_drive_of(self, folder_id).await
    }
}

fn encode_query(params: &[(&str, String)]) -> String {
    params
        .iter()
        .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

fn parse_json<T: serde::de::DeserializeOwned>(response: &HttpResponse, what: &str) -> Result<T> {
    serde_json::from_slice(&response.body)
        .map_err(|e| GoogleDriveError::ParseError(format!("Failed to parse {}: {}", what, e)))
}

fn multipart_related(
    boundary: &str,
    metadata: &NewFile,
    mime_type: &str,
    content: &[u8],
) -> Result<Bytes> {
    let metadata_json = serde_json::to_vec(metadata)
        .map_err(|e| GoogleDriveError::ParseError(format!("Failed to encode metadata: {}", e)))?;

    let mut body = BytesMut::with_capacity(content.len() + metadata_json.len() + 256);
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
    body.extend_from_slice(&metadata_json);
    body.extend_from_slice(format!("\r\n--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", mime_type).as_bytes());
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

    Ok(body.freeze())
}
