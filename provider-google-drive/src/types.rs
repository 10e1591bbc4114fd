//! Google Drive API types
//!
//! Request and response shapes for the Drive v3 endpoints used by the
//! connector.

use serde::{Deserialize, Serialize};

/// MIME type Drive uses for folders
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// Google Drive API file resource
///
/// Only `id` is guaranteed; everything else depends on the `fields` mask of
/// the request that produced it.
///
/// See: https://developers.google.com/drive/api/v3/reference/files#resource
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    /// File ID
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,

    /// File size in bytes, as a decimal string (omitted for folders)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,

    /// Creation time (RFC 3339)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<String>,

    /// Modification time (RFC 3339)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_time: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Parent folder IDs
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<String>,

    /// Browser link to the file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_view_link: Option<String>,

    /// Direct content link (binary files only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_content_link: Option<String>,

    /// Shared drive owning the file, absent for My Drive content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drive_id: Option<String>,

    #[serde(default)]
    pub trashed: bool,
}

impl DriveFile {
    pub fn is_folder(&self) -> bool {
        self.mime_type.as_deref() == Some(FOLDER_MIME_TYPE)
    }

    /// Size in bytes, when reported
    pub fn size_bytes(&self) -> Option<u64> {
        self.size.as_deref().and_then(|s| s.parse().ok())
    }
}

/// Metadata sent with `files.create`
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFile {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl NewFile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    pub fn parent(mut self, parent: Option<&str>) -> Self {
        if let Some(parent) = parent {
            self.parents.push(parent.to_string());
        }
        self
    }

    pub fn description(mut self, description: Option<&str>) -> Self {
        self.description = description.map(str::to_string);
        self
    }
}

/// Outcome of a stored upload
///
/// `external_id` is opaque and stable; callers persist it and derive every
/// later operation from it, whether it came from Drive or the mock path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResult {
    pub external_id: String,
    pub shareable_link: String,
}

/// Google Drive API files.list response
///
/// See: https://developers.google.com/drive/api/v3/reference/files/list
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilesListResponse {
    #[serde(default)]
    pub files: Vec<DriveFile>,

    /// Token for next page
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Google Drive API permission resource (only the fields we send)
#[derive(Debug, Clone, Serialize)]
pub struct Permission {
    #[serde(rename = "type")]
    pub grantee_type: &'static str,
    pub role: &'static str,
}

impl Permission {
    /// Anyone with the link may read
    pub fn public_reader() -> Self {
        Self {
            grantee_type: "anyone",
            role: "reader",
        }
    }
}

/// Standard Google API error envelope
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub code: u16,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub errors: Vec<ApiErrorItem>,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorItem {
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_drive_file() {
        let json = r#"{
            "id": "1a2b3c",
            "name": "thesis.pdf",
            "mimeType": "application/pdf",
            "size": "2097152",
            "createdTime": "2024-03-01T10:00:00.000Z",
            "modifiedTime": "2024-03-02T11:30:00.000Z",
            "webViewLink": "https://drive.google.com/file/d/1a2b3c/view?usp=drivesdk"
        }"#;

        let file: DriveFile = serde_json::from_str(json).unwrap();
        assert_eq!(file.id, "1a2b3c");
        assert_eq!(file.name.as_deref(), Some("thesis.pdf"));
        assert_eq!(file.size_bytes(), Some(2_097_152));
        assert!(!file.is_folder());
        assert!(file.web_content_link.is_none());
        assert!(file.parents.is_empty());
    }

    #[test]
    fn test_deserialize_id_only() {
        let file: DriveFile = serde_json::from_str(r#"{"id": "x"}"#).unwrap();
        assert_eq!(file.id, "x");
        assert!(file.drive_id.is_none());
        assert!(!file.trashed);
    }

    #[test]
    fn test_new_file_serialization() {
        let metadata = NewFile::new("notes.pdf")
            .parent(Some("F1"))
            .description(Some("Week 3"));
        let value = serde_json::to_value(&metadata).unwrap();

        assert_eq!(
            value,
            serde_json::json!({"name": "notes.pdf", "parents": ["F1"], "description": "Week 3"})
        );

        let bare = serde_json::to_value(NewFile::new("a").parent(None)).unwrap();
        assert_eq!(bare, serde_json::json!({"name": "a"}));
    }

    #[test]
    fn test_permission_shape() {
        assert_eq!(
            serde_json::to_value(Permission::public_reader()).unwrap(),
            serde_json::json!({"type": "anyone", "role": "reader"})
        );
    }

    #[test]
    fn test_deserialize_list_response() {
        let json = r#"{
            "nextPageToken": "tok",
            "files": [
                {"id": "a", "name": "A", "mimeType": "application/vnd.google-apps.folder"},
                {"id": "b", "name": "B", "mimeType": "application/pdf"}
            ]
        }"#;

        let response: FilesListResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.files.len(), 2);
        assert!(response.files[0].is_folder());
        assert_eq!(response.next_page_token.as_deref(), Some("tok"));
    }
}
