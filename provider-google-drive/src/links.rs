//! URL helpers derived from a file id
//!
//! Pure string construction: no I/O and no lookup, so ids produced by the
//! mock path yield links of the same shape as real ones.

use crate::types::DriveFile;

const DRIVE_WEB_BASE: &str = "https://drive.google.com";

/// Browser view link, `https://drive.google.com/file/d/<id>/view`
pub fn view_url(file_id: &str) -> String {
    format!("{}/file/d/{}/view", DRIVE_WEB_BASE, file_id)
}

/// Browser link to a folder
pub fn folder_url(folder_id: &str) -> String {
    format!("{}/drive/folders/{}", DRIVE_WEB_BASE, folder_id)
}

/// Direct download link
pub fn direct_download_url(file_id: &str) -> String {
    format!("{}/uc?export=download&id={}", DRIVE_WEB_BASE, file_id)
}

/// Embeddable preview link
pub fn preview_url(file_id: &str) -> String {
    format!("{}/file/d/{}/preview", DRIVE_WEB_BASE, file_id)
}

/// Thumbnail link; `size` uses Drive's syntax, e.g. `w400` or `s220`
pub fn thumbnail_url(file_id: &str, size: &str) -> String {
    format!("{}/thumbnail?id={}&sz={}", DRIVE_WEB_BASE, file_id, size)
}

/// Link for a freshly created file
///
/// Prefers what Drive returned (`webViewLink`, then `webContentLink`) and
/// falls back to [`view_url`].
pub fn shareable_link(file: &DriveFile) -> String {
    file.web_view_link
        .clone()
        .or_else(|| file.web_content_link.clone())
        .unwrap_or_else(|| view_url(&file.id))
}
