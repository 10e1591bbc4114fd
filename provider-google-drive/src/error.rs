//! Error types for Google Drive provider

use crate::types::ApiErrorResponse;
use thiserror::Error;

/// How the upload coordinator treats a failed remote call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Destination folder missing or not writable; served by the mock path
    DestinationInvalid,
    /// Storage quota exhausted (typically a service account without quota);
    /// served by the mock path
    QuotaExceeded,
    /// Anything else; surfaced to the caller
    Transient,
}

/// Google Drive provider errors
#[derive(Error, Debug)]
pub enum GoogleDriveError {
    /// No access token could be obtained
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// API request returned a non-success status
    #[error("Google Drive API error (status {status_code}): {message}")]
    ApiError {
        status_code: u16,
        /// `errors[0].reason` from the error body, when present
        reason: Option<String>,
        message: String,
    },

    /// File not found
    #[error("File not found: {file_id}")]
    FileNotFound { file_id: String },

    /// Failed to parse API response
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Operation has no meaning in the current mode
    #[error("Not available: {0}")]
    NotAvailable(String),

    /// Bridge error (transport failure)
    #[error(transparent)]
    BridgeError(#[from] bridge_traits::error::BridgeError),
}

/// Result type for Google Drive operations
pub type Result<T> = std::result::Result<T, GoogleDriveError>;

/// Typed failure of an upload
///
/// Only failures the mock path cannot absorb reach the caller; the provider
/// message is kept intact.
#[derive(Error, Debug)]
pub enum UploadError {
    /// The request itself is unusable
    #[error("Invalid upload request: {0}")]
    InvalidRequest(String),

    /// Drive failed in a way that is not substituted
    #[error("Upload failed: {0}")]
    Provider(#[from] GoogleDriveError),
}

impl From<core_auth::AuthError> for GoogleDriveError {
    fn from(error: core_auth::AuthError) -> Self {
        GoogleDriveError::AuthenticationFailed(error.to_string())
    }
}

const DESTINATION_REASONS: &[&str] = &[
    "notFound",
    "insufficientFilePermissions",
    "insufficientParentPermissions",
    "forbidden",
    "cannotAddParent",
];

const QUOTA_REASONS: &[&str] = &[
    "storageQuotaExceeded",
    "quotaExceeded",
    "teamDriveFileLimitExceeded",
];

const RATE_LIMIT_REASONS: &[&str] = &["rateLimitExceeded", "userRateLimitExceeded"];

const SERVICE_ACCOUNT_QUOTA_MESSAGE: &str = "Service Accounts do not have storage quota";

impl GoogleDriveError {
    /// Build an error from a non-success response body
    ///
    /// Bodies that are not the standard JSON error envelope are kept verbatim
    /// as the message.
    pub fn from_response(status_code: u16, body: &[u8]) -> Self {
        match serde_json::from_slice::<ApiErrorResponse>(body) {
            Ok(parsed) => {
                let reason = parsed
                    .error
                    .errors
                    .first()
                    .and_then(|item| item.reason.clone());
                GoogleDriveError::ApiError {
                    status_code,
                    reason,
                    message: parsed.error.message,
                }
            }
            Err(_) => GoogleDriveError::ApiError {
                status_code,
                reason: None,
                message: String::from_utf8_lossy(body).trim().to_string(),
            },
        }
    }

    /// HTTP status of the failed call, if it got that far
    pub fn status_code(&self) -> Option<u16> {
        match self {
            GoogleDriveError::ApiError { status_code, .. } => Some(*status_code),
            GoogleDriveError::FileNotFound { .. } => Some(404),
            _ => None,
        }
    }

    /// Classify using the structured reason code first, then the status
    pub fn classify(&self) -> FailureClass {
        match self {
            GoogleDriveError::FileNotFound { .. } => FailureClass::DestinationInvalid,
            GoogleDriveError::ApiError {
                status_code,
                reason,
                message,
            } => {
                if message.contains(SERVICE_ACCOUNT_QUOTA_MESSAGE) {
                    return FailureClass::QuotaExceeded;
                }
                match reason.as_deref() {
                    Some(r) if QUOTA_REASONS.contains(&r) => FailureClass::QuotaExceeded,
                    Some(r) if DESTINATION_REASONS.contains(&r) => {
                        FailureClass::DestinationInvalid
                    }
                    Some(r) if RATE_LIMIT_REASONS.contains(&r) => FailureClass::Transient,
                    _ => match status_code {
                        403 | 404 => FailureClass::DestinationInvalid,
                        _ => FailureClass::Transient,
                    },
                }
            }
            _ => FailureClass::Transient,
        }
    }
}
