//! Workspace facade crate.
//!
//! Host applications can depend on `docstore-workspace` and get the document
//! storage manager, configuration and desktop bridges without wiring each
//! workspace crate individually.

#[cfg(feature = "desktop-shims")]
pub use bridge_desktop::{
    desktop_credential_provider, FileSecureStore, ReqwestHttpClient, TerminalConsentPrompt,
};
#[cfg(feature = "desktop-shims")]
pub use core_auth::{CredentialProvider, StaticTokenSource};
#[cfg(feature = "desktop-shims")]
pub use core_runtime::config::{CredentialStrategy, StorageConfig};
#[cfg(feature = "desktop-shims")]
pub use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
#[cfg(feature = "desktop-shims")]
pub use provider_google_drive::{
    DocumentCategory, DocumentStorageManager, ManagerMode, UploadError, UploadRequest,
    UploadResult, UploadStats,
};
