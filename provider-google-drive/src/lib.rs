//! # Google Drive Provider
//!
//! Document storage on Google Drive API v3.
//!
//! ## Overview
//!
//! This crate provides:
//! - [`GoogleDriveConnector`]: typed calls for create, get, delete, list,
//!   permission grant and media download, always sent with shared-drive
//!   support
//! - [`TopologyCache`]: memoized folder → shared drive resolution
//! - [`MockAdapter`]: offline ids and links with the real shape
//! - [`DocumentStorageManager`]: the upload protocol with per-call mock
//!   fallback, plus delete/info/download and category folders
//! - [`links`]: pure URL helpers derived from a file id

pub mod connector;
pub mod error;
pub mod links;
pub mod manager;
pub mod mock;
pub mod topology;
pub mod types;

pub use connector::GoogleDriveConnector;
pub use error::{FailureClass, GoogleDriveError, Result, UploadError};
pub use manager::{
    DocumentCategory, DocumentStorageManager, ManagerMode, UploadRequest, UploadStats,
};
pub use mock::MockAdapter;
pub use topology::{SharedDriveLookup, TopologyCache};
pub use types::{DriveFile, NewFile, UploadResult};
