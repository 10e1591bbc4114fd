//! # Storage Configuration Module
//!
//! Provides configuration management for the document storage layer.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a
//! [`StorageConfig`]. It selects one of two mutually exclusive credential
//! strategies, names the credential files that strategy needs, and carries the
//! three destination folders documents are filed into.
//!
//! Missing credential files are *not* a configuration error: the storage
//! manager degrades to mock mode when credentials are unavailable. Validation
//! only rejects settings that can never work (an empty scope list, an empty
//! cache path).
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::{CredentialStrategy, StorageConfig};
//!
//! let config = StorageConfig::builder()
//!     .credential_strategy(CredentialStrategy::ServiceAccount)
//!     .service_account_key_path("keys/service-account.json")
//!     .papers_folder_id("1AbC")
//!     .build()
//!     .expect("Failed to build config");
//! ```
//!
//! ## Environment
//!
//! [`StorageConfig::from_env`] reads:
//!
//! | Variable | Meaning |
//! |----------|---------|
//! | `GOOGLE_DRIVE_CREDENTIAL_STRATEGY` | `service_account` or `delegated` |
//! | `GOOGLE_SERVICE_ACCOUNT_JSON` | service-account key file |
//! | `GOOGLE_OAUTH_CREDENTIALS_JSON` | OAuth client secrets file |
//! | `GOOGLE_DRIVE_TOKEN_CACHE` | delegated token cache file (default `token.json`) |
//! | `GOOGLE_DRIVE_PAPERS_FOLDER_ID` | papers folder |
//! | `GOOGLE_DRIVE_TEXTBOOKS_FOLDER_ID` | textbooks folder |
//! | `GOOGLE_DRIVE_NOTES_FOLDER_ID` | study notes folder |
//! | `GOOGLE_DRIVE_SUPPORTS_ALL_DRIVES` | shared-drive capability flag (default `true`) |

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Scope requested for both credential strategies
pub const DEFAULT_DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive.file";

/// Default location of the delegated credential cache
pub const DEFAULT_TOKEN_CACHE: &str = "token.json";

const ENV_STRATEGY: &str = "GOOGLE_DRIVE_CREDENTIAL_STRATEGY";
const ENV_SERVICE_ACCOUNT: &str = "GOOGLE_SERVICE_ACCOUNT_JSON";
const ENV_OAUTH_SECRETS: &str = "GOOGLE_OAUTH_CREDENTIALS_JSON";
const ENV_TOKEN_CACHE: &str = "GOOGLE_DRIVE_TOKEN_CACHE";
const ENV_PAPERS: &str = "GOOGLE_DRIVE_PAPERS_FOLDER_ID";
const ENV_TEXTBOOKS: &str = "GOOGLE_DRIVE_TEXTBOOKS_FOLDER_ID";
const ENV_NOTES: &str = "GOOGLE_DRIVE_NOTES_FOLDER_ID";
const ENV_ALL_DRIVES: &str = "GOOGLE_DRIVE_SUPPORTS_ALL_DRIVES";

/// How the storage layer authenticates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialStrategy {
    /// Service identity signed with a private key file
    ServiceAccount,
    /// End-user consent, cached and refreshed locally
    Delegated,
}

impl CredentialStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ServiceAccount => "service_account",
            Self::Delegated => "delegated",
        }
    }

    /// Parse a strategy name, accepting a few common spellings
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "service_account" | "service-account" | "serviceaccount" => {
                Some(Self::ServiceAccount)
            }
            "delegated" | "oauth" | "user" => Some(Self::Delegated),
            _ => None,
        }
    }
}

/// Destination folders for the three document categories
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentFolders {
    pub papers: Option<String>,
    pub textbooks: Option<String>,
    pub notes: Option<String>,
}

impl DocumentFolders {
    /// True when no category has a folder configured
    pub fn is_empty(&self) -> bool {
        self.papers.is_none() && self.textbooks.is_none() && self.notes.is_none()
    }
}

/// Storage layer configuration.
///
/// Use [`StorageConfigBuilder`] or [`StorageConfig::from_env`] to construct
/// instances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    /// Selected credential strategy
    pub credential_strategy: CredentialStrategy,

    /// Service-account key file (ServiceAccount strategy)
    pub service_account_key_path: Option<PathBuf>,

    /// OAuth client secrets file (Delegated strategy)
    pub oauth_client_secrets_path: Option<PathBuf>,

    /// File holding the cached delegated credential
    pub token_cache_path: PathBuf,

    /// Category destination folders
    pub folders: DocumentFolders,

    /// Pass the cross shared-drive capability flag on every call
    pub supports_all_drives: bool,

    /// OAuth scopes requested for either strategy
    pub scopes: Vec<String>,
}

impl StorageConfig {
    /// Create a new builder
    pub fn builder() -> StorageConfigBuilder {
        StorageConfigBuilder::default()
    }

    /// Load configuration from process environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    ///
    /// Used by [`from_env`](Self::from_env); tests pass a map instead of
    /// mutating the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Self::builder();

        if let Some(raw) = non_blank(lookup(ENV_STRATEGY)) {
            let strategy = CredentialStrategy::parse(&raw).ok_or_else(|| {
                Error::Config(format!(
                    "Unknown credential strategy '{}' in {}. Use 'service_account' or 'delegated'.",
                    raw, ENV_STRATEGY
                ))
            })?;
            builder = builder.credential_strategy(strategy);
        }
        if let Some(path) = non_blank(lookup(ENV_SERVICE_ACCOUNT)) {
            builder = builder.service_account_key_path(path);
        }
        if let Some(path) = non_blank(lookup(ENV_OAUTH_SECRETS)) {
            builder = builder.oauth_client_secrets_path(path);
        }
        if let Some(path) = non_blank(lookup(ENV_TOKEN_CACHE)) {
            builder = builder.token_cache_path(path);
        }
        if let Some(id) = lookup(ENV_PAPERS) {
            builder = builder.papers_folder_id(id);
        }
        if let Some(id) = lookup(ENV_TEXTBOOKS) {
            builder = builder.textbooks_folder_id(id);
        }
        if let Some(id) = lookup(ENV_NOTES) {
            builder = builder.notes_folder_id(id);
        }
        if let Some(raw) = non_blank(lookup(ENV_ALL_DRIVES)) {
            builder = builder.supports_all_drives(parse_bool(&raw).ok_or_else(|| {
                Error::Config(format!("{} must be true or false, got '{}'", ENV_ALL_DRIVES, raw))
            })?);
        }

        builder.build()
    }

    /// Resolve relative credential and cache paths against `base`
    pub fn with_base_dir(mut self, base: impl AsRef<Path>) -> Self {
        let base = base.as_ref();
        let resolve = |path: PathBuf| {
            if path.is_relative() {
                base.join(path)
            } else {
                path
            }
        };
        self.service_account_key_path = self.service_account_key_path.map(resolve);
        self.oauth_client_secrets_path = self.oauth_client_secrets_path.map(resolve);
        self.token_cache_path = resolve(self.token_cache_path);
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.scopes.is_empty() {
            return Err(Error::Config(
                "At least one OAuth scope is required. Use .scope() to add one.".to_string(),
            ));
        }
        if let Some(scope) = self.scopes.iter().find(|s| !s.starts_with("https://")) {
            return Err(Error::Config(format!(
                "OAuth scope '{}' must be a full https:// scope URL",
                scope
            )));
        }
        if self.token_cache_path.as_os_str().is_empty() {
            return Err(Error::Config(
                "Token cache path cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for [`StorageConfig`].
#[derive(Debug, Default)]
pub struct StorageConfigBuilder {
    credential_strategy: Option<CredentialStrategy>,
    service_account_key_path: Option<PathBuf>,
    oauth_client_secrets_path: Option<PathBuf>,
    token_cache_path: Option<PathBuf>,
    folders: DocumentFolders,
    supports_all_drives: Option<bool>,
    scopes: Vec<String>,
}

impl StorageConfigBuilder {
    /// Select the credential strategy explicitly.
    ///
    /// When not set, `Delegated` is chosen if an OAuth client secrets path is
    /// configured and `ServiceAccount` otherwise.
    pub fn credential_strategy(mut self, strategy: CredentialStrategy) -> Self {
        self.credential_strategy = Some(strategy);
        self
    }

    pub fn service_account_key_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.service_account_key_path = Some(path.into());
        self
    }

    pub fn oauth_client_secrets_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.oauth_client_secrets_path = Some(path.into());
        self
    }

    pub fn token_cache_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.token_cache_path = Some(path.into());
        self
    }

    /// Blank ids are treated as "no folder"
    pub fn papers_folder_id(mut self, id: impl Into<String>) -> Self {
        self.folders.papers = normalize_folder_id(id.into());
        self
    }

    pub fn textbooks_folder_id(mut self, id: impl Into<String>) -> Self {
        self.folders.textbooks = normalize_folder_id(id.into());
        self
    }

    pub fn notes_folder_id(mut self, id: impl Into<String>) -> Self {
        self.folders.notes = normalize_folder_id(id.into());
        self
    }

    pub fn supports_all_drives(mut self, enabled: bool) -> Self {
        self.supports_all_drives = Some(enabled);
        self
    }

    /// Add an OAuth scope. Replaces the default scope on first call.
    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scopes.push(scope.into());
        self
    }

    /// Build the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the resulting configuration fails
    /// [`StorageConfig::validate`].
    pub fn build(self) -> Result<StorageConfig> {
        let credential_strategy = self.credential_strategy.unwrap_or_else(|| {
            if self.oauth_client_secrets_path.is_some() {
                CredentialStrategy::Delegated
            } else {
                CredentialStrategy::ServiceAccount
            }
        });

        let scopes = if self.scopes.is_empty() {
            vec![DEFAULT_DRIVE_SCOPE.to_string()]
        } else {
            self.scopes
        };

        let config = StorageConfig {
            credential_strategy,
            service_account_key_path: self.service_account_key_path,
            oauth_client_secrets_path: self.oauth_client_secrets_path,
            token_cache_path: self
                .token_cache_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_TOKEN_CACHE)),
            folders: self.folders,
            supports_all_drives: self.supports_all_drives.unwrap_or(true),
            scopes,
        };

        config.validate()?;
        Ok(config)
    }
}

/// Trimmed folder id, `None` when blank
pub fn normalize_folder_id(id: String) -> Option<String> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
