//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop and server hosts
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `HttpClient` using `reqwest` ([`ReqwestHttpClient`])
//! - `SecureStore` as a permission-restricted JSON file ([`FileSecureStore`])
//! - `ConsentPrompt` on the terminal ([`TerminalConsentPrompt`])
//! - [`desktop_credential_provider`] wiring the above from a `StorageConfig`
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{FileSecureStore, ReqwestHttpClient, TerminalConsentPrompt};
//! use std::sync::Arc;
//!
//! let http_client = Arc::new(ReqwestHttpClient::new()?);
//! let secure_store = Arc::new(FileSecureStore::for_config(&config));
//! let consent = Arc::new(TerminalConsentPrompt::stdio());
//!
//! // Or both at once:
//! let credentials = bridge_desktop::desktop_credential_provider(&config, http_client.clone());
//! ```

mod consent;
mod credentials;
mod file_store;
mod http;

pub use consent::TerminalConsentPrompt;
pub use credentials::desktop_credential_provider;
pub use file_store::FileSecureStore;
pub use http::ReqwestHttpClient;
