//! # Authentication Module
//!
//! Credential acquisition for the document storage layer.
//!
//! ## Overview
//!
//! Two mutually exclusive strategies are supported:
//!
//! - **Service account**: a key file is read from configuration and exchanged
//!   for short-lived tokens via a signed JWT assertion.
//! - **Delegated**: an end user's OAuth token is cached through the
//!   [`SecureStore`](bridge_traits::SecureStore) bridge, refreshed when it
//!   expires, and obtained through an interactive consent prompt as a last
//!   resort.
//!
//! [`CredentialProvider`] hides the difference. Its `acquire` never fails:
//! when no credential can be obtained it returns `None`, and the storage
//! manager settles on mock mode.
//!
//! ## Features
//!
//! - OAuth 2.0 authorization code flow with PKCE
//! - JWT bearer grant for service accounts
//! - Serialized refresh so a rotating refresh token is used once
//! - Token values redacted from `Debug` output and logs

pub mod error;
pub mod oauth;
pub mod provider;
pub mod service_account;
pub mod token_store;
pub mod types;

pub use error::{AuthError, Result};
pub use oauth::{AuthorizationResponse, OAuthConfig, OAuthFlowManager, PkceVerifier};
pub use provider::{AccessTokenSource, ConsentPrompt, CredentialProvider, StaticTokenSource};
pub use service_account::ServiceAccountSigner;
pub use token_store::TokenStore;
pub use types::{ClientSecrets, Credential, OAuthTokens, ServiceAccountKey};
