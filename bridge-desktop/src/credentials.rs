//! Credential wiring for desktop hosts

use crate::{FileSecureStore, TerminalConsentPrompt};
use bridge_traits::http::HttpClient;
use core_auth::CredentialProvider;
use core_runtime::config::StorageConfig;
use std::sync::Arc;

impl FileSecureStore {
    /// Store at the configured delegated token cache path
    pub fn for_config(config: &StorageConfig) -> Self {
        Self::new(config.token_cache_path.clone())
    }
}

/// Credential provider caching delegated tokens in `config.token_cache_path`
/// and asking for consent on the terminal
pub fn desktop_credential_provider(
    config: &StorageConfig,
    http_client: Arc<dyn HttpClient>,
) -> CredentialProvider {
    CredentialProvider::new(
        config,
        http_client,
        Arc::new(FileSecureStore::for_config(config)),
    )
    .with_consent_prompt(Arc::new(TerminalConsentPrompt::stdio()))
}
