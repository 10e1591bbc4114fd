//! # Credential Provider
//!
//! Obtains, caches and refreshes authorization material for the storage
//! client under one of two strategies:
//!
//! - **ServiceAccount**: reads the key file named in configuration and signs a
//!   JWT bearer assertion whenever the current token has expired.
//! - **Delegated**: loads the cached user token, refreshes it when expired and
//!   persists the result. When neither works and an interactive
//!   [`ConsentPrompt`] is available, runs the consent flow at most once per
//!   provider instance.
//!
//! [`CredentialProvider::acquire`] never fails: every error is logged and
//! reported as `None` so the caller can settle on mock mode.
//!
//! ## Concurrency
//!
//! All acquisition goes through one async mutex, so concurrent callers that
//! find an expired token trigger a single refresh. Providers that rotate the
//! refresh token on first use would otherwise reject the second refresh.

use crate::error::{AuthError, Result};
use crate::oauth::{AuthorizationResponse, OAuthConfig, OAuthFlowManager};
use crate::service_account::ServiceAccountSigner;
use crate::token_store::TokenStore;
use crate::types::{ClientSecrets, Credential, OAuthTokens, ServiceAccountKey};
use async_trait::async_trait;
use bridge_traits::{Clock, HttpClient, SecureStore, SystemClock};
use chrono::{DateTime, Utc};
use core_runtime::config::{CredentialStrategy, StorageConfig};
use core_runtime::logging::{redact_if_sensitive, strip_path};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{timeout, Duration};
use tracing::{debug, info, instrument, warn};

/// Buffer before expiry at which a token is treated as expired (5 minutes)
const TOKEN_REFRESH_BUFFER_SECS: i64 = 300;

/// How long the interactive consent prompt may wait for the operator
const DEFAULT_CONSENT_TIMEOUT: Duration = Duration::from_secs(300);

/// Interactive consent step of the delegated strategy
///
/// Implementations show `auth_url` to a human and return the code and state
/// delivered to the redirect URI.
#[async_trait]
pub trait ConsentPrompt: Send + Sync {
    async fn authorize(&self, auth_url: &str) -> Result<AuthorizationResponse>;
}

/// Source of bearer tokens for outgoing API calls
#[async_trait]
pub trait AccessTokenSource: Send + Sync {
    async fn access_token(&self) -> Result<String>;
}

/// Fixed token, for hosts that manage credentials themselves
#[derive(Clone)]
pub struct StaticTokenSource(String);

impl StaticTokenSource {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl AccessTokenSource for StaticTokenSource {
    async fn access_token(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

#[derive(Default)]
struct CredentialState {
    current: Option<OAuthTokens>,
    signer: Option<Arc<ServiceAccountSigner>>,
    oauth: Option<Arc<OAuthFlowManager>>,
}

/// Credential provider for both strategies. See the module docs.
pub struct CredentialProvider {
    strategy: CredentialStrategy,
    service_account_key_path: Option<PathBuf>,
    client_secrets_path: Option<PathBuf>,
    scopes: Vec<String>,
    http_client: Arc<dyn HttpClient>,
    token_store: TokenStore,
    consent_prompt: Option<Arc<dyn ConsentPrompt>>,
    consent_timeout: Duration,
    consent_attempted: AtomicBool,
    clock: Arc<dyn Clock>,
    state: Mutex<CredentialState>,
}

impl CredentialProvider {
    /// Create a provider from storage configuration
    ///
    /// `secure_store` backs the delegated token cache. No I/O happens until
    /// the first [`acquire`](Self::acquire).
    pub fn new(
        config: &StorageConfig,
        http_client: Arc<dyn HttpClient>,
        secure_store: Arc<dyn SecureStore>,
    ) -> Self {
        Self {
            strategy: config.credential_strategy,
            service_account_key_path: config.service_account_key_path.clone(),
            client_secrets_path: config.oauth_client_secrets_path.clone(),
            scopes: config.scopes.clone(),
            http_client,
            token_store: TokenStore::new(secure_store),
            consent_prompt: None,
            consent_timeout: DEFAULT_CONSENT_TIMEOUT,
            consent_attempted: AtomicBool::new(false),
            clock: Arc::new(SystemClock),
            state: Mutex::new(CredentialState::default()),
        }
    }

    /// Enable interactive consent for the delegated strategy
    pub fn with_consent_prompt(mut self, prompt: Arc<dyn ConsentPrompt>) -> Self {
        self.consent_prompt = Some(prompt);
        self
    }

    pub fn with_consent_timeout(mut self, duration: Duration) -> Self {
        self.consent_timeout = duration;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn strategy(&self) -> CredentialStrategy {
        self.strategy
    }

    /// Obtain a usable credential, or `None` when none can be had
    ///
    /// Missing configuration is expected and logged at info; every other
    /// failure is logged at warn.
    pub async fn acquire(&self) -> Option<Credential> {
        match self.try_acquire().await {
            Ok(credential) => Some(credential),
            Err(AuthError::CredentialsMissing(reason)) => {
                info!(
                    strategy = self.strategy.as_str(),
                    reason = %reason,
                    "No credentials configured"
                );
                None
            }
            Err(e) => {
                warn!(
                    strategy = self.strategy.as_str(),
                    error = %e,
                    "Credential acquisition failed"
                );
                None
            }
        }
    }

    /// Like [`acquire`](Self::acquire) but reports why no credential exists
    #[instrument(skip(self), fields(strategy = self.strategy.as_str()))]
    pub async fn try_acquire(&self) -> Result<Credential> {
        let mut state = self.state.lock().await;
        let now = self.clock.now();

        if let Some(tokens) = &state.current {
            if !tokens.is_expired_at(now, TOKEN_REFRESH_BUFFER_SECS) {
                debug!("Using in-memory credential");
                return Ok(Credential::from_tokens(self.strategy, tokens));
            }
        }

        let tokens = match self.strategy {
            CredentialStrategy::ServiceAccount => {
                self.acquire_service_account(&mut state, now).await?
            }
            CredentialStrategy::Delegated => self.acquire_delegated(&mut state, now).await?,
        };

        let credential = Credential::from_tokens(self.strategy, &tokens);
        state.current = Some(tokens);
        Ok(credential)
    }

    async fn acquire_service_account(
        &self,
        state: &mut CredentialState,
        now: DateTime<Utc>,
    ) -> Result<OAuthTokens> {
        let signer = match &state.signer {
            Some(signer) => signer.clone(),
            None => {
                let path = self.service_account_key_path.as_deref().ok_or_else(|| {
                    AuthError::CredentialsMissing(
                        "no service account key file configured".to_string(),
                    )
                })?;

                let json = read_credential_file(path).await?;
                let key = ServiceAccountKey::from_json(&json).map_err(|reason| {
                    AuthError::InvalidCredentialFile {
                        path: display_name(path),
                        reason,
                    }
                })?;

                let signer = Arc::new(ServiceAccountSigner::new(
                    key,
                    self.scopes.clone(),
                    self.http_client.clone(),
                )?);
                info!(
                    file = %display_name(path),
                    client_email = %redact_if_sensitive("client_email", signer.client_email()),
                    "Loaded service account key"
                );
                state.signer = Some(signer.clone());
                signer
            }
        };

        signer.fetch_token(now).await
    }

    async fn acquire_delegated(
        &self,
        state: &mut CredentialState,
        now: DateTime<Utc>,
    ) -> Result<OAuthTokens> {
        let cached = match state.current.take() {
            Some(tokens) => Some(tokens),
            None => self.load_cached().await,
        };

        if let Some(tokens) = &cached {
            if !tokens.is_expired_at(now, TOKEN_REFRESH_BUFFER_SECS) {
                debug!("Using cached delegated credential");
                return Ok(tokens.clone());
            }
        }

        if let Some(refresh_token) = cached.as_ref().and_then(|t| t.refresh_token()) {
            let oauth = self.oauth_flow(state).await?;
            info!("Delegated credential expired, refreshing");
            match oauth.refresh_access_token(refresh_token).await {
                Ok(tokens) => {
                    self.persist(&tokens).await;
                    return Ok(tokens);
                }
                Err(e) => warn!(error = %e, "Refresh failed"),
            }
        }

        self.run_consent(state).await
    }

    async fn run_consent(&self, state: &mut CredentialState) -> Result<OAuthTokens> {
        let prompt = self.consent_prompt.clone().ok_or_else(|| {
            AuthError::ConsentUnavailable("no interactive prompt in this context".to_string())
        })?;

        let oauth = self.oauth_flow(state).await?;

        if self.consent_attempted.swap(true, Ordering::SeqCst) {
            return Err(AuthError::ConsentUnavailable(
                "interactive consent already attempted".to_string(),
            ));
        }

        let (auth_url, verifier) = oauth.build_auth_url()?;
        info!("Requesting interactive consent");

        let response = timeout(self.consent_timeout, prompt.authorize(&auth_url))
            .await
            .map_err(|_| {
                AuthError::ConsentUnavailable(format!(
                    "no response within {}s",
                    self.consent_timeout.as_secs()
                ))
            })??;

        let tokens = oauth
            .exchange_code(&response.code, &response.state, &verifier)
            .await?;
        self.persist(&tokens).await;
        Ok(tokens)
    }

    async fn oauth_flow(&self, state: &mut CredentialState) -> Result<Arc<OAuthFlowManager>> {
        if let Some(flow) = &state.oauth {
            return Ok(flow.clone());
        }

        let path = self.client_secrets_path.as_deref().ok_or_else(|| {
            AuthError::CredentialsMissing("no OAuth client secrets file configured".to_string())
        })?;

        let json = read_credential_file(path).await?;
        let secrets =
            ClientSecrets::from_json(&json).map_err(|reason| AuthError::InvalidCredentialFile {
                path: display_name(path),
                reason,
            })?;

        let flow = Arc::new(OAuthFlowManager::new(
            OAuthConfig::from_client_secrets(&secrets, self.scopes.clone()),
            self.http_client.clone(),
        ));
        state.oauth = Some(flow.clone());
        Ok(flow)
    }

    async fn load_cached(&self) -> Option<OAuthTokens> {
        match self.token_store.retrieve_tokens().await {
            Ok(tokens) => tokens,
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable token cache");
                None
            }
        }
    }

    async fn persist(&self, tokens: &OAuthTokens) {
        if let Err(e) = self.token_store.store_tokens(tokens).await {
            warn!(error = %e, "Could not persist delegated credential");
        }
    }
}

#[async_trait]
impl AccessTokenSource for CredentialProvider {
    async fn access_token(&self) -> Result<String> {
        Ok(self.try_acquire().await?.access_token)
    }
}

async fn read_credential_file(path: &Path) -> Result<String> {
    match tokio::fs::read_to_string(path).await {
        Ok(contents) => Ok(contents),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(AuthError::CredentialsMissing(
            format!("{} does not exist", display_name(path)),
        )),
        Err(e) => Err(AuthError::InvalidCredentialFile {
            path: display_name(path),
            reason: e.to_string(),
        }),
    }
}

fn display_name(path: &Path) -> String {
    strip_path(&path.to_string_lossy()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::http::{HttpRequest, HttpResponse};
    use bytes::Bytes;
    use mockall::mock;
    use std::collections::HashMap;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex as StdMutex;
    use tempfile::TempDir;

    mock! {
        HttpClient {}

        #[async_trait]
        impl HttpClient for HttpClient {
            async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
            async fn download_stream(&self, request: HttpRequest) -> BridgeResult<Box<dyn tokio::io::AsyncRead + Send + Unpin>>;
        }
    }

    const TEST_KEY: &str = include_str!("../tests/fixtures/test_service_account_key.pem");

    #[derive(Default)]
    struct MemoryStore {
        data: StdMutex<HashMap<String, Vec<u8>>>,
    }

    #[async_trait]
    impl SecureStore for MemoryStore {
        async fn set_secret(&self, key: &str, value: &[u8]) -> BridgeResult<()> {
            self.data.lock().unwrap().insert(key.to_string(), value.to_vec());
            Ok(())
        }

        async fn get_secret(&self, key: &str) -> BridgeResult<Option<Vec<u8>>> {
            Ok(self.data.lock().unwrap().get(key).cloned())
        }

        async fn delete_secret(&self, key: &str) -> BridgeResult<()> {
            self.data.lock().unwrap().remove(key);
            Ok(())
        }
    }

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    /// Answers consent with the state taken from the authorization URL
    #[derive(Default)]
    struct ApprovingPrompt {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ConsentPrompt for ApprovingPrompt {
        async fn authorize(&self, auth_url: &str) -> Result<AuthorizationResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let url = url::Url::parse(auth_url).unwrap();
            let state = url
                .query_pairs()
                .find(|(k, _)| k == "state")
                .map(|(_, v)| v.into_owned())
                .unwrap();
            Ok(AuthorizationResponse {
                code: "granted-code".to_string(),
                state,
            })
        }
    }

    #[derive(Default)]
    struct DecliningPrompt {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ConsentPrompt for DecliningPrompt {
        async fn authorize(&self, _auth_url: &str) -> Result<AuthorizationResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(AuthError::InvalidAuthCode("access_denied".to_string()))
        }
    }

    fn token_response(access_token: &str) -> HttpResponse {
        HttpResponse {
            status: 200,
            headers: HashMap::new(),
            body: Bytes::from(format!(
                r#"{{"access_token": "{}", "expires_in": 3600}}"#,
                access_token
            )),
        }
    }

    fn write_file(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn client_secrets_json() -> &'static str {
        r#"{"installed": {"client_id": "cid", "client_secret": "cs",
            "token_uri": "https://oauth2.googleapis.com/token",
            "redirect_uris": ["http://localhost"]}}"#
    }

    fn delegated_config(dir: &TempDir) -> StorageConfig {
        StorageConfig::builder()
            .credential_strategy(CredentialStrategy::Delegated)
            .oauth_client_secrets_path(write_file(dir, "oauth.json", client_secrets_json()))
            .build()
            .unwrap()
    }

    async fn seed_cache(store: &Arc<MemoryStore>, tokens: &OAuthTokens) {
        TokenStore::new(store.clone())
            .store_tokens(tokens)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_service_account_without_path_is_unavailable() {
        let mut http = MockHttpClient::new();
        http.expect_execute().times(0);

        let config = StorageConfig::builder().build().unwrap();
        let provider =
            CredentialProvider::new(&config, Arc::new(http), Arc::new(MemoryStore::default()));

        assert!(provider.acquire().await.is_none());
        assert!(matches!(
            provider.try_acquire().await,
            Err(AuthError::CredentialsMissing(_))
        ));
    }

    #[tokio::test]
    async fn test_service_account_missing_file_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let mut http = MockHttpClient::new();
        http.expect_execute().times(0);

        let config = StorageConfig::builder()
            .service_account_key_path(dir.path().join("absent.json"))
            .build()
            .unwrap();
        let provider =
            CredentialProvider::new(&config, Arc::new(http), Arc::new(MemoryStore::default()));

        assert!(provider.acquire().await.is_none());
    }

    #[tokio::test]
    async fn test_service_account_malformed_file_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let config = StorageConfig::builder()
            .service_account_key_path(write_file(&dir, "sa.json", "{ not json"))
            .build()
            .unwrap();
        let provider = CredentialProvider::new(
            &config,
            Arc::new(MockHttpClient::new()),
            Arc::new(MemoryStore::default()),
        );

        assert!(matches!(
            provider.try_acquire().await,
            Err(AuthError::InvalidCredentialFile { .. })
        ));
    }

    #[tokio::test]
    async fn test_service_account_token_reused_until_expiry() {
        let dir = TempDir::new().unwrap();
        let key_json = serde_json::json!({
            "type": "service_account",
            "client_email": "uploader@docs.iam.gserviceaccount.com",
            "private_key": TEST_KEY,
        })
        .to_string();

        let mut http = MockHttpClient::new();
        http.expect_execute()
            .times(1)
            .returning(|_| Ok(token_response("sa-token")));

        let config = StorageConfig::builder()
            .service_account_key_path(write_file(&dir, "sa.json", &key_json))
            .build()
            .unwrap();
        let store = Arc::new(MemoryStore::default());
        let provider = CredentialProvider::new(&config, Arc::new(http), store.clone());

        let first = provider.acquire().await.unwrap();
        let second = provider.acquire().await.unwrap();

        assert_eq!(first.strategy, CredentialStrategy::ServiceAccount);
        assert_eq!(first.access_token, "sa-token");
        assert_eq!(second.access_token, "sa-token");
        assert!(first.refresh_token.is_none());
        // Service tokens are never persisted
        assert!(store.data.lock().unwrap().is_empty());
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<StdMutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_service_account_email_redacted_in_logs() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let _guard = tracing::subscriber::set_default(
            tracing_subscriber::fmt()
                .with_ansi(false)
                .with_max_level(tracing::Level::DEBUG)
                .with_writer(move || writer.clone())
                .finish(),
        );

        let dir = TempDir::new().unwrap();
        let key_json = serde_json::json!({
            "type": "service_account",
            "client_email": "uploader@docs.iam.gserviceaccount.com",
            "private_key": TEST_KEY,
        })
        .to_string();

        let mut http = MockHttpClient::new();
        http.expect_execute()
            .times(1)
            .returning(|_| Ok(token_response("sa-token")));

        let config = StorageConfig::builder()
            .service_account_key_path(write_file(&dir, "sa.json", &key_json))
            .build()
            .unwrap();
        let provider =
            CredentialProvider::new(&config, Arc::new(http), Arc::new(MemoryStore::default()));
        assert!(provider.acquire().await.is_some());

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("Loaded service account key"));
        assert!(output.contains("u***@[REDACTED]"));
        assert!(!output.contains("uploader@docs.iam.gserviceaccount.com"));
        assert!(!output.contains("sa-token"));
    }

    #[tokio::test]
    async fn test_service_account_out_of_range_expiry_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let key_json = serde_json::json!({
            "type": "service_account",
            "client_email": "uploader@docs.iam.gserviceaccount.com",
            "private_key": TEST_KEY,
        })
        .to_string();

        let mut http = MockHttpClient::new();
        http.expect_execute().returning(|_| {
            Ok(HttpResponse {
                status: 200,
                headers: HashMap::new(),
                body: Bytes::from(r#"{"access_token": "t", "expires_in": 9223372036854775807}"#),
            })
        });

        let config = StorageConfig::builder()
            .service_account_key_path(write_file(&dir, "sa.json", &key_json))
            .build()
            .unwrap();
        let provider =
            CredentialProvider::new(&config, Arc::new(http), Arc::new(MemoryStore::default()));

        assert!(provider.acquire().await.is_none());
        assert!(matches!(
            provider.try_acquire().await,
            Err(AuthError::TokenRequestFailed(ref message)) if message.contains("expires_in")
        ));
    }

    #[tokio::test]
    async fn test_delegated_uses_unexpired_cache_without_network() {
        let dir = TempDir::new().unwrap();
        let mut http = MockHttpClient::new();
        http.expect_execute().times(0);

        let store = Arc::new(MemoryStore::default());
        seed_cache(
            &store,
            &OAuthTokens::new("cached".to_string(), Some("rt".to_string()), 3600),
        )
        .await;

        let provider =
            CredentialProvider::new(&delegated_config(&dir), Arc::new(http), store.clone());
        let credential = provider.acquire().await.unwrap();

        assert_eq!(credential.strategy, CredentialStrategy::Delegated);
        assert_eq!(credential.access_token, "cached");
    }

    #[tokio::test]
    async fn test_delegated_refreshes_and_persists() {
        let dir = TempDir::new().unwrap();
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .times(1)
            .withf(|req| {
                let body = String::from_utf8_lossy(req.body.as_deref().unwrap_or_default()).to_string();
                body.contains("grant_type=refresh_token") && body.contains("refresh_token=rt")
            })
            .returning(|_| Ok(token_response("refreshed")));

        let store = Arc::new(MemoryStore::default());
        seed_cache(
            &store,
            &OAuthTokens::new("stale".to_string(), Some("rt".to_string()), -60),
        )
        .await;

        let provider =
            CredentialProvider::new(&delegated_config(&dir), Arc::new(http), store.clone());
        let credential = provider.acquire().await.unwrap();
        assert_eq!(credential.access_token, "refreshed");
        assert_eq!(credential.refresh_token.as_deref(), Some("rt"));

        let persisted = TokenStore::new(store).retrieve_tokens().await.unwrap().unwrap();
        assert_eq!(persisted.access_token(), "refreshed");
    }

    #[tokio::test]
    async fn test_concurrent_acquire_refreshes_once() {
        let dir = TempDir::new().unwrap();
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .times(1)
            .returning(|_| Ok(token_response("refreshed")));

        let store = Arc::new(MemoryStore::default());
        seed_cache(
            &store,
            &OAuthTokens::new("stale".to_string(), Some("rt".to_string()), -60),
        )
        .await;

        let provider = Arc::new(CredentialProvider::new(
            &delegated_config(&dir),
            Arc::new(http),
            store,
        ));

        let (a, b, c) = tokio::join!(
            provider.acquire(),
            provider.acquire(),
            provider.access_token()
        );

        assert_eq!(a.unwrap().access_token, "refreshed");
        assert_eq!(b.unwrap().access_token, "refreshed");
        assert_eq!(c.unwrap(), "refreshed");
    }

    #[tokio::test]
    async fn test_delegated_without_prompt_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let mut http = MockHttpClient::new();
        http.expect_execute().times(0);

        let provider = CredentialProvider::new(
            &delegated_config(&dir),
            Arc::new(http),
            Arc::new(MemoryStore::default()),
        );

        assert!(matches!(
            provider.try_acquire().await,
            Err(AuthError::ConsentUnavailable(_))
        ));
        assert!(provider.acquire().await.is_none());
    }

    #[tokio::test]
    async fn test_consent_runs_at_most_once() {
        let dir = TempDir::new().unwrap();
        let prompt = Arc::new(DecliningPrompt::default());

        let provider = CredentialProvider::new(
            &delegated_config(&dir),
            Arc::new(MockHttpClient::new()),
            Arc::new(MemoryStore::default()),
        )
        .with_consent_prompt(prompt.clone());

        assert!(provider.acquire().await.is_none());
        assert!(provider.acquire().await.is_none());
        assert_eq!(prompt.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_consent_success_is_persisted() {
        let dir = TempDir::new().unwrap();
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .times(1)
            .withf(|req| {
                let body = String::from_utf8_lossy(req.body.as_deref().unwrap_or_default()).to_string();
                body.contains("grant_type=authorization_code") && body.contains("code=granted-code")
            })
            .returning(|_| {
                Ok(HttpResponse {
                    status: 200,
                    headers: HashMap::new(),
                    body: Bytes::from(
                        r#"{"access_token": "user-token", "refresh_token": "user-rt", "expires_in": 3600}"#,
                    ),
                })
            });

        let store = Arc::new(MemoryStore::default());
        let prompt = Arc::new(ApprovingPrompt::default());
        let provider =
            CredentialProvider::new(&delegated_config(&dir), Arc::new(http), store.clone())
                .with_consent_prompt(prompt.clone());

        let credential = provider.acquire().await.unwrap();
        assert_eq!(credential.access_token, "user-token");
        assert_eq!(prompt.calls.load(Ordering::SeqCst), 1);

        let persisted = TokenStore::new(store).retrieve_tokens().await.unwrap().unwrap();
        assert_eq!(persisted.refresh_token(), Some("user-rt"));
    }

    #[tokio::test]
    async fn test_expiry_follows_injected_clock() {
        let dir = TempDir::new().unwrap();
        let issued = Utc::now();
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .times(1)
            .returning(|_| Ok(token_response("refreshed")));

        let store = Arc::new(MemoryStore::default());
        seed_cache(
            &store,
            &OAuthTokens::issued_at("cached".to_string(), Some("rt".to_string()), 3600, issued),
        )
        .await;

        // Two hours later the cached token is stale
        let clock = Arc::new(FixedClock(issued + chrono::Duration::hours(2)));
        let provider = CredentialProvider::new(&delegated_config(&dir), Arc::new(http), store)
            .with_clock(clock);

        assert_eq!(provider.acquire().await.unwrap().access_token, "refreshed");
    }

    #[tokio::test]
    async fn test_static_token_source() {
        let source = StaticTokenSource::new("fixed");
        assert_eq!(source.access_token().await.unwrap(), "fixed");
    }
}
