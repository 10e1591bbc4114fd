//! OAuth 2.0 Authorization Flow Manager with PKCE Support
//!
//! This module implements RFC 6749 (OAuth 2.0) and RFC 7636 (PKCE) for the
//! delegated credential strategy.
//!
//! # Overview
//!
//! The OAuth flow manager handles:
//! - Building authorization URLs with PKCE challenge
//! - Exchanging authorization codes for tokens
//! - Refreshing access tokens
//! - State verification for CSRF protection
//!
//! Token requests are issued exactly once. Some providers rotate the refresh
//! token on first use, so a blind retry can invalidate the grant.
//!
//! # Example
//!
//! ```no_run
//! use core_auth::oauth::{OAuthConfig, OAuthFlowManager};
//! use core_auth::ClientSecrets;
//! use std::sync::Arc;
//!
//! # async fn example() -> core_auth::Result<()> {
//! # use bridge_traits::http::HttpClient;
//! # let http_client: Arc<dyn HttpClient> = todo!();
//! # let secrets: ClientSecrets = todo!();
//! let config = OAuthConfig::from_client_secrets(
//!     &secrets,
//!     vec!["https://www.googleapis.com/auth/drive.file".to_string()],
//! );
//!
//! let flow_manager = OAuthFlowManager::new(config, http_client);
//! let (auth_url, pkce_verifier) = flow_manager.build_auth_url()?;
//! // Show auth_url to the operator...
//! # Ok(())
//! # }
//! ```

use crate::error::{AuthError, Result};
use crate::types::{ClientSecrets, OAuthTokens};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest};
use bytes::Bytes;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// OAuth 2.0 client configuration.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    /// OAuth client ID
    pub client_id: String,
    /// OAuth client secret (optional for public clients)
    pub client_secret: Option<String>,
    /// Redirect URI registered for the client
    pub redirect_uri: String,
    /// List of OAuth scopes to request
    pub scopes: Vec<String>,
    /// Authorization endpoint URL
    pub auth_url: String,
    /// Token endpoint URL
    pub token_url: String,
}

impl OAuthConfig {
    /// Build a configuration from a parsed client secrets file
    pub fn from_client_secrets(secrets: &ClientSecrets, scopes: Vec<String>) -> Self {
        Self {
            client_id: secrets.client_id.clone(),
            client_secret: secrets.client_secret.clone(),
            redirect_uri: secrets.redirect_uri().to_string(),
            scopes,
            auth_url: secrets.auth_uri.clone(),
            token_url: secrets.token_uri.clone(),
        }
    }
}

/// PKCE (Proof Key for Code Exchange) verifier.
///
/// Holds the code verifier and the CSRF state for one authorization attempt.
/// Only the challenge derived from the verifier leaves the process before the
/// code exchange.
#[derive(Debug, Clone)]
pub struct PkceVerifier {
    verifier: String,
    state: String,
}

impl PkceVerifier {
    /// Create a new PKCE verifier with cryptographically secure random values.
    ///
    /// Generates a 32-byte code verifier and a 16-byte state, both URL-safe
    /// base64 without padding.
    pub fn new() -> Self {
        let mut rng = rand::thread_rng();

        let mut verifier_bytes = [0u8; 32];
        rng.fill(&mut verifier_bytes);
        let verifier = URL_SAFE_NO_PAD.encode(verifier_bytes);

        let mut state_bytes = [0u8; 16];
        rng.fill(&mut state_bytes);
        let state = URL_SAFE_NO_PAD.encode(state_bytes);

        Self { verifier, state }
    }

    pub fn verifier(&self) -> &str {
        &self.verifier
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    /// Compute the S256 code challenge: BASE64URL(SHA256(code_verifier))
    pub fn challenge(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.verifier.as_bytes());
        URL_SAFE_NO_PAD.encode(hasher.finalize())
    }
}

impl Default for PkceVerifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Code and state returned to the redirect URI after consent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationResponse {
    pub code: String,
    pub state: String,
}

impl AuthorizationResponse {
    /// Extract `code` and `state` from the full redirect URL
    ///
    /// An `error` parameter (e.g. `access_denied`) is reported as
    /// [`AuthError::InvalidAuthCode`].
    pub fn from_redirect_url(redirect: &str) -> Result<Self> {
        let url = Url::parse(redirect.trim())
            .map_err(|e| AuthError::InvalidAuthCode(format!("Invalid redirect URL: {}", e)))?;

        let params: HashMap<String, String> = url.query_pairs().into_owned().collect();

        if let Some(error) = params.get("error") {
            return Err(AuthError::InvalidAuthCode(format!(
                "Authorization was not granted: {}",
                error
            )));
        }

        let code = params
            .get("code")
            .filter(|c| !c.is_empty())
            .ok_or_else(|| AuthError::InvalidAuthCode("Redirect URL has no code".to_string()))?;
        let state = params.get("state").cloned().unwrap_or_default();

        Ok(Self {
            code: code.clone(),
            state,
        })
    }
}

/// OAuth 2.0 flow manager.
///
/// Handles the authorization code flow with PKCE and the refresh grant.
pub struct OAuthFlowManager {
    config: OAuthConfig,
    http_client: Arc<dyn HttpClient>,
}

impl OAuthFlowManager {
    pub fn new(config: OAuthConfig, http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            config,
            http_client,
        }
    }

    /// Build the authorization URL with PKCE challenge.
    ///
    /// Returns both the URL and the verifier that must be passed to
    /// [`exchange_code`](Self::exchange_code).
    #[instrument(skip(self), fields(client_id = %self.config.client_id))]
    pub fn build_auth_url(&self) -> Result<(String, PkceVerifier)> {
        let verifier = PkceVerifier::new();
        let challenge = verifier.challenge();

        let mut url = Url::parse(&self.config.auth_url)
            .map_err(|e| AuthError::Other(format!("Invalid auth URL: {}", e)))?;

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("client_id", &self.config.client_id);
            query.append_pair("redirect_uri", &self.config.redirect_uri);
            query.append_pair("response_type", "code");
            query.append_pair("scope", &self.config.scopes.join(" "));
            query.append_pair("state", verifier.state());
            query.append_pair("code_challenge", &challenge);
            query.append_pair("code_challenge_method", "S256");
            // Request a refresh token
            query.append_pair("access_type", "offline");
            query.append_pair("prompt", "consent");
        }

        debug!("Built authorization URL");

        Ok((url.to_string(), verifier))
    }

    /// Exchange an authorization code for OAuth tokens.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The state doesn't match (CSRF protection)
    /// - The token endpoint rejects the code
    /// - Network errors occur
    #[instrument(skip(self, code, verifier))]
    pub async fn exchange_code(
        &self,
        code: &str,
        state: &str,
        verifier: &PkceVerifier,
    ) -> Result<OAuthTokens> {
        if state != verifier.state() {
            warn!("OAuth state mismatch during code exchange");
            return Err(AuthError::StateMismatch {
                expected: verifier.state().to_string(),
                actual: state.to_string(),
            });
        }

        let mut params = HashMap::new();
        params.insert("grant_type", "authorization_code");
        params.insert("code", code);
        params.insert("redirect_uri", &self.config.redirect_uri);
        params.insert("client_id", &self.config.client_id);
        params.insert("code_verifier", verifier.verifier());

        if let Some(ref client_secret) = self.config.client_secret {
            params.insert("client_secret", client_secret);
        }

        debug!("Exchanging authorization code for tokens");

        let response = self.post_form(&params).await?;

        if !response.is_success() {
            let status = response.status;
            let error_body = response
                .text()
                .unwrap_or_else(|_| "Unable to read error response".to_string());

            warn!(
                status = status,
                error = %error_body,
                "Token exchange failed while exchanging authorization code"
            );

            return Err(AuthError::InvalidAuthCode(format!(
                "Token endpoint returned {}: {}",
                status, error_body
            )));
        }

        let token_response: TokenResponse = response
            .json()
            .map_err(|e| AuthError::Other(format!("Failed to parse token response: {}", e)))?;
        let expires_in = token_response.lifetime().map_err(AuthError::InvalidAuthCode)?;

        info!(
            expires_in,
            has_refresh_token = token_response.refresh_token.is_some(),
            "Exchanged authorization code for tokens"
        );

        Ok(OAuthTokens::new(
            token_response.access_token,
            token_response.refresh_token,
            expires_in,
        ))
    }

    /// Refresh an access token using a refresh token.
    ///
    /// The returned tokens keep the old refresh token when the endpoint does
    /// not rotate it.
    #[instrument(skip(self, refresh_token))]
    pub async fn refresh_access_token(&self, refresh_token: &str) -> Result<OAuthTokens> {
        let mut params = HashMap::new();
        params.insert("grant_type", "refresh_token");
        params.insert("refresh_token", refresh_token);
        params.insert("client_id", &self.config.client_id);

        if let Some(ref client_secret) = self.config.client_secret {
            params.insert("client_secret", client_secret);
        }

        debug!("Refreshing access token");

        let response = self
            .post_form(&params)
            .await
            .map_err(|e| AuthError::TokenRefreshFailed(e.to_string()))?;

        if !response.is_success() {
            let status = response.status;
            let error_body = response
                .text()
                .unwrap_or_else(|_| "Unable to read error response".to_string());

            warn!(
                status = status,
                error = %error_body,
                "Token refresh rejected"
            );

            return Err(AuthError::TokenRefreshFailed(format!(
                "Token endpoint returned {}: {}",
                status, error_body
            )));
        }

        let token_response: TokenResponse = response
            .json()
            .map_err(|e| AuthError::TokenRefreshFailed(format!("Failed to parse token response: {}", e)))?;
        let expires_in = token_response.lifetime().map_err(AuthError::TokenRefreshFailed)?;

        info!(
            expires_in,
            "Refreshed access token"
        );

        Ok(OAuthTokens::new(
            token_response.access_token,
            token_response
                .refresh_token
                .or_else(|| Some(refresh_token.to_string())),
            expires_in,
        ))
    }

    async fn post_form(
        &self,
        params: &HashMap<&str, &str>,
    ) -> Result<bridge_traits::http::HttpResponse> {
        let encoded_body = serde_urlencoded::to_string(params)
            .map_err(|e| AuthError::Other(format!("Failed to encode token request: {}", e)))?;

        let request = HttpRequest::new(HttpMethod::Post, self.config.token_url.clone())
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(Bytes::from(encoded_body));

        self.http_client
            .execute(request)
            .await
            .map_err(|e| AuthError::NetworkError(e.to_string()))
    }
}

/// Token response from the OAuth token endpoint.
#[derive(Debug, Deserialize, Serialize)]
pub(crate) struct TokenResponse {
    pub(crate) access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) refresh_token: Option<String>,
    #[serde(default = "default_expires_in")]
    pub(crate) expires_in: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    token_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    scope: Option<String>,
}

/// Upper bound accepted for `expires_in`; Google issues one-hour tokens
const MAX_TOKEN_LIFETIME_SECS: i64 = 7 * 24 * 3600;

impl TokenResponse {
    /// `expires_in` checked against a plausible range
    pub(crate) fn lifetime(&self) -> std::result::Result<i64, String> {
        if (1..=MAX_TOKEN_LIFETIME_SECS).contains(&self.expires_in) {
            Ok(self.expires_in)
        } else {
            Err(format!("invalid expires_in: {}", self.expires_in))
        }
    }
}

fn default_expires_in() -> i64 {
    3600
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::http::HttpResponse;
    use mockall::mock;

    mock! {
        HttpClient {}

        #[async_trait]
        impl HttpClient for HttpClient {
            async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
            async fn download_stream(&self, request: HttpRequest) -> BridgeResult<Box<dyn tokio::io::AsyncRead + Send + Unpin>>;
        }
    }

    fn test_config() -> OAuthConfig {
        OAuthConfig {
            client_id: "test-client".to_string(),
            client_secret: Some("secret".to_string()),
            redirect_uri: "http://localhost".to_string(),
            scopes: vec!["scope1".to_string(), "scope2".to_string()],
            auth_url: "https://provider.com/auth".to_string(),
            token_url: "https://provider.com/token".to_string(),
        }
    }

    fn json_response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: HashMap::new(),
            body: Bytes::from(body.to_string()),
        }
    }

    #[test]
    fn test_pkce_verifier_generation() {
        let verifier = PkceVerifier::new();

        assert!(!verifier.verifier().is_empty());
        assert!(!verifier.state().is_empty());
        assert_eq!(verifier.challenge(), verifier.challenge());

        let verifier2 = PkceVerifier::new();
        assert_ne!(verifier.verifier(), verifier2.verifier());
        assert_ne!(verifier.state(), verifier2.state());
    }

    #[test]
    fn test_pkce_challenge_known_value() {
        // RFC 7636 appendix B
        let verifier = PkceVerifier {
            verifier: "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk".to_string(),
            state: "s".to_string(),
        };

        assert_eq!(
            verifier.challenge(),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
        );
    }

    #[test]
    fn test_build_auth_url() {
        let manager = OAuthFlowManager::new(test_config(), Arc::new(MockHttpClient::new()));
        let (url, verifier) = manager.build_auth_url().unwrap();

        assert!(url.starts_with("https://provider.com/auth?"));
        assert!(url.contains("client_id=test-client"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("scope=scope1+scope2") || url.contains("scope=scope1%20scope2"));
        assert!(url.contains(&format!("state={}", verifier.state())));
        assert!(url.contains("code_challenge_method=S256"));
        assert!(url.contains("access_type=offline"));
    }

    #[test]
    fn test_build_auth_url_invalid_url() {
        let mut config = test_config();
        config.auth_url = "not a valid url".to_string();

        let manager = OAuthFlowManager::new(config, Arc::new(MockHttpClient::new()));
        assert!(manager.build_auth_url().is_err());
    }

    #[test]
    fn test_config_from_client_secrets() {
        let secrets = ClientSecrets::from_json(
            r#"{"installed": {"client_id": "cid", "client_secret": "cs",
                "token_uri": "https://oauth2.googleapis.com/token",
                "redirect_uris": ["urn:ietf:wg:oauth:2.0:oob", "http://localhost"]}}"#,
        )
        .unwrap();

        let config = OAuthConfig::from_client_secrets(&secrets, vec!["s".to_string()]);
        assert_eq!(config.client_id, "cid");
        assert_eq!(config.redirect_uri, "urn:ietf:wg:oauth:2.0:oob");
        assert_eq!(config.token_url, "https://oauth2.googleapis.com/token");
    }

    #[test]
    fn test_authorization_response_from_redirect() {
        let response =
            AuthorizationResponse::from_redirect_url("http://localhost/?state=xyz&code=4/0Ab&scope=drive")
                .unwrap();
        assert_eq!(response.code, "4/0Ab");
        assert_eq!(response.state, "xyz");

        let denied = AuthorizationResponse::from_redirect_url("http://localhost/?error=access_denied");
        assert!(matches!(denied, Err(AuthError::InvalidAuthCode(_))));

        let missing = AuthorizationResponse::from_redirect_url("http://localhost/?state=xyz");
        assert!(missing.is_err());
    }

    #[tokio::test]
    async fn test_exchange_code_rejects_state_mismatch() {
        let mut mock = MockHttpClient::new();
        mock.expect_execute().times(0);

        let manager = OAuthFlowManager::new(test_config(), Arc::new(mock));
        let verifier = PkceVerifier::new();

        let result = manager.exchange_code("code", "forged", &verifier).await;
        assert!(matches!(result, Err(AuthError::StateMismatch { .. })));
    }

    #[tokio::test]
    async fn test_exchange_code_success() {
        let mut mock = MockHttpClient::new();
        mock.expect_execute()
            .times(1)
            .withf(|req| {
                let body = String::from_utf8_lossy(req.body.as_deref().unwrap_or_default()).to_string();
                req.url == "https://provider.com/token"
                    && body.contains("grant_type=authorization_code")
                    && body.contains("code_verifier=")
            })
            .returning(|_| {
                Ok(json_response(
                    200,
                    r#"{"access_token": "at", "refresh_token": "rt", "expires_in": 3599}"#,
                ))
            });

        let manager = OAuthFlowManager::new(test_config(), Arc::new(mock));
        let verifier = PkceVerifier::new();
        let state = verifier.state().to_string();

        let tokens = manager.exchange_code("code", &state, &verifier).await.unwrap();
        assert_eq!(tokens.access_token(), "at");
        assert_eq!(tokens.refresh_token(), Some("rt"));
    }

    #[tokio::test]
    async fn test_refresh_keeps_refresh_token() {
        let mut mock = MockHttpClient::new();
        mock.expect_execute()
            .times(1)
            .returning(|_| Ok(json_response(200, r#"{"access_token": "fresh"}"#)));

        let manager = OAuthFlowManager::new(test_config(), Arc::new(mock));
        let tokens = manager.refresh_access_token("old-refresh").await.unwrap();

        assert_eq!(tokens.access_token(), "fresh");
        assert_eq!(tokens.refresh_token(), Some("old-refresh"));
    }

    #[tokio::test]
    async fn test_refresh_failure_is_not_retried() {
        let mut mock = MockHttpClient::new();
        mock.expect_execute()
            .times(1)
            .returning(|_| Ok(json_response(503, "unavailable")));

        let manager = OAuthFlowManager::new(test_config(), Arc::new(mock));
        let result = manager.refresh_access_token("rt").await;

        match result {
            Err(AuthError::TokenRefreshFailed(msg)) => assert!(msg.contains("503")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_token_response_deserialization_minimal() {
        let response: TokenResponse = serde_json::from_str(r#"{"access_token": "token"}"#).unwrap();
        assert_eq!(response.access_token, "token");
        assert_eq!(response.refresh_token, None);
        assert_eq!(response.expires_in, 3600);
    }
}
