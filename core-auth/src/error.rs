use bridge_traits::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    /// No usable credential source is configured (missing path or file)
    #[error("Credentials not configured: {0}")]
    CredentialsMissing(String),

    #[error("Invalid credential file {path}: {reason}")]
    InvalidCredentialFile { path: String, reason: String },

    #[error("Invalid authorization code: {0}")]
    InvalidAuthCode(String),

    #[error("OAuth state mismatch: expected {expected}, got {actual}")]
    StateMismatch { expected: String, actual: String },

    #[error("Token refresh failed: {0}")]
    TokenRefreshFailed(String),

    #[error("Token request failed: {0}")]
    TokenRequestFailed(String),

    #[error("Interactive consent unavailable: {0}")]
    ConsentUnavailable(String),

    #[error("Failed to sign assertion: {0}")]
    SigningFailed(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Secure storage unavailable: {0}")]
    SecureStorageUnavailable(String),

    #[error("Serialization failed ({context}): {message}")]
    SerializationFailed { context: String, message: String },

    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, AuthError>;
