//! Terminal consent prompt
//!
//! Prints the authorization URL and waits for the operator to paste the URL
//! the browser was redirected to.

use async_trait::async_trait;
use core_auth::{AuthError, AuthorizationResponse, ConsentPrompt};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;
use tracing::info;

/// [`ConsentPrompt`] over a line-oriented reader and writer
///
/// [`TerminalConsentPrompt::stdio`] uses the process terminal; tests pass
/// in-memory buffers.
pub struct TerminalConsentPrompt<R, W> {
    io: Mutex<(R, W)>,
}

impl TerminalConsentPrompt<BufReader<tokio::io::Stdin>, tokio::io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }
}

impl<R, W> TerminalConsentPrompt<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            io: Mutex::new((reader, writer)),
        }
    }
}

#[async_trait]
impl<R, W> ConsentPrompt for TerminalConsentPrompt<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn authorize(&self, auth_url: &str) -> core_auth::Result<AuthorizationResponse> {
        let mut io = self.io.lock().await;
        let (reader, writer) = &mut *io;

        let banner = format!(
            "Open this URL in a browser and grant access to Google Drive:\n\n  {}\n\n\
             Paste the full URL you were redirected to: ",
            auth_url
        );
        writer
            .write_all(banner.as_bytes())
            .await
            .map_err(|e| AuthError::ConsentUnavailable(e.to_string()))?;
        writer
            .flush()
            .await
            .map_err(|e| AuthError::ConsentUnavailable(e.to_string()))?;

        info!("Waiting for pasted redirect URL");

        let mut line = String::new();
        let read = reader
            .read_line(&mut line)
            .await
            .map_err(|e| AuthError::ConsentUnavailable(e.to_string()))?;
        if read == 0 {
            return Err(AuthError::ConsentUnavailable(
                "input closed before a redirect URL was entered".to_string(),
            ));
        }

        AuthorizationResponse::from_redirect_url(line.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reads_pasted_redirect() {
        let input: &[u8] = b"http://localhost/?state=abc&code=4/xyz&scope=drive.file\n";
        let prompt = TerminalConsentPrompt::new(input, Vec::new());

        let response = prompt
            .authorize("https://accounts.google.com/o/oauth2/auth?client_id=x")
            .await
            .unwrap();

        assert_eq!(response.code, "4/xyz");
        assert_eq!(response.state, "abc");

        let io = prompt.io.lock().await;
        let printed = String::from_utf8(io.1.clone()).unwrap();
        assert!(printed.contains("https://accounts.google.com/o/oauth2/auth?client_id=x"));
    }

    #[tokio::test]
    async fn test_closed_input_is_consent_unavailable() {
        let input: &[u8] = b"";
        let prompt = TerminalConsentPrompt::new(input, Vec::new());

        assert!(matches!(
            prompt.authorize("https://example.com/auth").await,
            Err(AuthError::ConsentUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_denied_consent() {
        let input: &[u8] = b"http://localhost/?error=access_denied\n";
        let prompt = TerminalConsentPrompt::new(input, Vec::new());

        assert!(matches!(
            prompt.authorize("https://example.com/auth").await,
            Err(AuthError::InvalidAuthCode(_))
        ));
    }
}
