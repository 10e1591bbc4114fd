//! # Host Bridge Traits
//!
//! Platform abstraction traits that the document storage core depends on.
//!
//! ## Overview
//!
//! This crate defines the contract between the storage core and the host that
//! embeds it. The core never opens sockets or files on its own: every remote
//! call goes through [`HttpClient`](http::HttpClient) and every persisted
//! credential goes through [`SecureStore`](storage::SecureStore). Tests swap
//! both for in-memory doubles, which is how "no network I/O" is verified.
//!
//! ## Traits
//!
//! - [`HttpClient`](http::HttpClient) - Async HTTP request execution and streamed downloads
//! - [`SecureStore`](storage::SecureStore) - Persistence for cached credential blobs
//! - [`Clock`](time::Clock) - Time source for deterministic expiry checks
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type. Host
//! implementations should convert platform-specific errors to `BridgeError`
//! and keep the original message, since it is surfaced to operators.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` bounds; a single instance is shared
//! by every concurrent request handler.
//!
//! ## Examples
//!
//! ### Implementing HttpClient
//!
//! ```ignore
//! use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
//! use bridge_traits::error::Result;
//! use async_trait::async_trait;
//!
//! pub struct MyHttpClient {
//!     client: reqwest::Client,
//! }
//!
//! #[async_trait]
//! impl HttpClient for MyHttpClient {
//!     async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
//!         todo!()
//!     }
//!
//!     async fn download_stream(&self, request: HttpRequest) -> Result<Box<dyn tokio::io::AsyncRead + Send + Unpin>> {
//!         todo!()
//!     }
//! }
//! ```

pub mod error;
pub mod http;
pub mod storage;
pub mod time;

pub use error::BridgeError;

pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
pub use storage::SecureStore;
pub use time::{Clock, LogLevel, SystemClock};
