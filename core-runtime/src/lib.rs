//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the document storage core:
//! - Logging and tracing infrastructure
//! - Storage configuration (builder and environment loading)
//!
//! ## Overview
//!
//! This crate contains the runtime utilities that the auth and provider crates
//! depend on. It establishes the logging conventions, including the dedicated
//! target that marks mock substitutions, and the configuration shape consumed
//! by the storage manager.

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
