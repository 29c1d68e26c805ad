//! # eds-core
//!
//! Core types and utilities for looking people up in an Enterprise Directory
//! Service (EDS).
//!
//! This crate provides the shared error type, the configuration collaborator that
//! turns environment variables into credentials, and the HTTP settings used by
//! the transport layer.
//!
//! ## Modules
//!
//! - [`error`] - Error taxonomy and structured error responses
//! - [`config`] - `EDS_*` environment configuration and [`Credentials`]
//! - [`client`] - HTTP transport settings and default timeouts

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod error;

// Re-export commonly used types
pub use config::{Credentials, EdsConfig};
pub use error::{Error, Result};
