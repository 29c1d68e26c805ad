//! # eds-user
//!
//! Resolve Enterprise Directory Service (EDS) person entries into flat,
//! application-facing records.
//!
//! A [`DirectoryClient`] performs one authenticated `GET {base_url}/{user_id}`,
//! keeps the parsed DSML response, and resolves the fields of an
//! [`AttributeMapping`] into a [`DirectoryRecord`]. Name fields prefer the
//! directory's `preferred*` attributes and fall back to the legal ones.
//!
//! ```no_run
//! use eds_core::EdsConfig;
//! use eds_user::DirectoryClient;
//!
//! # async fn run() -> eds_core::Result<()> {
//! let config = EdsConfig::from_env()?;
//! let record = DirectoryClient::retrieve_by_id(&config, "jdavis").await?;
//! println!("{:?}", record.get_str("email"));
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(test), deny(missing_docs))]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod mapping;
pub mod record;
pub mod resolver;
pub mod transport;

pub use client::DirectoryClient;
pub use mapping::{AttributeMapping, DEFAULT_ATTRIBUTES};
pub use record::{DirectoryRecord, FieldValue};
pub use resolver::{preferred_with_fallback, FieldOverride, FieldResolver, OverrideRegistry};
pub use transport::{HttpTransport, OfflineTransport, Transport};
