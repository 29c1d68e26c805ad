//! DSML (Directory Service Markup Language) response handling.
//!
//! A [`ResponseDocument`] wraps one parsed directory response and answers
//! attribute-value queries through a [`QueryPattern`]. Missing attributes are
//! reported as empty results rather than errors.

#![deny(missing_docs)]

mod document;
pub mod query;

pub use document::{ResponseDocument, MAX_DEPTH};
pub use query::{QueryPattern, DSML_VALUE_QUERY};

/// Convenient result alias that reuses the core error type.
pub type Result<T> = eds_core::Result<T>;
