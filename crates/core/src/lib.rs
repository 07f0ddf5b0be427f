//! HealthCompanion Core - Shared types library.
//!
//! Types used by the web crate and its integration tests:
//! - [`Locale`] - the closed set of supported interface languages
//! - [`UserId`] - identity-provider user identifiers
//! - [`Email`] - validated e-mail addresses
//!
//! The core crate performs no I/O: no HTTP clients, no environment reads.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
