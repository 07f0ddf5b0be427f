//! Core types for HealthCompanion.

pub mod email;
pub mod id;
pub mod locale;

pub use email::{Email, EmailError};
pub use id::{UserId, UserIdError};
pub use locale::{Locale, UnsupportedLocale};
