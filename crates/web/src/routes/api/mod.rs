//! JSON API routes.

pub mod admin;
pub mod profile;
