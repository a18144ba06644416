//! Persistence adapters, selected by cargo feature.

#[cfg(feature = "db-postgres")]
pub mod postgres;

#[cfg(feature = "db-postgres")]
pub use postgres::{PgAttachmentRepo, PgPostRepo};
