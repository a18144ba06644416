//! kotori/crates/domains/src/lib.rs
//!
//! The central domain types and port definitions for the kotori
//! publication pipeline.

pub mod error;
pub mod models;
pub mod ports;
pub mod topics;

// Re-exporting for easier access in other crates
pub use error::*;
pub use models::*;
pub use ports::*;
pub use topics::*;
