//! # storage-adapters
//!
//! Adapter implementations of the `domains` ports: the media processor
//! (always compiled), object stores and database repositories (selected by
//! cargo feature, matching what a deployment actually runs).

pub mod media;
pub mod object_store;
pub mod repo;

pub use media::{MediaSettings, StandardMediaProcessor};
