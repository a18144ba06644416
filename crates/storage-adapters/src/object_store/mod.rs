//! `ObjectStore` adapters, selected by cargo feature.

#[cfg(feature = "media-local")]
pub mod local;
#[cfg(feature = "media-s3")]
pub mod s3;

#[cfg(feature = "media-local")]
pub use local::LocalObjectStore;
#[cfg(feature = "media-s3")]
pub use s3::S3ObjectStore;
