//! # services
//!
//! The application layer of the kotori publication pipeline: text
//! sanitation, per-topic validation, random decoration, upload
//! classification, and the orchestrating publication service. Everything
//! here talks to the outside world through the `domains` ports only.

pub mod decoration;
pub mod detect;
pub mod publication;
pub mod sanitize;
pub mod validator;

pub use publication::{CreatePostRequest, Publication, PublicationService};
