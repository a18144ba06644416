//! # PipelineError
//!
//! Centralized error handling for the kotori publication pipeline.
//! Every stage returns `PipelineResult` so a failure in one stage
//! short-circuits the stages behind it instead of unwinding through them.

use thiserror::Error;

/// The primary error type threaded through every pipeline stage.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Resource not found (e.g., Attachment, Post)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// User-correctable rejection (oversize file, disallowed type,
    /// topic-rule violation). The message tells the user what to fix.
    #[error("validation error: {0}")]
    Validation(String),

    /// Internal media failure (decode, conversion, compositing, transcoder
    /// exit status). Logged with context, surfaced generically.
    #[error("media processing failed: {0}")]
    Processing(String),

    /// Object store put/remove failure.
    #[error("object storage failure: {0}")]
    Storage(String),

    /// Database statement affected an unexpected number of rows, or the
    /// statement itself failed. A consistency anomaly, not a "not found".
    #[error("persistence anomaly: {0}")]
    Persistence(String),
}

impl PipelineError {
    /// True when the caller can fix the request and resubmit.
    pub fn is_user_correctable(&self) -> bool {
        matches!(self, PipelineError::Validation(_) | PipelineError::NotFound(_, _))
    }
}

/// A specialized Result type for pipeline stages.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
