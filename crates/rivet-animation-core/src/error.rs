//! Error taxonomy for the engine.
//!
//! Only conditions the caller must know about are errors: missing
//! renderer/decoder resources and malformed persisted data. A missing
//! bracket, a malformed prediction row, or a dangling object reference is
//! a skip, not an error.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// The stepper cannot proceed without this resource; fatal for the
    /// current tick.
    #[error("missing resources: {what}")]
    MissingResources { what: String },

    /// A video frame decode failed; fatal for the current tick.
    #[error("video decode failed for {id}: {reason}")]
    Decode { id: String, reason: String },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("invalid sequence: {0}")]
    InvalidSequence(String),
}
