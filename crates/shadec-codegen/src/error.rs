//! Error type for the compile driver, mirroring the host-facing status
//! codes.

use thiserror::Error;

/// Failure modes of a compile. Success carries the artifact instead.
#[derive(Debug, Error)]
pub enum CodegenError {
    /// Malformed input that never reached the compiler proper (missing
    /// source, bad options).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The shader failed to compile; details were sent to the diagnostic
    /// sink.
    #[error("invalid shader")]
    InvalidShader,

    /// An allocation failed inside the compiler core.
    #[error("out of memory")]
    OutOfMemory,

    /// A requested feature or target is not supported.
    #[error("not implemented: {0}")]
    NotImplemented(String),
}
