//! Error types for gpumat
//!
//! Every failure a matrix operation can report is one of these variants. Failures
//! coming back from the kernel library arrive as native status codes and are
//! translated by [`crate::runtime::Status::check`]; `Precondition` failures are raised
//! locally before any kernel is invoked.

use thiserror::Error;

/// Result type alias using gpumat's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in gpumat operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Operand shapes or lengths are incompatible for the requested operation
    #[error("Incompatible matrix dimensions.")]
    DimensionMismatch,

    /// The compute backend (BLAS layer) reported an internal failure
    #[error("Backend error.")]
    Backend,

    /// Accelerator-level failure, with the device layer's last error message
    #[error("Device error: {0}")]
    Device(String),

    /// Operation needs owning storage but was given an aliasing view
    #[error("Operation not supported on views.")]
    UnsupportedOnView,

    /// Operation cannot service a transposed operand
    #[error("Operation not supported on transposed matrices.")]
    UnsupportedOnTransposed,

    /// Operands disagree in transposedness in a way the operation cannot reconcile
    #[error("Incompatible transposedness.")]
    TransposednessMismatch,

    /// Operation required device-resident data but the matrix has none
    #[error("Matrix is not in device memory.")]
    NotResident,

    /// Operation not implemented for the given input combination
    #[error("Operation not supported.")]
    Unsupported,

    /// Unspecified failure reported by the kernel library
    #[error("Unspecified kernel failure (status {0})")]
    Unspecified(i32),

    /// A check performed before calling into the kernel library failed
    #[error("Precondition failed in '{op}': {reason}")]
    Precondition {
        /// The operation that rejected its arguments
        op: &'static str,
        /// Why the arguments were rejected
        reason: String,
    },
}

impl Error {
    /// Create a local precondition error
    pub fn precondition(op: &'static str, reason: impl Into<String>) -> Self {
        Self::Precondition {
            op,
            reason: reason.into(),
        }
    }

    /// Whether this error was raised without a device round-trip
    pub fn is_local(&self) -> bool {
        matches!(self, Self::Precondition { .. })
    }
}
