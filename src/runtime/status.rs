//! Native status codes returned by kernel-library entry points
//!
//! Every entry point in [`super::KernelLibrary`] returns a [`Status`]. Zero means
//! success; negative codes enumerate the failure kinds of the native layer. Callers
//! must translate a status with [`Status::check`] before looking at any output the
//! entry point may have produced.

use crate::error::{Error, Result};
use std::fmt;

/// Integer status code returned by the kernel library
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Status(i32);

impl Status {
    /// The call completed
    pub const SUCCESS: Status = Status(0);
    /// Incompatible matrix dimensions
    pub const INCOMPATIBLE_DIMENSIONS: Status = Status(-1);
    /// The BLAS layer failed
    pub const BACKEND: Status = Status(-2);
    /// Device failure; details available from `last_error`
    pub const DEVICE: Status = Status(-3);
    /// Operation not supported on views
    pub const VIEW: Status = Status(-4);
    /// Operation not supported on transposed matrices
    pub const TRANSPOSED: Status = Status(-5);
    /// Unspecified failure
    pub const GENERIC: Status = Status(-6);
    /// Operands have incompatible transposedness
    pub const TRANSPOSEDNESS: Status = Status(-7);
    /// Matrix is not resident in device memory
    pub const NOT_ON_DEVICE: Status = Status(-8);
    /// Operation not supported
    pub const UNSUPPORTED: Status = Status(-9);

    /// Wrap a raw native code
    #[inline]
    pub const fn from_raw(code: i32) -> Self {
        Self(code)
    }

    /// The raw native code
    #[inline]
    pub const fn raw(self) -> i32 {
        self.0
    }

    /// Whether the call completed
    #[inline]
    pub const fn is_success(self) -> bool {
        self.0 == 0
    }

    /// Translate this status into a typed result.
    ///
    /// `last_error` is only consulted for [`Status::DEVICE`], where the device layer
    /// keeps a human-readable description of the most recent failure.
    pub fn check(self, last_error: impl FnOnce() -> String) -> Result<()> {
        let err = match self {
            Self::SUCCESS => return Ok(()),
            Self::INCOMPATIBLE_DIMENSIONS => Error::DimensionMismatch,
            Self::BACKEND => Error::Backend,
            Self::DEVICE => Error::Device(last_error()),
            Self::VIEW => Error::UnsupportedOnView,
            Self::TRANSPOSED => Error::UnsupportedOnTransposed,
            Self::TRANSPOSEDNESS => Error::TransposednessMismatch,
            Self::NOT_ON_DEVICE => Error::NotResident,
            Self::UNSUPPORTED => Error::Unsupported,
            Self(code) => Error::Unspecified(code),
        };
        log::debug!("kernel library returned {self}: {err}");
        Err(err)
    }
}

impl fmt::Debug for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Status({})", self.0)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "status {}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_message() -> String {
        panic!("last_error must only be queried for device failures")
    }

    #[test]
    fn test_success_translates_to_ok() {
        assert!(Status::SUCCESS.check(no_message).is_ok());
        assert!(Status::SUCCESS.is_success());
    }

    #[test]
    fn test_taxonomy() {
        let cases = [
            (Status::INCOMPATIBLE_DIMENSIONS, Error::DimensionMismatch),
            (Status::BACKEND, Error::Backend),
            (Status::VIEW, Error::UnsupportedOnView),
            (Status::TRANSPOSED, Error::UnsupportedOnTransposed),
            (Status::GENERIC, Error::Unspecified(-6)),
            (Status::TRANSPOSEDNESS, Error::TransposednessMismatch),
            (Status::NOT_ON_DEVICE, Error::NotResident),
            (Status::UNSUPPORTED, Error::Unsupported),
        ];
        for (status, expected) in cases {
            assert_eq!(status.check(no_message), Err(expected), "{status:?}");
        }
    }

    #[test]
    fn test_device_error_queries_last_error() {
        let err = Status::DEVICE.check(|| "invalid device pointer".to_string());
        assert_eq!(err, Err(Error::Device("invalid device pointer".to_string())));
    }

    #[test]
    fn test_unknown_code_is_unspecified() {
        assert_eq!(
            Status::from_raw(-42).check(no_message),
            Err(Error::Unspecified(-42))
        );
    }
}
