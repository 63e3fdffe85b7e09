//! Reference kernels for the CPU backend
//!
//! Kernels are plain functions over the memory arena. They report failures as a
//! [`Fault`], which the client turns into a native [`Status`] (recording the
//! message of device faults as its last error).

pub(crate) mod broadcast;
pub(crate) mod columns;
pub(crate) mod elementwise;
pub(crate) mod linalg;
pub(crate) mod memory;
pub(crate) mod random;
pub(crate) mod reduce;
pub(crate) mod softmax;

use crate::runtime::{ArenaAllocator, MatDesc, Status};

/// Why a kernel did not complete
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Fault {
    /// A validation failure with a fixed native code
    Status(Status),
    /// A device-level failure with a message for `last_error`
    Device(String),
}

impl From<String> for Fault {
    fn from(message: String) -> Self {
        Fault::Device(message)
    }
}

pub(crate) type KernelResult<T = ()> = std::result::Result<T, Fault>;

/// Fail with `status` unless `cond` holds
#[inline]
pub(crate) fn ensure(cond: bool, status: Status) -> KernelResult {
    if cond {
        Ok(())
    } else {
        Err(Fault::Status(status))
    }
}

/// Copy a matrix's elements out of the arena (column-major)
pub(crate) fn load(arena: &ArenaAllocator, mat: &MatDesc) -> KernelResult<Vec<f32>> {
    ensure(mat.on_device, Status::NOT_ON_DEVICE)?;
    Ok(arena.read(mat.ptr, mat.len())?)
}

/// Write a complete result for `mat` into the arena
///
/// Destinations must already be resident; only uploads may target a matrix that is
/// not.
pub(crate) fn store(arena: &ArenaAllocator, mat: &MatDesc, data: &[f32]) -> KernelResult {
    debug_assert_eq!(data.len(), mat.len());
    ensure(mat.on_device, Status::NOT_ON_DEVICE)?;
    Ok(arena.write(mat.ptr, data)?)
}

/// Compute `len` output elements from their linear index
pub(crate) fn map_elements<F>(len: usize, f: F) -> Vec<f32>
where
    F: Fn(usize) -> f32 + Send + Sync,
{
    #[cfg(feature = "rayon")]
    {
        use rayon::prelude::*;
        (0..len).into_par_iter().map(f).collect()
    }
    #[cfg(not(feature = "rayon"))]
    {
        (0..len).map(f).collect()
    }
}

/// Read a float-encoded column index, resolving negative values from the end
///
/// Returns `None` for indices outside `[-cols, cols - 1]`.
pub(crate) fn resolve_index(value: f32, cols: usize) -> Option<usize> {
    if !value.is_finite() {
        return None;
    }
    let idx = value as i64;
    let cols = cols as i64;
    let idx = if idx < 0 { idx + cols } else { idx };
    if (0..cols).contains(&idx) {
        Some(idx as usize)
    } else {
        None
    }
}
