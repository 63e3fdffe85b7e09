//! # gpumat
//!
//! **Column-major f32 matrices on an accelerator, with host mirrors and aliasing views.**
//!
//! A [`Matrix`](matrix::Matrix) is a handle over a flat column-major buffer that can
//! live on the device, on the host, or both. Handles either own their storage or alias
//! another handle's storage (transposed views, column slices); views never free.
//! Every operation is one synchronous call into a [`KernelLibrary`](runtime::KernelLibrary)
//! whose integer status is translated into a typed [`Error`](error::Error).
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use gpumat::prelude::*;
//!
//! let client = CpuRuntime::default_client(&CpuRuntime::default_device());
//! let a = Matrix::<CpuRuntime>::from_row_major(&client, &[1.0, 2.0, 3.0, 4.0], 2, 2)?;
//! let b = a.transposed_view();
//!
//! let c = a.dot(&b, 1.0)?;
//! c.add(1.0, None)?;
//! let col_sums = c.sum(Axis::Rows, 1.0)?;
//! ```
//!
//! ## Feature Flags
//!
//! - `rayon` (default): multi-threaded reference kernels

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod context;
pub mod error;
pub mod matrix;
mod ops;
pub mod random;
pub mod runtime;

/// Default backend
pub type DefaultRuntime = runtime::cpu::CpuRuntime;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::context::Context;
    pub use crate::error::{Error, Result};
    pub use crate::matrix::{Dim, Matrix, MatrixId, Operand, Ownership, Shape4D};
    pub use crate::random::RandomState;
    pub use crate::runtime::cpu::CpuRuntime;
    pub use crate::runtime::{
        Axis, DerivOp, Device, NormConstraint, Runtime, RuntimeClient, UnaryOp,
        device_synchronize,
    };
}
