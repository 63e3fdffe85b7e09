//! The matrix handle and its views
//!
//! [`Matrix`] is a handle over a column-major float32 buffer in device memory,
//! optionally mirrored on the host. Views alias an owner's buffer without owning it.

mod core;
mod id;
mod operand;
mod shape;
mod view;

pub use core::{Matrix, Ownership};
pub use id::MatrixId;
pub use operand::Operand;
pub use shape::{Dim, Shape4D};
