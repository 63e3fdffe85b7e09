//! CPU runtime implementation
//!
//! The CPU runtime keeps "device" buffers in a host-memory arena and implements the
//! full kernel catalog against it. It is the reference backend used by the tests
//! and the default runtime of the crate.
//!
//! # Kernel discipline
//!
//! Every kernel copies its operands out of the arena, computes the complete result,
//! and only then writes the destination. Aliased operands (including the default
//! in-place `target == source`) are therefore always legal, and a kernel that
//! fails validation never leaves a partially written output behind.

mod client;
mod device;
mod kernel;
pub(crate) mod kernels;
mod runtime;

pub use client::{CpuAllocator, CpuClient};
pub use device::CpuDevice;
pub use runtime::CpuRuntime;
