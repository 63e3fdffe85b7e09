//! Runtime backends for matrix computation
//!
//! This module defines the `Runtime` trait, the kernel-library boundary, and the
//! CPU reference backend.
//!
//! # Architecture
//!
//! ```text
//! Runtime (backend identity)
//! ├── Device (identifies a specific accelerator)
//! ├── Client (owns the memory arena, implements KernelLibrary)
//! │   └── KernelLibrary (flat catalog of status-returning entry points)
//! └── Allocator (buffers keyed by stable BufferIds)
//! ```

mod allocator;
pub mod kernel;
mod status;
pub mod traits;

pub mod cpu;

pub use allocator::{Allocator, ArenaAllocator, BufferId, DevicePtr};
pub use kernel::{
    Axis, BinaryOp, CompareOp, DerivOp, KernelLibrary, LossOp, MatDesc, NormConstraint,
    RngStreams, SampleOp, UnaryOp,
};
pub use status::Status;
pub use traits::{Device, Runtime, RuntimeClient};

/// Block until all outstanding device work issued through `client` has completed
///
/// Every kernel-library call is already synchronous; this barrier exists for
/// timing measurements and host reads not mediated by `sync_to_host`.
pub fn device_synchronize<R: Runtime>(client: &R::Client) {
    client.synchronize();
}
