//! Core trait for compute backends

use crate::runtime::{Allocator, KernelLibrary};

/// Core trait for compute backends
///
/// `Runtime` ties together the pieces a backend provides. It uses static dispatch
/// via generics, so matrices are parameterized by their runtime (`Matrix<R>`).
///
/// # Associated Types
///
/// - `Device`: Identifies a specific compute unit (e.g., GPU 0)
/// - `Client`: Owns the device memory arena and executes the kernel catalog
/// - `Allocator`: Hands out device buffers keyed by stable ids
pub trait Runtime: Clone + Send + Sync + 'static {
    /// Device identifier type
    type Device: super::Device;

    /// Client for dispatching operations
    type Client: super::RuntimeClient<Self> + KernelLibrary;

    /// Memory allocator type
    type Allocator: Allocator;

    /// Human-readable name of this runtime
    fn name() -> &'static str;

    /// Get the default device
    fn default_device() -> Self::Device;

    /// Get the default client for a device
    fn default_client(device: &Self::Device) -> Self::Client;
}
