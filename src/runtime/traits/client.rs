//! Client owning a device's memory arena

use super::Runtime;
use crate::runtime::Allocator;

/// Handle to one device's memory and kernel catalog
///
/// Clones share the same arena, so every matrix keeps a clone of the client that
/// created it.
pub trait RuntimeClient<R: Runtime>: Clone + Send + Sync {
    /// The device this client allocates on
    fn device(&self) -> &R::Device;

    /// Block until all issued kernels have completed
    fn synchronize(&self);

    /// Arena holding this device's buffers
    fn allocator(&self) -> &R::Allocator;

    /// Bytes currently held by live buffers
    fn memory_in_use(&self) -> usize {
        self.allocator().allocated_bytes()
    }
}
