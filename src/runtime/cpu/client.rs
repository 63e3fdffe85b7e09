//! CPU client and allocator implementation

use super::device::CpuDevice;
use super::runtime::CpuRuntime;
use crate::runtime::{ArenaAllocator, Device, RuntimeClient};
use parking_lot::Mutex;
use std::sync::Arc;

/// CPU client for operation dispatch
///
/// Clones share one memory arena and one last-error slot.
#[derive(Clone, Debug)]
pub struct CpuClient {
    pub(crate) device: CpuDevice,
    allocator: CpuAllocator,
    last_error: Arc<Mutex<String>>,
}

impl CpuClient {
    /// Create a new CPU client with a fresh memory arena
    pub fn new(device: CpuDevice) -> Self {
        let allocator = ArenaAllocator::with_limit(device.memory_limit());
        log::debug!("created client for {}", device.name());
        Self {
            device,
            allocator,
            last_error: Arc::new(Mutex::new(String::new())),
        }
    }

    pub(crate) fn arena(&self) -> &CpuAllocator {
        &self.allocator
    }

    pub(crate) fn set_last_error(&self, message: String) {
        log::trace!("device error: {message}");
        *self.last_error.lock() = message;
    }

    pub(crate) fn last_error_message(&self) -> String {
        self.last_error.lock().clone()
    }
}

impl RuntimeClient<CpuRuntime> for CpuClient {
    fn device(&self) -> &CpuDevice {
        &self.device
    }

    fn synchronize(&self) {
        // CPU operations are synchronous, nothing to do
    }

    fn allocator(&self) -> &CpuAllocator {
        &self.allocator
    }
}

/// CPU-specific allocator type alias
pub type CpuAllocator = ArenaAllocator;
