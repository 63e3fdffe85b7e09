//! CPU device implementation

use crate::runtime::Device;

/// CPU device standing in for an accelerator
///
/// Device memory is an arena of host buffers. An optional memory limit makes
/// allocation failures reproducible.
#[derive(Clone, Debug, Default)]
pub struct CpuDevice {
    id: usize,
    memory_limit: Option<usize>,
}

impl CpuDevice {
    /// Create a new CPU device
    pub fn new() -> Self {
        Self {
            id: 0,
            memory_limit: None,
        }
    }

    /// Create a device whose arena refuses to grow beyond `bytes`
    pub fn with_memory_limit(bytes: usize) -> Self {
        Self {
            id: 0,
            memory_limit: Some(bytes),
        }
    }
}

impl Device for CpuDevice {
    fn id(&self) -> usize {
        self.id
    }

    fn memory_limit(&self) -> Option<usize> {
        self.memory_limit
    }

    fn name(&self) -> String {
        "cpu".to_string()
    }
}
