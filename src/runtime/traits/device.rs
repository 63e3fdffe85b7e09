//! Accelerator identity

/// An accelerator that matrices can be allocated on
pub trait Device: Clone + Send + Sync + 'static {
    /// Ordinal of this accelerator
    fn id(&self) -> usize;

    /// Bytes of device memory available to the arena, `None` if unbounded
    fn memory_limit(&self) -> Option<usize> {
        None
    }

    /// Human-readable name used in logs
    fn name(&self) -> String {
        format!("device:{}", self.id())
    }
}
