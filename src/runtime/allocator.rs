//! Device memory allocation
//!
//! Device buffers are identified by stable [`BufferId`]s handed out by an arena,
//! never by raw addresses. A matrix handle records which buffer it points into and
//! at what element offset; whether the handle owns that buffer is a tag on the
//! handle, checked when it is released.

use crate::error::{Error, Result};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Global counter for buffer ids, unique across every arena in the process
static NEXT_BUFFER: AtomicU64 = AtomicU64::new(1);

/// Stable identifier of a device buffer
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct BufferId(u64);

impl BufferId {
    fn next() -> Self {
        Self(NEXT_BUFFER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw id value
    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }

    /// Create from raw value (for testing only)
    #[inline]
    pub const fn from_raw(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for BufferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Buffer({})", self.0)
    }
}

/// Device pointer: a buffer plus an element offset into it
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct DevicePtr {
    /// The buffer the data lives in
    pub buffer: BufferId,
    /// Offset into the buffer, in elements
    pub offset: usize,
}

impl DevicePtr {
    /// Pointer to the start of a buffer
    #[inline]
    pub const fn new(buffer: BufferId) -> Self {
        Self { buffer, offset: 0 }
    }

    /// Pointer `elems` elements further into the same buffer
    #[inline]
    pub const fn add(self, elems: usize) -> Self {
        Self {
            buffer: self.buffer,
            offset: self.offset + elems,
        }
    }
}

/// Memory allocator trait for runtime backends
pub trait Allocator: Clone + Send + Sync {
    /// Allocate a zero-filled buffer of `len` f32 elements
    fn allocate(&self, len: usize) -> Result<BufferId>;

    /// Free a buffer. Returns false if the buffer was not live.
    fn deallocate(&self, id: BufferId) -> bool;

    /// Get the total allocated bytes
    fn allocated_bytes(&self) -> usize {
        0 // Default: tracking not supported
    }

    /// Number of buffers currently allocated
    fn live_buffers(&self) -> usize {
        0
    }
}

/// Arena of host-resident buffers standing in for device memory
///
/// Clones share the same arena. Reads and writes go through element ranges of a
/// buffer; a range that falls outside a live buffer is reported as an error string
/// which the kernel library surfaces as its last device error.
#[derive(Clone, Default)]
pub struct ArenaAllocator {
    inner: Arc<ArenaInner>,
}

#[derive(Default)]
struct ArenaInner {
    buffers: Mutex<HashMap<BufferId, Vec<f32>>>,
    allocated: AtomicUsize,
    limit: Option<usize>,
}

impl ArenaAllocator {
    /// Create an arena without a memory limit
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an arena that refuses to hold more than `limit_bytes`
    pub fn with_limit(limit_bytes: Option<usize>) -> Self {
        Self {
            inner: Arc::new(ArenaInner {
                limit: limit_bytes,
                ..Default::default()
            }),
        }
    }

    /// Copy `len` elements starting at `ptr` out of the arena
    pub fn read(&self, ptr: DevicePtr, len: usize) -> std::result::Result<Vec<f32>, String> {
        let buffers = self.inner.buffers.lock();
        let buf = buffers
            .get(&ptr.buffer)
            .ok_or_else(|| format!("invalid device pointer: {} is not allocated", ptr.buffer))?;
        let end = range_end(ptr, len, buf.len())?;
        Ok(buf[ptr.offset..end].to_vec())
    }

    /// Write `data` into the arena starting at `ptr`
    pub fn write(&self, ptr: DevicePtr, data: &[f32]) -> std::result::Result<(), String> {
        let mut buffers = self.inner.buffers.lock();
        let buf = buffers
            .get_mut(&ptr.buffer)
            .ok_or_else(|| format!("invalid device pointer: {} is not allocated", ptr.buffer))?;
        let end = range_end(ptr, data.len(), buf.len())?;
        buf[ptr.offset..end].copy_from_slice(data);
        Ok(())
    }

    /// Whether `id` refers to a live buffer
    pub fn contains(&self, id: BufferId) -> bool {
        self.inner.buffers.lock().contains_key(&id)
    }
}

fn range_end(ptr: DevicePtr, len: usize, buf_len: usize) -> std::result::Result<usize, String> {
    let end = ptr.offset + len;
    if end > buf_len {
        return Err(format!(
            "out of bounds access: {}+{}..{} exceeds {} elements",
            ptr.buffer, ptr.offset, end, buf_len
        ));
    }
    Ok(end)
}

impl Allocator for ArenaAllocator {
    fn allocate(&self, len: usize) -> Result<BufferId> {
        let bytes = len * std::mem::size_of::<f32>();
        let used = self.inner.allocated.load(Ordering::Relaxed);
        if let Some(limit) = self.inner.limit {
            if used + bytes > limit {
                return Err(Error::Device(format!(
                    "out of memory: failed to allocate {bytes} bytes ({used} of {limit} in use)"
                )));
            }
        }

        let id = BufferId::next();
        self.inner.buffers.lock().insert(id, vec![0.0; len]);
        self.inner.allocated.fetch_add(bytes, Ordering::Relaxed);
        log::trace!("allocated {id} ({len} elements)");
        Ok(id)
    }

    fn deallocate(&self, id: BufferId) -> bool {
        match self.inner.buffers.lock().remove(&id) {
            Some(buf) => {
                let bytes = buf.len() * std::mem::size_of::<f32>();
                self.inner.allocated.fetch_sub(bytes, Ordering::Relaxed);
                log::trace!("freed {id}");
                true
            }
            None => false,
        }
    }

    fn allocated_bytes(&self) -> usize {
        self.inner.allocated.load(Ordering::Relaxed)
    }

    fn live_buffers(&self) -> usize {
        self.inner.buffers.lock().len()
    }
}

impl fmt::Debug for ArenaAllocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArenaAllocator")
            .field("buffers", &self.live_buffers())
            .field("allocated_bytes", &self.allocated_bytes())
            .field("limit", &self.inner.limit)
            .finish()
    }
}
