//! Core Matrix handle type

use super::MatrixId;
use super::operand::Operand;
use super::shape::{Dim, Geometry, Shape4D};
use crate::error::{Error, Result};
use crate::runtime::{
    Allocator, BufferId, DevicePtr, KernelLibrary, MatDesc, Runtime, RuntimeClient, Status,
};
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Whether a handle owns its device buffer
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Ownership {
    /// The handle allocated the buffer and frees it on release
    Owning,
    /// The handle aliases storage owned by `root`
    Borrowed {
        /// The owning handle at the root of the view chain
        root: MatrixId,
    },
}

impl Ownership {
    /// Whether this is [`Ownership::Owning`]
    #[inline]
    pub fn is_owning(self) -> bool {
        matches!(self, Ownership::Owning)
    }
}

/// Host side of a handle's data
///
/// Device validity is tracked separately, once per root buffer, so every view of
/// the buffer sees an upload made through any other handle.
#[derive(Debug, Default)]
pub(crate) struct Residency {
    /// Host mirror, allocated on first `sync_to_host` or staged at creation
    pub host: Option<Vec<f32>>,
}

/// Column-major float32 matrix stored in device memory
///
/// A `Matrix` either owns a device buffer or aliases one owned by another handle:
///
/// - **Owning** handles are created by the constructors below and free their buffer
///   exactly once, on [`release`](Self::release) or drop.
/// - **Views** come from [`transposed_view`](Self::transposed_view) and
///   [`column_slice`](Self::column_slice) and never free anything.
///
/// Operations take `&self`: device memory is mutated through the kernel library,
/// and shape changes go through state shared with the transposed view.
///
/// # Lifecycle
///
/// ```text
/// create ──► DeviceOnly / HostAndDevice ──► sync_* ──► HostAndDevice ──► release ──► Released
/// ```
///
/// Using a released owning handle panics. A view whose owner has been released
/// fails with [`Error::Device`].
pub struct Matrix<R: Runtime> {
    id: MatrixId,
    client: R::Client,
    buffer: DevicePtr,
    geometry: Arc<RwLock<Geometry>>,
    transposed: bool,
    ownership: Ownership,
    residency: Arc<Mutex<Residency>>,
    device_valid: Arc<AtomicBool>,
    released: AtomicBool,
}

impl<R: Runtime> Matrix<R> {
    fn owning(
        client: &R::Client,
        buffer: BufferId,
        geometry: Geometry,
        residency: Residency,
        on_device: bool,
    ) -> Self {
        Self {
            id: MatrixId::new(),
            client: client.clone(),
            buffer: DevicePtr::new(buffer),
            geometry: Arc::new(RwLock::new(geometry)),
            transposed: false,
            ownership: Ownership::Owning,
            residency: Arc::new(Mutex::new(residency)),
            device_valid: Arc::new(AtomicBool::new(on_device)),
            released: AtomicBool::new(false),
        }
    }

    /// Build a view over `buffer`, borrowing from this handle's root
    pub(super) fn view(
        &self,
        buffer: DevicePtr,
        geometry: Arc<RwLock<Geometry>>,
        transposed: bool,
        residency: Arc<Mutex<Residency>>,
    ) -> Self {
        Self {
            id: MatrixId::new(),
            client: self.client.clone(),
            buffer,
            geometry,
            transposed,
            ownership: Ownership::Borrowed {
                root: self.root_id(),
            },
            residency,
            device_valid: Arc::clone(&self.device_valid),
            released: AtomicBool::new(false),
        }
    }

    /// Allocate a zero-filled `(rows, cols)` matrix on the device
    pub fn empty(client: &R::Client, rows: usize, cols: usize) -> Result<Self> {
        let len = checked_len("empty", rows, cols)?;
        let buffer = client.allocator().allocate(len)?;
        let geometry = Geometry::new(rows, cols);
        Ok(Self::owning(client, buffer, geometry, Residency::default(), true))
    }

    /// Allocate a zero-filled matrix for a 2-, 4- or 5-D shape
    ///
    /// The physical extent is `(dims[0], product of the rest)` and `dims` becomes the
    /// shape overlay.
    pub fn empty_nd(client: &R::Client, dims: &[usize]) -> Result<Self> {
        let shape = Shape4D::from_dims(dims)?;
        let [rows, b, c, d] = shape.0;
        let cols = b
            .checked_mul(c)
            .and_then(|bc| bc.checked_mul(d))
            .ok_or_else(|| Error::precondition("empty_nd", format!("{dims:?} overflows")))?;
        let mat = Self::empty(client, rows, cols)?;
        mat.geometry.write().shape4d = shape;
        Ok(mat)
    }

    /// Allocate a zero-filled matrix with the same physical extent and overlay
    pub fn empty_like(&self) -> Result<Self> {
        let geometry = self.geometry.read().clone();
        let mat = Self::empty(&self.client, geometry.rows, geometry.cols)?;
        *mat.geometry.write() = geometry;
        Ok(mat)
    }

    /// Stage a column-major host array as a new `(rows, cols)` matrix
    ///
    /// With `copy_to_device` the data is uploaded immediately; otherwise the matrix
    /// stays host-only until [`sync_to_device`](Self::sync_to_device).
    pub fn from_host(
        client: &R::Client,
        data: Vec<f32>,
        rows: usize,
        cols: usize,
        copy_to_device: bool,
    ) -> Result<Self> {
        if data.len() != checked_len("from_host", rows, cols)? {
            return Err(Error::precondition(
                "from_host",
                format!("{} elements cannot fill ({rows}, {cols})", data.len()),
            ));
        }
        let buffer = client.allocator().allocate(data.len())?;
        let residency = Residency { host: Some(data) };
        let mat = Self::owning(client, buffer, Geometry::new(rows, cols), residency, false);
        if copy_to_device {
            mat.sync_to_device()?;
        }
        Ok(mat)
    }

    /// Stage a row-major host array, converting it to column-major first
    pub fn from_row_major(
        client: &R::Client,
        data: &[f32],
        rows: usize,
        cols: usize,
    ) -> Result<Self> {
        if data.len() != checked_len("from_row_major", rows, cols)? {
            return Err(Error::precondition(
                "from_row_major",
                format!("{} elements cannot fill ({rows}, {cols})", data.len()),
            ));
        }
        let col_major = (0..data.len())
            .map(|i| data[(i % rows) * cols + i / rows])
            .collect();
        Self::from_host(client, col_major, rows, cols, true)
    }

    // ===== Accessors =====

    /// Unique id of this handle
    #[inline]
    pub fn id(&self) -> MatrixId {
        self.id
    }

    /// The client this matrix was created with
    #[inline]
    pub fn client(&self) -> &R::Client {
        &self.client
    }

    /// Logical `(rows, cols)`, swapped for transposed views
    pub fn shape(&self) -> (usize, usize) {
        let (rows, cols) = self.physical_shape();
        if self.transposed { (cols, rows) } else { (rows, cols) }
    }

    /// Allocated `(rows, cols)` extent
    pub fn physical_shape(&self) -> (usize, usize) {
        let g = self.geometry.read();
        (g.rows, g.cols)
    }

    /// Logical 4-D shape overlay
    pub fn shape4d(&self) -> Shape4D {
        self.geometry.read().shape4d
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.geometry.read().len()
    }

    /// Whether the matrix has no elements
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether logical rows and columns are swapped
    #[inline]
    pub fn is_transposed(&self) -> bool {
        self.transposed
    }

    /// Ownership of the device buffer
    #[inline]
    pub fn ownership(&self) -> Ownership {
        self.ownership
    }

    /// Whether this handle aliases storage it does not own
    #[inline]
    pub fn is_view(&self) -> bool {
        !self.ownership.is_owning()
    }

    /// Id of the owning handle whose storage this handle uses
    pub fn root_id(&self) -> MatrixId {
        match self.ownership {
            Ownership::Owning => self.id,
            Ownership::Borrowed { root } => root,
        }
    }

    /// Whether the device copy holds valid data
    ///
    /// Shared by every handle on the same root buffer.
    pub fn on_device(&self) -> bool {
        self.device_valid.load(Ordering::Acquire)
    }

    /// Whether a host mirror exists
    pub fn on_host(&self) -> bool {
        self.residency.lock().host.is_some()
    }

    /// Whether this owning handle has freed its storage
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    pub(crate) fn geometry(&self) -> &Arc<RwLock<Geometry>> {
        &self.geometry
    }

    pub(crate) fn residency(&self) -> &Arc<Mutex<Residency>> {
        &self.residency
    }

    pub(crate) fn device_ptr(&self) -> DevicePtr {
        self.assert_live();
        self.buffer
    }

    fn assert_live(&self) {
        assert!(!self.is_released(), "{} used after release", self.id);
    }

    fn desc_with(&self, residency: &Residency) -> MatDesc {
        self.assert_live();
        let g = self.geometry.read();
        MatDesc {
            ptr: self.buffer,
            rows: g.rows,
            cols: g.cols,
            is_trans: self.transposed,
            on_device: self.on_device(),
            on_host: residency.host.is_some(),
            owns_data: self.ownership.is_owning(),
        }
    }

    /// Descriptor handed to the kernel library
    ///
    /// # Panics
    ///
    /// Panics if this owning handle has been released.
    pub(crate) fn desc(&self) -> MatDesc {
        self.desc_with(&self.residency.lock())
    }

    /// Translate a kernel-library status, fetching the device error message if needed
    pub(crate) fn check(&self, status: Status) -> Result<()> {
        status.check(|| self.client.last_error())
    }

    // ===== Shape =====

    /// Lay a 2-, 4- or 5-D logical shape over the physical buffer
    ///
    /// The element count must equal `rows * cols`; five extents fold the last two
    /// into one.
    pub fn set_shape(&self, dims: &[usize]) -> Result<&Self> {
        self.geometry.write().set_shape(dims)?;
        Ok(self)
    }

    /// Reinterpret the physical extent as `(rows, cols)` without moving data
    ///
    /// Either extent may be [`Dim::Infer`]. The new extent is shared with every
    /// transposed view of this handle.
    ///
    /// ```ignore
    /// let m = Matrix::<CpuRuntime>::empty(&client, 4, 6)?;
    /// m.reshape(Dim::Infer, 3)?;
    /// assert_eq!(m.shape(), (8, 3));
    /// ```
    pub fn reshape(&self, rows: impl Into<Dim>, cols: impl Into<Dim>) -> Result<&Self> {
        self.geometry.write().reshape(rows.into(), cols.into())?;
        Ok(self)
    }

    // ===== Host/device transfer =====

    /// Upload the host mirror into the device buffer
    pub fn sync_to_device(&self) -> Result<()> {
        let res = self.residency.lock();
        let desc = self.desc_with(&res);
        let Some(host) = res.host.as_deref() else {
            return Err(Error::precondition(
                "sync_to_device",
                format!("{} has no host data staged", self.id),
            ));
        };
        self.check(self.client.copy_to_device(host, &desc))?;
        log::trace!("{}: uploaded {} elements", self.id, desc.len());
        self.device_valid.store(true, Ordering::Release);
        Ok(())
    }

    /// Download the device buffer into the host mirror, allocating it on first use
    pub fn sync_to_host(&self) -> Result<()> {
        let mut res = self.residency.lock();
        let desc = self.desc_with(&res);
        if let Some(host) = res.host.as_mut() {
            self.check(self.client.copy_to_host(&desc, host))?;
        } else {
            let mut host = vec![0.0; desc.len()];
            self.check(self.client.copy_to_host(&desc, &mut host))?;
            res.host = Some(host);
        }
        log::trace!("{}: downloaded {} elements", self.id, desc.len());
        Ok(())
    }

    /// Sync to the host and return a copy of the column-major physical data
    pub fn to_host_vec(&self) -> Result<Vec<f32>> {
        self.sync_to_host()?;
        Ok(self.residency.lock().host.clone().unwrap_or_default())
    }

    /// Replace the contents of owning storage with a same-sized host array
    pub fn overwrite(&self, data: &[f32]) -> Result<&Self> {
        if self.is_view() {
            return Err(Error::UnsupportedOnView);
        }
        if data.len() != self.len() {
            return Err(Error::precondition(
                "overwrite",
                format!("{} elements cannot replace {}", data.len(), self.len()),
            ));
        }
        let mut res = self.residency.lock();
        let desc = self.desc_with(&res);
        self.check(self.client.copy_to_device(data, &desc))?;
        res.host = Some(data.to_vec());
        self.device_valid.store(true, Ordering::Release);
        Ok(self)
    }

    fn physical_index(&self, row: usize, col: usize) -> (usize, usize) {
        if self.transposed { (col, row) } else { (row, col) }
    }

    /// Read the element at logical `(row, col)`
    pub fn read_value(&self, row: usize, col: usize) -> Result<f32> {
        let (r, c) = self.physical_index(row, col);
        let mut out = 0.0;
        self.check(self.client.read_from(&self.desc(), r, c, &mut out))?;
        Ok(out)
    }

    /// Write the element at logical `(row, col)`
    pub fn write_value(&self, row: usize, col: usize, value: f32) -> Result<&Self> {
        let (r, c) = self.physical_index(row, col);
        self.check(self.client.write_at(&self.desc(), r, c, value))?;
        Ok(self)
    }

    /// Copy another matrix (same shape) or broadcast a scalar into this one
    pub fn assign<'o>(&self, val: impl Into<Operand<'o, R>>) -> Result<&Self> {
        let status = match val.into() {
            Operand::Matrix(src) => self.client.copy_on_device(&src.desc(), &self.desc()),
            Operand::Scalar(alpha) => self.client.assign_scalar(&self.desc(), alpha),
        };
        self.check(status)?;
        Ok(self)
    }

    // ===== Lifecycle =====

    /// Free the device buffer if this handle owns it
    ///
    /// Releasing twice, or releasing a view, does nothing.
    pub fn release(&self) -> Result<()> {
        if !self.ownership.is_owning() || self.released.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        if self.client.allocator().deallocate(self.buffer.buffer) {
            log::trace!("{}: released {}", self.id, self.buffer.buffer);
            Ok(())
        } else {
            Err(Error::Device(format!(
                "invalid device pointer: {} was already freed",
                self.buffer.buffer
            )))
        }
    }
}

/// `rows * cols`, failing instead of wrapping on overflow
pub(crate) fn checked_len(op: &'static str, rows: usize, cols: usize) -> Result<usize> {
    rows.checked_mul(cols)
        .ok_or_else(|| Error::precondition(op, format!("({rows}, {cols}) overflows usize")))
}

impl<R: Runtime> Drop for Matrix<R> {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            log::warn!("failed to free {} on drop: {e}", self.id);
        }
    }
}

impl<R: Runtime> fmt::Debug for Matrix<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Matrix")
            .field("id", &self.id)
            .field("shape", &self.shape())
            .field("transposed", &self.transposed)
            .field("ownership", &self.ownership)
            .field("buffer", &self.buffer)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::cpu::{CpuClient, CpuDevice, CpuRuntime};

    fn client() -> CpuClient {
        CpuClient::new(CpuDevice::new())
    }

    #[test]
    fn test_empty_is_zero_filled_and_resident() {
        let client = client();
        let m = Matrix::<CpuRuntime>::empty(&client, 2, 3).unwrap();
        assert!(m.on_device());
        assert!(!m.on_host());
        assert_eq!(m.shape(), (2, 3));
        assert_eq!(m.to_host_vec().unwrap(), vec![0.0; 6]);
        assert!(m.on_host());
    }

    #[test]
    fn test_from_host_without_upload() {
        let client = client();
        let m = Matrix::<CpuRuntime>::from_host(&client, vec![1.0, 2.0], 2, 1, false).unwrap();
        assert!(!m.on_device());
        assert_eq!(m.read_value(0, 0), Err(Error::NotResident));

        m.sync_to_device().unwrap();
        assert_eq!(m.read_value(1, 0).unwrap(), 2.0);
    }

    #[test]
    fn test_from_row_major() {
        let client = client();
        let m = Matrix::<CpuRuntime>::from_row_major(&client, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2, 3)
            .unwrap();
        assert_eq!(m.to_host_vec().unwrap(), vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
        assert_eq!(m.read_value(0, 2).unwrap(), 3.0);
    }

    #[test]
    fn test_empty_nd_sets_overlay() {
        let client = client();
        let m = Matrix::<CpuRuntime>::empty_nd(&client, &[2, 3, 4, 5]).unwrap();
        assert_eq!(m.shape(), (2, 60));
        assert_eq!(m.shape4d(), Shape4D([2, 3, 4, 5]));

        let like = m.empty_like().unwrap();
        assert_eq!(like.shape4d(), m.shape4d());
        assert!(Matrix::<CpuRuntime>::empty_nd(&client, &[2, 3, 4]).is_err());
    }

    #[test]
    fn test_release_is_idempotent() {
        let client = client();
        let m = Matrix::<CpuRuntime>::empty(&client, 2, 2).unwrap();
        assert_eq!(client.allocator().live_buffers(), 1);
        m.release().unwrap();
        m.release().unwrap();
        assert!(m.is_released());
        assert_eq!(client.allocator().live_buffers(), 0);
        drop(m);
        assert_eq!(client.allocator().live_buffers(), 0);
    }

    #[test]
    #[should_panic(expected = "used after release")]
    fn test_use_after_release_panics() {
        let client = client();
        let m = Matrix::<CpuRuntime>::empty(&client, 2, 2).unwrap();
        m.release().unwrap();
        let _ = m.assign(1.0);
    }

    #[test]
    fn test_overwrite_and_assign() {
        let client = client();
        let m = Matrix::<CpuRuntime>::empty(&client, 2, 2).unwrap();
        m.overwrite(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(m.read_value(1, 1).unwrap(), 4.0);
        assert!(m.overwrite(&[1.0]).unwrap_err().is_local());

        let other = Matrix::<CpuRuntime>::empty(&client, 2, 2).unwrap();
        other.assign(&m).unwrap();
        assert_eq!(other.to_host_vec().unwrap(), vec![1.0, 2.0, 3.0, 4.0]);
        other.assign(7.0).unwrap();
        assert_eq!(other.to_host_vec().unwrap(), vec![7.0; 4]);

        let wrong = Matrix::<CpuRuntime>::empty(&client, 1, 4).unwrap();
        assert_eq!(wrong.assign(&m).unwrap_err(), Error::DimensionMismatch);
    }

    #[test]
    fn test_out_of_memory_is_device_error() {
        let client = CpuClient::new(CpuDevice::with_memory_limit(64));
        let _first = Matrix::<CpuRuntime>::empty(&client, 4, 4).unwrap();
        let err = Matrix::<CpuRuntime>::empty(&client, 4, 4).unwrap_err();
        assert!(matches!(err, Error::Device(msg) if msg.contains("out of memory")));
    }
}
