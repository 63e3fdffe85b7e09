//! Aliasing views and slice copies
//!
//! Every aliasing constructor lives here so ownership bookkeeping is done in one
//! place: views record the root owner's id and never free storage.

use super::Matrix;
use super::core::Residency;
use super::shape::Geometry;
use crate::error::{Error, Result};
use crate::runtime::{KernelLibrary, Runtime};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

impl<R: Runtime> Matrix<R> {
    /// View of the same buffer with logical rows and columns swapped
    ///
    /// The view shares this handle's extent and overlay, so a later
    /// [`reshape`](Self::reshape) on either is seen by both.
    pub fn transposed_view(&self) -> Matrix<R> {
        self.view(
            self.device_ptr(),
            Arc::clone(self.geometry()),
            !self.is_transposed(),
            Arc::clone(self.residency()),
        )
    }

    /// View aliasing columns `[first, last)`
    ///
    /// On a vector (a single row or column) the range selects elements instead,
    /// keeping the vector's orientation.
    pub fn column_slice(&self, first: usize, last: usize) -> Result<Matrix<R>> {
        if self.is_transposed() {
            return Err(Error::UnsupportedOnTransposed);
        }
        let (rows, cols) = self.physical_shape();
        let is_vector = rows == 1 || cols == 1;
        let (offset, geometry) = if is_vector {
            let len = rows * cols;
            if first >= last || last > len {
                return Err(Error::DimensionMismatch);
            }
            let width = last - first;
            let geometry = if rows == 1 {
                Geometry::new(1, width)
            } else {
                Geometry::new(width, 1)
            };
            (first, geometry)
        } else {
            if first >= last || last > cols {
                return Err(Error::DimensionMismatch);
            }
            (first * rows, Geometry::new(rows, last - first))
        };

        // The slice keeps its own host mirror but shares device validity with
        // the root, so uploads through the owner are visible here.
        Ok(self.view(
            self.device_ptr().add(offset),
            Arc::new(RwLock::new(geometry)),
            false,
            Arc::new(Mutex::new(Residency::default())),
        ))
    }

    /// Copy rows `[start, end)` into a newly allocated `(end - start, cols)` matrix
    ///
    /// Rows are not contiguous in column-major storage, so this is always a copy.
    pub fn row_slice(&self, start: usize, end: usize) -> Result<Matrix<R>> {
        if start >= end {
            return Err(Error::DimensionMismatch);
        }
        let (_, cols) = self.physical_shape();
        let target = Matrix::empty(self.client(), end - start, cols)?;
        self.row_slice_into(start, end, &target)?;
        Ok(target)
    }

    /// Copy rows `[start, end)` into `target`
    pub fn row_slice_into<'t>(
        &self,
        start: usize,
        end: usize,
        target: &'t Matrix<R>,
    ) -> Result<&'t Matrix<R>> {
        let status = self
            .client()
            .get_row_slice(&self.desc(), &target.desc(), start, end);
        self.check(status)?;
        Ok(target)
    }

    /// Copy `src` into rows `[start, end)`
    pub fn set_row_slice(&self, start: usize, end: usize, src: &Matrix<R>) -> Result<&Self> {
        let status = self
            .client()
            .set_row_slice(&src.desc(), &self.desc(), start, end);
        self.check(status)?;
        Ok(self)
    }

    /// Copy columns `[first, last)` into a newly allocated matrix
    pub fn get_col_slice(&self, first: usize, last: usize) -> Result<Matrix<R>> {
        let slice = self.column_slice(first, last)?;
        let target = slice.empty_like()?;
        target.assign(&slice)?;
        Ok(target)
    }

    /// Copy columns `[first, last)` into `target`
    pub fn get_col_slice_into<'t>(
        &self,
        first: usize,
        last: usize,
        target: &'t Matrix<R>,
    ) -> Result<&'t Matrix<R>> {
        target.assign(&self.column_slice(first, last)?)?;
        Ok(target)
    }

    /// Assign `src` to columns `[first, last)`
    pub fn set_col_slice(&self, first: usize, last: usize, src: &Matrix<R>) -> Result<&Self> {
        self.column_slice(first, last)?.assign(src)?;
        Ok(self)
    }

    /// Physically transposed copy in a new `(cols, rows)` matrix
    pub fn transpose_copy(&self) -> Result<Matrix<R>> {
        let (rows, cols) = self.physical_shape();
        let target = Matrix::empty(self.client(), cols, rows)?;
        self.transpose_into(&target)?;
        Ok(target)
    }

    /// Physically transpose into `target`
    pub fn transpose_into<'t>(&self, target: &'t Matrix<R>) -> Result<&'t Matrix<R>> {
        let status = self.client().copy_transpose(&self.desc(), &target.desc());
        self.check(status)?;
        Ok(target)
    }
}
