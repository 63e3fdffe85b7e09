//! Cached all-ones vector and the reductions built on it
//!
//! Global sums are computed as dot products with a vector of ones rather than by a
//! separate reduction kernel. [`Context`] owns that vector and grows it lazily.

use crate::error::{Error, Result};
use crate::matrix::Matrix;
use crate::runtime::{Axis, Runtime};
use parking_lot::Mutex;

/// Upper bound on the length of the cached ones vector
pub const MAX_ONES: usize = 1024 * 1024 * 32;

/// Process-wide context holding the cached ones vector
///
/// Slices returned by [`ones`](Self::ones) alias the cache and stay valid for the
/// lifetime of the context, including across growth.
pub struct Context<R: Runtime> {
    client: R::Client,
    // Superseded caches are retained so slices handed out earlier stay valid.
    caches: Mutex<Vec<Matrix<R>>>,
}

impl<R: Runtime> Context<R> {
    /// Create a context; nothing is allocated until the first request
    pub fn new(client: &R::Client) -> Self {
        Self {
            client: client.clone(),
            caches: Mutex::new(Vec::new()),
        }
    }

    /// A `(len, 1)` column of ones aliasing the cache
    pub fn ones(&self, len: usize) -> Result<Matrix<R>> {
        if len == 0 || len > MAX_ONES {
            return Err(Error::precondition(
                "Context::ones",
                format!("length {len} outside 1..={MAX_ONES}"),
            ));
        }
        let mut caches = self.caches.lock();
        let current = caches.last().map_or(0, Matrix::len);
        if current < len {
            let size = len.next_power_of_two().min(MAX_ONES);
            log::trace!("growing ones cache from {current} to {size}");
            let cache = Matrix::empty(&self.client, size, 1)?;
            cache.assign(1.0)?;
            caches.push(cache);
        }
        match caches.last() {
            Some(cache) => cache.column_slice(0, len),
            None => Err(Error::precondition("Context::ones", "cache missing")),
        }
    }

    /// Length of the largest cached ones vector
    pub fn cached_len(&self) -> usize {
        self.caches.lock().last().map_or(0, Matrix::len)
    }
}

impl<R: Runtime> Matrix<R> {
    /// mult * (sum of every element)
    pub fn sum_all(&self, ctx: &Context<R>, mult: f32) -> Result<f32> {
        if self.is_empty() {
            return Ok(0.0);
        }
        let ones = ctx.ones(self.len())?;
        Ok(mult * self.vdot(&ones)?)
    }

    /// self += mult * sum(mat, axis), computed as a product with the ones vector
    pub fn add_sums(
        &self,
        ctx: &Context<R>,
        mat: &Matrix<R>,
        axis: Axis,
        mult: f32,
    ) -> Result<&Self> {
        let (rows, cols) = mat.shape();
        match axis {
            Axis::Rows => {
                let ones = ctx.ones(rows)?.transposed_view();
                ones.dot_into(mat, self, mult, 1.0)
            }
            Axis::Cols => {
                let ones = ctx.ones(cols)?;
                mat.dot_into(&ones, self, mult, 1.0)
            }
        }
    }
}
