//! Physical extent and logical shape overlay of a matrix
//!
//! The physical buffer is always 2-D and column-major. A 4-D overlay can be laid
//! over it for consumers that think in `(n, c, h, w)`-style shapes; the overlay
//! never reallocates and always covers exactly `rows * cols` elements.

use crate::error::{Error, Result};
use std::fmt;

/// One argument of [`reshape`](crate::matrix::Matrix::reshape)
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Dim {
    /// Compute this extent from the element count
    Infer,
    /// Use exactly this extent
    Fixed(usize),
}

impl From<usize> for Dim {
    fn from(n: usize) -> Self {
        Dim::Fixed(n)
    }
}

/// Negative values mean [`Dim::Infer`], so `reshape(-1, n)` reads naturally.
impl From<i32> for Dim {
    fn from(n: i32) -> Self {
        match usize::try_from(n) {
            Ok(n) => Dim::Fixed(n),
            Err(_) => Dim::Infer,
        }
    }
}

/// Logical 4-D shape overlay
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Shape4D(pub [usize; 4]);

impl Shape4D {
    /// The overlay of a plain `(rows, cols)` matrix
    pub fn plain(rows: usize, cols: usize) -> Self {
        Self([rows, 1, 1, cols])
    }

    /// Number of elements covered
    pub fn numel(&self) -> usize {
        self.0.iter().product()
    }

    /// Fold 2, 4 or 5 logical extents into an overlay
    ///
    /// Five extents fold the last two into the fourth.
    pub fn from_dims(dims: &[usize]) -> Result<Self> {
        let overflow = || Error::precondition("set_shape", format!("{dims:?} overflows usize"));
        let shape = match *dims {
            [r, c] => Self::plain(r, c),
            [a, b, c, d] => Self([a, b, c, d]),
            [a, b, c, d, e] => Self([a, b, c, d.checked_mul(e).ok_or_else(overflow)?]),
            _ => {
                return Err(Error::precondition(
                    "set_shape",
                    format!("expected 2, 4 or 5 dimensions, got {}", dims.len()),
                ));
            }
        };
        shape
            .0
            .iter()
            .try_fold(1usize, |acc, &d| acc.checked_mul(d))
            .ok_or_else(overflow)?;
        Ok(shape)
    }
}

impl fmt::Display for Shape4D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.0;
        write!(f, "({a}, {b}, {c}, {d})")
    }
}

/// Physical extent plus overlay, shared between a handle and its transposed view
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Geometry {
    pub rows: usize,
    pub cols: usize,
    pub shape4d: Shape4D,
}

impl Geometry {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            shape4d: Shape4D::plain(rows, cols),
        }
    }

    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    /// Replace the overlay; the element count must not change
    pub fn set_shape(&mut self, dims: &[usize]) -> Result<()> {
        let shape = Shape4D::from_dims(dims)?;
        if shape.numel() != self.len() {
            return Err(Error::precondition(
                "set_shape",
                format!(
                    "{dims:?} has {} elements, matrix has {}",
                    shape.numel(),
                    self.len()
                ),
            ));
        }
        self.shape4d = shape;
        Ok(())
    }

    /// Reinterpret the physical extent; resets the overlay to the new 2-D shape
    pub fn reshape(&mut self, rows: Dim, cols: Dim) -> Result<()> {
        let len = self.len();
        let infer = |known: usize| {
            if known > 0 && len % known == 0 {
                Ok(len / known)
            } else {
                Err(Error::precondition(
                    "reshape",
                    format!("{known} does not divide {len} elements"),
                ))
            }
        };

        let (m, n) = match (rows, cols) {
            (Dim::Infer, Dim::Infer) => {
                return Err(Error::precondition(
                    "reshape",
                    "at most one extent can be inferred",
                ));
            }
            (Dim::Infer, Dim::Fixed(n)) => (infer(n)?, n),
            (Dim::Fixed(m), Dim::Infer) => (m, infer(m)?),
            (Dim::Fixed(m), Dim::Fixed(n)) => (m, n),
        };
        if m.checked_mul(n) != Some(len) {
            return Err(Error::precondition(
                "reshape",
                format!("({m}, {n}) does not hold {len} elements"),
            ));
        }

        *self = Self::new(m, n);
        Ok(())
    }
}
