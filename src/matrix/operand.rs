//! Right-hand operands that may be a scalar or another matrix

use super::Matrix;
use crate::runtime::Runtime;

/// A scalar or a borrowed matrix
///
/// Operations that accept either kind take `impl Into<Operand>` and pick the
/// scalar or elementwise kernel from the variant.
#[derive(Debug)]
pub enum Operand<'a, R: Runtime> {
    /// Broadcast a single value
    Scalar(f32),
    /// Combine elementwise with a same-shaped matrix
    Matrix(&'a Matrix<R>),
}

impl<R: Runtime> Clone for Operand<'_, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R: Runtime> Copy for Operand<'_, R> {}

impl<R: Runtime> From<f32> for Operand<'_, R> {
    fn from(value: f32) -> Self {
        Operand::Scalar(value)
    }
}

impl<R: Runtime> From<f64> for Operand<'_, R> {
    fn from(value: f64) -> Self {
        Operand::Scalar(value as f32)
    }
}

impl<R: Runtime> From<i32> for Operand<'_, R> {
    fn from(value: i32) -> Self {
        Operand::Scalar(value as f32)
    }
}

impl<'a, R: Runtime> From<&'a Matrix<R>> for Operand<'a, R> {
    fn from(mat: &'a Matrix<R>) -> Self {
        Operand::Matrix(mat)
    }
}
