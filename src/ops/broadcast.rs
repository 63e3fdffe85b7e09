//! Row/column vector broadcasting and diagonal updates
//!
//! Vector lengths are validated by the kernel library, which reports a mismatch as
//! [`Error::DimensionMismatch`](crate::error::Error::DimensionMismatch).

use crate::error::Result;
use crate::matrix::{Matrix, Operand};
use crate::runtime::{BinaryOp, KernelLibrary, Runtime};

impl<R: Runtime> Matrix<R> {
    fn column_vector_op<'a>(
        &'a self,
        op: BinaryOp,
        vec: &Matrix<R>,
        mult: f32,
        target: Option<&'a Matrix<R>>,
    ) -> Result<&'a Matrix<R>> {
        let target = target.unwrap_or(self);
        let status =
            self.client()
                .column_vector_op(op, &self.desc(), &vec.desc(), &target.desc(), mult);
        self.check(status)?;
        Ok(target)
    }

    fn row_vector_op<'a>(
        &'a self,
        op: BinaryOp,
        vec: &Matrix<R>,
        mult: f32,
        target: Option<&'a Matrix<R>>,
    ) -> Result<&'a Matrix<R>> {
        let target = target.unwrap_or(self);
        let status =
            self.client()
                .row_vector_op(op, &self.desc(), &vec.desc(), &target.desc(), mult);
        self.check(status)?;
        Ok(target)
    }

    /// Add a `(rows, 1)` vector to every column
    pub fn add_column_vector<'a>(
        &'a self,
        vec: &Matrix<R>,
        target: Option<&'a Matrix<R>>,
    ) -> Result<&'a Matrix<R>> {
        self.column_vector_op(BinaryOp::Add, vec, 1.0, target)
    }

    /// Add `mult * vec` to every column
    pub fn add_column_mult<'a>(
        &'a self,
        vec: &Matrix<R>,
        mult: f32,
        target: Option<&'a Matrix<R>>,
    ) -> Result<&'a Matrix<R>> {
        self.column_vector_op(BinaryOp::Add, vec, mult, target)
    }

    /// Add a `(1, cols)` vector to every row
    pub fn add_row_vector<'a>(
        &'a self,
        vec: &Matrix<R>,
        target: Option<&'a Matrix<R>>,
    ) -> Result<&'a Matrix<R>> {
        self.row_vector_op(BinaryOp::Add, vec, 1.0, target)
    }

    /// Add `mult * vec` to every row
    pub fn add_row_mult<'a>(
        &'a self,
        vec: &Matrix<R>,
        mult: f32,
        target: Option<&'a Matrix<R>>,
    ) -> Result<&'a Matrix<R>> {
        self.row_vector_op(BinaryOp::Add, vec, mult, target)
    }

    /// Scale every column elementwise by a `(rows, 1)` vector
    pub fn multiply_by_column_vector<'a>(
        &'a self,
        vec: &Matrix<R>,
        target: Option<&'a Matrix<R>>,
    ) -> Result<&'a Matrix<R>> {
        self.column_vector_op(BinaryOp::Mul, vec, 1.0, target)
    }

    /// Scale every row elementwise by a `(1, cols)` vector
    pub fn multiply_by_row_vector<'a>(
        &'a self,
        vec: &Matrix<R>,
        target: Option<&'a Matrix<R>>,
    ) -> Result<&'a Matrix<R>> {
        self.row_vector_op(BinaryOp::Mul, vec, 1.0, target)
    }

    /// Divide every column elementwise by a `(rows, 1)` vector
    pub fn divide_by_column_vector<'a>(
        &'a self,
        vec: &Matrix<R>,
        target: Option<&'a Matrix<R>>,
    ) -> Result<&'a Matrix<R>> {
        self.column_vector_op(BinaryOp::Div, vec, 1.0, target)
    }

    /// Divide every row elementwise by a `(1, cols)` vector
    pub fn divide_by_row_vector<'a>(
        &'a self,
        vec: &Matrix<R>,
        target: Option<&'a Matrix<R>>,
    ) -> Result<&'a Matrix<R>> {
        self.row_vector_op(BinaryOp::Div, vec, 1.0, target)
    }

    fn diagonal_op<'a>(
        &'a self,
        op: BinaryOp,
        val: Operand<'_, R>,
        target: Option<&'a Matrix<R>>,
    ) -> Result<&'a Matrix<R>> {
        let target = target.unwrap_or(self);
        let status = match val {
            Operand::Matrix(vec) => {
                self.client()
                    .diagonal_op(op, &self.desc(), &vec.desc(), &target.desc())
            }
            Operand::Scalar(alpha) => {
                self.client()
                    .diagonal_scalar_op(op, &self.desc(), alpha, &target.desc())
            }
        };
        self.check(status)?;
        Ok(target)
    }

    /// Add a scalar or a vector to the diagonal of a square matrix
    pub fn add_to_diagonal<'a, 'o>(
        &'a self,
        val: impl Into<Operand<'o, R>>,
        target: Option<&'a Matrix<R>>,
    ) -> Result<&'a Matrix<R>> {
        self.diagonal_op(BinaryOp::Add, val.into(), target)
    }

    /// Scale the diagonal of a square matrix by a scalar or a vector
    pub fn multiply_diagonal<'a, 'o>(
        &'a self,
        val: impl Into<Operand<'o, R>>,
        target: Option<&'a Matrix<R>>,
    ) -> Result<&'a Matrix<R>> {
        self.diagonal_op(BinaryOp::Mul, val.into(), target)
    }
}
