//! Elementwise arithmetic

use crate::error::Result;
use crate::matrix::{Matrix, Operand};
use crate::runtime::{BinaryOp, KernelLibrary, Runtime};

impl<R: Runtime> Matrix<R> {
    /// Dispatch on the operand kind: elementwise kernel for a matrix, scalar kernel
    /// for a number
    pub(crate) fn binary_op<'a>(
        &'a self,
        op: BinaryOp,
        val: Operand<'_, R>,
        target: Option<&'a Matrix<R>>,
    ) -> Result<&'a Matrix<R>> {
        let target = target.unwrap_or(self);
        let status = match val {
            Operand::Matrix(other) => {
                self.client()
                    .binary_elementwise(op, &self.desc(), &other.desc(), &target.desc())
            }
            Operand::Scalar(alpha) => {
                self.client()
                    .binary_scalar(op, &self.desc(), alpha, &target.desc())
            }
        };
        self.check(status)?;
        Ok(target)
    }

    /// target = self + val
    pub fn add<'a, 'o>(
        &'a self,
        val: impl Into<Operand<'o, R>>,
        target: Option<&'a Matrix<R>>,
    ) -> Result<&'a Matrix<R>> {
        self.binary_op(BinaryOp::Add, val.into(), target)
    }

    /// target = self - val
    pub fn subtract<'a, 'o>(
        &'a self,
        val: impl Into<Operand<'o, R>>,
        target: Option<&'a Matrix<R>>,
    ) -> Result<&'a Matrix<R>> {
        self.binary_op(BinaryOp::Sub, val.into(), target)
    }

    /// target = self * val (elementwise)
    pub fn multiply<'a, 'o>(
        &'a self,
        val: impl Into<Operand<'o, R>>,
        target: Option<&'a Matrix<R>>,
    ) -> Result<&'a Matrix<R>> {
        self.binary_op(BinaryOp::Mul, val.into(), target)
    }

    /// target = self / val (elementwise)
    pub fn divide<'a, 'o>(
        &'a self,
        val: impl Into<Operand<'o, R>>,
        target: Option<&'a Matrix<R>>,
    ) -> Result<&'a Matrix<R>> {
        self.binary_op(BinaryOp::Div, val.into(), target)
    }

    /// target = scale_targets * target + self * val (elementwise)
    ///
    /// With `scale_targets` of 0 the old contents of `target` are never read.
    pub fn multiply_scaled<'a, 'o>(
        &'a self,
        val: impl Into<Operand<'o, R>>,
        target: Option<&'a Matrix<R>>,
        scale_targets: f32,
    ) -> Result<&'a Matrix<R>> {
        let target = target.unwrap_or(self);
        let status = match val.into() {
            Operand::Matrix(other) => self.client().mult_scaled(
                &self.desc(),
                &other.desc(),
                &target.desc(),
                scale_targets,
            ),
            Operand::Scalar(alpha) => self.client().mult_scalar_scaled(
                &self.desc(),
                alpha,
                &target.desc(),
                scale_targets,
            ),
        };
        self.check(status)?;
        Ok(target)
    }

    /// self += mult * other
    pub fn add_mult(&self, other: &Matrix<R>, mult: f32) -> Result<&Self> {
        let status = self.client().add_mult(&self.desc(), &other.desc(), mult);
        self.check(status)?;
        Ok(self)
    }

    /// self -= mult * other
    pub fn subtract_mult(&self, other: &Matrix<R>, mult: f32) -> Result<&Self> {
        self.add_mult(other, -mult)
    }

    /// self += mult * sign(other)
    pub fn add_mult_sign(&self, other: &Matrix<R>, mult: f32) -> Result<&Self> {
        let status = self
            .client()
            .add_mult_sign(&self.desc(), &other.desc(), mult);
        self.check(status)?;
        Ok(self)
    }

    /// Fill with `alpha`
    #[deprecated(note = "use `assign`")]
    pub fn assign_scalar(&self, alpha: f32) -> Result<&Self> {
        log::warn!("assign_scalar is deprecated, use assign");
        self.assign(alpha)
    }

    /// target = self * alpha
    #[deprecated(note = "use `multiply`")]
    pub fn mult_by_scalar<'a>(
        &'a self,
        alpha: f32,
        target: Option<&'a Matrix<R>>,
    ) -> Result<&'a Matrix<R>> {
        log::warn!("mult_by_scalar is deprecated, use multiply");
        self.multiply(alpha, target)
    }

    /// target = self / alpha
    #[deprecated(note = "use `divide`")]
    pub fn div_by_scalar<'a>(
        &'a self,
        alpha: f32,
        target: Option<&'a Matrix<R>>,
    ) -> Result<&'a Matrix<R>> {
        log::warn!("div_by_scalar is deprecated, use divide");
        self.divide(alpha, target)
    }

    /// target = self + alpha
    #[deprecated(note = "use `add`")]
    pub fn add_scalar<'a>(
        &'a self,
        alpha: f32,
        target: Option<&'a Matrix<R>>,
    ) -> Result<&'a Matrix<R>> {
        log::warn!("add_scalar is deprecated, use add");
        self.add(alpha, target)
    }
}
