//! Comparisons and thresholds

use crate::error::Result;
use crate::matrix::{Matrix, Operand};
use crate::runtime::{CompareOp, KernelLibrary, Runtime};

impl<R: Runtime> Matrix<R> {
    fn compare_op<'a>(
        &'a self,
        op: CompareOp,
        val: Operand<'_, R>,
        target: Option<&'a Matrix<R>>,
    ) -> Result<&'a Matrix<R>> {
        let target = target.unwrap_or(self);
        let status = match val {
            Operand::Matrix(other) => {
                self.client()
                    .compare(op, &self.desc(), &other.desc(), &target.desc())
            }
            Operand::Scalar(alpha) => {
                self.client()
                    .compare_scalar(op, &self.desc(), alpha, &target.desc())
            }
        };
        self.check(status)?;
        Ok(target)
    }

    /// 1 where self < val, 0 elsewhere
    pub fn less_than<'a, 'o>(
        &'a self,
        val: impl Into<Operand<'o, R>>,
        target: Option<&'a Matrix<R>>,
    ) -> Result<&'a Matrix<R>> {
        self.compare_op(CompareOp::LessThan, val.into(), target)
    }

    /// 1 where self <= val, 0 elsewhere
    pub fn less_than_eq<'a, 'o>(
        &'a self,
        val: impl Into<Operand<'o, R>>,
        target: Option<&'a Matrix<R>>,
    ) -> Result<&'a Matrix<R>> {
        self.compare_op(CompareOp::LessThanEq, val.into(), target)
    }

    /// 1 where self > val, 0 elsewhere
    pub fn greater_than<'a, 'o>(
        &'a self,
        val: impl Into<Operand<'o, R>>,
        target: Option<&'a Matrix<R>>,
    ) -> Result<&'a Matrix<R>> {
        self.compare_op(CompareOp::GreaterThan, val.into(), target)
    }

    /// 1 where self >= val, 0 elsewhere
    pub fn greater_than_eq<'a, 'o>(
        &'a self,
        val: impl Into<Operand<'o, R>>,
        target: Option<&'a Matrix<R>>,
    ) -> Result<&'a Matrix<R>> {
        self.compare_op(CompareOp::GreaterThanEq, val.into(), target)
    }

    /// Elementwise min(self, val)
    pub fn upper_bound<'a, 'o>(
        &'a self,
        val: impl Into<Operand<'o, R>>,
        target: Option<&'a Matrix<R>>,
    ) -> Result<&'a Matrix<R>> {
        self.compare_op(CompareOp::UpperBound, val.into(), target)
    }

    /// Elementwise max(self, val)
    pub fn lower_bound<'a, 'o>(
        &'a self,
        val: impl Into<Operand<'o, R>>,
        target: Option<&'a Matrix<R>>,
    ) -> Result<&'a Matrix<R>> {
        self.compare_op(CompareOp::LowerBound, val.into(), target)
    }

    /// Clamp magnitudes to `bound`, keeping signs
    pub fn upper_bound_mod<'a>(
        &'a self,
        bound: f32,
        target: Option<&'a Matrix<R>>,
    ) -> Result<&'a Matrix<R>> {
        self.compare_op(CompareOp::UpperBoundMod, Operand::Scalar(bound), target)
    }
}
