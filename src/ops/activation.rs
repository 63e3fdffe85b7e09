//! Softmax, activation derivatives and per-element losses
//!
//! Softmax treats each column as one case. Label vectors are `(1, cols)` and hold
//! the row index of the correct class for each column.

use crate::error::Result;
use crate::matrix::Matrix;
use crate::runtime::{DerivOp, KernelLibrary, LossOp, Runtime};

macro_rules! deriv_methods {
    ($($(#[$doc:meta])* $name:ident => $op:expr;)*) => {
        $(
            $(#[$doc])*
            pub fn $name<'a>(
                &'a self,
                act: &Matrix<R>,
                target: Option<&'a Matrix<R>>,
            ) -> Result<&'a Matrix<R>> {
                self.apply_deriv($op, act, target)
            }
        )*
    };
}

impl<R: Runtime> Matrix<R> {
    /// Column softmax: every column becomes exp(x - max) / sum
    pub fn softmax<'a>(&'a self, target: Option<&'a Matrix<R>>) -> Result<&'a Matrix<R>> {
        let target = target.unwrap_or(self);
        let status = self.client().softmax(&self.desc(), &target.desc());
        self.check(status)?;
        Ok(target)
    }

    /// Gradient of softmax cross-entropy: self minus the one-hot encoding of `labels`
    ///
    /// Labels outside `[0, rows)` leave their column unchanged.
    pub fn apply_softmax_grad<'a>(
        &'a self,
        labels: &Matrix<R>,
        target: Option<&'a Matrix<R>>,
    ) -> Result<&'a Matrix<R>> {
        let target = target.unwrap_or(self);
        let status =
            self.client()
                .apply_softmax_grad(&self.desc(), &labels.desc(), &target.desc());
        self.check(status)?;
        Ok(target)
    }

    fn per_column_target(&self) -> Result<Matrix<R>> {
        let (_, cols) = self.physical_shape();
        Matrix::empty(self.client(), 1, cols)
    }

    /// `(1, cols)` mask: 1 where a column's maximum sits in the labelled row
    pub fn softmax_correct(&self, labels: &Matrix<R>) -> Result<Matrix<R>> {
        let target = self.per_column_target()?;
        self.softmax_correct_into(labels, &target)?;
        Ok(target)
    }

    /// Write the per-column correctness mask into `target`
    pub fn softmax_correct_into<'t>(
        &self,
        labels: &Matrix<R>,
        target: &'t Matrix<R>,
    ) -> Result<&'t Matrix<R>> {
        let status = self
            .client()
            .softmax_correct(&self.desc(), &labels.desc(), &target.desc());
        self.check(status)?;
        Ok(target)
    }

    /// `(1, cols)` vector of -ln(self[label, c] + tiny)
    ///
    /// A label outside `[0, rows)` yields NaN for its column.
    pub fn softmax_cross_entropy(&self, labels: &Matrix<R>, tiny: f32) -> Result<Matrix<R>> {
        let target = self.per_column_target()?;
        self.softmax_cross_entropy_into(labels, &target, tiny)?;
        Ok(target)
    }

    /// Write the per-column cross-entropy into `target`
    pub fn softmax_cross_entropy_into<'t>(
        &self,
        labels: &Matrix<R>,
        target: &'t Matrix<R>,
        tiny: f32,
    ) -> Result<&'t Matrix<R>> {
        let status = self.client().softmax_cross_entropy(
            &self.desc(),
            &labels.desc(),
            &target.desc(),
            tiny,
        );
        self.check(status)?;
        Ok(target)
    }

    /// Multiply the gradient in self by the derivative `op` evaluated at `act`
    pub fn apply_deriv<'a>(
        &'a self,
        op: DerivOp,
        act: &Matrix<R>,
        target: Option<&'a Matrix<R>>,
    ) -> Result<&'a Matrix<R>> {
        let target = target.unwrap_or(self);
        let status = self
            .client()
            .apply_deriv(op, &self.desc(), &act.desc(), &target.desc());
        self.check(status)?;
        Ok(target)
    }

    deriv_methods! {
        /// Backpropagate through logistic units; `act` is their output
        apply_logistic_deriv => DerivOp::Logistic;
        /// Backpropagate through tanh units; `act` is their output
        apply_tanh_deriv => DerivOp::Tanh;
        /// Backpropagate through rectified linear units; `act` is their output
        apply_rectified_linear_deriv => DerivOp::RectifiedLinear;
        /// Backpropagate through softplus units; `act` is their output
        apply_rectified_linear_smooth_deriv => DerivOp::RectifiedLinearSmooth;
        /// Backpropagate through cosine units; `act` is their input
        apply_cos_deriv => DerivOp::Cos;
        /// Backpropagate through sine units; `act` is their input
        apply_sin_deriv => DerivOp::Sin;
    }

    fn loss<'a>(
        &'a self,
        op: LossOp,
        predictions: &Matrix<R>,
        target: Option<&'a Matrix<R>>,
    ) -> Result<&'a Matrix<R>> {
        let target = target.unwrap_or(self);
        let status = self.client().elementwise_loss(
            op,
            &self.desc(),
            &predictions.desc(),
            &target.desc(),
        );
        self.check(status)?;
        Ok(target)
    }

    /// -self * ln(p + tiny), with self holding the labels
    pub fn cross_entropy<'a>(
        &'a self,
        p: &Matrix<R>,
        tiny: f32,
        target: Option<&'a Matrix<R>>,
    ) -> Result<&'a Matrix<R>> {
        self.loss(LossOp::CrossEntropy { tiny }, p, target)
    }

    /// -self * ln(p + tiny) - (1 - self) * ln(1 - p + tiny)
    pub fn cross_entropy_bernoulli<'a>(
        &'a self,
        p: &Matrix<R>,
        tiny: f32,
        target: Option<&'a Matrix<R>>,
    ) -> Result<&'a Matrix<R>> {
        self.loss(LossOp::CrossEntropyBernoulli { tiny }, p, target)
    }

    /// 1 where the binary label in self agrees with `p` thresholded at `cutoff`
    pub fn correct_preds<'a>(
        &'a self,
        p: &Matrix<R>,
        cutoff: f32,
        target: Option<&'a Matrix<R>>,
    ) -> Result<&'a Matrix<R>> {
        self.loss(LossOp::CorrectPreds { cutoff }, p, target)
    }
}
