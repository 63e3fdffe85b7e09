//! Elementwise functions

use crate::error::Result;
use crate::matrix::{Matrix, Operand};
use crate::runtime::{BinaryOp, KernelLibrary, Runtime, UnaryOp};

macro_rules! unary_methods {
    ($($(#[$doc:meta])* $name:ident => $op:expr;)*) => {
        $(
            $(#[$doc])*
            pub fn $name<'a>(&'a self, target: Option<&'a Matrix<R>>) -> Result<&'a Matrix<R>> {
                self.apply($op, target)
            }
        )*
    };
}

impl<R: Runtime> Matrix<R> {
    /// target = op(self)
    pub fn apply<'a>(
        &'a self,
        op: UnaryOp,
        target: Option<&'a Matrix<R>>,
    ) -> Result<&'a Matrix<R>> {
        let target = target.unwrap_or(self);
        let status = self.client().apply_unary(op, &self.desc(), &target.desc());
        self.check(status)?;
        Ok(target)
    }

    unary_methods! {
        /// Logistic sigmoid
        sigmoid => UnaryOp::Sigmoid;
        /// Hyperbolic tangent
        tanh => UnaryOp::Tanh;
        /// Absolute value
        abs => UnaryOp::Abs;
        /// e^x
        exp => UnaryOp::Exp;
        /// ln(1 + e^x)
        log_1_plus_exp => UnaryOp::Log1PlusExp;
        /// Square root
        sqrt => UnaryOp::Sqrt;
        /// -1, 0 or 1 by sign
        sign => UnaryOp::Sign;
        /// 1 / x
        reciprocal => UnaryOp::Reciprocal;
        /// Round down
        floor => UnaryOp::Floor;
        /// Round up
        ceil => UnaryOp::Ceil;
        /// Cosine
        cos => UnaryOp::Cos;
        /// Sine
        sin => UnaryOp::Sin;
    }

    /// ln(x + tiny)
    pub fn log<'a>(&'a self, tiny: f32, target: Option<&'a Matrix<R>>) -> Result<&'a Matrix<R>> {
        self.apply(UnaryOp::Log { tiny }, target)
    }

    /// target = self ^ val, for a scalar or elementwise exponent
    pub fn pow<'a, 'o>(
        &'a self,
        val: impl Into<Operand<'o, R>>,
        target: Option<&'a Matrix<R>>,
    ) -> Result<&'a Matrix<R>> {
        self.binary_op(BinaryOp::Pow, val.into(), target)
    }
}
