//! The kernel library boundary
//!
//! [`KernelLibrary`] is the flat catalog of native entry points every matrix
//! operation bottoms out in. Entry points take [`MatDesc`] descriptors plus scalar
//! parameters, run synchronously to completion, and report the outcome as a
//! [`Status`]. Nothing about how a backend packages or schedules its kernels leaks
//! through this trait.
//!
//! # Contract
//!
//! ```text
//! Matrix method ──► KernelLibrary entry point ──► Status
//!                                                   │
//!                                  Status::check ◄──┘  (translate before using outputs)
//! ```
//!
//! - Outputs are only meaningful when the returned status is success.
//! - A failing entry point leaves its destination untouched.
//! - Operand descriptors may alias each other (in-place `target == source` calls).

use super::{DevicePtr, Status};

/// Opaque matrix descriptor passed across the kernel boundary
///
/// Sizes are physical: a transposed handle keeps the extent of its storage and only
/// flips `is_trans`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MatDesc {
    /// Where the column-major data starts
    pub ptr: DevicePtr,
    /// Physical row count
    pub rows: usize,
    /// Physical column count
    pub cols: usize,
    /// Logical rows and columns are swapped
    pub is_trans: bool,
    /// The device copy holds valid data
    pub on_device: bool,
    /// A host mirror exists
    pub on_host: bool,
    /// The handle owns `ptr.buffer`
    pub owns_data: bool,
}

impl MatDesc {
    /// Number of elements
    #[inline]
    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    /// Whether the matrix has no elements
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Logical row count (accounts for `is_trans`)
    #[inline]
    pub fn leading_dim(&self) -> usize {
        if self.is_trans { self.cols } else { self.rows }
    }

    /// Logical column count (accounts for `is_trans`)
    #[inline]
    pub fn nonleading_dim(&self) -> usize {
        if self.is_trans { self.rows } else { self.cols }
    }

    /// Whether the physical extents equal `other`'s
    #[inline]
    pub fn same_size(&self, other: &MatDesc) -> bool {
        self.rows == other.rows && self.cols == other.cols
    }
}

/// Reduction / broadcast axis
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Axis 0: collapse the rows of every column, producing a `(1, cols)` row vector
    Rows,
    /// Axis 1: collapse the columns of every row, producing a `(rows, 1)` column vector
    Cols,
}

impl Axis {
    /// Numeric axis index (0 or 1)
    pub fn index(self) -> usize {
        match self {
            Axis::Rows => 0,
            Axis::Cols => 1,
        }
    }

    /// Shape of the vector produced by reducing a `(rows, cols)` matrix
    pub fn reduced_shape(self, rows: usize, cols: usize) -> (usize, usize) {
        match self {
            Axis::Rows => (1, cols),
            Axis::Cols => (rows, 1),
        }
    }
}

impl TryFrom<i32> for Axis {
    type Error = crate::error::Error;

    fn try_from(axis: i32) -> crate::error::Result<Self> {
        match axis {
            0 => Ok(Axis::Rows),
            1 => Ok(Axis::Cols),
            other => Err(crate::error::Error::precondition(
                "axis",
                format!("axis must be 0 or 1, got {other}"),
            )),
        }
    }
}

/// Elementwise binary operation
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// a + b
    Add,
    /// a - b
    Sub,
    /// a * b
    Mul,
    /// a / b
    Div,
    /// a ^ b
    Pow,
}

impl BinaryOp {
    #[inline]
    pub(crate) fn apply(self, a: f32, b: f32) -> f32 {
        match self {
            BinaryOp::Add => a + b,
            BinaryOp::Sub => a - b,
            BinaryOp::Mul => a * b,
            BinaryOp::Div => a / b,
            BinaryOp::Pow => a.powf(b),
        }
    }
}

/// Elementwise unary function
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum UnaryOp {
    /// Logistic sigmoid 1 / (1 + e^-x)
    Sigmoid,
    /// Hyperbolic tangent
    Tanh,
    /// |x|
    Abs,
    /// e^x
    Exp,
    /// ln(x + tiny)
    Log {
        /// Added to the argument before taking the logarithm
        tiny: f32,
    },
    /// ln(1 + e^x)
    Log1PlusExp,
    /// Square root
    Sqrt,
    /// -1, 0 or 1
    Sign,
    /// 1 / x
    Reciprocal,
    /// Round down
    Floor,
    /// Round up
    Ceil,
    /// Cosine
    Cos,
    /// Sine
    Sin,
}

impl UnaryOp {
    #[inline]
    pub(crate) fn apply(self, x: f32) -> f32 {
        match self {
            UnaryOp::Sigmoid => 1.0 / (1.0 + (-x).exp()),
            UnaryOp::Tanh => x.tanh(),
            UnaryOp::Abs => x.abs(),
            UnaryOp::Exp => x.exp(),
            UnaryOp::Log { tiny } => (x + tiny).ln(),
            UnaryOp::Log1PlusExp => {
                // Avoid overflow of e^x for large inputs
                if x > 0.0 {
                    x + (-x).exp().ln_1p()
                } else {
                    x.exp().ln_1p()
                }
            }
            UnaryOp::Sqrt => x.sqrt(),
            UnaryOp::Sign => {
                if x > 0.0 {
                    1.0
                } else if x < 0.0 {
                    -1.0
                } else {
                    0.0
                }
            }
            UnaryOp::Reciprocal => 1.0 / x,
            UnaryOp::Floor => x.floor(),
            UnaryOp::Ceil => x.ceil(),
            UnaryOp::Cos => x.cos(),
            UnaryOp::Sin => x.sin(),
        }
    }
}

/// Comparison / threshold operation producing 0/1 masks or clamped values
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CompareOp {
    /// 1 where a < b
    LessThan,
    /// 1 where a <= b
    LessThanEq,
    /// 1 where a > b
    GreaterThan,
    /// 1 where a >= b
    GreaterThanEq,
    /// min(a, b)
    UpperBound,
    /// max(a, b)
    LowerBound,
    /// sign(a) * b where |a| > b, a otherwise (scalar bound only)
    UpperBoundMod,
}

impl CompareOp {
    #[inline]
    pub(crate) fn apply(self, a: f32, b: f32) -> f32 {
        let mask = |c: bool| if c { 1.0 } else { 0.0 };
        match self {
            CompareOp::LessThan => mask(a < b),
            CompareOp::LessThanEq => mask(a <= b),
            CompareOp::GreaterThan => mask(a > b),
            CompareOp::GreaterThanEq => mask(a >= b),
            CompareOp::UpperBound => {
                if a > b {
                    b
                } else {
                    a
                }
            }
            CompareOp::LowerBound => {
                if a < b {
                    b
                } else {
                    a
                }
            }
            CompareOp::UpperBoundMod => {
                if a.abs() > b {
                    b.copysign(a)
                } else {
                    a
                }
            }
        }
    }
}

/// Derivative of an activation, applied to an incoming gradient
///
/// The first operand is the gradient, the second is `act`: the unit's output for
/// the saturating activations, the unit's input for `Cos` and `Sin`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DerivOp {
    /// grad * act * (1 - act)
    Logistic,
    /// grad * (1 + act) * (1 - act)
    Tanh,
    /// grad where act > 0, 0 elsewhere
    RectifiedLinear,
    /// grad * (1 - e^-act), `act` being the softplus output
    RectifiedLinearSmooth,
    /// -grad * sin(act)
    Cos,
    /// grad * cos(act)
    Sin,
}

impl DerivOp {
    #[inline]
    pub(crate) fn apply(self, grad: f32, act: f32) -> f32 {
        match self {
            DerivOp::Logistic => grad * act * (1.0 - act),
            DerivOp::Tanh => grad * (1.0 + act) * (1.0 - act),
            DerivOp::RectifiedLinear => {
                if act > 0.0 {
                    grad
                } else {
                    0.0
                }
            }
            DerivOp::RectifiedLinearSmooth => grad * (1.0 - (-act).exp()),
            DerivOp::Cos => -grad * act.sin(),
            DerivOp::Sin => grad * act.cos(),
        }
    }
}

/// Elementwise loss of labels `t` against predictions `p`
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum LossOp {
    /// -t * ln(p + tiny)
    CrossEntropy {
        /// Keeps the logarithm finite at p = 0
        tiny: f32,
    },
    /// -t * ln(p + tiny) - (1 - t) * ln(1 - p + tiny)
    CrossEntropyBernoulli {
        /// Keeps the logarithms finite at p = 0 and p = 1
        tiny: f32,
    },
    /// t * (p >= cutoff) + (1 - t) * (p < cutoff)
    CorrectPreds {
        /// Decision threshold
        cutoff: f32,
    },
}

impl LossOp {
    #[inline]
    pub(crate) fn apply(self, t: f32, p: f32) -> f32 {
        match self {
            LossOp::CrossEntropy { tiny } => -t * (p + tiny).ln(),
            LossOp::CrossEntropyBernoulli { tiny } => {
                -t * (p + tiny).ln() - (1.0 - t) * (1.0 - p + tiny).ln()
            }
            LossOp::CorrectPreds { cutoff } => {
                if p >= cutoff {
                    t
                } else {
                    1.0 - t
                }
            }
        }
    }
}

/// How `normlimit_by_axis` rescales vectors
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum NormConstraint {
    /// Rescale only vectors whose norm exceeds the limit
    #[default]
    ClipIfExceeding,
    /// Rescale every vector to exactly the limit
    Exact,
}

/// Stochastic transform applied elementwise from a source to a target
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum SampleOp {
    /// 1 with probability given by the source entry, 0 otherwise
    Bernoulli,
    /// 1 with probability (1 + x) / 2, -1 otherwise
    BernoulliSymmetric,
    /// Poisson sample with rate given by the source entry
    Poisson,
    /// Add zero-mean gaussian noise with standard deviation `mult`
    GaussianNoise {
        /// Noise standard deviation
        mult: f32,
    },
    /// Add -ln(-ln(u)) (Gumbel perturbation of energies)
    PerturbEnergy,
    /// Divide by -ln(u) (exponential perturbation of probabilities)
    PerturbProb,
}

/// Device-side random generator state: one seed word per parallel stream
///
/// Element `i` of a matrix is drawn from stream `i % streams`; each call advances
/// every stream it touched, so a given seed always reproduces the same sequence.
#[derive(Clone, Debug)]
pub struct RngStreams {
    pub(crate) words: Vec<u64>,
}

impl RngStreams {
    /// Uninitialized state with `streams` parallel streams
    pub fn new(streams: usize) -> Self {
        Self {
            words: vec![0; streams],
        }
    }

    /// Number of parallel streams
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Whether there are no streams
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Flat catalog of native entry points
///
/// Every method runs to completion before returning and reports through [`Status`].
/// Implemented by each backend's client.
#[allow(clippy::too_many_arguments)]
pub trait KernelLibrary {
    /// Human-readable description of the most recent device failure
    fn last_error(&self) -> String;

    // ===== Memory =====

    /// Upload a column-major host array into the descriptor's device storage
    fn copy_to_device(&self, src: &[f32], dst: &MatDesc) -> Status;

    /// Download the descriptor's device storage into a host array
    fn copy_to_host(&self, src: &MatDesc, dst: &mut [f32]) -> Status;

    /// Device-to-device copy between equally sized matrices
    fn copy_on_device(&self, src: &MatDesc, dst: &MatDesc) -> Status;

    /// Fill every element with `alpha`
    fn assign_scalar(&self, mat: &MatDesc, alpha: f32) -> Status;

    /// Read a single element
    fn read_from(&self, mat: &MatDesc, row: usize, col: usize, out: &mut f32) -> Status;

    /// Write a single element
    fn write_at(&self, mat: &MatDesc, row: usize, col: usize, value: f32) -> Status;

    /// Copy rows `[start, end)` of `src` into `target`
    fn get_row_slice(&self, src: &MatDesc, target: &MatDesc, start: usize, end: usize)
    -> Status;

    /// Copy `src` into rows `[start, end)` of `target`
    fn set_row_slice(&self, src: &MatDesc, target: &MatDesc, start: usize, end: usize)
    -> Status;

    /// Physically transpose `src` into `target`
    fn copy_transpose(&self, src: &MatDesc, target: &MatDesc) -> Status;

    // ===== Elementwise =====

    /// target = a op b
    fn binary_elementwise(&self, op: BinaryOp, a: &MatDesc, b: &MatDesc, target: &MatDesc)
    -> Status;

    /// target = a op alpha
    fn binary_scalar(&self, op: BinaryOp, a: &MatDesc, alpha: f32, target: &MatDesc) -> Status;

    /// a += mult * b
    fn add_mult(&self, a: &MatDesc, b: &MatDesc, mult: f32) -> Status;

    /// target = scale_targets * target + a * b
    fn mult_scaled(&self, a: &MatDesc, b: &MatDesc, target: &MatDesc, scale_targets: f32)
    -> Status;

    /// target = scale_targets * target + a * alpha
    fn mult_scalar_scaled(&self, a: &MatDesc, alpha: f32, target: &MatDesc, scale_targets: f32)
    -> Status;

    /// a += mult * sign(b)
    fn add_mult_sign(&self, a: &MatDesc, b: &MatDesc, mult: f32) -> Status;

    /// target = f(a)
    fn apply_unary(&self, op: UnaryOp, a: &MatDesc, target: &MatDesc) -> Status;

    /// target = op'(act) applied to the gradient `grad`
    fn apply_deriv(&self, op: DerivOp, grad: &MatDesc, act: &MatDesc, target: &MatDesc)
    -> Status;

    /// target = loss(labels, predictions)
    fn elementwise_loss(
        &self,
        op: LossOp,
        labels: &MatDesc,
        predictions: &MatDesc,
        target: &MatDesc,
    ) -> Status;

    /// target = a cmp b
    fn compare(&self, op: CompareOp, a: &MatDesc, b: &MatDesc, target: &MatDesc) -> Status;

    /// target = a cmp alpha
    fn compare_scalar(&self, op: CompareOp, a: &MatDesc, alpha: f32, target: &MatDesc)
    -> Status;

    // ===== Broadcast =====

    /// target[r, c] = mat[r, c] op (mult * vec[r]) for a `(rows, 1)` vector
    fn column_vector_op(
        &self,
        op: BinaryOp,
        mat: &MatDesc,
        vec: &MatDesc,
        target: &MatDesc,
        mult: f32,
    ) -> Status;

    /// target[r, c] = mat[r, c] op (mult * vec[c]) for a `(1, cols)` vector
    fn row_vector_op(
        &self,
        op: BinaryOp,
        mat: &MatDesc,
        vec: &MatDesc,
        target: &MatDesc,
        mult: f32,
    ) -> Status;

    /// target = mat with diagonal entries combined with the entries of `vec`
    fn diagonal_op(&self, op: BinaryOp, mat: &MatDesc, vec: &MatDesc, target: &MatDesc)
    -> Status;

    /// target = mat with diagonal entries combined with `alpha`
    fn diagonal_scalar_op(&self, op: BinaryOp, mat: &MatDesc, alpha: f32, target: &MatDesc)
    -> Status;

    // ===== Reductions =====

    /// target = p * target + mult * sum(mat, axis)
    fn sum_by_axis(&self, mat: &MatDesc, target: &MatDesc, axis: Axis, mult: f32, p: f32)
    -> Status;

    /// target = p * target + mult * sum(mat^2, axis)
    fn sqsum_by_axis(
        &self,
        mat: &MatDesc,
        target: &MatDesc,
        axis: Axis,
        mult: f32,
        p: f32,
    ) -> Status;

    /// target = max(mat, axis)
    fn max_by_axis(&self, mat: &MatDesc, target: &MatDesc, axis: Axis) -> Status;

    /// target = argmax(mat, axis), indices encoded as f32
    fn argmax_by_axis(&self, mat: &MatDesc, target: &MatDesc, axis: Axis) -> Status;

    /// Rescale every vector along `axis` so its norm respects `norm`
    fn normlimit_by_axis(
        &self,
        mat: &MatDesc,
        target: &MatDesc,
        axis: Axis,
        norm: f32,
        constraint: NormConstraint,
    ) -> Status;

    /// Running sum along `axis`
    fn cumsum_by_axis(&self, mat: &MatDesc, target: &MatDesc, axis: Axis) -> Status;

    /// One-hot mask of the maximum along `axis`
    fn choose_max_by_axis(&self, mat: &MatDesc, target: &MatDesc, axis: Axis) -> Status;

    /// acc[r, c] += 1 where row r holds the maximum of column c
    fn choose_max_and_accumulate(&self, mat: &MatDesc, acc: &MatDesc) -> Status;

    /// Inner product of two equally sized matrices viewed as vectors
    fn vdot(&self, a: &MatDesc, b: &MatDesc, out: &mut f32) -> Status;

    /// Frobenius norm
    fn euclid_norm(&self, mat: &MatDesc, out: &mut f32) -> Status;

    // ===== Softmax =====

    /// Normalize every column into a probability distribution
    fn softmax(&self, mat: &MatDesc, target: &MatDesc) -> Status;

    /// target = mat minus the one-hot encoding of `labels` (one row index per column)
    fn apply_softmax_grad(&self, mat: &MatDesc, labels: &MatDesc, target: &MatDesc) -> Status;

    /// target[c] = 1 where the maximum of column c sits in row `labels[c]`, 0 otherwise
    fn softmax_correct(&self, mat: &MatDesc, labels: &MatDesc, target: &MatDesc) -> Status;

    /// target[c] = -ln(mat[labels[c], c] + tiny)
    fn softmax_cross_entropy(
        &self,
        mat: &MatDesc,
        labels: &MatDesc,
        target: &MatDesc,
        tiny: f32,
    ) -> Status;

    // ===== Linear algebra =====

    /// target = beta * target + alpha * (a · b), honoring each operand's `is_trans`
    fn dot(&self, a: &MatDesc, b: &MatDesc, target: &MatDesc, beta: f32, alpha: f32) -> Status;

    // ===== Column permutation =====

    /// target[:, c] = src[:, indices[c]]
    fn select_columns(&self, src: &MatDesc, target: &MatDesc, indices: &MatDesc) -> Status;

    /// target[:, indices[c]] = src[:, c]
    fn set_selected_columns(&self, target: &MatDesc, src: &MatDesc, indices: &MatDesc)
    -> Status;

    /// target[:, idx2[c]] = src[:, idx1[c]]
    fn swap_columns(
        &self,
        src: &MatDesc,
        target: &MatDesc,
        idx1: &MatDesc,
        idx2: &MatDesc,
    ) -> Status;

    /// target[:, indices[c]] += mult * src[:, c], averaged per destination when `avg`
    fn accumulate_columns(
        &self,
        src: &MatDesc,
        indices: &MatDesc,
        target: &MatDesc,
        mult: f32,
        avg: bool,
    ) -> Status;

    /// target[:, c] = mat[:, c] + mult * val[:, indices[c]]
    fn expand_and_add(
        &self,
        mat: &MatDesc,
        val: &MatDesc,
        indices: &MatDesc,
        target: &MatDesc,
        mult: f32,
    ) -> Status;

    /// In place: column c becomes the old column perm[c]
    fn shuffle_columns(&self, mat: &MatDesc, perm: &MatDesc) -> Status;

    // ===== Random =====

    /// Seed every stream from `seed`, discarding previous state
    fn init_random(&self, streams: &mut RngStreams, seed: u64) -> Status;

    /// Fill with uniform samples from (0, 1)
    fn fill_with_rand(&self, streams: &mut RngStreams, mat: &MatDesc) -> Status;

    /// Fill with standard normal samples
    fn fill_with_randn(&self, streams: &mut RngStreams, mat: &MatDesc) -> Status;

    /// target = sample(op, src)
    fn sample(&self, streams: &mut RngStreams, op: SampleOp, src: &MatDesc, target: &MatDesc)
    -> Status;

    /// Replace entries with `value` with probability `drop_prob`, scale the rest
    fn dropout(
        &self,
        streams: &mut RngStreams,
        mat: &MatDesc,
        drop_prob: f32,
        value: f32,
        scale: f32,
    ) -> Status;
}
