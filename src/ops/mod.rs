//! Matrix operations
//!
//! Every operation family is an `impl` block on [`Matrix`](crate::matrix::Matrix)
//! that forwards to one [`KernelLibrary`](crate::runtime::KernelLibrary) entry point
//! and translates the returned status before touching any output.
//!
//! ```text
//! Matrix<R>
//!   ├── add, subtract, multiply, divide, pow   (scalar or matrix operand)
//!   ├── add_row_vector, add_column_vector, ... (broadcast)
//!   ├── sigmoid, tanh, exp, log, ...           (unary)
//!   ├── less_than, upper_bound, ...            (comparison)
//!   ├── sum, max, argmax, norm_limit, ...      (reductions)
//!   ├── softmax, apply_*_deriv, cross_entropy  (activations and losses)
//!   ├── dot, add_dot, vdot, euclid_norm        (linear algebra)
//!   └── select_columns, shuffle_columns, ...   (column permutation)
//! ```
//!
//! # Output convention
//!
//! Operations that write a same-shaped result take `target: Option<&Matrix<R>>`
//! and return the matrix written to; `None` means in place. Operations whose result
//! has a different shape come in pairs: `op(..)` allocates a new matrix and
//! `op_into(.., target)` writes into an existing one.

mod activation;
mod arithmetic;
mod broadcast;
mod columns;
mod compare;
mod matmul;
mod reduce;
mod unary;
