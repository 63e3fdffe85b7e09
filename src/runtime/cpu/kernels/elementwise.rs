//! Elementwise arithmetic, unary, comparison, derivative and loss kernels

use super::{KernelResult, ensure, load, map_elements, store};
use crate::runtime::{
    ArenaAllocator, BinaryOp, CompareOp, DerivOp, LossOp, MatDesc, Status, UnaryOp,
};

/// Shared shape rules: equal physical extents, equal transposedness
fn check_pair(a: &MatDesc, t: &MatDesc) -> KernelResult {
    ensure(a.same_size(t), Status::INCOMPATIBLE_DIMENSIONS)?;
    ensure(a.is_trans == t.is_trans, Status::TRANSPOSEDNESS)
}

fn check_triple(a: &MatDesc, b: &MatDesc, t: &MatDesc) -> KernelResult {
    ensure(a.same_size(b) && a.same_size(t), Status::INCOMPATIBLE_DIMENSIONS)?;
    ensure(
        a.is_trans == b.is_trans && a.is_trans == t.is_trans,
        Status::TRANSPOSEDNESS,
    )
}

pub(crate) fn binary(
    arena: &ArenaAllocator,
    op: BinaryOp,
    a: &MatDesc,
    b: &MatDesc,
    t: &MatDesc,
) -> KernelResult {
    check_triple(a, b, t)?;
    let (x, y) = (load(arena, a)?, load(arena, b)?);
    let out = map_elements(x.len(), |i| op.apply(x[i], y[i]));
    store(arena, t, &out)
}

pub(crate) fn binary_scalar(
    arena: &ArenaAllocator,
    op: BinaryOp,
    a: &MatDesc,
    alpha: f32,
    t: &MatDesc,
) -> KernelResult {
    check_pair(a, t)?;
    let x = load(arena, a)?;
    let out = map_elements(x.len(), |i| op.apply(x[i], alpha));
    store(arena, t, &out)
}

pub(crate) fn add_mult(
    arena: &ArenaAllocator,
    a: &MatDesc,
    b: &MatDesc,
    mult: f32,
) -> KernelResult {
    check_pair(b, a)?;
    let (x, y) = (load(arena, a)?, load(arena, b)?);
    let out = map_elements(x.len(), |i| x[i] + mult * y[i]);
    store(arena, a, &out)
}

/// target = scale * target + product; the old target is not read when `scale` is 0
fn store_scaled(
    arena: &ArenaAllocator,
    t: &MatDesc,
    product: Vec<f32>,
    scale: f32,
) -> KernelResult {
    if scale == 0.0 {
        return store(arena, t, &product);
    }
    let prev = load(arena, t)?;
    let out = map_elements(prev.len(), |i| scale * prev[i] + product[i]);
    store(arena, t, &out)
}

pub(crate) fn mult_scaled(
    arena: &ArenaAllocator,
    a: &MatDesc,
    b: &MatDesc,
    t: &MatDesc,
    scale: f32,
) -> KernelResult {
    check_triple(a, b, t)?;
    let (x, y) = (load(arena, a)?, load(arena, b)?);
    store_scaled(arena, t, map_elements(x.len(), |i| x[i] * y[i]), scale)
}

pub(crate) fn mult_scalar_scaled(
    arena: &ArenaAllocator,
    a: &MatDesc,
    alpha: f32,
    t: &MatDesc,
    scale: f32,
) -> KernelResult {
    check_pair(a, t)?;
    let x = load(arena, a)?;
    store_scaled(arena, t, map_elements(x.len(), |i| x[i] * alpha), scale)
}

pub(crate) fn add_mult_sign(
    arena: &ArenaAllocator,
    a: &MatDesc,
    b: &MatDesc,
    mult: f32,
) -> KernelResult {
    check_pair(b, a)?;
    let (x, y) = (load(arena, a)?, load(arena, b)?);
    let out = map_elements(x.len(), |i| x[i] + mult * UnaryOp::Sign.apply(y[i]));
    store(arena, a, &out)
}

pub(crate) fn unary(arena: &ArenaAllocator, op: UnaryOp, a: &MatDesc, t: &MatDesc) -> KernelResult {
    check_pair(a, t)?;
    let x = load(arena, a)?;
    let out = map_elements(x.len(), |i| op.apply(x[i]));
    store(arena, t, &out)
}

pub(crate) fn compare(
    arena: &ArenaAllocator,
    op: CompareOp,
    a: &MatDesc,
    b: &MatDesc,
    t: &MatDesc,
) -> KernelResult {
    // The modulus bound is only defined against a scalar
    ensure(op != CompareOp::UpperBoundMod, Status::UNSUPPORTED)?;
    check_triple(a, b, t)?;
    let (x, y) = (load(arena, a)?, load(arena, b)?);
    let out = map_elements(x.len(), |i| op.apply(x[i], y[i]));
    store(arena, t, &out)
}

pub(crate) fn compare_scalar(
    arena: &ArenaAllocator,
    op: CompareOp,
    a: &MatDesc,
    alpha: f32,
    t: &MatDesc,
) -> KernelResult {
    check_pair(a, t)?;
    let x = load(arena, a)?;
    let out = map_elements(x.len(), |i| op.apply(x[i], alpha));
    store(arena, t, &out)
}

pub(crate) fn deriv(
    arena: &ArenaAllocator,
    op: DerivOp,
    grad: &MatDesc,
    act: &MatDesc,
    t: &MatDesc,
) -> KernelResult {
    check_triple(grad, act, t)?;
    let (g, y) = (load(arena, grad)?, load(arena, act)?);
    let out = map_elements(g.len(), |i| op.apply(g[i], y[i]));
    store(arena, t, &out)
}

pub(crate) fn loss(
    arena: &ArenaAllocator,
    op: LossOp,
    labels: &MatDesc,
    predictions: &MatDesc,
    t: &MatDesc,
) -> KernelResult {
    check_triple(labels, predictions, t)?;
    let (l, p) = (load(arena, labels)?, load(arena, predictions)?);
    let out = map_elements(l.len(), |i| op.apply(l[i], p[i]));
    store(arena, t, &out)
}
