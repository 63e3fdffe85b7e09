//! Matrix multiplication

use super::{KernelResult, ensure, load, map_elements, store};
use crate::runtime::{ArenaAllocator, MatDesc, Status};

/// Logical element `(i, j)` of a column-major buffer described by `mat`
#[inline]
fn at(data: &[f32], mat: &MatDesc, i: usize, j: usize) -> f32 {
    if mat.is_trans {
        data[j + i * mat.rows]
    } else {
        data[i + j * mat.rows]
    }
}

/// target = beta * target + alpha * (a · b)
pub(crate) fn dot(
    arena: &ArenaAllocator,
    a: &MatDesc,
    b: &MatDesc,
    target: &MatDesc,
    beta: f32,
    alpha: f32,
) -> KernelResult {
    let (m, k) = (a.leading_dim(), a.nonleading_dim());
    let n = b.nonleading_dim();
    ensure(
        b.leading_dim() == k && target.leading_dim() == m && target.nonleading_dim() == n,
        Status::INCOMPATIBLE_DIMENSIONS,
    )?;
    ensure(!target.is_trans, Status::TRANSPOSEDNESS)?;

    let (x, y) = (load(arena, a)?, load(arena, b)?);
    let prev = if beta == 0.0 {
        None
    } else {
        Some(load(arena, target)?)
    };

    let out = map_elements(m * n, |idx| {
        let (i, j) = (idx % m, idx / m);
        let acc: f32 = (0..k).map(|p| at(&x, a, i, p) * at(&y, b, p, j)).sum();
        match &prev {
            Some(t) => beta * t[idx] + alpha * acc,
            None => alpha * acc,
        }
    });
    store(arena, target, &out)
}
