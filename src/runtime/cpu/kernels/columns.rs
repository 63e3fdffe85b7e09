//! Column gather/scatter driven by float-encoded index vectors
//!
//! A source index outside `[-cols, cols - 1]` yields a column of NaN. A destination
//! index outside that range is skipped.

use super::{KernelResult, ensure, load, resolve_index, store};
use crate::runtime::{ArenaAllocator, MatDesc, Status};

fn check_untransposed(mats: &[&MatDesc]) -> KernelResult {
    ensure(mats.iter().all(|m| !m.is_trans), Status::TRANSPOSED)
}

/// Copy column `from` of `src` (or NaN when out of range) into column `to` of `out`
fn put_column(out: &mut [f32], to: usize, src: &[f32], from: Option<usize>, rows: usize) {
    let dst = &mut out[to * rows..(to + 1) * rows];
    match from {
        Some(f) => dst.copy_from_slice(&src[f * rows..(f + 1) * rows]),
        None => dst.fill(f32::NAN),
    }
}

pub(crate) fn select_columns(
    arena: &ArenaAllocator,
    src: &MatDesc,
    target: &MatDesc,
    indices: &MatDesc,
) -> KernelResult {
    check_untransposed(&[src, target])?;
    ensure(
        indices.len() == target.cols && target.rows == src.rows,
        Status::INCOMPATIBLE_DIMENSIONS,
    )?;
    let (data, idx) = (load(arena, src)?, load(arena, indices)?);
    let mut out = vec![0.0; target.len()];
    for (c, &i) in idx.iter().enumerate() {
        put_column(&mut out, c, &data, resolve_index(i, src.cols), src.rows);
    }
    store(arena, target, &out)
}

pub(crate) fn set_selected_columns(
    arena: &ArenaAllocator,
    target: &MatDesc,
    src: &MatDesc,
    indices: &MatDesc,
) -> KernelResult {
    check_untransposed(&[src, target])?;
    ensure(
        indices.len() == src.cols && target.rows == src.rows,
        Status::INCOMPATIBLE_DIMENSIONS,
    )?;
    let (data, idx) = (load(arena, src)?, load(arena, indices)?);
    let mut out = load(arena, target)?;
    for (c, &i) in idx.iter().enumerate() {
        if let Some(to) = resolve_index(i, target.cols) {
            put_column(&mut out, to, &data, Some(c), src.rows);
        }
    }
    store(arena, target, &out)
}

pub(crate) fn swap_columns(
    arena: &ArenaAllocator,
    src: &MatDesc,
    target: &MatDesc,
    idx1: &MatDesc,
    idx2: &MatDesc,
) -> KernelResult {
    check_untransposed(&[src, target])?;
    ensure(
        idx1.len() == idx2.len() && target.rows == src.rows,
        Status::INCOMPATIBLE_DIMENSIONS,
    )?;
    let (data, from, to) = (load(arena, src)?, load(arena, idx1)?, load(arena, idx2)?);
    let mut out = load(arena, target)?;
    for (&f, &t) in from.iter().zip(&to) {
        if let Some(to) = resolve_index(t, target.cols) {
            put_column(&mut out, to, &data, resolve_index(f, src.cols), src.rows);
        }
    }
    store(arena, target, &out)
}

pub(crate) fn shuffle_columns(
    arena: &ArenaAllocator,
    mat: &MatDesc,
    perm: &MatDesc,
) -> KernelResult {
    check_untransposed(&[mat])?;
    ensure(perm.len() == mat.cols, Status::INCOMPATIBLE_DIMENSIONS)?;
    let (data, idx) = (load(arena, mat)?, load(arena, perm)?);
    let mut out = vec![0.0; data.len()];
    for (c, &i) in idx.iter().enumerate() {
        put_column(&mut out, c, &data, resolve_index(i, mat.cols), mat.rows);
    }
    store(arena, mat, &out)
}

pub(crate) fn accumulate_columns(
    arena: &ArenaAllocator,
    src: &MatDesc,
    indices: &MatDesc,
    target: &MatDesc,
    mult: f32,
    avg: bool,
) -> KernelResult {
    check_untransposed(&[src, target])?;
    ensure(
        indices.len() == src.cols && target.rows == src.rows,
        Status::INCOMPATIBLE_DIMENSIONS,
    )?;
    let (data, idx) = (load(arena, src)?, load(arena, indices)?);
    let rows = src.rows;
    let mut sums = vec![0.0; target.len()];
    let mut counts = vec![0usize; target.cols];
    for (c, &i) in idx.iter().enumerate() {
        if let Some(to) = resolve_index(i, target.cols) {
            counts[to] += 1;
            for r in 0..rows {
                sums[r + to * rows] += data[r + c * rows];
            }
        }
    }
    let mut out = load(arena, target)?;
    for (to, &count) in counts.iter().enumerate() {
        let div = if avg && count > 0 { count as f32 } else { 1.0 };
        for r in 0..rows {
            out[r + to * rows] += mult * sums[r + to * rows] / div;
        }
    }
    store(arena, target, &out)
}

pub(crate) fn expand_and_add(
    arena: &ArenaAllocator,
    mat: &MatDesc,
    val: &MatDesc,
    indices: &MatDesc,
    target: &MatDesc,
    mult: f32,
) -> KernelResult {
    check_untransposed(&[mat, val, target])?;
    ensure(
        mat.same_size(target) && indices.len() == mat.cols && val.rows == mat.rows,
        Status::INCOMPATIBLE_DIMENSIONS,
    )?;
    let (data, vals, idx) = (load(arena, mat)?, load(arena, val)?, load(arena, indices)?);
    let rows = mat.rows;
    let mut gathered = vec![0.0; data.len()];
    for (c, &i) in idx.iter().enumerate() {
        put_column(&mut gathered, c, &vals, resolve_index(i, val.cols), rows);
    }
    let out = data
        .iter()
        .zip(&gathered)
        .map(|(x, g)| x + mult * g)
        .collect::<Vec<_>>();
    store(arena, target, &out)
}
