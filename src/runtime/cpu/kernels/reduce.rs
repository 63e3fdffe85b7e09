//! Axis reductions, running sums and norms

use super::{KernelResult, ensure, load, store};
use crate::runtime::{ArenaAllocator, Axis, MatDesc, NormConstraint, Status};

/// Elements of lane `k`: column `k` for [`Axis::Rows`], row `k` for [`Axis::Cols`]
fn lane(data: &[f32], rows: usize, cols: usize, axis: Axis, k: usize) -> Vec<f32> {
    match axis {
        Axis::Rows => data[k * rows..(k + 1) * rows].to_vec(),
        Axis::Cols => (0..cols).map(|c| data[k + c * rows]).collect(),
    }
}

fn lane_count(mat: &MatDesc, axis: Axis) -> usize {
    match axis {
        Axis::Rows => mat.cols,
        Axis::Cols => mat.rows,
    }
}

/// Index of lane `k`'s element `j` in column-major storage
fn lane_index(rows: usize, axis: Axis, k: usize, j: usize) -> usize {
    match axis {
        Axis::Rows => j + k * rows,
        Axis::Cols => k + j * rows,
    }
}

fn check_reduction(mat: &MatDesc, target: &MatDesc, axis: Axis) -> KernelResult {
    ensure(!mat.is_trans && !target.is_trans, Status::TRANSPOSED)?;
    let (rows, cols) = axis.reduced_shape(mat.rows, mat.cols);
    ensure(
        target.rows == rows && target.cols == cols,
        Status::INCOMPATIBLE_DIMENSIONS,
    )
}

fn reduce_lanes<F>(
    arena: &ArenaAllocator,
    mat: &MatDesc,
    axis: Axis,
    f: F,
) -> KernelResult<Vec<f32>>
where
    F: Fn(&[f32]) -> f32,
{
    let data = load(arena, mat)?;
    Ok((0..lane_count(mat, axis))
        .map(|k| f(&lane(&data, mat.rows, mat.cols, axis, k)))
        .collect())
}

/// target = p * target + mult * reduced
fn accumulate(
    arena: &ArenaAllocator,
    target: &MatDesc,
    reduced: Vec<f32>,
    mult: f32,
    p: f32,
) -> KernelResult {
    let out = if p == 0.0 {
        reduced.into_iter().map(|x| mult * x).collect::<Vec<_>>()
    } else {
        let prev = load(arena, target)?;
        prev.iter()
            .zip(reduced)
            .map(|(t, x)| p * t + mult * x)
            .collect()
    };
    store(arena, target, &out)
}

pub(crate) fn sum_by_axis(
    arena: &ArenaAllocator,
    mat: &MatDesc,
    target: &MatDesc,
    axis: Axis,
    mult: f32,
    p: f32,
) -> KernelResult {
    check_reduction(mat, target, axis)?;
    let sums = reduce_lanes(arena, mat, axis, |l| l.iter().sum())?;
    accumulate(arena, target, sums, mult, p)
}

pub(crate) fn sqsum_by_axis(
    arena: &ArenaAllocator,
    mat: &MatDesc,
    target: &MatDesc,
    axis: Axis,
    mult: f32,
    p: f32,
) -> KernelResult {
    check_reduction(mat, target, axis)?;
    let sums = reduce_lanes(arena, mat, axis, |l| l.iter().map(|x| x * x).sum())?;
    accumulate(arena, target, sums, mult, p)
}

/// Position of the first maximum in a lane
pub(super) fn argmax(lane: &[f32]) -> usize {
    let mut best = 0;
    for (j, &x) in lane.iter().enumerate() {
        if x > lane[best] {
            best = j;
        }
    }
    best
}

pub(crate) fn max_by_axis(
    arena: &ArenaAllocator,
    mat: &MatDesc,
    target: &MatDesc,
    axis: Axis,
) -> KernelResult {
    check_reduction(mat, target, axis)?;
    let maxima = reduce_lanes(arena, mat, axis, |l| {
        l.iter().copied().fold(f32::NEG_INFINITY, f32::max)
    })?;
    store(arena, target, &maxima)
}

pub(crate) fn argmax_by_axis(
    arena: &ArenaAllocator,
    mat: &MatDesc,
    target: &MatDesc,
    axis: Axis,
) -> KernelResult {
    check_reduction(mat, target, axis)?;
    let indices = reduce_lanes(arena, mat, axis, |l| argmax(l) as f32)?;
    store(arena, target, &indices)
}

fn check_full(mat: &MatDesc, target: &MatDesc) -> KernelResult {
    ensure(!mat.is_trans && !target.is_trans, Status::TRANSPOSED)?;
    ensure(mat.same_size(target), Status::INCOMPATIBLE_DIMENSIONS)
}

/// Rewrite every lane of `mat` through `f` into a same-sized target
fn map_lanes<F>(
    arena: &ArenaAllocator,
    mat: &MatDesc,
    target: &MatDesc,
    axis: Axis,
    f: F,
) -> KernelResult
where
    F: Fn(&[f32], &mut [f32]),
{
    let data = load(arena, mat)?;
    let mut out = vec![0.0; data.len()];
    let mut scratch = Vec::new();
    for k in 0..lane_count(mat, axis) {
        let l = lane(&data, mat.rows, mat.cols, axis, k);
        scratch.clear();
        scratch.resize(l.len(), 0.0);
        f(&l, &mut scratch);
        for (j, &x) in scratch.iter().enumerate() {
            out[lane_index(mat.rows, axis, k, j)] = x;
        }
    }
    store(arena, target, &out)
}

pub(crate) fn normlimit_by_axis(
    arena: &ArenaAllocator,
    mat: &MatDesc,
    target: &MatDesc,
    axis: Axis,
    norm: f32,
    constraint: NormConstraint,
) -> KernelResult {
    check_full(mat, target)?;
    map_lanes(arena, mat, target, axis, |l, out| {
        let current = l.iter().map(|x| x * x).sum::<f32>().sqrt();
        let scale = match constraint {
            NormConstraint::Exact if current > 0.0 => norm / current,
            NormConstraint::ClipIfExceeding if current > norm => norm / current,
            _ => 1.0,
        };
        for (o, x) in out.iter_mut().zip(l) {
            *o = x * scale;
        }
    })
}

pub(crate) fn cumsum_by_axis(
    arena: &ArenaAllocator,
    mat: &MatDesc,
    target: &MatDesc,
    axis: Axis,
) -> KernelResult {
    ensure(axis == Axis::Rows, Status::UNSUPPORTED)?;
    check_full(mat, target)?;
    map_lanes(arena, mat, target, axis, |l, out| {
        let mut acc = 0.0;
        for (o, x) in out.iter_mut().zip(l) {
            acc += x;
            *o = acc;
        }
    })
}

pub(crate) fn choose_max_by_axis(
    arena: &ArenaAllocator,
    mat: &MatDesc,
    target: &MatDesc,
    axis: Axis,
) -> KernelResult {
    ensure(axis == Axis::Rows, Status::UNSUPPORTED)?;
    check_full(mat, target)?;
    map_lanes(arena, mat, target, axis, |l, out| {
        if !l.is_empty() {
            out[argmax(l)] = 1.0;
        }
    })
}

pub(crate) fn choose_max_and_accumulate(
    arena: &ArenaAllocator,
    mat: &MatDesc,
    acc: &MatDesc,
) -> KernelResult {
    check_full(mat, acc)?;
    let (data, mut out) = (load(arena, mat)?, load(arena, acc)?);
    if mat.rows > 0 {
        for (c, col) in data.chunks(mat.rows).enumerate() {
            out[argmax(col) + c * mat.rows] += 1.0;
        }
    }
    store(arena, acc, &out)
}

pub(crate) fn vdot(arena: &ArenaAllocator, a: &MatDesc, b: &MatDesc) -> KernelResult<f32> {
    ensure(a.len() == b.len(), Status::INCOMPATIBLE_DIMENSIONS)?;
    // Vectors read the same in either orientation; full matrices must agree
    let is_vector = |m: &MatDesc| m.rows == 1 || m.cols == 1;
    ensure(
        a.is_trans == b.is_trans || is_vector(a) || is_vector(b),
        Status::TRANSPOSEDNESS,
    )?;
    let (x, y) = (load(arena, a)?, load(arena, b)?);
    Ok(x.iter().zip(&y).map(|(p, q)| p * q).sum())
}

pub(crate) fn euclid_norm(arena: &ArenaAllocator, mat: &MatDesc) -> KernelResult<f32> {
    let data = load(arena, mat)?;
    Ok(data.iter().map(|x| x * x).sum::<f32>().sqrt())
}

#[cfg(test)]
mod tests {
    use super::super::Fault;
    use super::super::test_util::{download, upload};
    use super::*;

    // [[1, 4], [2, 5], [3, 6]]
    const M: [f32; 6] = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];

    #[test]
    fn test_sum_by_axis() {
        let arena = ArenaAllocator::new();
        let m = upload(&arena, &M, 3, 2);
        let row = upload(&arena, &[0.0; 2], 1, 2);
        let col = upload(&arena, &[1.0; 3], 3, 1);

        sum_by_axis(&arena, &m, &row, Axis::Rows, 1.0, 0.0).unwrap();
        assert_eq!(download(&arena, &row), vec![6.0, 15.0]);

        sum_by_axis(&arena, &m, &col, Axis::Cols, 2.0, 1.0).unwrap();
        assert_eq!(download(&arena, &col), vec![11.0, 15.0, 19.0]);

        assert_eq!(
            sum_by_axis(&arena, &m, &col, Axis::Rows, 1.0, 0.0),
            Err(Fault::Status(Status::INCOMPATIBLE_DIMENSIONS))
        );
    }

    #[test]
    fn test_reduction_rejects_transposed() {
        let arena = ArenaAllocator::new();
        let mut m = upload(&arena, &M, 3, 2);
        m.is_trans = true;
        let row = upload(&arena, &[0.0; 2], 1, 2);
        assert_eq!(
            max_by_axis(&arena, &m, &row, Axis::Rows),
            Err(Fault::Status(Status::TRANSPOSED))
        );
    }

    #[test]
    fn test_max_and_argmax() {
        let arena = ArenaAllocator::new();
        let m = upload(&arena, &[3.0, 9.0, 1.0, 4.0, 2.0, 8.0], 3, 2);
        let row = upload(&arena, &[0.0; 2], 1, 2);
        max_by_axis(&arena, &m, &row, Axis::Rows).unwrap();
        assert_eq!(download(&arena, &row), vec![9.0, 8.0]);

        let col = upload(&arena, &[0.0; 3], 3, 1);
        argmax_by_axis(&arena, &m, &col, Axis::Cols).unwrap();
        assert_eq!(download(&arena, &col), vec![1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_cumsum_and_choose_max() {
        let arena = ArenaAllocator::new();
        let m = upload(&arena, &M, 3, 2);
        let t = upload(&arena, &[0.0; 6], 3, 2);
        cumsum_by_axis(&arena, &m, &t, Axis::Rows).unwrap();
        assert_eq!(download(&arena, &t), vec![1.0, 3.0, 6.0, 4.0, 9.0, 15.0]);

        choose_max_by_axis(&arena, &m, &t, Axis::Rows).unwrap();
        assert_eq!(download(&arena, &t), vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0]);

        assert_eq!(
            cumsum_by_axis(&arena, &m, &t, Axis::Cols),
            Err(Fault::Status(Status::UNSUPPORTED))
        );
    }

    #[test]
    fn test_choose_max_and_accumulate() {
        let arena = ArenaAllocator::new();
        let m = upload(&arena, &M, 3, 2);
        let acc = upload(&arena, &[0.0, 0.0, 1.0, 0.0, 0.0, 0.0], 3, 2);
        choose_max_and_accumulate(&arena, &m, &acc).unwrap();
        choose_max_and_accumulate(&arena, &m, &acc).unwrap();
        assert_eq!(download(&arena, &acc), vec![0.0, 0.0, 3.0, 0.0, 0.0, 2.0]);
    }

    #[test]
    fn test_normlimit() {
        let arena = ArenaAllocator::new();
        // columns (3, 4) and (0.3, 0.4)
        let m = upload(&arena, &[3.0, 4.0, 0.3, 0.4], 2, 2);
        let t = upload(&arena, &[0.0; 4], 2, 2);
        normlimit_by_axis(&arena, &m, &t, Axis::Rows, 1.0, NormConstraint::ClipIfExceeding)
            .unwrap();
        let out = download(&arena, &t);
        assert!((out[0] - 0.6).abs() < 1e-6 && (out[1] - 0.8).abs() < 1e-6);
        assert!((out[2] - 0.3).abs() < 1e-6 && (out[3] - 0.4).abs() < 1e-6);

        normlimit_by_axis(&arena, &m, &t, Axis::Rows, 1.0, NormConstraint::Exact).unwrap();
        let out = download(&arena, &t);
        assert!((out[2] - 0.6).abs() < 1e-6 && (out[3] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_vdot_and_norm() {
        let arena = ArenaAllocator::new();
        let a = upload(&arena, &[1.0, 2.0, 3.0], 3, 1);
        let b = upload(&arena, &[4.0, 5.0, 6.0], 1, 3);
        assert_eq!(vdot(&arena, &a, &b).unwrap(), 32.0);

        let n = upload(&arena, &[3.0, 4.0], 2, 1);
        assert_eq!(euclid_norm(&arena, &n).unwrap(), 5.0);
    }
}
