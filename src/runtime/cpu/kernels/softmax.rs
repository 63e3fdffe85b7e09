//! Column softmax and the label-driven kernels built on it
//!
//! Every column of the input is one case: a distribution over its rows. Label
//! vectors hold one float-encoded row index per column.

use super::reduce::argmax;
use super::{KernelResult, ensure, load, store};
use crate::runtime::{ArenaAllocator, MatDesc, Status};

fn check_untransposed(mats: &[&MatDesc]) -> KernelResult {
    ensure(mats.iter().all(|m| !m.is_trans), Status::TRANSPOSED)
}

/// Labels must be one entry per column of `mat`; `out` is the per-column result
fn check_labels(mat: &MatDesc, labels: &MatDesc, out: &MatDesc) -> KernelResult {
    check_untransposed(&[mat, labels, out])?;
    ensure(
        labels.len() == mat.cols && out.len() == mat.cols,
        Status::INCOMPATIBLE_DIMENSIONS,
    )
}

/// Row addressed by a float-encoded label, if it names one
fn label_row(value: f32, rows: usize) -> Option<usize> {
    if value.is_finite() && value >= 0.0 && (value as usize) < rows {
        Some(value as usize)
    } else {
        None
    }
}

/// Replace `col` with exp(x - max) / sum, leaving an all-zero column if the sum vanishes
fn softmax_column(col: &mut [f32]) {
    let max_val = col.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let mut sum = 0.0;
    for x in col.iter_mut() {
        *x = (*x - max_val).exp();
        sum += *x;
    }
    let inv_sum = if sum > 0.0 { 1.0 / sum } else { 0.0 };
    for x in col.iter_mut() {
        *x *= inv_sum;
    }
}

pub(crate) fn softmax(arena: &ArenaAllocator, mat: &MatDesc, target: &MatDesc) -> KernelResult {
    check_untransposed(&[mat, target])?;
    ensure(mat.same_size(target), Status::INCOMPATIBLE_DIMENSIONS)?;
    let mut data = load(arena, mat)?;
    if mat.rows > 0 {
        for col in data.chunks_mut(mat.rows) {
            softmax_column(col);
        }
    }
    store(arena, target, &data)
}

pub(crate) fn apply_softmax_grad(
    arena: &ArenaAllocator,
    mat: &MatDesc,
    labels: &MatDesc,
    target: &MatDesc,
) -> KernelResult {
    check_untransposed(&[mat, labels, target])?;
    ensure(
        labels.len() == mat.cols && mat.same_size(target),
        Status::INCOMPATIBLE_DIMENSIONS,
    )?;
    let (mut data, idx) = (load(arena, mat)?, load(arena, labels)?);
    for (c, &label) in idx.iter().enumerate() {
        if let Some(r) = label_row(label, mat.rows) {
            data[r + c * mat.rows] -= 1.0;
        }
    }
    store(arena, target, &data)
}

pub(crate) fn softmax_correct(
    arena: &ArenaAllocator,
    mat: &MatDesc,
    labels: &MatDesc,
    target: &MatDesc,
) -> KernelResult {
    check_labels(mat, labels, target)?;
    let (data, idx) = (load(arena, mat)?, load(arena, labels)?);
    let out = idx
        .iter()
        .enumerate()
        .map(|(c, &label)| {
            let col = &data[c * mat.rows..(c + 1) * mat.rows];
            let hit = !col.is_empty() && label_row(label, mat.rows) == Some(argmax(col));
            if hit { 1.0 } else { 0.0 }
        })
        .collect::<Vec<_>>();
    store(arena, target, &out)
}

pub(crate) fn softmax_cross_entropy(
    arena: &ArenaAllocator,
    mat: &MatDesc,
    labels: &MatDesc,
    target: &MatDesc,
    tiny: f32,
) -> KernelResult {
    check_labels(mat, labels, target)?;
    let (data, idx) = (load(arena, mat)?, load(arena, labels)?);
    let out = idx
        .iter()
        .enumerate()
        .map(|(c, &label)| match label_row(label, mat.rows) {
            Some(r) => -(data[r + c * mat.rows] + tiny).ln(),
            None => f32::NAN,
        })
        .collect::<Vec<_>>();
    store(arena, target, &out)
}

#[cfg(test)]
mod tests {
    use super::super::Fault;
    use super::super::test_util::{download, upload};
    use super::*;

    #[test]
    fn test_softmax_columns_sum_to_one() {
        let arena = ArenaAllocator::new();
        // columns (0, 0) and (1000, 0): the second must not overflow
        let m = upload(&arena, &[0.0, 0.0, 1000.0, 0.0], 2, 2);
        softmax(&arena, &m, &m).unwrap();
        let out = download(&arena, &m);
        assert_eq!(&out[..2], &[0.5, 0.5]);
        assert!((out[2] - 1.0).abs() < 1e-6 && out[3].abs() < 1e-6);
    }

    #[test]
    fn test_softmax_grad_subtracts_one_hot() {
        let arena = ArenaAllocator::new();
        let m = upload(&arena, &[0.25, 0.75, 0.5, 0.5], 2, 2);
        let labels = upload(&arena, &[1.0, 7.0], 1, 2);
        let t = upload(&arena, &[0.0; 4], 2, 2);
        apply_softmax_grad(&arena, &m, &labels, &t).unwrap();
        // an out-of-range label leaves its column unchanged
        assert_eq!(download(&arena, &t), vec![0.25, -0.25, 0.5, 0.5]);
    }

    #[test]
    fn test_correct_and_cross_entropy() {
        let arena = ArenaAllocator::new();
        let m = upload(&arena, &[0.2, 0.8, 0.9, 0.1, 0.5, 0.5], 2, 3);
        let labels = upload(&arena, &[1.0, 1.0, 0.0], 1, 3);
        let t = upload(&arena, &[0.0; 3], 1, 3);

        softmax_correct(&arena, &m, &labels, &t).unwrap();
        assert_eq!(download(&arena, &t), vec![1.0, 0.0, 1.0]);

        softmax_cross_entropy(&arena, &m, &labels, &t, 0.0).unwrap();
        let out = download(&arena, &t);
        assert!((out[0] + 0.8f32.ln()).abs() < 1e-6);
        assert!((out[1] + 0.1f32.ln()).abs() < 1e-6);
    }

    #[test]
    fn test_label_shape_is_checked() {
        let arena = ArenaAllocator::new();
        let m = upload(&arena, &[0.0; 6], 2, 3);
        let labels = upload(&arena, &[0.0; 2], 1, 2);
        let t = upload(&arena, &[0.0; 3], 1, 3);
        assert_eq!(
            softmax_correct(&arena, &m, &labels, &t),
            Err(Fault::Status(Status::INCOMPATIBLE_DIMENSIONS))
        );
    }
}
