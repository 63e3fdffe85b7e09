//! Row/column vector broadcasting and diagonal kernels

use super::{KernelResult, ensure, load, map_elements, store};
use crate::runtime::{ArenaAllocator, BinaryOp, MatDesc, Status};

fn is_vector_of(vec: &MatDesc, len: usize) -> bool {
    (vec.rows == 1 || vec.cols == 1) && vec.len() == len
}

fn check_broadcast(mat: &MatDesc, vec: &MatDesc, t: &MatDesc, len: usize) -> KernelResult {
    ensure(!mat.is_trans && !t.is_trans, Status::TRANSPOSED)?;
    ensure(
        is_vector_of(vec, len) && mat.same_size(t),
        Status::INCOMPATIBLE_DIMENSIONS,
    )
}

pub(crate) fn column_vector_op(
    arena: &ArenaAllocator,
    op: BinaryOp,
    mat: &MatDesc,
    vec: &MatDesc,
    t: &MatDesc,
    mult: f32,
) -> KernelResult {
    check_broadcast(mat, vec, t, mat.rows)?;
    let (m, v) = (load(arena, mat)?, load(arena, vec)?);
    let rows = mat.rows;
    let out = map_elements(m.len(), |i| op.apply(m[i], mult * v[i % rows]));
    store(arena, t, &out)
}

pub(crate) fn row_vector_op(
    arena: &ArenaAllocator,
    op: BinaryOp,
    mat: &MatDesc,
    vec: &MatDesc,
    t: &MatDesc,
    mult: f32,
) -> KernelResult {
    check_broadcast(mat, vec, t, mat.cols)?;
    let (m, v) = (load(arena, mat)?, load(arena, vec)?);
    let rows = mat.rows;
    let out = map_elements(m.len(), |i| op.apply(m[i], mult * v[i / rows]));
    store(arena, t, &out)
}

fn check_diagonal(mat: &MatDesc, t: &MatDesc) -> KernelResult {
    ensure(
        mat.rows == mat.cols && mat.same_size(t),
        Status::INCOMPATIBLE_DIMENSIONS,
    )?;
    ensure(mat.is_trans == t.is_trans, Status::TRANSPOSEDNESS)
}

fn combine_diagonal<F>(arena: &ArenaAllocator, mat: &MatDesc, t: &MatDesc, f: F) -> KernelResult
where
    F: Fn(usize, f32) -> f32 + Send + Sync,
{
    let m = load(arena, mat)?;
    let n = mat.rows;
    let out = map_elements(m.len(), |i| {
        let (r, c) = (i % n, i / n);
        if r == c { f(r, m[i]) } else { m[i] }
    });
    store(arena, t, &out)
}

pub(crate) fn diagonal_op(
    arena: &ArenaAllocator,
    op: BinaryOp,
    mat: &MatDesc,
    vec: &MatDesc,
    t: &MatDesc,
) -> KernelResult {
    check_diagonal(mat, t)?;
    ensure(is_vector_of(vec, mat.rows), Status::INCOMPATIBLE_DIMENSIONS)?;
    let v = load(arena, vec)?;
    combine_diagonal(arena, mat, t, |k, x| op.apply(x, v[k]))
}

pub(crate) fn diagonal_scalar_op(
    arena: &ArenaAllocator,
    op: BinaryOp,
    mat: &MatDesc,
    alpha: f32,
    t: &MatDesc,
) -> KernelResult {
    check_diagonal(mat, t)?;
    combine_diagonal(arena, mat, t, |_, x| op.apply(x, alpha))
}

#[cfg(test)]
mod tests {
    use super::super::Fault;
    use super::super::test_util::{download, upload};
    use super::*;

    #[test]
    fn test_add_column_and_row_vectors() {
        let arena = ArenaAllocator::new();
        // [[1, 3], [2, 4]]
        let m = upload(&arena, &[1.0, 2.0, 3.0, 4.0], 2, 2);
        let col = upload(&arena, &[10.0, 20.0], 2, 1);
        let row = upload(&arena, &[100.0, 200.0], 1, 2);
        let t = upload(&arena, &[0.0; 4], 2, 2);

        column_vector_op(&arena, BinaryOp::Add, &m, &col, &t, 1.0).unwrap();
        assert_eq!(download(&arena, &t), vec![11.0, 22.0, 13.0, 24.0]);

        row_vector_op(&arena, BinaryOp::Mul, &m, &row, &t, 0.5).unwrap();
        assert_eq!(download(&arena, &t), vec![50.0, 100.0, 300.0, 400.0]);
    }

    #[test]
    fn test_vector_length_mismatch() {
        let arena = ArenaAllocator::new();
        let m = upload(&arena, &[0.0; 6], 2, 3);
        let col = upload(&arena, &[1.0, 2.0, 3.0], 3, 1);
        assert_eq!(
            column_vector_op(&arena, BinaryOp::Add, &m, &col, &m, 1.0),
            Err(Fault::Status(Status::INCOMPATIBLE_DIMENSIONS))
        );
    }

    #[test]
    fn test_diagonal_ops() {
        let arena = ArenaAllocator::new();
        let m = upload(&arena, &[1.0, 2.0, 3.0, 4.0], 2, 2);
        diagonal_scalar_op(&arena, BinaryOp::Add, &m, 10.0, &m).unwrap();
        assert_eq!(download(&arena, &m), vec![11.0, 2.0, 3.0, 14.0]);

        let v = upload(&arena, &[2.0, 3.0], 2, 1);
        diagonal_op(&arena, BinaryOp::Mul, &m, &v, &m).unwrap();
        assert_eq!(download(&arena, &m), vec![22.0, 2.0, 3.0, 42.0]);

        let rect = upload(&arena, &[0.0; 6], 2, 3);
        assert_eq!(
            diagonal_scalar_op(&arena, BinaryOp::Add, &rect, 1.0, &rect),
            Err(Fault::Status(Status::INCOMPATIBLE_DIMENSIONS))
        );
    }
}
