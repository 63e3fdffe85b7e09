//! Transfer, assignment and row-slice kernels

use super::{KernelResult, ensure, load, map_elements, store};
use crate::runtime::{ArenaAllocator, MatDesc, Status};

pub(crate) fn copy_to_device(arena: &ArenaAllocator, src: &[f32], dst: &MatDesc) -> KernelResult {
    ensure(src.len() == dst.len(), Status::INCOMPATIBLE_DIMENSIONS)?;
    Ok(arena.write(dst.ptr, src)?)
}

pub(crate) fn copy_to_host(arena: &ArenaAllocator, src: &MatDesc, dst: &mut [f32]) -> KernelResult {
    ensure(src.len() == dst.len(), Status::INCOMPATIBLE_DIMENSIONS)?;
    let data = load(arena, src)?;
    dst.copy_from_slice(&data);
    Ok(())
}

pub(crate) fn copy_on_device(arena: &ArenaAllocator, src: &MatDesc, dst: &MatDesc) -> KernelResult {
    ensure(src.same_size(dst), Status::INCOMPATIBLE_DIMENSIONS)?;
    let data = load(arena, src)?;
    store(arena, dst, &data)
}

pub(crate) fn assign_scalar(arena: &ArenaAllocator, mat: &MatDesc, alpha: f32) -> KernelResult {
    store(arena, mat, &vec![alpha; mat.len()])
}

pub(crate) fn read_from(
    arena: &ArenaAllocator,
    mat: &MatDesc,
    row: usize,
    col: usize,
) -> KernelResult<f32> {
    ensure(row < mat.rows && col < mat.cols, Status::INCOMPATIBLE_DIMENSIONS)?;
    ensure(mat.on_device, Status::NOT_ON_DEVICE)?;
    let value = arena.read(mat.ptr.add(row + col * mat.rows), 1)?;
    Ok(value[0])
}

pub(crate) fn write_at(
    arena: &ArenaAllocator,
    mat: &MatDesc,
    row: usize,
    col: usize,
    value: f32,
) -> KernelResult {
    ensure(row < mat.rows && col < mat.cols, Status::INCOMPATIBLE_DIMENSIONS)?;
    ensure(mat.on_device, Status::NOT_ON_DEVICE)?;
    Ok(arena.write(mat.ptr.add(row + col * mat.rows), &[value])?)
}

pub(crate) fn get_row_slice(
    arena: &ArenaAllocator,
    src: &MatDesc,
    target: &MatDesc,
    start: usize,
    end: usize,
) -> KernelResult {
    ensure(!src.is_trans && !target.is_trans, Status::TRANSPOSED)?;
    ensure(start < end && end <= src.rows, Status::INCOMPATIBLE_DIMENSIONS)?;
    let height = end - start;
    ensure(
        target.rows == height && target.cols == src.cols,
        Status::INCOMPATIBLE_DIMENSIONS,
    )?;

    let data = load(arena, src)?;
    let rows = src.rows;
    let out = map_elements(target.len(), |i| {
        let (r, c) = (i % height, i / height);
        data[start + r + c * rows]
    });
    store(arena, target, &out)
}

pub(crate) fn set_row_slice(
    arena: &ArenaAllocator,
    src: &MatDesc,
    target: &MatDesc,
    start: usize,
    end: usize,
) -> KernelResult {
    ensure(!src.is_trans && !target.is_trans, Status::TRANSPOSED)?;
    ensure(start < end && end <= target.rows, Status::INCOMPATIBLE_DIMENSIONS)?;
    let height = end - start;
    ensure(
        src.rows == height && src.cols == target.cols,
        Status::INCOMPATIBLE_DIMENSIONS,
    )?;

    let rows_src = load(arena, src)?;
    let mut out = load(arena, target)?;
    for c in 0..target.cols {
        for r in 0..height {
            out[start + r + c * target.rows] = rows_src[r + c * height];
        }
    }
    store(arena, target, &out)
}

pub(crate) fn copy_transpose(
    arena: &ArenaAllocator,
    src: &MatDesc,
    target: &MatDesc,
) -> KernelResult {
    ensure(!src.is_trans && !target.is_trans, Status::TRANSPOSED)?;
    ensure(
        target.rows == src.cols && target.cols == src.rows,
        Status::INCOMPATIBLE_DIMENSIONS,
    )?;

    let data = load(arena, src)?;
    let (rows, cols) = (src.rows, src.cols);
    // target is (cols, rows): target[c, r] = src[r, c]
    let out = map_elements(target.len(), |i| {
        let (c, r) = (i % cols, i / cols);
        data[r + c * rows]
    });
    store(arena, target, &out)
}

#[cfg(test)]
mod tests {
    use super::super::Fault;
    use super::super::test_util::{download, upload};
    use super::*;

    #[test]
    fn test_copy_to_host_length_mismatch_leaves_dst() {
        let arena = ArenaAllocator::new();
        let m = upload(&arena, &[1.0, 2.0, 3.0, 4.0], 2, 2);
        let mut dst = vec![9.0; 3];
        assert_eq!(
            copy_to_host(&arena, &m, &mut dst),
            Err(Fault::Status(Status::INCOMPATIBLE_DIMENSIONS))
        );
        assert_eq!(dst, vec![9.0; 3]);
    }

    #[test]
    fn test_row_slice_roundtrip() {
        let arena = ArenaAllocator::new();
        // 3x2 column-major: [[1, 4], [2, 5], [3, 6]]
        let m = upload(&arena, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 3, 2);
        let t = upload(&arena, &[0.0; 4], 2, 2);
        get_row_slice(&arena, &m, &t, 1, 3).unwrap();
        assert_eq!(download(&arena, &t), vec![2.0, 3.0, 5.0, 6.0]);

        let z = upload(&arena, &[0.0; 2], 1, 2);
        set_row_slice(&arena, &z, &m, 0, 1).unwrap();
        assert_eq!(download(&arena, &m), vec![0.0, 2.0, 3.0, 0.0, 5.0, 6.0]);
    }

    #[test]
    fn test_row_slice_rejects_bad_range() {
        let arena = ArenaAllocator::new();
        let m = upload(&arena, &[0.0; 6], 3, 2);
        let t = upload(&arena, &[0.0; 2], 1, 2);
        assert_eq!(
            get_row_slice(&arena, &m, &t, 2, 2),
            Err(Fault::Status(Status::INCOMPATIBLE_DIMENSIONS))
        );
        assert_eq!(
            get_row_slice(&arena, &m, &t, 3, 4),
            Err(Fault::Status(Status::INCOMPATIBLE_DIMENSIONS))
        );
    }

    #[test]
    fn test_copy_transpose() {
        let arena = ArenaAllocator::new();
        let m = upload(&arena, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2, 3);
        let t = upload(&arena, &[0.0; 6], 3, 2);
        copy_transpose(&arena, &m, &t).unwrap();
        // m = [[1, 3, 5], [2, 4, 6]] so t = [[1, 2], [3, 4], [5, 6]]
        assert_eq!(download(&arena, &t), vec![1.0, 3.0, 5.0, 2.0, 4.0, 6.0]);
    }

    #[test]
    fn test_read_write_element() {
        let arena = ArenaAllocator::new();
        let m = upload(&arena, &[1.0, 2.0, 3.0, 4.0], 2, 2);
        write_at(&arena, &m, 1, 0, 7.0).unwrap();
        assert_eq!(read_from(&arena, &m, 1, 0).unwrap(), 7.0);
        assert_eq!(read_from(&arena, &m, 0, 1).unwrap(), 3.0);
        assert_eq!(
            read_from(&arena, &m, 2, 0),
            Err(Fault::Status(Status::INCOMPATIBLE_DIMENSIONS))
        );
    }
}
