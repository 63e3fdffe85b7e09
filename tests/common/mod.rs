//! Common test utilities
#![allow(dead_code)]

use gpumat::matrix::Matrix;
use gpumat::runtime::Runtime;
use gpumat::runtime::cpu::{CpuClient, CpuDevice, CpuRuntime};

/// Create a CPU client and device for testing
pub fn create_cpu_client() -> (CpuClient, CpuDevice) {
    let device = CpuDevice::new();
    let client = CpuRuntime::default_client(&device);
    (client, device)
}

/// Matrix from row-major literal data
pub fn matrix(client: &CpuClient, rows: usize, cols: usize, data: &[f32]) -> Matrix<CpuRuntime> {
    Matrix::from_row_major(client, data, rows, cols).unwrap()
}

/// Matrix filled with `value`
pub fn filled(client: &CpuClient, rows: usize, cols: usize, value: f32) -> Matrix<CpuRuntime> {
    let m = Matrix::empty(client, rows, cols).unwrap();
    m.assign(value).unwrap();
    m
}

/// Assert two f32 slices are close within tolerance
///
/// Uses the formula: |a - b| <= atol + rtol * |b|
pub fn assert_allclose_f32(a: &[f32], b: &[f32], rtol: f32, atol: f32, msg: &str) {
    assert_eq!(a.len(), b.len(), "{}: length mismatch", msg);
    for (i, (x, y)) in a.iter().zip(b.iter()).enumerate() {
        let diff = (x - y).abs();
        let tol = atol + rtol * y.abs();
        assert!(
            diff <= tol,
            "{}: element {} differs: {} vs {} (diff={}, tol={})",
            msg,
            i,
            x,
            y,
            diff,
            tol
        );
    }
}
