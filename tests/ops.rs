//! Integration tests for dispatched matrix operations

mod common;

use common::{assert_allclose_f32, create_cpu_client, filled, matrix};
use gpumat::prelude::*;

#[test]
fn test_dot_shapes() {
    let (client, _device) = create_cpu_client();
    let a = matrix(
        &client,
        3,
        4,
        &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0],
    );
    let b = matrix(&client, 4, 2, &[1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0]);

    let c = a.dot(&b, 1.0).unwrap();
    assert_eq!(c.shape(), (3, 2));
    assert_eq!(c.read_value(0, 0).unwrap(), 4.0);
    assert_eq!(c.read_value(2, 1).unwrap(), 22.0);

    let gram = a.transposed_view().dot(&a, 1.0).unwrap();
    assert_eq!(gram.shape(), (4, 4));
    assert_eq!(gram.read_value(0, 0).unwrap(), 1.0 + 25.0 + 81.0);
    assert_eq!(gram.read_value(1, 3).unwrap(), gram.read_value(3, 1).unwrap());

    assert_eq!(a.dot(&a, 1.0).unwrap_err(), Error::DimensionMismatch);
}

#[test]
fn test_add_dot_accumulates() {
    let (client, _device) = create_cpu_client();
    let a = matrix(&client, 2, 2, &[1.0, 2.0, 3.0, 4.0]);
    let acc = filled(&client, 2, 2, 1.0);
    acc.add_dot(&a, &a, 1.0).unwrap();
    acc.subtract_dot(&a, &a, 0.5).unwrap();
    assert_allclose_f32(
        &acc.to_host_vec().unwrap(),
        &[4.5, 8.5, 6.0, 12.0],
        1e-6,
        1e-6,
        "half of a·a plus one",
    );
}

#[test]
fn test_sum_by_axis() {
    let (client, _device) = create_cpu_client();
    let m = filled(&client, 3, 4, 1.0);

    let rows = m.sum(Axis::try_from(0).unwrap(), 1.0).unwrap();
    assert_eq!(rows.shape(), (1, 4));
    assert_eq!(rows.to_host_vec().unwrap(), vec![3.0; 4]);

    let cols = m.sum(Axis::try_from(1).unwrap(), 1.0).unwrap();
    assert_eq!(cols.shape(), (3, 1));
    assert_eq!(cols.to_host_vec().unwrap(), vec![4.0; 3]);

    assert!(Axis::try_from(2).unwrap_err().is_local());
}

#[test]
fn test_global_sum_uses_ones_vector() {
    let (client, _device) = create_cpu_client();
    let ctx = Context::new(&client);
    let m = matrix(&client, 2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    assert_eq!(m.sum_all(&ctx, 2.0).unwrap(), 42.0);

    let acc = Matrix::<CpuRuntime>::empty(&client, 1, 3).unwrap();
    acc.add_sums(&ctx, &m, Axis::Rows, 1.0).unwrap();
    assert_eq!(acc.to_host_vec().unwrap(), vec![5.0, 7.0, 9.0]);
}

#[test]
fn test_max_and_argmax() {
    let (client, _device) = create_cpu_client();
    let m = matrix(&client, 2, 3, &[1.0, 9.0, 3.0, 7.0, 2.0, 7.0]);
    assert_eq!(m.max(Axis::Rows).unwrap().to_host_vec().unwrap(), vec![7.0, 9.0, 7.0]);
    assert_eq!(m.argmax(Axis::Cols).unwrap().to_host_vec().unwrap(), vec![1.0, 0.0]);
}

#[test]
fn test_select_columns_negative_and_out_of_range() {
    let (client, _device) = create_cpu_client();
    let m = matrix(
        &client,
        2,
        5,
        &[0.0, 1.0, 2.0, 3.0, 4.0, 10.0, 11.0, 12.0, 13.0, 14.0],
    );
    let indices = matrix(&client, 1, 2, &[-1.0, 10.0]);
    let target = Matrix::<CpuRuntime>::empty(&client, 2, 2).unwrap();
    m.select_columns(&indices, &target).unwrap();

    assert_eq!(target.read_value(0, 0).unwrap(), 4.0);
    assert_eq!(target.read_value(1, 0).unwrap(), 14.0);
    assert!(target.read_value(0, 1).unwrap().is_nan());
    assert!(target.read_value(1, 1).unwrap().is_nan());
}

#[test]
fn test_operand_dispatch() {
    let (client, _device) = create_cpu_client();
    let m = matrix(&client, 2, 2, &[1.0, 2.0, 3.0, 4.0]);
    let other = filled(&client, 2, 2, 2.0);
    let out = m.empty_like().unwrap();

    m.multiply(&other, Some(&out)).unwrap();
    assert_eq!(out.to_host_vec().unwrap(), vec![2.0, 6.0, 4.0, 8.0]);
    m.subtract(1.0, Some(&out)).unwrap();
    assert_eq!(out.to_host_vec().unwrap(), vec![0.0, 2.0, 1.0, 3.0]);

    let wrong = filled(&client, 3, 1, 0.0);
    assert_eq!(m.add(&wrong, None).unwrap_err(), Error::DimensionMismatch);
}

#[test]
#[allow(deprecated)]
fn test_deprecated_aliases_match_unified_ops() {
    let (client, _device) = create_cpu_client();
    let a = filled(&client, 2, 2, 3.0);
    let b = filled(&client, 2, 2, 3.0);

    a.mult_by_scalar(2.0, None).unwrap();
    b.multiply(2.0, None).unwrap();
    assert_eq!(a.to_host_vec().unwrap(), b.to_host_vec().unwrap());

    a.add_scalar(1.0, None).unwrap();
    a.div_by_scalar(7.0, None).unwrap();
    assert_eq!(a.to_host_vec().unwrap(), vec![1.0; 4]);

    a.assign_scalar(0.5).unwrap();
    assert_eq!(a.to_host_vec().unwrap(), vec![0.5; 4]);
}

#[test]
fn test_comparisons_and_bounds() {
    let (client, _device) = create_cpu_client();
    let m = matrix(&client, 1, 4, &[-2.0, 0.0, 1.0, 5.0]);
    let out = m.empty_like().unwrap();

    m.less_than(1.0, Some(&out)).unwrap();
    assert_eq!(out.to_host_vec().unwrap(), vec![1.0, 1.0, 0.0, 0.0]);
    m.greater_than_eq(1.0, Some(&out)).unwrap();
    assert_eq!(out.to_host_vec().unwrap(), vec![0.0, 0.0, 1.0, 1.0]);
    m.upper_bound(2.0, Some(&out)).unwrap();
    assert_eq!(out.to_host_vec().unwrap(), vec![-2.0, 0.0, 1.0, 2.0]);
    m.lower_bound(0.0, Some(&out)).unwrap();
    assert_eq!(out.to_host_vec().unwrap(), vec![0.0, 0.0, 1.0, 5.0]);
}

#[test]
fn test_unary_catalog() {
    let (client, _device) = create_cpu_client();
    let m = matrix(&client, 1, 3, &[0.0, 1.0, -1.0]);
    let out = m.empty_like().unwrap();

    m.sigmoid(Some(&out)).unwrap();
    assert_allclose_f32(
        &out.to_host_vec().unwrap(),
        &[0.5, 0.731_058_6, 0.268_941_4],
        1e-6,
        1e-6,
        "sigmoid",
    );
    m.apply(UnaryOp::Abs, Some(&out)).unwrap();
    assert_eq!(out.to_host_vec().unwrap(), vec![0.0, 1.0, 1.0]);
    m.pow(2.0, Some(&out)).unwrap();
    assert_eq!(out.to_host_vec().unwrap(), vec![0.0, 1.0, 1.0]);
}

#[test]
fn test_broadcast_vectors() {
    let (client, _device) = create_cpu_client();
    let m = filled(&client, 2, 3, 1.0);
    let col = matrix(&client, 2, 1, &[1.0, 2.0]);
    let row = matrix(&client, 1, 3, &[10.0, 20.0, 30.0]);

    m.add_column_vector(&col, None).unwrap();
    m.add_row_mult(&row, 0.1, None).unwrap();
    assert_allclose_f32(
        &m.to_host_vec().unwrap(),
        &[3.0, 4.0, 4.0, 5.0, 5.0, 6.0],
        1e-6,
        1e-6,
        "column then scaled row",
    );

    let short = matrix(&client, 1, 2, &[1.0, 1.0]);
    assert_eq!(
        m.add_row_vector(&short, None).unwrap_err(),
        Error::DimensionMismatch
    );
}

#[test]
fn test_norm_limit_and_euclid_norm() {
    let (client, _device) = create_cpu_client();
    let m = matrix(&client, 2, 2, &[3.0, 0.0, 4.0, 1.0]);
    assert_allclose_f32(&[m.euclid_norm().unwrap()], &[26.0_f32.sqrt()], 1e-6, 0.0, "norm");

    m.norm_limit(1.0, Axis::Rows, NormConstraint::ClipIfExceeding, None)
        .unwrap();
    assert_allclose_f32(
        &m.to_host_vec().unwrap(),
        &[0.6, 0.8, 0.0, 1.0],
        1e-6,
        1e-6,
        "columns clipped to unit norm",
    );
}

#[test]
fn test_cumsum_rejects_column_axis() {
    let (client, _device) = create_cpu_client();
    let m = matrix(&client, 3, 1, &[1.0, 2.0, 3.0]);
    m.cumsum(Axis::Rows, None).unwrap();
    assert_eq!(m.to_host_vec().unwrap(), vec![1.0, 3.0, 6.0]);
    assert_eq!(m.cumsum(Axis::Cols, None).unwrap_err(), Error::Unsupported);
}

#[test]
fn test_softmax_classifier_step() {
    let (client, _device) = create_cpu_client();
    // three cases, two classes; each column is one case
    let logits = matrix(&client, 2, 3, &[0.0, 3.0, 1.0, 0.0, 1.0, 1.0]);
    let labels = matrix(&client, 1, 3, &[0.0, 0.0, 1.0]);

    let probs = logits.empty_like().unwrap();
    logits.softmax(Some(&probs)).unwrap();
    let sums = probs.sum(Axis::Rows, 1.0).unwrap();
    assert_allclose_f32(&sums.to_host_vec().unwrap(), &[1.0; 3], 1e-6, 1e-6, "columns");

    // ties go to the first row
    let correct = probs.softmax_correct(&labels).unwrap();
    assert_eq!(correct.to_host_vec().unwrap(), vec![1.0, 1.0, 0.0]);

    let loss = probs.softmax_cross_entropy(&labels, 1e-10).unwrap();
    assert!(loss.to_host_vec().unwrap().iter().all(|&l| l > 0.0));

    probs.apply_softmax_grad(&labels, None).unwrap();
    let grad_sums = probs.sum(Axis::Rows, 1.0).unwrap();
    assert_allclose_f32(&grad_sums.to_host_vec().unwrap(), &[0.0; 3], 1e-6, 1e-6, "grad");

    let wins = Matrix::<CpuRuntime>::empty(&client, 2, 3).unwrap();
    logits.choose_max_and_accumulate(&wins).unwrap();
    assert_eq!(wins.to_host_vec().unwrap(), vec![1.0, 0.0, 1.0, 0.0, 1.0, 0.0]);
}

#[test]
fn test_backprop_helpers() {
    let (client, _device) = create_cpu_client();
    let act = matrix(&client, 1, 4, &[0.5, 0.0, 2.0, -1.0]);
    let grad = filled(&client, 1, 4, 2.0);
    let out = grad.empty_like().unwrap();

    grad.apply_rectified_linear_deriv(&act, Some(&out)).unwrap();
    assert_eq!(out.to_host_vec().unwrap(), vec![2.0, 0.0, 2.0, 0.0]);
    grad.apply_deriv(DerivOp::Sin, &act, Some(&out)).unwrap();
    let expected = [0.5f32, 0.0, 2.0, -1.0].map(|x| 2.0 * x.cos());
    assert_allclose_f32(&out.to_host_vec().unwrap(), &expected, 1e-6, 1e-6, "sin");
    grad.apply_rectified_linear_smooth_deriv(&act, Some(&out)).unwrap();
    assert_eq!(out.read_value(0, 1).unwrap(), 0.0);

    grad.multiply_scaled(&act, Some(&out), 0.0).unwrap();
    assert_eq!(out.to_host_vec().unwrap(), vec![1.0, 0.0, 4.0, -2.0]);
    grad.multiply_scaled(1.0, Some(&out), 1.0).unwrap();
    assert_eq!(out.to_host_vec().unwrap(), vec![3.0, 2.0, 6.0, 0.0]);
    out.add_mult_sign(&act, -1.0).unwrap();
    assert_eq!(out.to_host_vec().unwrap(), vec![2.0, 2.0, 5.0, 1.0]);
}
