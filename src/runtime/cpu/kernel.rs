//! `KernelLibrary` implementation for the CPU client

use super::client::CpuClient;
use super::kernels::{
    Fault, KernelResult, broadcast, columns, elementwise, linalg, memory, random, reduce,
    softmax,
};
use crate::runtime::{
    Axis, BinaryOp, CompareOp, DerivOp, KernelLibrary, LossOp, MatDesc, NormConstraint,
    RngStreams, SampleOp, Status, UnaryOp,
};

impl CpuClient {
    /// Collapse a kernel outcome into a native status code
    fn run(&self, result: KernelResult) -> Status {
        match result {
            Ok(()) => Status::SUCCESS,
            Err(Fault::Status(status)) => status,
            Err(Fault::Device(message)) => {
                self.set_last_error(message);
                Status::DEVICE
            }
        }
    }

    /// Like [`run`](Self::run), writing a scalar result into `out` on success
    fn run_scalar(&self, result: KernelResult<f32>, out: &mut f32) -> Status {
        self.run(result.map(|value| *out = value))
    }
}

impl KernelLibrary for CpuClient {
    fn last_error(&self) -> String {
        self.last_error_message()
    }

    // ===== Memory =====

    fn copy_to_device(&self, src: &[f32], dst: &MatDesc) -> Status {
        self.run(memory::copy_to_device(self.arena(), src, dst))
    }

    fn copy_to_host(&self, src: &MatDesc, dst: &mut [f32]) -> Status {
        self.run(memory::copy_to_host(self.arena(), src, dst))
    }

    fn copy_on_device(&self, src: &MatDesc, dst: &MatDesc) -> Status {
        self.run(memory::copy_on_device(self.arena(), src, dst))
    }

    fn assign_scalar(&self, mat: &MatDesc, alpha: f32) -> Status {
        self.run(memory::assign_scalar(self.arena(), mat, alpha))
    }

    fn read_from(&self, mat: &MatDesc, row: usize, col: usize, out: &mut f32) -> Status {
        self.run_scalar(memory::read_from(self.arena(), mat, row, col), out)
    }

    fn write_at(&self, mat: &MatDesc, row: usize, col: usize, value: f32) -> Status {
        self.run(memory::write_at(self.arena(), mat, row, col, value))
    }

    fn get_row_slice(&self, src: &MatDesc, target: &MatDesc, start: usize, end: usize) -> Status {
        self.run(memory::get_row_slice(self.arena(), src, target, start, end))
    }

    fn set_row_slice(&self, src: &MatDesc, target: &MatDesc, start: usize, end: usize) -> Status {
        self.run(memory::set_row_slice(self.arena(), src, target, start, end))
    }

    fn copy_transpose(&self, src: &MatDesc, target: &MatDesc) -> Status {
        self.run(memory::copy_transpose(self.arena(), src, target))
    }

    // ===== Elementwise =====

    fn binary_elementwise(
        &self,
        op: BinaryOp,
        a: &MatDesc,
        b: &MatDesc,
        target: &MatDesc,
    ) -> Status {
        self.run(elementwise::binary(self.arena(), op, a, b, target))
    }

    fn binary_scalar(&self, op: BinaryOp, a: &MatDesc, alpha: f32, target: &MatDesc) -> Status {
        self.run(elementwise::binary_scalar(self.arena(), op, a, alpha, target))
    }

    fn add_mult(&self, a: &MatDesc, b: &MatDesc, mult: f32) -> Status {
        self.run(elementwise::add_mult(self.arena(), a, b, mult))
    }

    fn mult_scaled(
        &self,
        a: &MatDesc,
        b: &MatDesc,
        target: &MatDesc,
        scale_targets: f32,
    ) -> Status {
        self.run(elementwise::mult_scaled(self.arena(), a, b, target, scale_targets))
    }

    fn mult_scalar_scaled(
        &self,
        a: &MatDesc,
        alpha: f32,
        target: &MatDesc,
        scale_targets: f32,
    ) -> Status {
        self.run(elementwise::mult_scalar_scaled(
            self.arena(),
            a,
            alpha,
            target,
            scale_targets,
        ))
    }

    fn add_mult_sign(&self, a: &MatDesc, b: &MatDesc, mult: f32) -> Status {
        self.run(elementwise::add_mult_sign(self.arena(), a, b, mult))
    }

    fn apply_unary(&self, op: UnaryOp, a: &MatDesc, target: &MatDesc) -> Status {
        self.run(elementwise::unary(self.arena(), op, a, target))
    }

    fn apply_deriv(&self, op: DerivOp, grad: &MatDesc, act: &MatDesc, target: &MatDesc) -> Status {
        self.run(elementwise::deriv(self.arena(), op, grad, act, target))
    }

    fn elementwise_loss(
        &self,
        op: LossOp,
        labels: &MatDesc,
        predictions: &MatDesc,
        target: &MatDesc,
    ) -> Status {
        self.run(elementwise::loss(self.arena(), op, labels, predictions, target))
    }

    fn compare(&self, op: CompareOp, a: &MatDesc, b: &MatDesc, target: &MatDesc) -> Status {
        self.run(elementwise::compare(self.arena(), op, a, b, target))
    }

    fn compare_scalar(&self, op: CompareOp, a: &MatDesc, alpha: f32, target: &MatDesc) -> Status {
        self.run(elementwise::compare_scalar(self.arena(), op, a, alpha, target))
    }

    // ===== Broadcast =====

    fn column_vector_op(
        &self,
        op: BinaryOp,
        mat: &MatDesc,
        vec: &MatDesc,
        target: &MatDesc,
        mult: f32,
    ) -> Status {
        self.run(broadcast::column_vector_op(self.arena(), op, mat, vec, target, mult))
    }

    fn row_vector_op(
        &self,
        op: BinaryOp,
        mat: &MatDesc,
        vec: &MatDesc,
        target: &MatDesc,
        mult: f32,
    ) -> Status {
        self.run(broadcast::row_vector_op(self.arena(), op, mat, vec, target, mult))
    }

    fn diagonal_op(&self, op: BinaryOp, mat: &MatDesc, vec: &MatDesc, target: &MatDesc) -> Status {
        self.run(broadcast::diagonal_op(self.arena(), op, mat, vec, target))
    }

    fn diagonal_scalar_op(
        &self,
        op: BinaryOp,
        mat: &MatDesc,
        alpha: f32,
        target: &MatDesc,
    ) -> Status {
        self.run(broadcast::diagonal_scalar_op(self.arena(), op, mat, alpha, target))
    }

    // ===== Reductions =====

    fn sum_by_axis(
        &self,
        mat: &MatDesc,
        target: &MatDesc,
        axis: Axis,
        mult: f32,
        p: f32,
    ) -> Status {
        self.run(reduce::sum_by_axis(self.arena(), mat, target, axis, mult, p))
    }

    fn sqsum_by_axis(
        &self,
        mat: &MatDesc,
        target: &MatDesc,
        axis: Axis,
        mult: f32,
        p: f32,
    ) -> Status {
        self.run(reduce::sqsum_by_axis(self.arena(), mat, target, axis, mult, p))
    }

    fn max_by_axis(&self, mat: &MatDesc, target: &MatDesc, axis: Axis) -> Status {
        self.run(reduce::max_by_axis(self.arena(), mat, target, axis))
    }

    fn argmax_by_axis(&self, mat: &MatDesc, target: &MatDesc, axis: Axis) -> Status {
        self.run(reduce::argmax_by_axis(self.arena(), mat, target, axis))
    }

    fn normlimit_by_axis(
        &self,
        mat: &MatDesc,
        target: &MatDesc,
        axis: Axis,
        norm: f32,
        constraint: NormConstraint,
    ) -> Status {
        self.run(reduce::normlimit_by_axis(
            self.arena(),
            mat,
            target,
            axis,
            norm,
            constraint,
        ))
    }

    fn cumsum_by_axis(&self, mat: &MatDesc, target: &MatDesc, axis: Axis) -> Status {
        self.run(reduce::cumsum_by_axis(self.arena(), mat, target, axis))
    }

    fn choose_max_by_axis(&self, mat: &MatDesc, target: &MatDesc, axis: Axis) -> Status {
        self.run(reduce::choose_max_by_axis(self.arena(), mat, target, axis))
    }

    fn choose_max_and_accumulate(&self, mat: &MatDesc, acc: &MatDesc) -> Status {
        self.run(reduce::choose_max_and_accumulate(self.arena(), mat, acc))
    }

    fn vdot(&self, a: &MatDesc, b: &MatDesc, out: &mut f32) -> Status {
        self.run_scalar(reduce::vdot(self.arena(), a, b), out)
    }

    fn euclid_norm(&self, mat: &MatDesc, out: &mut f32) -> Status {
        self.run_scalar(reduce::euclid_norm(self.arena(), mat), out)
    }

    // ===== Softmax =====

    fn softmax(&self, mat: &MatDesc, target: &MatDesc) -> Status {
        self.run(softmax::softmax(self.arena(), mat, target))
    }

    fn apply_softmax_grad(&self, mat: &MatDesc, labels: &MatDesc, target: &MatDesc) -> Status {
        self.run(softmax::apply_softmax_grad(self.arena(), mat, labels, target))
    }

    fn softmax_correct(&self, mat: &MatDesc, labels: &MatDesc, target: &MatDesc) -> Status {
        self.run(softmax::softmax_correct(self.arena(), mat, labels, target))
    }

    fn softmax_cross_entropy(
        &self,
        mat: &MatDesc,
        labels: &MatDesc,
        target: &MatDesc,
        tiny: f32,
    ) -> Status {
        self.run(softmax::softmax_cross_entropy(
            self.arena(),
            mat,
            labels,
            target,
            tiny,
        ))
    }

    // ===== Linear algebra =====

    fn dot(&self, a: &MatDesc, b: &MatDesc, target: &MatDesc, beta: f32, alpha: f32) -> Status {
        self.run(linalg::dot(self.arena(), a, b, target, beta, alpha))
    }

    // ===== Column permutation =====

    fn select_columns(&self, src: &MatDesc, target: &MatDesc, indices: &MatDesc) -> Status {
        self.run(columns::select_columns(self.arena(), src, target, indices))
    }

    fn set_selected_columns(&self, target: &MatDesc, src: &MatDesc, indices: &MatDesc) -> Status {
        self.run(columns::set_selected_columns(self.arena(), target, src, indices))
    }

    fn swap_columns(
        &self,
        src: &MatDesc,
        target: &MatDesc,
        idx1: &MatDesc,
        idx2: &MatDesc,
    ) -> Status {
        self.run(columns::swap_columns(self.arena(), src, target, idx1, idx2))
    }

    fn accumulate_columns(
        &self,
        src: &MatDesc,
        indices: &MatDesc,
        target: &MatDesc,
        mult: f32,
        avg: bool,
    ) -> Status {
        self.run(columns::accumulate_columns(
            self.arena(),
            src,
            indices,
            target,
            mult,
            avg,
        ))
    }

    fn expand_and_add(
        &self,
        mat: &MatDesc,
        val: &MatDesc,
        indices: &MatDesc,
        target: &MatDesc,
        mult: f32,
    ) -> Status {
        self.run(columns::expand_and_add(
            self.arena(),
            mat,
            val,
            indices,
            target,
            mult,
        ))
    }

    fn shuffle_columns(&self, mat: &MatDesc, perm: &MatDesc) -> Status {
        self.run(columns::shuffle_columns(self.arena(), mat, perm))
    }

    // ===== Random =====

    fn init_random(&self, streams: &mut RngStreams, seed: u64) -> Status {
        random::init_random(streams, seed);
        Status::SUCCESS
    }

    fn fill_with_rand(&self, streams: &mut RngStreams, mat: &MatDesc) -> Status {
        self.run(random::fill_with_rand(self.arena(), streams, mat))
    }

    fn fill_with_randn(&self, streams: &mut RngStreams, mat: &MatDesc) -> Status {
        self.run(random::fill_with_randn(self.arena(), streams, mat))
    }

    fn sample(
        &self,
        streams: &mut RngStreams,
        op: SampleOp,
        src: &MatDesc,
        target: &MatDesc,
    ) -> Status {
        self.run(random::sample(self.arena(), streams, op, src, target))
    }

    fn dropout(
        &self,
        streams: &mut RngStreams,
        mat: &MatDesc,
        drop_prob: f32,
        value: f32,
        scale: f32,
    ) -> Status {
        self.run(random::dropout(self.arena(), streams, mat, drop_prob, value, scale))
    }
}

#[cfg(test)]
mod tests {
    use super::super::CpuDevice;
    use super::*;
    use crate::runtime::{Allocator, DevicePtr, RuntimeClient};

    #[test]
    fn test_device_fault_sets_last_error() {
        let client = CpuClient::new(CpuDevice::new());
        let id = client.allocator().allocate(4).unwrap();
        let desc = MatDesc {
            ptr: DevicePtr::new(id),
            rows: 2,
            cols: 2,
            is_trans: false,
            on_device: true,
            on_host: false,
            owns_data: true,
        };
        assert!(client.assign_scalar(&desc, 1.0).is_success());

        client.allocator().deallocate(id);
        let status = client.assign_scalar(&desc, 1.0);
        assert_eq!(status, Status::DEVICE);
        assert!(client.last_error().contains("invalid device pointer"));
    }

    #[test]
    fn test_validation_failure_reports_code() {
        let client = CpuClient::new(CpuDevice::new());
        let a = client.allocator().allocate(4).unwrap();
        let b = client.allocator().allocate(6).unwrap();
        let desc = |id, rows, cols| MatDesc {
            ptr: DevicePtr::new(id),
            rows,
            cols,
            is_trans: false,
            on_device: true,
            on_host: false,
            owns_data: true,
        };
        let status = client.binary_elementwise(
            BinaryOp::Add,
            &desc(a, 2, 2),
            &desc(b, 2, 3),
            &desc(a, 2, 2),
        );
        assert_eq!(status, Status::INCOMPATIBLE_DIMENSIONS);

        let mut out = 0.0;
        assert!(client.vdot(&desc(a, 2, 2), &desc(a, 2, 2), &mut out).is_success());
        assert_eq!(out, 0.0);
    }
}
