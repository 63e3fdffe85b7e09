//! Axis reductions, running sums and norm limits

use crate::error::Result;
use crate::matrix::Matrix;
use crate::runtime::{Axis, KernelLibrary, NormConstraint, Runtime};

impl<R: Runtime> Matrix<R> {
    /// Allocate the vector produced by reducing this matrix along `axis`
    fn reduced_target(&self, axis: Axis) -> Result<Matrix<R>> {
        let (rows, cols) = self.physical_shape();
        let (r, c) = axis.reduced_shape(rows, cols);
        Matrix::empty(self.client(), r, c)
    }

    /// `mult` times the sum along `axis`: a `(1, cols)` vector for
    /// [`Axis::Rows`], a `(rows, 1)` vector for [`Axis::Cols`]
    pub fn sum(&self, axis: Axis, mult: f32) -> Result<Matrix<R>> {
        let target = self.reduced_target(axis)?;
        self.sum_into(axis, &target, mult)?;
        Ok(target)
    }

    /// Write `mult` times the sum along `axis` into `target`
    pub fn sum_into<'t>(
        &self,
        axis: Axis,
        target: &'t Matrix<R>,
        mult: f32,
    ) -> Result<&'t Matrix<R>> {
        let status = self
            .client()
            .sum_by_axis(&self.desc(), &target.desc(), axis, mult, 0.0);
        self.check(status)?;
        Ok(target)
    }

    /// `mult` times the sum of squares along `axis`
    pub fn sum_of_squares(&self, axis: Axis, mult: f32) -> Result<Matrix<R>> {
        let target = self.reduced_target(axis)?;
        self.sum_of_squares_into(axis, &target, mult)?;
        Ok(target)
    }

    /// Write `mult` times the sum of squares along `axis` into `target`
    pub fn sum_of_squares_into<'t>(
        &self,
        axis: Axis,
        target: &'t Matrix<R>,
        mult: f32,
    ) -> Result<&'t Matrix<R>> {
        let status = self
            .client()
            .sqsum_by_axis(&self.desc(), &target.desc(), axis, mult, 0.0);
        self.check(status)?;
        Ok(target)
    }

    /// self += mult * sum of squares of `mat` along `axis`
    pub fn add_sqsums(&self, mat: &Matrix<R>, axis: Axis, mult: f32) -> Result<&Self> {
        let status = self
            .client()
            .sqsum_by_axis(&mat.desc(), &self.desc(), axis, mult, 1.0);
        self.check(status)?;
        Ok(self)
    }

    /// Maximum along `axis`
    pub fn max(&self, axis: Axis) -> Result<Matrix<R>> {
        let target = self.reduced_target(axis)?;
        self.max_into(axis, &target)?;
        Ok(target)
    }

    /// Write the maximum along `axis` into `target`
    pub fn max_into<'t>(&self, axis: Axis, target: &'t Matrix<R>) -> Result<&'t Matrix<R>> {
        let status = self.client().max_by_axis(&self.desc(), &target.desc(), axis);
        self.check(status)?;
        Ok(target)
    }

    /// Position of the first maximum along `axis`, as floats
    pub fn argmax(&self, axis: Axis) -> Result<Matrix<R>> {
        let target = self.reduced_target(axis)?;
        self.argmax_into(axis, &target)?;
        Ok(target)
    }

    /// Write the position of the first maximum along `axis` into `target`
    pub fn argmax_into<'t>(&self, axis: Axis, target: &'t Matrix<R>) -> Result<&'t Matrix<R>> {
        let status = self
            .client()
            .argmax_by_axis(&self.desc(), &target.desc(), axis);
        self.check(status)?;
        Ok(target)
    }

    /// Rescale every column ([`Axis::Rows`]) or row ([`Axis::Cols`]) so its euclidean
    /// norm respects `max_norm`
    pub fn norm_limit<'a>(
        &'a self,
        max_norm: f32,
        axis: Axis,
        constraint: NormConstraint,
        target: Option<&'a Matrix<R>>,
    ) -> Result<&'a Matrix<R>> {
        let target = target.unwrap_or(self);
        let status = self.client().normlimit_by_axis(
            &self.desc(),
            &target.desc(),
            axis,
            max_norm,
            constraint,
        );
        self.check(status)?;
        Ok(target)
    }

    /// Running sum down each column; only [`Axis::Rows`] is supported
    pub fn cumsum<'a>(
        &'a self,
        axis: Axis,
        target: Option<&'a Matrix<R>>,
    ) -> Result<&'a Matrix<R>> {
        let target = target.unwrap_or(self);
        let status = self
            .client()
            .cumsum_by_axis(&self.desc(), &target.desc(), axis);
        self.check(status)?;
        Ok(target)
    }

    /// One-hot mask of each column's maximum; only [`Axis::Rows`] is supported
    pub fn choose_max<'a>(
        &'a self,
        axis: Axis,
        target: Option<&'a Matrix<R>>,
    ) -> Result<&'a Matrix<R>> {
        let target = target.unwrap_or(self);
        let status = self
            .client()
            .choose_max_by_axis(&self.desc(), &target.desc(), axis);
        self.check(status)?;
        Ok(target)
    }

    /// Add one to `acc` at the position of each column's maximum
    pub fn choose_max_and_accumulate<'t>(&self, acc: &'t Matrix<R>) -> Result<&'t Matrix<R>> {
        let status = self
            .client()
            .choose_max_and_accumulate(&self.desc(), &acc.desc());
        self.check(status)?;
        Ok(acc)
    }
}

#[cfg(test)]
mod tests {
    use crate::error::Error;
    use crate::matrix::Matrix;
    use crate::runtime::cpu::{CpuClient, CpuDevice, CpuRuntime};
    use crate::runtime::{Axis, NormConstraint};

    fn ones(client: &CpuClient, rows: usize, cols: usize) -> Matrix<CpuRuntime> {
        let m = Matrix::empty(client, rows, cols).unwrap();
        m.assign(1.0).unwrap();
        m
    }

    #[test]
    fn test_sum_shapes() {
        let client = CpuClient::new(CpuDevice::new());
        let m = ones(&client, 3, 4);
        let rows = m.sum(Axis::Rows, 1.0).unwrap();
        assert_eq!(rows.shape(), (1, 4));
        assert_eq!(rows.to_host_vec().unwrap(), vec![3.0; 4]);
        let cols = m.sum(Axis::Cols, 0.5).unwrap();
        assert_eq!(cols.shape(), (3, 1));
        assert_eq!(cols.to_host_vec().unwrap(), vec![2.0; 3]);
    }

    #[test]
    fn test_sqsums_accumulate() {
        let client = CpuClient::new(CpuDevice::new());
        let m = Matrix::<CpuRuntime>::from_host(&client, vec![1.0, 2.0, 3.0, 4.0], 2, 2, true)
            .unwrap();
        let acc = ones(&client, 1, 2);
        acc.add_sqsums(&m, Axis::Rows, 2.0).unwrap();
        assert_eq!(acc.to_host_vec().unwrap(), vec![11.0, 51.0]);
        assert_eq!(
            m.sum_of_squares(Axis::Cols, 1.0).unwrap().to_host_vec().unwrap(),
            vec![10.0, 20.0]
        );
    }

    #[test]
    fn test_max_argmax_choose_max() {
        let client = CpuClient::new(CpuDevice::new());
        let m = Matrix::<CpuRuntime>::from_row_major(&client, &[1.0, 7.0, 5.0, 2.0], 2, 2).unwrap();
        assert_eq!(m.max(Axis::Rows).unwrap().to_host_vec().unwrap(), vec![5.0, 7.0]);
        assert_eq!(m.argmax(Axis::Cols).unwrap().to_host_vec().unwrap(), vec![1.0, 0.0]);

        let mask = m.empty_like().unwrap();
        m.choose_max(Axis::Rows, Some(&mask)).unwrap();
        assert_eq!(mask.to_host_vec().unwrap(), vec![0.0, 1.0, 1.0, 0.0]);
        assert_eq!(
            m.choose_max(Axis::Cols, Some(&mask)).unwrap_err(),
            Error::Unsupported
        );
    }

    #[test]
    fn test_choose_max_and_accumulate_counts_winners() {
        let client = CpuClient::new(CpuDevice::new());
        let m = Matrix::<CpuRuntime>::from_row_major(&client, &[1.0, 7.0, 5.0, 2.0], 2, 2).unwrap();
        let acc = Matrix::<CpuRuntime>::empty(&client, 2, 2).unwrap();
        m.choose_max_and_accumulate(&acc).unwrap();
        m.choose_max_and_accumulate(&acc).unwrap();
        assert_eq!(acc.to_host_vec().unwrap(), vec![0.0, 2.0, 2.0, 0.0]);

        let wrong = Matrix::<CpuRuntime>::empty(&client, 2, 3).unwrap();
        assert_eq!(
            m.choose_max_and_accumulate(&wrong).unwrap_err(),
            Error::DimensionMismatch
        );
    }

    #[test]
    fn test_cumsum_and_norm_limit() {
        let client = CpuClient::new(CpuDevice::new());
        let m = ones(&client, 3, 2);
        m.cumsum(Axis::Rows, None).unwrap();
        assert_eq!(m.to_host_vec().unwrap(), vec![1.0, 2.0, 3.0, 1.0, 2.0, 3.0]);
        assert_eq!(m.cumsum(Axis::Cols, None).unwrap_err(), Error::Unsupported);

        let v = Matrix::<CpuRuntime>::from_host(&client, vec![3.0, 4.0], 2, 1, true).unwrap();
        v.norm_limit(1.0, Axis::Rows, NormConstraint::ClipIfExceeding, None)
            .unwrap();
        let out = v.to_host_vec().unwrap();
        assert!((out[0] - 0.6).abs() < 1e-6 && (out[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_reductions_reject_transposed() {
        let client = CpuClient::new(CpuDevice::new());
        let m = ones(&client, 3, 4);
        assert_eq!(
            m.transposed_view().sum(Axis::Rows, 1.0).unwrap_err(),
            Error::UnsupportedOnTransposed
        );
    }
}
