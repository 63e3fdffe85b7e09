//! Matrix products and inner products

use crate::error::Result;
use crate::matrix::Matrix;
use crate::runtime::{KernelLibrary, Runtime};

impl<R: Runtime> Matrix<R> {
    /// `mult * (self · other)` in a newly allocated matrix
    ///
    /// The result has `self`'s logical row count and `other`'s logical column count;
    /// transposed views are read without materializing the transpose.
    pub fn dot(&self, other: &Matrix<R>, mult: f32) -> Result<Matrix<R>> {
        let (rows, _) = self.shape();
        let (_, cols) = other.shape();
        let target = Matrix::empty(self.client(), rows, cols)?;
        self.dot_into(other, &target, mult, 0.0)?;
        Ok(target)
    }

    /// target = scale_existing * target + mult * (self · other)
    pub fn dot_into<'t>(
        &self,
        other: &Matrix<R>,
        target: &'t Matrix<R>,
        mult: f32,
        scale_existing: f32,
    ) -> Result<&'t Matrix<R>> {
        let status = self.client().dot(
            &self.desc(),
            &other.desc(),
            &target.desc(),
            scale_existing,
            mult,
        );
        self.check(status)?;
        Ok(target)
    }

    /// self += mult * (m1 · m2)
    pub fn add_dot(&self, m1: &Matrix<R>, m2: &Matrix<R>, mult: f32) -> Result<&Self> {
        m1.dot_into(m2, self, mult, 1.0)
    }

    /// self -= mult * (m1 · m2)
    pub fn subtract_dot(&self, m1: &Matrix<R>, m2: &Matrix<R>, mult: f32) -> Result<&Self> {
        m1.dot_into(m2, self, -mult, 1.0)
    }

    /// Sum of the elementwise product with an equally sized matrix
    pub fn vdot(&self, other: &Matrix<R>) -> Result<f32> {
        let mut out = 0.0;
        let status = self.client().vdot(&self.desc(), &other.desc(), &mut out);
        self.check(status)?;
        Ok(out)
    }

    /// Frobenius norm
    pub fn euclid_norm(&self) -> Result<f32> {
        let mut out = 0.0;
        let status = self.client().euclid_norm(&self.desc(), &mut out);
        self.check(status)?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use crate::error::Error;
    use crate::matrix::Matrix;
    use crate::runtime::cpu::{CpuClient, CpuDevice, CpuRuntime};

    #[test]
    fn test_dot_shapes() {
        let client = CpuClient::new(CpuDevice::new());
        let a = Matrix::<CpuRuntime>::empty(&client, 3, 4).unwrap();
        let b = Matrix::<CpuRuntime>::empty(&client, 4, 2).unwrap();
        assert_eq!(a.dot(&b, 1.0).unwrap().shape(), (3, 2));

        let at = a.transposed_view();
        assert_eq!(at.dot(&a, 1.0).unwrap().shape(), (4, 4));
        assert_eq!(a.dot(&a, 1.0).unwrap_err(), Error::DimensionMismatch);
    }

    #[test]
    fn test_accumulating_products() {
        let client = CpuClient::new(CpuDevice::new());
        let a = Matrix::<CpuRuntime>::from_row_major(&client, &[1.0, 2.0, 3.0, 4.0], 2, 2).unwrap();
        let eye = Matrix::<CpuRuntime>::empty(&client, 2, 2).unwrap();
        eye.add_to_diagonal(1.0, None).unwrap();

        let acc = Matrix::<CpuRuntime>::empty(&client, 2, 2).unwrap();
        acc.add_dot(&a, &eye, 3.0).unwrap();
        acc.subtract_dot(&eye, &a, 1.0).unwrap();
        assert_eq!(acc.to_host_vec().unwrap(), vec![2.0, 6.0, 4.0, 8.0]);

        let out = a.dot(&a.transposed_view(), 1.0).unwrap();
        // [[1, 2], [3, 4]] · [[1, 3], [2, 4]]
        assert_eq!(out.to_host_vec().unwrap(), vec![5.0, 11.0, 11.0, 25.0]);
    }

    #[test]
    fn test_inner_products() {
        let client = CpuClient::new(CpuDevice::new());
        let a = Matrix::<CpuRuntime>::from_host(&client, vec![3.0, 4.0], 2, 1, true).unwrap();
        assert_eq!(a.vdot(&a).unwrap(), 25.0);
        assert_eq!(a.euclid_norm().unwrap(), 5.0);
    }
}
