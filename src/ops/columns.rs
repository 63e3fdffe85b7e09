//! Column gather, scatter and permutation
//!
//! Index vectors hold column numbers encoded as floats; negative values count from
//! the end. A source index outside `[-cols, cols - 1]` produces a column of NaN
//! instead of an error.

use crate::error::Result;
use crate::matrix::Matrix;
use crate::runtime::{KernelLibrary, Runtime};

impl<R: Runtime> Matrix<R> {
    /// target column `c` = column `indices[c]` of self
    pub fn select_columns<'t>(
        &self,
        indices: &Matrix<R>,
        target: &'t Matrix<R>,
    ) -> Result<&'t Matrix<R>> {
        let status = self
            .client()
            .select_columns(&self.desc(), &target.desc(), &indices.desc());
        self.check(status)?;
        Ok(target)
    }

    /// self column `indices[c]` = column `c` of `source`
    ///
    /// Out-of-range destinations are skipped.
    pub fn set_selected_columns(&self, indices: &Matrix<R>, source: &Matrix<R>) -> Result<&Self> {
        let status =
            self.client()
                .set_selected_columns(&self.desc(), &source.desc(), &indices.desc());
        self.check(status)?;
        Ok(self)
    }

    /// target column `idx_b[c]` = column `idx_a[c]` of self
    pub fn swap_columns<'t>(
        &self,
        idx_a: &Matrix<R>,
        idx_b: &Matrix<R>,
        target: &'t Matrix<R>,
    ) -> Result<&'t Matrix<R>> {
        let status = self.client().swap_columns(
            &self.desc(),
            &target.desc(),
            &idx_a.desc(),
            &idx_b.desc(),
        );
        self.check(status)?;
        Ok(target)
    }

    /// Reorder columns in place: column `c` becomes the old column `permutation[c]`
    pub fn shuffle_columns(&self, permutation: &Matrix<R>) -> Result<&Self> {
        let status = self
            .client()
            .shuffle_columns(&self.desc(), &permutation.desc());
        self.check(status)?;
        Ok(self)
    }

    /// Gather columns into `target`: target column `c` = column `indices[c]` of self
    ///
    /// The same gather as [`select_columns`](Self::select_columns), named for its use
    /// in expanding a compact table into one column per case.
    pub fn expand<'t>(
        &self,
        expansion_indices: &Matrix<R>,
        target: &'t Matrix<R>,
    ) -> Result<&'t Matrix<R>> {
        self.select_columns(expansion_indices, target)
    }

    /// target column `c` = self column `c` + mult * column `indices[c]` of `val`
    pub fn expand_and_add<'a>(
        &'a self,
        val: &Matrix<R>,
        expansion_indices: &Matrix<R>,
        target: Option<&'a Matrix<R>>,
        mult: f32,
    ) -> Result<&'a Matrix<R>> {
        let target = target.unwrap_or(self);
        let status = self.client().expand_and_add(
            &self.desc(),
            &val.desc(),
            &expansion_indices.desc(),
            &target.desc(),
            mult,
        );
        self.check(status)?;
        Ok(target)
    }

    /// target column `indices[c]` += mult * column `c` of self
    ///
    /// With `avg` each destination column receives the mean of the columns mapped to
    /// it instead of their sum. Out-of-range destinations are skipped.
    pub fn accumulate_columns<'t>(
        &self,
        indices: &Matrix<R>,
        target: &'t Matrix<R>,
        mult: f32,
        avg: bool,
    ) -> Result<&'t Matrix<R>> {
        let status = self.client().accumulate_columns(
            &self.desc(),
            &indices.desc(),
            &target.desc(),
            mult,
            avg,
        );
        self.check(status)?;
        Ok(target)
    }
}
