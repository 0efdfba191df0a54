//! Storage of the assembled linear system.
//!
//! Writes to [`GalMat`] and [`GalVec`] are queued and only become visible
//! after a `flush`. The sparsity pattern of a [`GalMat`] is fixed once built:
//! writes can change values but never add or remove entries.

use crate::space::DofIdx;

use std::collections::BTreeSet;

#[derive(Debug, thiserror::Error)]
pub enum SparsityError {
  #[error("entry ({row}, {col}) is not part of the sparsity pattern")]
  NotInPattern { row: usize, col: usize },
  #[error("sparsity patterns differ")]
  PatternMismatch,
  #[error(transparent)]
  Format(#[from] nas::SparseFormatError),
}

/// Galerkin matrix in CSR format with queued writes.
#[derive(Debug, Clone)]
pub struct GalMat {
  csr: nas::CsrMatrix<f64>,
  pending: Vec<(usize, usize, f64)>,
}

impl GalMat {
  pub fn new(csr: nas::CsrMatrix<f64>) -> Self {
    Self {
      csr,
      pending: Vec::new(),
    }
  }

  /// Duplicate entries are summed up, explicit zeros are kept.
  pub fn from_coo(coo: &nas::CooMatrix<f64>) -> Self {
    Self::new(coo.into())
  }

  pub fn try_from_triplets(
    nrows: usize,
    ncols: usize,
    triplets: &[(usize, usize, f64)],
  ) -> Result<Self, SparsityError> {
    let rows = triplets.iter().map(|t| t.0).collect();
    let cols = triplets.iter().map(|t| t.1).collect();
    let vals = triplets.iter().map(|t| t.2).collect();
    let coo = nas::CooMatrix::try_from_triplets(nrows, ncols, rows, cols, vals)?;
    Ok(Self::from_coo(&coo))
  }

  pub fn nrows(&self) -> usize {
    self.csr.nrows()
  }
  pub fn ncols(&self) -> usize {
    self.csr.ncols()
  }
  pub fn nnz(&self) -> usize {
    self.csr.nnz()
  }
  pub fn csr(&self) -> &nas::CsrMatrix<f64> {
    &self.csr
  }
  pub fn to_nalgebra_dense(&self) -> na::DMatrix<f64> {
    (&self.csr).into()
  }

  /// The stored value at `(row, col)`, `None` if outside the pattern.
  pub fn get(&self, row: usize, col: usize) -> Option<f64> {
    self.position(row, col).map(|i| self.csr.values()[i])
  }

  pub fn row_nnz(&self, row: usize) -> usize {
    self.csr.row(row).nnz()
  }
  /// Number of nonzeros of the widest row.
  pub fn max_row_nnz(&self) -> usize {
    self
      .csr
      .row_offsets()
      .windows(2)
      .map(|w| w[1] - w[0])
      .max()
      .unwrap_or(0)
  }

  /// Reads the column indices and values of `row` into the given buffers.
  pub fn getrow(&self, row: usize, cols: &mut Vec<usize>, values: &mut Vec<f64>) {
    let row = self.csr.row(row);
    cols.clear();
    cols.extend_from_slice(row.col_indices());
    values.clear();
    values.extend_from_slice(row.values());
  }

  /// Queues writes of `values` into `row` at the columns `cols`.
  pub fn set_row(&mut self, row: usize, cols: &[usize], values: &[f64]) {
    assert_eq!(cols.len(), values.len());
    self
      .pending
      .extend(cols.iter().zip(values).map(|(&col, &v)| (row, col, v)));
  }

  /// Queues a single write.
  pub fn set(&mut self, row: usize, col: usize, value: f64) {
    self.pending.push((row, col, value));
  }

  pub fn has_pending(&self) -> bool {
    !self.pending.is_empty()
  }

  /// Applies all queued writes in the order they were issued.
  ///
  /// Either all writes are applied or, if any of them lies outside the
  /// sparsity pattern, none. The queue is empty afterwards in both cases.
  pub fn flush(&mut self) -> Result<(), SparsityError> {
    let pending = std::mem::take(&mut self.pending);
    let positions = pending
      .iter()
      .map(|&(row, col, _)| {
        self
          .position(row, col)
          .ok_or(SparsityError::NotInPattern { row, col })
      })
      .collect::<Result<Vec<_>, _>>()?;

    let values = self.csr.values_mut();
    for (i, (_, _, v)) in positions.into_iter().zip(pending) {
      values[i] = v;
    }
    Ok(())
  }

  /// Overwrites all values with those of `other`, which must have the same
  /// sparsity pattern. Discards queued writes.
  pub fn assign_values(&mut self, other: &GalMat) -> Result<(), SparsityError> {
    if self.csr.pattern() != other.csr.pattern() {
      return Err(SparsityError::PatternMismatch);
    }
    self.pending.clear();
    self.csr.values_mut().copy_from_slice(other.csr.values());
    Ok(())
  }

  /// Index of entry `(row, col)` into the value array.
  fn position(&self, row: usize, col: usize) -> Option<usize> {
    if row >= self.nrows() {
      return None;
    }
    let offsets = self.csr.row_offsets();
    let (start, end) = (offsets[row], offsets[row + 1]);
    self.csr.col_indices()[start..end]
      .binary_search(&col)
      .ok()
      .map(|i| start + i)
  }
}

/// Galerkin vector with queued writes and ghost registration.
#[derive(Debug, Clone)]
pub struct GalVec {
  values: na::DVector<f64>,
  pending: Vec<(DofIdx, f64)>,
  ghosts: BTreeSet<DofIdx>,
}

impl GalVec {
  pub fn new(values: na::DVector<f64>) -> Self {
    Self {
      values,
      pending: Vec::new(),
      ghosts: BTreeSet::new(),
    }
  }
  pub fn zeros(len: usize) -> Self {
    Self::new(na::DVector::zeros(len))
  }

  pub fn len(&self) -> usize {
    self.values.len()
  }
  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }
  pub fn get(&self, i: DofIdx) -> f64 {
    self.values[i]
  }
  pub fn as_vector(&self) -> &na::DVector<f64> {
    &self.values
  }
  pub fn into_vector(self) -> na::DVector<f64> {
    self.values
  }

  /// Queues a write.
  pub fn set(&mut self, i: DofIdx, value: f64) {
    assert!(i < self.len(), "index {i} out of bounds ({})", self.len());
    self.pending.push((i, value));
  }

  pub fn has_pending(&self) -> bool {
    !self.pending.is_empty()
  }

  /// Applies all queued writes in order, later writes win.
  pub fn flush(&mut self) {
    for (i, v) in self.pending.drain(..) {
      self.values[i] = v;
    }
  }

  /// Drops all queued writes.
  pub fn discard_pending(&mut self) {
    self.pending.clear();
  }

  /// Registers the rows owned by other ranks that this rank references.
  pub fn init_ghosted(&mut self, ghosts: BTreeSet<DofIdx>) {
    self.ghosts = ghosts;
  }
  pub fn ghost_indices(&self) -> &BTreeSet<DofIdx> {
    &self.ghosts
  }
}
