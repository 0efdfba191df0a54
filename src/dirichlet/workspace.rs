use super::BcError;
use crate::{
  space::DofIdx,
  sparse::{GalMat, GalVec},
};

/// Scratch storage owned by a boundary condition and reused across `apply` calls.
///
/// Holds a copy of the system matrix that receives the constraint writes,
/// plus row buffers. The buffers are sized for the widest row of the matrix
/// at creation and grow to the widest row ever constrained; they never shrink.
#[derive(Debug)]
pub struct Workspace {
  scratch: GalMat,
  row_cols: Vec<usize>,
  row_values: Vec<f64>,
  zero_row: Vec<f64>,
}

impl Workspace {
  pub fn new(galmat: &GalMat) -> Self {
    let width = galmat.max_row_nnz();
    Self {
      scratch: galmat.clone(),
      row_cols: Vec::with_capacity(width),
      row_values: Vec::with_capacity(width),
      zero_row: vec![0.0; width],
    }
  }

  pub fn scratch(&self) -> &GalMat {
    &self.scratch
  }

  /// Current width of the row buffers.
  pub fn capacity(&self) -> usize {
    self.zero_row.len()
  }

  /// Overwrites the scratch values with the current values of `galmat`.
  pub fn copy_in(&mut self, galmat: &GalMat) -> Result<(), BcError> {
    self.scratch.assign_values(galmat)?;
    Ok(())
  }

  /// Flushes the constraint writes and publishes the scratch values to `galmat`.
  pub fn copy_out(&mut self, galmat: &mut GalMat) -> Result<(), BcError> {
    self.scratch.flush()?;
    galmat.assign_values(&self.scratch)?;
    Ok(())
  }

  fn reserve(&mut self, width: usize) {
    if width > self.zero_row.len() {
      self.zero_row.resize(width, 0.0);
    }
  }

  /// Replaces row `dof` by the identity row.
  ///
  /// The row pattern is read from `galmat`, the writes go to the scratch
  /// matrix: every stored entry of the row becomes zero, then the diagonal
  /// becomes one. The pattern stays untouched.
  pub fn constrain_row(&mut self, galmat: &GalMat, dof: DofIdx) -> Result<(), BcError> {
    galmat.getrow(dof, &mut self.row_cols, &mut self.row_values);
    let nnz = self.row_cols.len();
    if nnz == 0 {
      return Err(BcError::EmptyRow { row: dof });
    }
    if self.row_cols.binary_search(&dof).is_err() {
      return Err(BcError::MissingDiagonal { row: dof });
    }

    self.reserve(nnz);
    let zeros = &mut self.zero_row[..nnz];
    zeros.fill(0.0);

    self.scratch.set_row(dof, &self.row_cols, zeros);
    self.scratch.set(dof, dof, 1.0);
    Ok(())
  }
}

/// Prescribes the value of `dof` in the right-hand side.
pub fn constrain_rhs(galvec: &mut GalVec, dof: DofIdx, value: f64) {
  galvec.set(dof, value);
}
