//! Element matrices and vectors for piecewise-linear Lagrange elements.
//!
//! A cell is given by the coordinates of its vertices, as columns.

use crate::Dim;

pub trait ElmatProvider {
  fn eval(&self, cell_coords: &na::DMatrix<f64>) -> na::DMatrix<f64>;
}
impl<F> ElmatProvider for F
where
  F: Fn(&na::DMatrix<f64>) -> na::DMatrix<f64>,
{
  fn eval(&self, cell_coords: &na::DMatrix<f64>) -> na::DMatrix<f64> {
    self(cell_coords)
  }
}

pub trait ElvecProvider {
  fn eval(&self, cell_coords: &na::DMatrix<f64>) -> na::DVector<f64>;
}
impl<F> ElvecProvider for F
where
  F: Fn(&na::DMatrix<f64>) -> na::DVector<f64>,
{
  fn eval(&self, cell_coords: &na::DMatrix<f64>) -> na::DVector<f64> {
    self(cell_coords)
  }
}

pub fn factorial(num: usize) -> usize {
  (1..=num).product()
}

/// Intrinsic dimension of a cell.
pub fn cell_dim(cell_coords: &na::DMatrix<f64>) -> Dim {
  cell_coords.ncols() - 1
}

/// Edge vectors from the first vertex to all others, as columns.
pub fn spanning_vectors(cell_coords: &na::DMatrix<f64>) -> na::DMatrix<f64> {
  let v0 = cell_coords.column(0);
  let mut spanning = cell_coords.columns(1, cell_dim(cell_coords)).into_owned();
  for mut col in spanning.column_iter_mut() {
    col -= &v0;
  }
  spanning
}

/// $G = J^T J$
pub fn metric_tensor(cell_coords: &na::DMatrix<f64>) -> na::DMatrix<f64> {
  let spanning = spanning_vectors(cell_coords);
  spanning.transpose() * spanning
}

pub fn cell_vol(cell_coords: &na::DMatrix<f64>) -> f64 {
  let dim = cell_dim(cell_coords);
  metric_tensor(cell_coords).determinant().sqrt() / factorial(dim) as f64
}

/// The constant exterior derivatives of the reference barycentric coordinate
/// functions, given in the 1-form standard basis.
pub fn ref_difbarys(n: Dim) -> na::DMatrix<f64> {
  let mut ref_difbarys = na::DMatrix::zeros(n, n + 1);
  for i in 0..n {
    ref_difbarys[(i, 0)] = -1.0;
    ref_difbarys[(i, i + 1)] = 1.0;
  }
  ref_difbarys
}

/// Gradients of the barycentric coordinate functions in the embedding space,
/// one column per vertex.
pub fn barycentric_gradients(cell_coords: &na::DMatrix<f64>) -> na::DMatrix<f64> {
  let dim = cell_dim(cell_coords);
  let spanning = spanning_vectors(cell_coords);
  let inverse_metric = (spanning.transpose() * &spanning)
    .try_inverse()
    .expect("cell must not be degenerate");
  spanning * inverse_metric * ref_difbarys(dim)
}

/// Exact Element Matrix Provider for mass bilinear form.
pub fn mass_elmat(cell_coords: &na::DMatrix<f64>) -> na::DMatrix<f64> {
  let ndofs = cell_coords.ncols();
  let dim = cell_dim(cell_coords);
  let v = cell_vol(cell_coords) / ((dim + 1) * (dim + 2)) as f64;
  let mut elmat = na::DMatrix::from_element(ndofs, ndofs, v);
  elmat.fill_diagonal(2.0 * v);
  elmat
}

/// Exact Element Matrix Provider for the negative Laplacian.
pub fn laplace_elmat(cell_coords: &na::DMatrix<f64>) -> na::DMatrix<f64> {
  let grads = barycentric_gradients(cell_coords);
  cell_vol(cell_coords) * grads.transpose() * grads
}

/// $B_k = [integral lambda_i partial_k lambda_j]_(i,j)$
pub fn partial_derivative_elmat(cell_coords: &na::DMatrix<f64>, axis: usize) -> na::DMatrix<f64> {
  let grads = barycentric_gradients(cell_coords);
  let n = cell_coords.ncols();
  let weight = cell_vol(cell_coords) / n as f64;
  na::DMatrix::from_fn(n, n, |_, j| weight * grads[(axis, j)])
}

/// Element matrix of the coupled scalar+vector operator
/// $mat(K, B_1, ..., B_d; B_1^T, M + K, 0; ...; B_d^T, 0, M + K)$.
///
/// Blocked by component, matching the cell tabulation of the dof map.
pub fn cg1v_cg1_elmat(cell_coords: &na::DMatrix<f64>) -> na::DMatrix<f64> {
  let n = cell_coords.ncols();
  let gdim = cell_coords.nrows();
  let ncomponents = 1 + gdim;

  let laplace = laplace_elmat(cell_coords);
  let vector_block = mass_elmat(cell_coords) + &laplace;

  let mut elmat = na::DMatrix::zeros(ncomponents * n, ncomponents * n);
  elmat.view_mut((0, 0), (n, n)).copy_from(&laplace);
  for axis in 0..gdim {
    let offset = (1 + axis) * n;
    let coupling = partial_derivative_elmat(cell_coords, axis);
    elmat.view_mut((0, offset), (n, n)).copy_from(&coupling);
    elmat
      .view_mut((offset, 0), (n, n))
      .copy_from(&coupling.transpose());
    elmat
      .view_mut((offset, offset), (n, n))
      .copy_from(&vector_block);
  }
  elmat
}

/// Element matrix with $M + K$ on every diagonal component block.
/// Symmetric positive definite.
pub fn block_diagonal_elmat(cell_coords: &na::DMatrix<f64>) -> na::DMatrix<f64> {
  let n = cell_coords.ncols();
  let ncomponents = 1 + cell_coords.nrows();
  let block = mass_elmat(cell_coords) + laplace_elmat(cell_coords);

  let mut elmat = na::DMatrix::zeros(ncomponents * n, ncomponents * n);
  for icomp in 0..ncomponents {
    let offset = icomp * n;
    elmat.view_mut((offset, offset), (n, n)).copy_from(&block);
  }
  elmat
}

/// Element Vector Provider for a scalar load function,
/// applied to every component.
///
/// Computed using trapezoidal quadrature rule.
/// Exact for constant load.
pub struct LoadElvec<F> {
  load: F,
}
impl<F> LoadElvec<F>
where
  F: Fn(na::DVectorView<f64>) -> f64,
{
  pub fn new(load: F) -> Self {
    Self { load }
  }
}
impl<F> ElvecProvider for LoadElvec<F>
where
  F: Fn(na::DVectorView<f64>) -> f64,
{
  fn eval(&self, cell_coords: &na::DMatrix<f64>) -> na::DVector<f64> {
    let n = cell_coords.ncols();
    let ncomponents = 1 + cell_coords.nrows();
    let weight = cell_vol(cell_coords) / n as f64;
    na::DVector::from_fn(ncomponents * n, |i, _| {
      weight * (self.load)(cell_coords.column(i % n))
    })
  }
}
