use super::{coordinates::VertexCoords, SimplicialMesh, VertexIdx};
use crate::Dim;

use itertools::Itertools;

/// converts linear index to cartesian index
///
/// converts linear index in 0..dim_len^d to cartesian index in (0)^d..(dim_len)^d
pub fn linear_index2cartesian_index(
  mut lin_idx: usize,
  dim_len: usize,
  dim: usize,
) -> na::DVector<usize> {
  let mut cart_idx = na::DVector::zeros(dim);
  for icomp in 0..dim {
    cart_idx[icomp] = lin_idx % dim_len;
    lin_idx /= dim_len;
  }
  cart_idx
}

/// converts cartesian index to linear index
///
/// converts cartesian index in (0)^d..(dim_len)^d to linear index in 0..dim_len^d
pub fn cartesian_index2linear_index(cart_idx: &na::DVector<usize>, dim_len: usize) -> usize {
  let dim = cart_idx.len();
  let mut lin_idx = 0;
  for icomp in (0..dim).rev() {
    lin_idx *= dim_len;
    lin_idx += cart_idx[icomp];
  }
  lin_idx
}

pub struct HyperBox {
  min: na::DVector<f64>,
  max: na::DVector<f64>,
}

impl HyperBox {
  pub fn new_min_max(min: na::DVector<f64>, max: na::DVector<f64>) -> Self {
    assert!(min.len() == max.len());
    Self { min, max }
  }
  pub fn new_unit(dim: Dim) -> Self {
    let min = na::DVector::zeros(dim);
    let max = na::DVector::from_element(dim, 1.0);
    Self { min, max }
  }

  pub fn dim(&self) -> usize {
    self.min.len()
  }
  pub fn min(&self) -> &na::DVector<f64> {
    &self.min
  }
  pub fn max(&self) -> &na::DVector<f64> {
    &self.max
  }
  pub fn side_lengths(&self) -> na::DVector<f64> {
    &self.max - &self.min
  }
}

/// Structured simplicial mesh of a [`HyperBox`].
///
/// The box is subdivided into `nboxes_per_dim^d` equal sub-boxes, each of
/// which is split into `d!` simplicies (Kuhn triangulation).
/// Vertices are numbered lexicographically, first axis fastest.
pub struct HyperBoxMeshInfo {
  hyperbox: HyperBox,
  nboxes_per_dim: usize,
}

impl HyperBoxMeshInfo {
  pub fn new_min_max(min: na::DVector<f64>, max: na::DVector<f64>, nboxes_per_dim: usize) -> Self {
    let hyperbox = HyperBox::new_min_max(min, max);
    Self {
      hyperbox,
      nboxes_per_dim,
    }
  }
  pub fn new_unit(dim: Dim, nboxes_per_dim: usize) -> Self {
    let hyperbox = HyperBox::new_unit(dim);
    Self {
      hyperbox,
      nboxes_per_dim,
    }
  }

  pub fn hyperbox(&self) -> &HyperBox {
    &self.hyperbox
  }
  pub fn dim(&self) -> usize {
    self.hyperbox.dim()
  }
  pub fn nboxes_per_dim(&self) -> usize {
    self.nboxes_per_dim
  }
  pub fn nvertices_per_dim(&self) -> usize {
    self.nboxes_per_dim + 1
  }
  pub fn nboxes(&self) -> usize {
    self.nboxes_per_dim.pow(self.dim() as u32)
  }
  pub fn nvertices(&self) -> usize {
    self.nvertices_per_dim().pow(self.dim() as u32)
  }
  pub fn vertex_cart_idx(&self, ivertex: VertexIdx) -> na::DVector<usize> {
    linear_index2cartesian_index(ivertex, self.nvertices_per_dim(), self.dim())
  }
  pub fn vertex_pos(&self, ivertex: VertexIdx) -> na::DVector<f64> {
    (self.vertex_cart_idx(ivertex).cast::<f64>() / self.nboxes_per_dim as f64)
      .component_mul(&self.hyperbox.side_lengths())
      + self.hyperbox.min()
  }

  pub fn is_vertex_on_boundary(&self, ivertex: VertexIdx) -> bool {
    self
      .vertex_cart_idx(ivertex)
      .iter()
      .any(|&c| c == 0 || c == self.nboxes_per_dim)
  }

  pub fn compute_vertex_coords(&self) -> VertexCoords {
    let mut coords = na::DMatrix::zeros(self.dim(), self.nvertices());
    for (ivertex, mut coord) in coords.column_iter_mut().enumerate() {
      coord.copy_from(&self.vertex_pos(ivertex));
    }
    VertexCoords::new(coords)
  }

  pub fn compute_cells(&self) -> Vec<Vec<VertexIdx>> {
    let dim = self.dim();
    let mut cells = Vec::with_capacity(self.nboxes() * (1..=dim).product::<usize>());

    // iterate through all boxes that make up the mesh
    for ibox in 0..self.nboxes() {
      let origin_icart = linear_index2cartesian_index(ibox, self.nboxes_per_dim, dim);
      let ivertex_origin = cartesian_index2linear_index(&origin_icart, self.nvertices_per_dim());

      // each permutation of the axes gives rise to one simplicial cell
      for axes in (0..dim).permutations(dim) {
        let mut cell = Vec::with_capacity(dim + 1);
        cell.push(ivertex_origin);

        // every shift step along an axis gives us one vertex
        let mut vertex_icart = origin_icart.clone();
        for axis in axes {
          vertex_icart[axis] += 1;
          cell.push(cartesian_index2linear_index(
            &vertex_icart,
            self.nvertices_per_dim(),
          ));
        }
        cells.push(cell);
      }
    }
    cells
  }

  pub fn to_mesh(&self) -> SimplicialMesh {
    SimplicialMesh::new(self.compute_cells(), self.compute_vertex_coords())
      .expect("hyperbox triangulation is a valid manifold mesh")
  }
}
