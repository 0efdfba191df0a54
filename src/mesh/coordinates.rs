use super::VertexIdx;
use crate::Dim;

/// Vertex positions of a mesh in its embedding space.
#[derive(Debug, Clone)]
pub struct VertexCoords {
  /// The vertex coordinates in the columns of a matrix.
  matrix: na::DMatrix<f64>,
}
impl VertexCoords {
  pub fn new(matrix: na::DMatrix<f64>) -> Self {
    Self { matrix }
  }

  pub fn dim(&self) -> Dim {
    self.matrix.nrows()
  }
  pub fn nvertices(&self) -> usize {
    self.matrix.ncols()
  }

  pub fn coord(&self, ivertex: VertexIdx) -> na::DVectorView<'_, f64> {
    self.matrix.column(ivertex)
  }

  pub fn matrix(&self) -> &na::DMatrix<f64> {
    &self.matrix
  }

  /// The coordinates of the given vertices as columns, in the given order.
  pub fn simplex_coords(&self, vertices: &[VertexIdx]) -> na::DMatrix<f64> {
    let mut coords = na::DMatrix::zeros(self.dim(), vertices.len());
    for (i, &v) in vertices.iter().enumerate() {
      coords.set_column(i, &self.coord(v));
    }
    coords
  }
}
