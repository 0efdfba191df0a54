use super::{CellIdx, SimplicialMesh, SortedFacet, VertexIdx};

use itertools::Itertools;

impl SimplicialMesh {
  pub fn has_boundary(&self) -> bool {
    self.boundary_facets().next().is_some()
  }

  /// For a d-mesh computes the boundary, which consists of facets ((d-1)-simplicies).
  ///
  /// The boundary facets are characterized by the fact that they
  /// only have 1 cell as super entity.
  /// Yields the facet together with this single cell, in facet order.
  pub fn boundary_facets(&self) -> impl Iterator<Item = (&SortedFacet, CellIdx)> + '_ {
    self
      .facets()
      .iter()
      .filter(|(_, cocells)| cocells.len() == 1)
      .map(|(facet, cocells)| (facet, cocells[0]))
  }

  /// The vertices that lie on the boundary of the mesh,
  /// in order of first appearance on the boundary facets.
  pub fn boundary_vertices(&self) -> Vec<VertexIdx> {
    self
      .boundary_facets()
      .flat_map(|(facet, _)| facet.iter().copied())
      .unique()
      .collect()
  }

  pub fn boundary_cells(&self) -> Vec<CellIdx> {
    self
      .boundary_facets()
      .map(|(_, icell)| icell)
      .unique()
      .collect()
  }
}

/// A vertex on the mesh boundary together with a cell containing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceVertex {
  /// Index of the vertex in the full mesh.
  pub vertex: VertexIdx,
  /// A cell of the full mesh adjacent to the boundary at this vertex.
  pub cell: CellIdx,
  /// Position of `vertex` in the vertex list of `cell`.
  pub ilocal: usize,
}

/// The boundary of a mesh, seen from its vertices.
///
/// Relates every boundary vertex to a volume cell it belongs to,
/// which is what is needed to look up the vertex's degrees of freedom.
#[derive(Debug, Clone, Default)]
pub struct BoundaryTrace {
  vertices: Vec<TraceVertex>,
}

impl BoundaryTrace {
  /// Traverses the boundary facets in mesh order. Every boundary vertex is
  /// recorded once, with the cell of the facet it is first found on.
  pub fn compute(mesh: &SimplicialMesh) -> Self {
    let vertices = mesh
      .boundary_facets()
      .flat_map(|(facet, icell)| facet.iter().map(move |&ivertex| (ivertex, icell)))
      .unique_by(|&(ivertex, _)| ivertex)
      .map(|(vertex, cell)| {
        let ilocal = mesh
          .local_vertex_index(cell, vertex)
          .expect("facet vertices belong to their cell");
        TraceVertex {
          vertex,
          cell,
          ilocal,
        }
      })
      .collect();
    Self { vertices }
  }

  pub fn len(&self) -> usize {
    self.vertices.len()
  }
  pub fn is_empty(&self) -> bool {
    self.vertices.is_empty()
  }
  pub fn iter(&self) -> std::slice::Iter<'_, TraceVertex> {
    self.vertices.iter()
  }
}

impl<'a> IntoIterator for &'a BoundaryTrace {
  type Item = &'a TraceVertex;
  type IntoIter = std::slice::Iter<'a, TraceVertex>;

  fn into_iter(self) -> Self::IntoIter {
    self.vertices.iter()
  }
}
