//! A mesh plays the role of a container of mesh entities (cells, facets, vertices).
//! It provides a global numbering for unique identification of the entities.
//! It allows for the traversal of the entities in a defined order.
//! It provides topology information (incidence).
//! It stores the mesh geometry in form of vertex coordinates.

pub mod boundary;
pub mod coordinates;
pub mod hyperbox;

use crate::{partition::Partition, Dim};
use coordinates::VertexCoords;

use indexmap::IndexMap;

pub type VertexIdx = usize;
pub type CellIdx = usize;

/// A facet identified by its sorted vertices.
pub type SortedFacet = Vec<VertexIdx>;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MeshError {
  #[error("mesh has no cells")]
  Empty,
  #[error("cell {icell} has {nvertices} vertices, expected {expected}")]
  InconsistentCell {
    icell: CellIdx,
    nvertices: usize,
    expected: usize,
  },
  #[error("cell {icell} references vertex {ivertex}, but there are only {nvertices} vertices")]
  VertexOutOfRange {
    icell: CellIdx,
    ivertex: VertexIdx,
    nvertices: usize,
  },
  #[error("facet {facet:?} is shared by {ncocells} cells, topology must be manifold")]
  NonManifold { facet: SortedFacet, ncocells: usize },
  #[error("invalid partition: {0}")]
  InvalidPartition(String),
}

/// A simplicial mesh with both topological and geometric information.
///
/// Facets are stored in the order they are first encountered when walking
/// the cells, which makes every traversal derived from them deterministic.
#[derive(Debug, Clone)]
pub struct SimplicialMesh {
  /// Vertices of each cell. Defines the global numbering of cells.
  cells: Vec<Vec<VertexIdx>>,
  /// Facets with the cells they are a face of.
  facets: IndexMap<SortedFacet, Vec<CellIdx>>,
  /// Cells incident to each vertex, ascending.
  vertex_cells: Vec<Vec<CellIdx>>,
  coords: VertexCoords,
  partition: Partition,
}

// constructors
impl SimplicialMesh {
  pub fn new(cells: Vec<Vec<VertexIdx>>, coords: VertexCoords) -> Result<Self, MeshError> {
    let nvertices_cell = cells.first().ok_or(MeshError::Empty)?.len();
    let nvertices = coords.nvertices();

    let mut facets: IndexMap<SortedFacet, Vec<CellIdx>> = IndexMap::new();
    let mut vertex_cells = vec![Vec::new(); nvertices];
    for (icell, cell) in cells.iter().enumerate() {
      if cell.len() != nvertices_cell {
        return Err(MeshError::InconsistentCell {
          icell,
          nvertices: cell.len(),
          expected: nvertices_cell,
        });
      }
      if let Some(&ivertex) = cell.iter().find(|&&v| v >= nvertices) {
        return Err(MeshError::VertexOutOfRange {
          icell,
          ivertex,
          nvertices,
        });
      }

      for &ivertex in cell {
        vertex_cells[ivertex].push(icell);
      }

      // a 0-dimensional mesh has no facets
      if nvertices_cell < 2 {
        continue;
      }
      for iomit in 0..cell.len() {
        let mut facet: SortedFacet = cell.clone();
        facet.remove(iomit);
        facet.sort_unstable();
        facets.entry(facet).or_default().push(icell);
      }
    }

    if let Some((facet, cocells)) = facets.iter().find(|(_, cocells)| cocells.len() > 2) {
      return Err(MeshError::NonManifold {
        facet: facet.clone(),
        ncocells: cocells.len(),
      });
    }

    let partition = Partition::serial(nvertices, cells.len());
    Ok(Self {
      cells,
      facets,
      vertex_cells,
      coords,
      partition,
    })
  }

  /// Attaches the ownership information of a distributed run.
  ///
  /// `cell_owners[icell]` is the rank that assembles cell `icell`.
  pub fn distribute(
    mut self,
    rank: usize,
    nranks: usize,
    cell_owners: &[usize],
  ) -> Result<Self, MeshError> {
    self.partition = Partition::from_cell_owners(&self, rank, nranks, cell_owners)?;
    Ok(self)
  }
}

// getters
impl SimplicialMesh {
  /// Intrinsic dimension of the mesh.
  pub fn dim(&self) -> Dim {
    self.nvertices_per_cell() - 1
  }
  /// Dimension of the space the vertices live in.
  pub fn dim_embedded(&self) -> Dim {
    self.coords.dim()
  }
  pub fn nvertices(&self) -> usize {
    self.coords.nvertices()
  }
  pub fn ncells(&self) -> usize {
    self.cells.len()
  }
  pub fn nvertices_per_cell(&self) -> usize {
    self.cells[0].len()
  }
  pub fn cells(&self) -> &[Vec<VertexIdx>] {
    &self.cells
  }
  pub fn cell(&self, icell: CellIdx) -> &[VertexIdx] {
    &self.cells[icell]
  }
  pub fn coords(&self) -> &VertexCoords {
    &self.coords
  }
  pub fn vertex_cells(&self, ivertex: VertexIdx) -> &[CellIdx] {
    &self.vertex_cells[ivertex]
  }
  pub fn facets(&self) -> &IndexMap<SortedFacet, Vec<CellIdx>> {
    &self.facets
  }
  pub fn partition(&self) -> &Partition {
    &self.partition
  }

  /// Position of `ivertex` within the vertex list of `icell`.
  pub fn local_vertex_index(&self, icell: CellIdx, ivertex: VertexIdx) -> Option<usize> {
    self.cells[icell].iter().position(|&v| v == ivertex)
  }
}
