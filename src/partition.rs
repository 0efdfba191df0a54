//! Ownership of mesh entities in a distributed run.
//!
//! Every rank holds the mesh together with a [`Partition`], which is computed
//! once when the mesh is distributed. Entities shared between ranks are owned
//! by exactly one of them; on all other ranks they are ghosts.

use crate::mesh::{CellIdx, MeshError, SimplicialMesh, VertexIdx};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
  Owned,
  /// Owned by the rank `owner`.
  Ghost { owner: usize },
}

#[derive(Debug, Clone)]
pub struct Partition {
  rank: usize,
  nranks: usize,
  vertex_ownership: Vec<Ownership>,
  cell_owned: Vec<bool>,
}

impl Partition {
  /// A single-process run: everything is owned by rank 0.
  pub fn serial(nvertices: usize, ncells: usize) -> Self {
    Self {
      rank: 0,
      nranks: 1,
      vertex_ownership: vec![Ownership::Owned; nvertices],
      cell_owned: vec![true; ncells],
    }
  }

  /// Derives vertex ownership from the cell distribution.
  ///
  /// A vertex is owned by the lowest rank among the owners of its cells.
  pub fn from_cell_owners(
    mesh: &SimplicialMesh,
    rank: usize,
    nranks: usize,
    cell_owners: &[usize],
  ) -> Result<Self, MeshError> {
    if rank >= nranks {
      return Err(MeshError::InvalidPartition(format!(
        "rank {rank} is not below the number of ranks {nranks}"
      )));
    }
    if cell_owners.len() != mesh.ncells() {
      return Err(MeshError::InvalidPartition(format!(
        "got {} cell owners for {} cells",
        cell_owners.len(),
        mesh.ncells()
      )));
    }
    if let Some(&owner) = cell_owners.iter().find(|&&owner| owner >= nranks) {
      return Err(MeshError::InvalidPartition(format!(
        "cell owner {owner} is not below the number of ranks {nranks}"
      )));
    }

    let vertex_ownership = (0..mesh.nvertices())
      .map(|ivertex| {
        let owner = mesh
          .vertex_cells(ivertex)
          .iter()
          .map(|&icell| cell_owners[icell])
          .min()
          .unwrap_or(rank);
        if owner == rank {
          Ownership::Owned
        } else {
          Ownership::Ghost { owner }
        }
      })
      .collect();

    let cell_owned = cell_owners.iter().map(|&owner| owner == rank).collect();

    Ok(Self {
      rank,
      nranks,
      vertex_ownership,
      cell_owned,
    })
  }

  pub fn rank(&self) -> usize {
    self.rank
  }
  pub fn nranks(&self) -> usize {
    self.nranks
  }
  pub fn is_serial(&self) -> bool {
    self.nranks == 1
  }

  pub fn ownership(&self, ivertex: VertexIdx) -> Ownership {
    self.vertex_ownership[ivertex]
  }
  pub fn is_ghost(&self, ivertex: VertexIdx) -> bool {
    matches!(self.vertex_ownership[ivertex], Ownership::Ghost { .. })
  }
  pub fn owner(&self, ivertex: VertexIdx) -> usize {
    match self.vertex_ownership[ivertex] {
      Ownership::Owned => self.rank,
      Ownership::Ghost { owner } => owner,
    }
  }

  /// The cells assembled on this rank, ascending.
  pub fn local_cells(&self) -> impl Iterator<Item = CellIdx> + '_ {
    self
      .cell_owned
      .iter()
      .enumerate()
      .filter_map(|(icell, &owned)| owned.then_some(icell))
  }
}
