//! Degrees of freedom of the coupled scalar+vector piecewise-linear space.

use crate::{
  dirichlet::BcError,
  mesh::{CellIdx, SimplicialMesh},
};

pub type DofIdx = usize;

/// Tabulates the global degrees of freedom of each cell.
///
/// The local numbering of a cell is blocked by field component:
/// slots `c * n .. (c + 1) * n`, with `n = ndofs_per_field_per_cell()`,
/// hold the dofs of component `c`.
pub trait DofMap {
  /// The mesh the dofs live on.
  fn mesh(&self) -> &SimplicialMesh;
  fn ncomponents(&self) -> usize;
  fn ndofs_per_field_per_cell(&self) -> usize;
  fn global_dimension(&self) -> usize;
  fn tabulate_dofs(&self, icell: CellIdx, dofs: &mut [DofIdx]);

  fn local_dimension(&self) -> usize {
    self.ncomponents() * self.ndofs_per_field_per_cell()
  }
}

/// A scalar field and a `gdim`-dimensional vector field, both continuous and
/// piecewise-linear, coupled in one system.
///
/// Component 0 is the scalar field, components `1..=gdim` are the
/// spatial components of the vector field.
/// Globally the dofs are blocked by component as well:
/// component `c` at vertex `v` has dof `c * nvertices + v`.
pub struct Cg1vCg1DofMap<'m> {
  mesh: &'m SimplicialMesh,
}

impl<'m> Cg1vCg1DofMap<'m> {
  pub fn new(mesh: &'m SimplicialMesh) -> Self {
    Self { mesh }
  }

  pub fn dof(&self, component: FieldComponent, ivertex: usize) -> DofIdx {
    component.index() * self.mesh.nvertices() + ivertex
  }
}

impl DofMap for Cg1vCg1DofMap<'_> {
  fn mesh(&self) -> &SimplicialMesh {
    self.mesh
  }
  fn ncomponents(&self) -> usize {
    1 + self.mesh.dim_embedded()
  }
  fn ndofs_per_field_per_cell(&self) -> usize {
    self.mesh.nvertices_per_cell()
  }
  fn global_dimension(&self) -> usize {
    self.ncomponents() * self.mesh.nvertices()
  }

  fn tabulate_dofs(&self, icell: CellIdx, dofs: &mut [DofIdx]) {
    assert_eq!(dofs.len(), self.local_dimension());
    let nvertices = self.mesh.nvertices();
    let cell = self.mesh.cell(icell);
    for (component, block) in dofs.chunks_exact_mut(cell.len()).enumerate() {
      for (dof, &ivertex) in block.iter_mut().zip(cell) {
        *dof = component * nvertices + ivertex;
      }
    }
  }
}

/// A component of the coupled field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldComponent {
  Scalar,
  /// Spatial component `axis` of the vector field.
  Vector(usize),
}

impl FieldComponent {
  /// Position of the component in the blocked layout, `None` if it is not
  /// representable.
  pub fn checked_index(self) -> Option<usize> {
    match self {
      Self::Scalar => Some(0),
      Self::Vector(axis) => axis.checked_add(1),
    }
  }
  pub fn index(self) -> usize {
    self
      .checked_index()
      .expect("vector axis overflows the component index")
  }
  pub fn from_index(index: usize) -> Self {
    match index {
      0 => Self::Scalar,
      _ => Self::Vector(index - 1),
    }
  }
}

/// Picks the dof of one field component at a vertex out of a cell tabulation.
#[derive(Debug, Clone, Copy)]
pub struct DofResolver {
  component: usize,
  ncomponents: usize,
  ndofs_per_field_per_cell: usize,
}

impl DofResolver {
  pub fn new(dof_map: &impl DofMap, component: FieldComponent) -> Result<Self, BcError> {
    Self::from_layout(
      component,
      dof_map.ncomponents(),
      dof_map.ndofs_per_field_per_cell(),
    )
  }

  pub fn from_layout(
    component: FieldComponent,
    ncomponents: usize,
    ndofs_per_field_per_cell: usize,
  ) -> Result<Self, BcError> {
    let index = component
      .checked_index()
      .filter(|&index| index < ncomponents)
      .ok_or(BcError::ComponentOutOfRange {
        component,
        ncomponents,
      })?;
    Ok(Self {
      component: index,
      ncomponents,
      ndofs_per_field_per_cell,
    })
  }

  pub fn component(&self) -> FieldComponent {
    FieldComponent::from_index(self.component)
  }

  /// The global dof of the configured component at local vertex `ilocal`,
  /// given the full tabulation `cell_dofs` of the cell.
  pub fn resolve(&self, cell_dofs: &[DofIdx], ilocal: usize) -> DofIdx {
    self.resolve_component(cell_dofs, ilocal, self.component)
  }

  pub fn resolve_component(&self, cell_dofs: &[DofIdx], ilocal: usize, component: usize) -> DofIdx {
    assert!(
      component < self.ncomponents,
      "component {component} out of range ({} components)",
      self.ncomponents
    );
    assert!(
      ilocal < self.ndofs_per_field_per_cell,
      "local vertex {ilocal} out of range ({} per cell)",
      self.ndofs_per_field_per_cell
    );
    assert_eq!(cell_dofs.len(), self.ncomponents * self.ndofs_per_field_per_cell);
    cell_dofs[ilocal + component * self.ndofs_per_field_per_cell]
  }
}
