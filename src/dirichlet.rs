//! Dirichlet boundary conditions for the coupled CG1v_CG1 discretization.
//!
//! A [`DirichletBc`] prescribes one component of the coupled field on the
//! boundary vertices inside a sub-domain. Applying it to an assembled system
//! turns each constrained row into an identity row (keeping the sparsity
//! pattern, so the assembled structure can be reused across nonlinear
//! iterations and time steps) and sets the right-hand side to the
//! prescribed value.
//!
//! The only entry point takes a [`DofMap`], which knows its mesh.
//! There is no way to apply the condition from a dof map that is not tied
//! to a mesh, since the boundary could not be derived from it.

pub mod workspace;

use crate::{
  mesh::{boundary::BoundaryTrace, SimplicialMesh, VertexIdx},
  space::{DofIdx, DofMap, DofResolver, FieldComponent},
  sparse::{GalMat, GalVec, SparsityError},
};
use workspace::{constrain_rhs, Workspace};

use once_cell::unsync::OnceCell;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

pub type SubDomainId = u32;

/// Marker of the vertices a [`DirichletBc`] acts on.
pub const TARGET_SUB_DOMAIN: SubDomainId = 0;
/// Marker of all other vertices.
pub const OTHER_SUB_DOMAIN: SubDomainId = 1;

#[derive(Debug, thiserror::Error)]
pub enum BcError {
  #[error("field component {component:?} out of range for a space with {ncomponents} components")]
  ComponentOutOfRange {
    component: FieldComponent,
    ncomponents: usize,
  },
  #[error("the dof map lives on a different mesh than the boundary condition")]
  MeshMismatch,
  #[error("{what} has dimension {found}, expected {expected}")]
  DimensionMismatch {
    what: &'static str,
    expected: usize,
    found: usize,
  },
  #[error("row {row} of the assembled matrix has no nonzeros")]
  EmptyRow { row: DofIdx },
  #[error("row {row} of the assembled matrix has no diagonal entry")]
  MissingDiagonal { row: DofIdx },
  #[error(transparent)]
  Sparsity(#[from] SparsityError),
}

/// A region of the domain, given by a pointwise predicate.
pub trait SubDomain {
  fn inside(&self, x: na::DVectorView<f64>) -> bool;

  /// Sets `markers[v] = id` for all vertices `v` inside the sub-domain.
  fn mark(&self, mesh: &SimplicialMesh, markers: &mut [SubDomainId], id: SubDomainId) {
    for (ivertex, marker) in markers.iter_mut().enumerate() {
      if self.inside(mesh.coords().coord(ivertex)) {
        *marker = id;
      }
    }
  }
}
impl<F> SubDomain for F
where
  F: Fn(na::DVectorView<f64>) -> bool,
{
  fn inside(&self, x: na::DVectorView<f64>) -> bool {
    self(x)
  }
}

/// The prescribed value as a function of position.
pub trait BoundaryValue {
  fn eval(&self, x: na::DVectorView<f64>) -> f64;
}
impl<F> BoundaryValue for F
where
  F: Fn(na::DVectorView<f64>) -> f64,
{
  fn eval(&self, x: na::DVectorView<f64>) -> f64 {
    self(x)
  }
}

/// Outcome of one [`DirichletBc::apply`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyReport {
  /// Rows turned into identity rows, counting repeats.
  pub nconstrained: usize,
  /// Boundary vertices in the sub-domain left to their owning rank.
  /// Counts every vertex owned elsewhere, including those no local cell touches.
  pub nskipped_ghosts: usize,
}

/// Dirichlet condition on one component of the CG1v_CG1 field.
///
/// The boundary trace and the scratch workspace are created on the first
/// [`apply`](Self::apply) and reused by all later ones. They are tied to the
/// borrowed mesh and to the sparsity pattern of the first matrix; a matrix
/// with a different pattern is rejected.
///
/// Not meant to be shared between concurrent applies; separate instances on
/// separate matrices are independent.
pub struct DirichletBc<'m, V> {
  mesh: &'m SimplicialMesh,
  markers: Vec<SubDomainId>,
  component: FieldComponent,
  value: V,
  trace: OnceCell<BoundaryTrace>,
  workspace: Option<Workspace>,
  ghosts_registered: bool,
}

impl<'m, V: BoundaryValue> DirichletBc<'m, V> {
  /// Marks every vertex inside `sub_domain` as [`TARGET_SUB_DOMAIN`],
  /// all others as [`OTHER_SUB_DOMAIN`].
  pub fn new(
    mesh: &'m SimplicialMesh,
    sub_domain: &impl SubDomain,
    component: FieldComponent,
    value: V,
  ) -> Self {
    let mut markers = vec![OTHER_SUB_DOMAIN; mesh.nvertices()];
    sub_domain.mark(mesh, &mut markers, TARGET_SUB_DOMAIN);
    Self {
      mesh,
      markers,
      component,
      value,
      trace: OnceCell::new(),
      workspace: None,
      ghosts_registered: false,
    }
  }

  pub fn mesh(&self) -> &'m SimplicialMesh {
    self.mesh
  }
  pub fn component(&self) -> FieldComponent {
    self.component
  }
  pub fn markers(&self) -> &[SubDomainId] {
    &self.markers
  }
  pub fn workspace(&self) -> Option<&Workspace> {
    self.workspace.as_ref()
  }

  pub fn boundary_trace(&self) -> &BoundaryTrace {
    self.trace.get_or_init(|| compute_trace(self.mesh))
  }

  /// Constrains `galmat` and `galvec` in place.
  ///
  /// Writes already queued on `galmat` and `galvec` are flushed first.
  /// Apart from that, an error leaves both of them untouched, including the
  /// ghost registration of `galvec`.
  pub fn apply(
    &mut self,
    galmat: &mut GalMat,
    galvec: &mut GalVec,
    dof_map: &impl DofMap,
  ) -> Result<ApplyReport, BcError> {
    let mesh = self.mesh;
    if !std::ptr::eq(dof_map.mesh(), mesh) {
      return Err(BcError::MeshMismatch);
    }
    let ndofs = dof_map.global_dimension();
    check_dim("matrix rows", ndofs, galmat.nrows())?;
    check_dim("matrix columns", ndofs, galmat.ncols())?;
    check_dim("right-hand side", ndofs, galvec.len())?;
    let resolver = DofResolver::new(dof_map, self.component)?;
    galmat.flush()?;
    galvec.flush();

    let partition = mesh.partition();
    if partition.rank() == 0 {
      info!("applying CG1v_CG1 Dirichlet boundary conditions to linear system");
    }

    let Self {
      markers,
      value,
      trace,
      workspace,
      ghosts_registered,
      ..
    } = self;
    let trace = trace.get_or_init(|| compute_trace(mesh));
    if trace.is_empty() {
      warn!("mesh has no boundary, nothing to constrain");
    }

    let workspace = workspace.get_or_insert_with(|| {
      debug!("allocating workspace for {} rows", galmat.nrows());
      Workspace::new(galmat)
    });
    workspace.copy_in(galmat)?;

    let mut report = ApplyReport::default();
    let mut cell_dofs = vec![0; dof_map.local_dimension()];
    let traversal = trace
      .iter()
      .filter(|entry| markers[entry.vertex] == TARGET_SUB_DOMAIN)
      .try_for_each(|entry| -> Result<(), BcError> {
        if !partition.is_serial() && partition.is_ghost(entry.vertex) {
          report.nskipped_ghosts += 1;
          return Ok(());
        }

        dof_map.tabulate_dofs(entry.cell, &mut cell_dofs);
        let dof = resolver.resolve(&cell_dofs, entry.ilocal);
        let prescribed = value.eval(mesh.coords().coord(entry.vertex));

        workspace.constrain_row(galmat, dof)?;
        constrain_rhs(galvec, dof, prescribed);
        report.nconstrained += 1;
        Ok(())
      })
      .and_then(|()| workspace.copy_out(galmat));

    if let Err(err) = traversal {
      galvec.discard_pending();
      return Err(err);
    }
    galvec.flush();

    if !partition.is_serial() && !*ghosts_registered {
      let ghosts = off_process_rows(dof_map);
      debug!("registering {} off-process rows", ghosts.len());
      galvec.init_ghosted(ghosts);
      *ghosts_registered = true;
    }

    debug!(
      "constrained {} rows, skipped {} ghost vertices",
      report.nconstrained, report.nskipped_ghosts
    );
    Ok(report)
  }

  /// The vertices this rank would constrain: boundary vertices in the
  /// sub-domain that it owns, in application order.
  pub fn constrained_vertices(&self) -> Vec<VertexIdx> {
    let partition = self.mesh.partition();
    self
      .boundary_trace()
      .iter()
      .map(|entry| entry.vertex)
      .filter(|&v| self.markers[v] == TARGET_SUB_DOMAIN)
      .filter(|&v| partition.is_serial() || !partition.is_ghost(v))
      .collect()
  }
}

fn compute_trace(mesh: &SimplicialMesh) -> BoundaryTrace {
  let trace = BoundaryTrace::compute(mesh);
  debug!("boundary trace with {} vertices", trace.len());
  trace
}

fn check_dim(what: &'static str, expected: usize, found: usize) -> Result<(), BcError> {
  if expected == found {
    Ok(())
  } else {
    Err(BcError::DimensionMismatch {
      what,
      expected,
      found,
    })
  }
}

/// The dofs of the cells assembled on this rank that belong to vertices
/// owned by another rank.
pub fn off_process_rows(dof_map: &impl DofMap) -> BTreeSet<DofIdx> {
  let mesh = dof_map.mesh();
  let partition = mesh.partition();
  let nper_field = dof_map.ndofs_per_field_per_cell();
  let mut dofs = vec![0; dof_map.local_dimension()];

  let mut rows = BTreeSet::new();
  for icell in partition.local_cells() {
    dof_map.tabulate_dofs(icell, &mut dofs);
    for (ilocal, &ivertex) in mesh.cell(icell).iter().enumerate() {
      if partition.is_ghost(ivertex) {
        rows.extend(dofs.iter().skip(ilocal).step_by(nper_field).copied());
      }
    }
  }
  rows
}
