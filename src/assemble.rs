use crate::{
  fe::{ElmatProvider, ElvecProvider},
  space::{DofIdx, DofMap},
  sparse::{GalMat, GalVec},
};

use itertools::Itertools;

/// Assembly algorithm for the Galerkin Matrix.
///
/// Every pair of dofs sharing a cell becomes an entry of the pattern,
/// even if its value vanishes, so that the structure only depends on the
/// dof map.
pub fn assemble_galmat(dof_map: &impl DofMap, elmat: impl ElmatProvider) -> GalMat {
  let mesh = dof_map.mesh();
  let ndofs = dof_map.global_dimension();
  let mut dofs = vec![0; dof_map.local_dimension()];

  let mut triplets: Vec<(DofIdx, DofIdx, f64)> = Vec::new();
  for (icell, cell) in mesh.cells().iter().enumerate() {
    let cell_coords = mesh.coords().simplex_coords(cell);
    let elmat = elmat.eval(&cell_coords);
    assert_eq!(elmat.shape(), (dofs.len(), dofs.len()));

    dof_map.tabulate_dofs(icell, &mut dofs);
    for (ilocal, &iglobal) in dofs.iter().enumerate() {
      for (jlocal, &jglobal) in dofs.iter().enumerate() {
        triplets.push((iglobal, jglobal, elmat[(ilocal, jlocal)]));
      }
    }
  }

  let (rows, cols, values): (Vec<_>, Vec<_>, Vec<_>) = triplets.into_iter().multiunzip();
  let coo = nas::CooMatrix::try_from_triplets(ndofs, ndofs, rows, cols, values)
    .expect("dof map produced dofs out of range");
  GalMat::from_coo(&coo)
}

/// Assembly algorithm for the Galerkin Vector.
pub fn assemble_galvec(dof_map: &impl DofMap, elvec: impl ElvecProvider) -> GalVec {
  let mesh = dof_map.mesh();
  let mut dofs = vec![0; dof_map.local_dimension()];

  let mut galvec = na::DVector::zeros(dof_map.global_dimension());
  for (icell, cell) in mesh.cells().iter().enumerate() {
    let cell_coords = mesh.coords().simplex_coords(cell);
    let elvec = elvec.eval(&cell_coords);

    dof_map.tabulate_dofs(icell, &mut dofs);
    for (ilocal, &iglobal) in dofs.iter().enumerate() {
      galvec[iglobal] += elvec[ilocal];
    }
  }
  GalVec::new(galvec)
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::{fe, mesh::hyperbox::HyperBoxMeshInfo, space::Cg1vCg1DofMap};

  #[test]
  fn pattern_is_full_cell_coupling() {
    let mesh = HyperBoxMeshInfo::new_unit(2, 1).to_mesh();
    let dof_map = Cg1vCg1DofMap::new(&mesh);
    let galmat = assemble_galmat(&dof_map, fe::cg1v_cg1_elmat);

    // 4 vertices, 3 components, vertices 1 and 2 are not connected
    assert_eq!(galmat.nrows(), 12);
    assert_eq!(galmat.row_nnz(0), 12);
    assert_eq!(galmat.row_nnz(1), 9);
    assert_eq!(galmat.get(1, 2), None);
    // vector components do not couple, but the entry is structurally present
    assert_eq!(galmat.get(4, 8), Some(0.0));
  }

  #[test]
  fn load_vector_integrates_constant() {
    let mesh = HyperBoxMeshInfo::new_unit(2, 3).to_mesh();
    let dof_map = Cg1vCg1DofMap::new(&mesh);
    let galvec = assemble_galvec(&dof_map, fe::LoadElvec::new(|_: na::DVectorView<f64>| 2.0));

    let nvertices = mesh.nvertices();
    for component in 0..3 {
      let block = galvec.as_vector().rows(component * nvertices, nvertices);
      assert!((block.sum() - 2.0).abs() < 1e-12);
    }
  }
}
