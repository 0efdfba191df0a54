//! Dirichlet conditions on assembled CG1v_CG1 systems of unit hyperbox meshes.
//!
//! On the unit square with 2 boxes per dimension the vertices are numbered
//! lexicographically, `v = ix + 3 iy`, and there are 3 components,
//! so component `c` at vertex `v` is dof `9 c + v`.

extern crate nalgebra as na;

use dirichlet_cg1v::{
  assemble::{assemble_galmat, assemble_galvec},
  dirichlet::{BcError, DirichletBc},
  fe,
  mesh::{coordinates::VertexCoords, hyperbox::HyperBoxMeshInfo, SimplicialMesh},
  space::{Cg1vCg1DofMap, DofMap, FieldComponent},
  sparse::{GalMat, GalVec},
};

fn init_logging() {
  let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn constant(value: f64) -> impl Fn(na::DVectorView<f64>) -> f64 {
  move |_: na::DVectorView<f64>| value
}
fn on_left(x: na::DVectorView<f64>) -> bool {
  x[0].abs() < 1e-12
}
fn on_bottom(x: na::DVectorView<f64>) -> bool {
  x[1].abs() < 1e-12
}
fn on_right(x: na::DVectorView<f64>) -> bool {
  (x[0] - 1.0).abs() < 1e-12
}

fn system(mesh: &SimplicialMesh) -> (GalMat, GalVec) {
  let dof_map = Cg1vCg1DofMap::new(mesh);
  let galmat = assemble_galmat(&dof_map, fe::cg1v_cg1_elmat);
  let galvec = assemble_galvec(&dof_map, fe::LoadElvec::new(|_: na::DVectorView<f64>| 1.0));
  (galmat, galvec)
}

/// Asserts that row `dof` is an identity row, with all stored entries kept.
fn assert_identity_row(galmat: &GalMat, dof: usize) {
  let (mut cols, mut values) = (Vec::new(), Vec::new());
  galmat.getrow(dof, &mut cols, &mut values);
  assert!(cols.len() > 1);
  for (&col, &value) in cols.iter().zip(&values) {
    let expected = if col == dof { 1.0 } else { 0.0 };
    assert_eq!(value, expected, "entry ({dof}, {col})");
  }
}

/// Asserts that all rows except `constrained` are bitwise unchanged.
fn assert_rows_untouched(before: &GalMat, after: &GalMat, constrained: &[usize]) {
  let (mut cols0, mut values0) = (Vec::new(), Vec::new());
  let (mut cols1, mut values1) = (Vec::new(), Vec::new());
  for row in (0..before.nrows()).filter(|row| !constrained.contains(row)) {
    before.getrow(row, &mut cols0, &mut values0);
    after.getrow(row, &mut cols1, &mut values1);
    assert_eq!(cols0, cols1);
    let bits0: Vec<_> = values0.iter().map(|v| v.to_bits()).collect();
    let bits1: Vec<_> = values1.iter().map(|v| v.to_bits()).collect();
    assert_eq!(bits0, bits1, "row {row} changed");
  }
}

#[test]
fn left_edge_scalar() {
  init_logging();
  let mesh = HyperBoxMeshInfo::new_unit(2, 2).to_mesh();
  let dof_map = Cg1vCg1DofMap::new(&mesh);
  let (mut galmat, mut galvec) = system(&mesh);
  let (mat_before, vec_before) = (galmat.clone(), galvec.clone());

  let mut bc = DirichletBc::new(&mesh, &on_left, FieldComponent::Scalar, constant(3.0));
  let report = bc.apply(&mut galmat, &mut galvec, &dof_map).unwrap();
  assert_eq!(report.nconstrained, 3);
  assert_eq!(report.nskipped_ghosts, 0);

  let constrained = [0, 3, 6];
  assert_eq!(galmat.csr().pattern(), mat_before.csr().pattern());
  for dof in constrained {
    assert_identity_row(&galmat, dof);
    assert_eq!(galvec.get(dof), 3.0);
  }
  assert_rows_untouched(&mat_before, &galmat, &constrained);
  for dof in (0..galvec.len()).filter(|dof| !constrained.contains(dof)) {
    assert_eq!(galvec.get(dof).to_bits(), vec_before.get(dof).to_bits());
  }
  assert!(!galmat.has_pending());
  assert!(!galvec.has_pending());
}

#[test]
fn constrained_vertices_in_trace_order() {
  let mesh = HyperBoxMeshInfo::new_unit(2, 2).to_mesh();
  let bc = DirichletBc::new(&mesh, &on_left, FieldComponent::Scalar, constant(3.0));
  let mut vertices = bc.constrained_vertices();
  assert_eq!(vertices.len(), 3);
  vertices.sort_unstable();
  assert_eq!(vertices, vec![0, 3, 6]);
}

#[test]
fn second_apply_changes_nothing() {
  let mesh = HyperBoxMeshInfo::new_unit(2, 2).to_mesh();
  let dof_map = Cg1vCg1DofMap::new(&mesh);
  let (mut galmat, mut galvec) = system(&mesh);

  let mut bc = DirichletBc::new(&mesh, &on_bottom, FieldComponent::Vector(0), constant(-2.0));
  bc.apply(&mut galmat, &mut galvec, &dof_map).unwrap();
  let (mat_once, vec_once) = (galmat.clone(), galvec.clone());
  bc.apply(&mut galmat, &mut galvec, &dof_map).unwrap();

  assert_eq!(galmat.csr().values(), mat_once.csr().values());
  assert_eq!(galvec.as_vector(), vec_once.as_vector());
}

#[test]
fn vector_component_offset() {
  let mesh = HyperBoxMeshInfo::new_unit(2, 2).to_mesh();
  let dof_map = Cg1vCg1DofMap::new(&mesh);
  let (mut galmat, mut galvec) = system(&mesh);
  let before = galmat.clone();

  let mut bc = DirichletBc::new(&mesh, &on_bottom, FieldComponent::Vector(1), constant(0.5));
  bc.apply(&mut galmat, &mut galvec, &dof_map).unwrap();

  // bottom vertices 0, 1, 2 in component 2
  let constrained = [18, 19, 20];
  for dof in constrained {
    assert_identity_row(&galmat, dof);
    assert_eq!(galvec.get(dof), 0.5);
  }
  assert_rows_untouched(&before, &galmat, &constrained);
  // the scalar rows of the same vertices are left alone
  assert_ne!(galvec.get(0), 0.5);
}

#[test]
fn value_is_evaluated_at_vertex() {
  let mesh = HyperBoxMeshInfo::new_unit(2, 2).to_mesh();
  let dof_map = Cg1vCg1DofMap::new(&mesh);
  let (mut galmat, mut galvec) = system(&mesh);

  let height = |x: na::DVectorView<f64>| 1.0 + x[1];
  let mut bc = DirichletBc::new(&mesh, &on_left, FieldComponent::Scalar, height);
  bc.apply(&mut galmat, &mut galvec, &dof_map).unwrap();
  assert_eq!(galvec.get(0), 1.0);
  assert_eq!(galvec.get(3), 1.5);
  assert_eq!(galvec.get(6), 2.0);
}

#[test]
fn empty_sub_domain_is_noop() {
  let mesh = HyperBoxMeshInfo::new_unit(2, 2).to_mesh();
  let dof_map = Cg1vCg1DofMap::new(&mesh);
  let (mut galmat, mut galvec) = system(&mesh);
  let (mat_before, vec_before) = (galmat.clone(), galvec.clone());

  let nowhere = |_: na::DVectorView<f64>| false;
  let mut bc = DirichletBc::new(&mesh, &nowhere, FieldComponent::Scalar, constant(3.0));
  let report = bc.apply(&mut galmat, &mut galvec, &dof_map).unwrap();
  assert_eq!(report.nconstrained, 0);
  assert_eq!(galmat.csr().values(), mat_before.csr().values());
  assert_eq!(galvec.as_vector(), vec_before.as_vector());
}

#[test]
fn interior_vertices_are_never_constrained() {
  let mesh = HyperBoxMeshInfo::new_unit(2, 2).to_mesh();
  let dof_map = Cg1vCg1DofMap::new(&mesh);
  let (mut galmat, mut galvec) = system(&mesh);
  let before = galmat.clone();

  // only the center vertex 4 lies inside
  let center = |x: na::DVectorView<f64>| (x[0] - 0.5).abs() < 0.1 && (x[1] - 0.5).abs() < 0.1;
  let mut bc = DirichletBc::new(&mesh, &center, FieldComponent::Scalar, constant(3.0));
  assert_eq!(bc.markers()[4], dirichlet_cg1v::dirichlet::TARGET_SUB_DOMAIN);
  let report = bc.apply(&mut galmat, &mut galvec, &dof_map).unwrap();
  assert_eq!(report.nconstrained, 0);
  assert_eq!(galmat.csr().values(), before.csr().values());
}

#[test]
fn closed_surface_has_nothing_to_constrain() {
  #[rustfmt::skip]
  let coords = na::DMatrix::from_column_slice(3, 4, &[
    0.0, 0.0, 0.0,
    1.0, 0.0, 0.0,
    0.0, 1.0, 0.0,
    0.0, 0.0, 1.0,
  ]);
  let cells = vec![vec![0, 1, 2], vec![0, 1, 3], vec![0, 2, 3], vec![1, 2, 3]];
  let mesh = SimplicialMesh::new(cells, VertexCoords::new(coords)).unwrap();
  let dof_map = Cg1vCg1DofMap::new(&mesh);
  assert_eq!(dof_map.global_dimension(), 16);
  let (mut galmat, mut galvec) = system(&mesh);
  let before = galmat.clone();

  let everywhere = |_: na::DVectorView<f64>| true;
  let mut bc = DirichletBc::new(&mesh, &everywhere, FieldComponent::Scalar, constant(3.0));
  let report = bc.apply(&mut galmat, &mut galvec, &dof_map).unwrap();
  assert_eq!(report.nconstrained, 0);
  assert!(bc.boundary_trace().is_empty());
  assert_eq!(galmat.csr().values(), before.csr().values());
}

#[test]
fn unit_cube_bottom_face() {
  let mesh = HyperBoxMeshInfo::new_unit(3, 2).to_mesh();
  let dof_map = Cg1vCg1DofMap::new(&mesh);
  let (mut galmat, mut galvec) = system(&mesh);
  let before = galmat.clone();

  let on_floor = |x: na::DVectorView<f64>| x[2].abs() < 1e-12;
  let mut bc = DirichletBc::new(&mesh, &on_floor, FieldComponent::Vector(2), constant(1.0));
  let report = bc.apply(&mut galmat, &mut galvec, &dof_map).unwrap();
  assert_eq!(report.nconstrained, 9);

  // 27 vertices, 4 components, floor vertices are 0..9
  let constrained: Vec<_> = (0..9).map(|v| 3 * 27 + v).collect();
  for &dof in &constrained {
    assert_identity_row(&galmat, dof);
    assert_eq!(galvec.get(dof), 1.0);
  }
  assert_rows_untouched(&before, &galmat, &constrained);
}

#[test]
fn failed_apply_leaves_system_untouched() {
  let mesh = HyperBoxMeshInfo::new_unit(2, 2).to_mesh();
  let dof_map = Cg1vCg1DofMap::new(&mesh);
  let ndofs = dof_map.global_dimension();

  // diagonal matrix with an empty row 3
  let triplets: Vec<_> = (0..ndofs).filter(|&i| i != 3).map(|i| (i, i, 2.0)).collect();
  let mut galmat = GalMat::try_from_triplets(ndofs, ndofs, &triplets).unwrap();
  let mut galvec = GalVec::zeros(ndofs);
  let before = galmat.clone();

  let mut bc = DirichletBc::new(&mesh, &on_left, FieldComponent::Scalar, constant(3.0));
  assert!(matches!(
    bc.apply(&mut galmat, &mut galvec, &dof_map),
    Err(BcError::EmptyRow { row: 3 })
  ));
  assert_eq!(galmat.csr().values(), before.csr().values());
  assert!(!galvec.has_pending());
  assert!(galvec.as_vector().iter().all(|&v| v == 0.0));

  // a row without diagonal entry
  let mut triplets = triplets;
  triplets.push((3, 4, 1.0));
  let mut galmat = GalMat::try_from_triplets(ndofs, ndofs, &triplets).unwrap();
  let mut bc = DirichletBc::new(&mesh, &on_left, FieldComponent::Scalar, constant(3.0));
  assert!(matches!(
    bc.apply(&mut galmat, &mut galvec, &dof_map),
    Err(BcError::MissingDiagonal { row: 3 })
  ));
}

#[test]
fn rejects_matrix_with_different_pattern() {
  let mesh = HyperBoxMeshInfo::new_unit(2, 2).to_mesh();
  let dof_map = Cg1vCg1DofMap::new(&mesh);
  let (mut galmat, mut galvec) = system(&mesh);

  let mut bc = DirichletBc::new(&mesh, &on_left, FieldComponent::Scalar, constant(3.0));
  bc.apply(&mut galmat, &mut galvec, &dof_map).unwrap();

  let ndofs = dof_map.global_dimension();
  let triplets: Vec<_> = (0..ndofs).map(|i| (i, i, 1.0)).collect();
  let mut diagonal = GalMat::try_from_triplets(ndofs, ndofs, &triplets).unwrap();
  assert!(matches!(
    bc.apply(&mut diagonal, &mut galvec, &dof_map),
    Err(BcError::Sparsity(_))
  ));
}

#[test]
fn constrained_solve_attains_boundary_values() {
  init_logging();
  let mesh = HyperBoxMeshInfo::new_unit(2, 4).to_mesh();
  let dof_map = Cg1vCg1DofMap::new(&mesh);
  let mut galmat = assemble_galmat(&dof_map, fe::block_diagonal_elmat);
  let mut galvec = assemble_galvec(&dof_map, fe::LoadElvec::new(|_: na::DVectorView<f64>| 1.0));

  let mut scalar_bc = DirichletBc::new(&mesh, &on_left, FieldComponent::Scalar, constant(3.0));
  let mut vector_bc = DirichletBc::new(&mesh, &on_right, FieldComponent::Vector(0), constant(-1.0));
  scalar_bc.apply(&mut galmat, &mut galvec, &dof_map).unwrap();
  vector_bc.apply(&mut galmat, &mut galvec, &dof_map).unwrap();

  let lu = galmat.to_nalgebra_dense().lu();
  let u = lu.solve(&galvec.into_vector()).unwrap();

  let nvertices = mesh.nvertices();
  for ivertex in 0..nvertices {
    let x = mesh.coords().coord(ivertex);
    if on_left(x) {
      assert!((u[dof_map.dof(FieldComponent::Scalar, ivertex)] - 3.0).abs() < 1e-10);
    }
    if on_right(x) {
      assert!((u[dof_map.dof(FieldComponent::Vector(0), ivertex)] + 1.0).abs() < 1e-10);
    }
  }
  // the load is the mass matrix row sum, so the free component is one
  assert!(u
    .rows(2 * nvertices, nvertices)
    .iter()
    .all(|&v| (v - 1.0).abs() < 1e-10));
}
