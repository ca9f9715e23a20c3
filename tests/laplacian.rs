//! The 5-point Laplacian on small uniform grids, checked against
//! handcomputed matrices and the bilinear harmonic solution.
//!
//! Nodes are ordered lexicographically, x fastest.

extern crate nalgebra as na;

use gridfdm::{
  linalg::{nalgebra::DenseCholesky, LinearSolver},
  util::assert_mat_eq,
  Equations, FdmOperator, Grid, OperatorKind, Params,
};

fn unit_laplacian() -> FdmOperator {
  let params = Params::from_iter([("kx", 1.0), ("ky", 1.0)]);
  FdmOperator::new(OperatorKind::Laplacian, 2, &params).unwrap()
}

/// 2x2 divisions, 3x3 nodes, no prescribed dofs.
#[test]
fn full_matrix() {
  let grid = Grid::new(&[0.0, 0.0], &[2.0, 2.0], &[2, 2]).unwrap();
  let mut eq = Equations::new(grid.nnodes(), &[]).unwrap();
  unit_laplacian().assemble(&grid, &mut eq).unwrap();
  assert_eq!(eq.nknown(), 0);

  #[rustfmt::skip]
  let expected = na::DMatrix::from_row_slice(9, 9, &[
     4.,-2., 0.,-2., 0., 0., 0., 0., 0.,
    -1., 4.,-1., 0.,-2., 0., 0., 0., 0.,
     0.,-2., 4., 0., 0.,-2., 0., 0., 0.,
    -1., 0., 0., 4.,-2., 0.,-1., 0., 0.,
     0.,-1., 0.,-1., 4.,-1., 0.,-1., 0.,
     0., 0.,-1., 0.,-2., 4., 0., 0.,-1.,
     0., 0., 0.,-2., 0., 0., 4.,-2., 0.,
     0., 0., 0., 0.,-2., 0.,-1., 4.,-1.,
     0., 0., 0., 0., 0.,-2., 0.,-2., 4.,
  ]);
  let auu = eq.auu().to_nalgebra_dense();
  assert_mat_eq(&auu, &expected, Some(1e-15));

  assert_eq!(auu.row(4).sum(), 0.0);
  assert!(auu != auu.transpose());
  assert_eq!(auu.diagonal(), na::DVector::from_element(9, 4.0));
}

#[test]
fn interior_rows_sum_to_zero() {
  let grid = Grid::new(&[0.0, 0.0], &[1.0, 2.0], &[5, 4]).unwrap();
  let mut eq = Equations::new(grid.nnodes(), &[]).unwrap();
  unit_laplacian().assemble(&grid, &mut eq).unwrap();
  let a = eq.auu().to_nalgebra_dense();
  for inode in (0..grid.nnodes()).filter(|&i| !grid.is_node_on_boundary(i)) {
    approx::assert_abs_diff_eq!(a.row(inode).sum(), 0.0, epsilon = 1e-10);
  }
}

/// 3x3 divisions, 4x4 nodes, all boundary nodes prescribed.
/// Elimination and solve done by hand on the blocks.
#[test]
fn manual_elimination() {
  let grid = Grid::new(&[0.0, 0.0], &[3.0, 3.0], &[3, 3]).unwrap();
  let mut eq = Equations::new(grid.nnodes(), &grid.boundary_nodes()).unwrap();
  unit_laplacian().assemble(&grid, &mut eq).unwrap();

  assert_eq!(eq.u2f(), &[5, 6, 9, 10]);
  assert_eq!(eq.k2f(), &[0, 1, 2, 3, 4, 7, 8, 11, 12, 13, 14, 15]);

  #[rustfmt::skip]
  let expected = na::DMatrix::from_row_slice(4, 4, &[
     4.,-1.,-1., 0.,
    -1., 4., 0.,-1.,
    -1., 0., 4.,-1.,
     0.,-1.,-1., 4.,
  ]);
  assert_mat_eq(&eq.auu().to_nalgebra_dense(), &expected, Some(1e-15));

  // bottom, right, top, left: later edges overwrite the corners
  let edges = [(20, 1.0), (11, 2.0), (21, 2.0), (10, 1.0)];
  for (tag, value) in edges {
    for &inode in grid.boundary(tag).unwrap() {
      eq.set_known_value(inode, value).unwrap();
    }
  }

  let rhs = eq.eliminated_rhs();
  let xu = DenseCholesky.solve(eq.auu(), &rhs).unwrap();
  eq.set_unknown_values(xu);

  let expected = na::DVector::from_column_slice(&[
    1., 1., 1., 2., 1., 1.25, 1.5, 2., 1., 1.5, 1.75, 2., 1., 2., 2., 2.,
  ]);
  approx::assert_relative_eq!(eq.solution(), expected, epsilon = 1e-14);
}

#[test]
fn join_is_left_inverse_of_split() {
  let grid = Grid::new(&[0.0, 0.0, 0.0], &[1.0, 1.0, 1.0], &[2, 3, 2]).unwrap();
  let eq = Equations::new(grid.nnodes(), grid.boundary(30).unwrap()).unwrap();
  assert_eq!(eq.nunknown() + eq.nknown(), grid.nnodes());

  let full = na::DVector::from_fn(grid.nnodes(), |i, _| i as f64 * 0.5 - 3.0);
  let (xu, xk) = eq.split_vector(&full);
  assert_eq!(eq.join_vector(&xu, &xk), full);
}
