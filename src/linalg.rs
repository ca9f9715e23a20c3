//! Linear solvers for the reduced system $A_(U U) x_U = b_U$.
//!
//! The discretization only talks to the [`LinearSolver`] trait; the actual
//! factorizations are provided by `faer` (sparse) and `nalgebra` (dense).

pub mod faer;
pub mod nalgebra;

use crate::sparse::SparseMatrix;
use self::nalgebra::Vector;

/// Relative tolerance used by the Cholesky solvers for the symmetry check.
pub const SYMMETRY_TOL: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LinSolveError {
  #[error("matrix is not square ({nrows}x{ncols})")]
  NotSquare { nrows: usize, ncols: usize },
  #[error("rhs has length {rhs} but matrix has {nrows} rows")]
  RhsLength { nrows: usize, rhs: usize },
  #[error("matrix is not symmetric")]
  NotSymmetric,
  #[error("matrix is not positive definite")]
  NotPositiveDefinite,
  #[error("matrix is singular")]
  Singular,
  #[error("backend failure: {0}")]
  Backend(String),
}

pub trait LinearSolver {
  fn name(&self) -> &'static str;
  fn solve(&self, a: &SparseMatrix, b: &Vector) -> Result<Vector, LinSolveError>;
}

impl<S: LinearSolver + ?Sized> LinearSolver for Box<S> {
  fn name(&self) -> &'static str {
    (**self).name()
  }
  fn solve(&self, a: &SparseMatrix, b: &Vector) -> Result<Vector, LinSolveError> {
    (**self).solve(a, b)
  }
}

/// Shape checks shared by all solvers.
pub fn check_system(a: &SparseMatrix, b: &Vector) -> Result<(), LinSolveError> {
  if !a.is_square() {
    return Err(LinSolveError::NotSquare {
      nrows: a.nrows(),
      ncols: a.ncols(),
    });
  }
  if a.nrows() != b.len() {
    return Err(LinSolveError::RhsLength {
      nrows: a.nrows(),
      rhs: b.len(),
    });
  }
  Ok(())
}

/// Additional precondition of the Cholesky solvers, which only read one triangle.
pub fn check_symmetric(a: &SparseMatrix) -> Result<(), LinSolveError> {
  if a.is_symmetric(SYMMETRY_TOL) {
    Ok(())
  } else {
    Err(LinSolveError::NotSymmetric)
  }
}

/// Euclidean norm of $b - A x$.
pub fn residual_norm(a: &SparseMatrix, x: &Vector, b: &Vector) -> f64 {
  let mut r = b.clone();
  a.mul_vec_add(&mut r, -1.0, x);
  r.norm()
}
