use super::{check_symmetric, check_system, LinSolveError, LinearSolver};
use crate::sparse::SparseMatrix;

pub type Vector<T = f64> = na::DVector<T>;
pub type Matrix<T = f64> = na::DMatrix<T>;
pub type CsrMatrix<T = f64> = nas::CsrMatrix<T>;

/// Dense Cholesky factorization.
///
/// Only sensible for small systems, since the matrix gets densified.
#[derive(Debug, Default, Clone, Copy)]
pub struct DenseCholesky;

impl LinearSolver for DenseCholesky {
  fn name(&self) -> &'static str {
    "nalgebra-dense-cholesky"
  }

  fn solve(&self, a: &SparseMatrix, b: &Vector) -> Result<Vector, LinSolveError> {
    check_system(a, b)?;
    check_symmetric(a)?;
    let chol = na::Cholesky::new(a.to_nalgebra_dense()).ok_or(LinSolveError::NotPositiveDefinite)?;
    Ok(chol.solve(b))
  }
}
