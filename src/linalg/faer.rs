use super::{check_symmetric, check_system, nalgebra::Vector, LinSolveError, LinearSolver};
use crate::sparse::SparseMatrix;

use faer::solvers::SpSolver;

type SparseMatrixFaer = faer::sparse::SparseColMat<usize, f64>;

pub fn sparse2faer(a: &SparseMatrix) -> Result<SparseMatrixFaer, LinSolveError> {
  SparseMatrixFaer::try_new_from_triplets(a.nrows(), a.ncols(), a.triplets())
    .map_err(|err| LinSolveError::Backend(format!("{err:?}")))
}

pub fn navec2faer(b: &Vector) -> faer::col::ColRef<'_, f64> {
  faer::col::from_slice(b.as_slice())
}

pub fn faer2navec(x: &faer::Col<f64>) -> Vector {
  Vector::from_column_slice(x.as_slice())
}

/// Sparse Cholesky ($L L^T$) factorization for symmetric positive-definite systems.
#[derive(Debug, Default, Clone, Copy)]
pub struct FaerCholesky;

impl LinearSolver for FaerCholesky {
  fn name(&self) -> &'static str {
    "faer-sparse-cholesky"
  }

  fn solve(&self, a: &SparseMatrix, b: &Vector) -> Result<Vector, LinSolveError> {
    check_system(a, b)?;
    check_symmetric(a)?;
    let raw = sparse2faer(a)?
      .sp_cholesky(faer::Side::Upper)
      .map_err(|_| LinSolveError::NotPositiveDefinite)?;
    Ok(faer2navec(&raw.solve(navec2faer(b))))
  }
}

/// Sparse LU factorization for general (nonsymmetric) systems.
#[derive(Debug, Default, Clone, Copy)]
pub struct FaerLu;

impl LinearSolver for FaerLu {
  fn name(&self) -> &'static str {
    "faer-sparse-lu"
  }

  fn solve(&self, a: &SparseMatrix, b: &Vector) -> Result<Vector, LinSolveError> {
    check_system(a, b)?;
    let raw = sparse2faer(a)?.sp_lu().map_err(|_| LinSolveError::Singular)?;
    let x = faer2navec(&raw.solve(navec2faer(b)));
    // sparse LU does not always detect exact singularity
    if x.iter().all(|v| v.is_finite()) {
      Ok(x)
    } else {
      Err(LinSolveError::Singular)
    }
  }
}
