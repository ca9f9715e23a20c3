use crate::linalg::nalgebra::{CsrMatrix, Matrix, Vector};

/// Append-only sparse matrix in triplet (COO) form.
///
/// Entries sharing the same coordinates are summed whenever the matrix is
/// consolidated or multiplied.
#[derive(Default, Debug, Clone)]
pub struct SparseMatrix {
  nrows: usize,
  ncols: usize,
  triplets: Vec<(usize, usize, f64)>,
}

impl SparseMatrix {
  pub fn zeros(nrows: usize, ncols: usize) -> Self {
    Self::new(nrows, ncols, Vec::new())
  }
  pub fn new(nrows: usize, ncols: usize, triplets: Vec<(usize, usize, f64)>) -> Self {
    assert!(triplets.iter().all(|&(r, c, _)| r < nrows && c < ncols));
    Self {
      nrows,
      ncols,
      triplets,
    }
  }

  pub fn nrows(&self) -> usize {
    self.nrows
  }
  pub fn ncols(&self) -> usize {
    self.ncols
  }
  pub fn is_square(&self) -> bool {
    self.nrows == self.ncols
  }
  pub fn ntriplets(&self) -> usize {
    self.triplets.len()
  }
  pub fn triplets(&self) -> &[(usize, usize, f64)] {
    &self.triplets
  }

  pub fn push(&mut self, r: usize, c: usize, v: f64) {
    assert!(r < self.nrows() && c < self.ncols());
    if v != 0.0 {
      self.triplets.push((r, c, v));
    }
  }

  /// $y += alpha A x$
  ///
  /// Works directly on the triplets, so duplicates accumulate without consolidation.
  pub fn mul_vec_add(&self, y: &mut Vector, alpha: f64, x: &Vector) {
    assert_eq!(y.len(), self.nrows);
    assert_eq!(x.len(), self.ncols);
    for &(r, c, v) in &self.triplets {
      y[r] += alpha * v * x[c];
    }
  }

  pub fn mul_vec(&self, x: &Vector) -> Vector {
    let mut y = Vector::zeros(self.nrows);
    self.mul_vec_add(&mut y, 1.0, x);
    y
  }

  pub fn to_nalgebra_coo(&self) -> nas::CooMatrix<f64> {
    let mut coo = nas::CooMatrix::new(self.nrows, self.ncols);
    for &(r, c, v) in &self.triplets {
      coo.push(r, c, v);
    }
    coo
  }

  pub fn to_nalgebra_csr(&self) -> CsrMatrix {
    (&self.to_nalgebra_coo()).into()
  }

  pub fn to_nalgebra_dense(&self) -> Matrix {
    (&self.to_nalgebra_coo()).into()
  }

  /// Checks symmetry of the consolidated matrix up to a tolerance relative
  /// to the largest entry.
  pub fn is_symmetric(&self, rel_tol: f64) -> bool {
    if !self.is_square() {
      return false;
    }
    let csr = self.to_nalgebra_csr();
    let scale = csr.values().iter().fold(0.0f64, |m, v| m.max(v.abs()));
    let diff = &csr - &csr.transpose();
    diff.values().iter().all(|v| v.abs() <= rel_tol * scale)
  }
}
