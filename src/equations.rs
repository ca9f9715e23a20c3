//! Partitioned linear system of equations.
//!
//! The full dof index space `0..n` is split into the known (prescribed) set $K$
//! and the unknown set $U$. Assembled entries are routed into the four blocks
//!
//! $mat(A_(U U), A_(U K); A_(K U), A_(K K)) vec(x_U, x_K) = vec(b_U, b_K)$
//!
//! using block-local indices, so assembly never needs to know about boundary
//! conditions.

use crate::{
  error::{FdmError, Result},
  linalg::nalgebra::Vector,
  sparse::SparseMatrix,
  util,
};

pub type DofIdx = usize;

/// Position of a full dof inside one of the two partitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Local {
  Unknown(usize),
  Known(usize),
}

#[derive(Debug, Clone)]
pub struct Equations {
  ndofs: usize,
  f2u: Vec<Option<usize>>,
  f2k: Vec<Option<usize>>,
  u2f: Vec<DofIdx>,
  k2f: Vec<DofIdx>,

  auu: SparseMatrix,
  auk: SparseMatrix,
  aku: SparseMatrix,
  akk: SparseMatrix,

  bu: Vector,
  bk: Vector,
  xu: Vector,
  xk: Vector,
}

impl Equations {
  /// Builds the partition from the full indices of the known dofs.
  ///
  /// Duplicates in `known` are allowed. All other dofs are unknown.
  pub fn new(ndofs: usize, known: &[DofIdx]) -> Result<Self> {
    if let Some(&bad) = known.iter().find(|&&i| i >= ndofs) {
      return Err(FdmError::config(format!(
        "known dof {bad} out of range for {ndofs} dofs"
      )));
    }
    let known_flags = util::indicies_to_flags(known, ndofs);

    let mut f2u = vec![None; ndofs];
    let mut f2k = vec![None; ndofs];
    let mut u2f = Vec::new();
    let mut k2f = Vec::new();
    for (idof, &is_known) in known_flags.iter().enumerate() {
      if is_known {
        f2k[idof] = Some(k2f.len());
        k2f.push(idof);
      } else {
        f2u[idof] = Some(u2f.len());
        u2f.push(idof);
      }
    }

    let nu = u2f.len();
    let nk = k2f.len();
    tracing::debug!("partitioned {ndofs} dofs into {nu} unknown and {nk} known");

    Ok(Self {
      ndofs,
      f2u,
      f2k,
      u2f,
      k2f,
      auu: SparseMatrix::zeros(nu, nu),
      auk: SparseMatrix::zeros(nu, nk),
      aku: SparseMatrix::zeros(nk, nu),
      akk: SparseMatrix::zeros(nk, nk),
      bu: Vector::zeros(nu),
      bk: Vector::zeros(nk),
      xu: Vector::zeros(nu),
      xk: Vector::zeros(nk),
    })
  }
}

// index maps
impl Equations {
  pub fn ndofs(&self) -> usize {
    self.ndofs
  }
  pub fn nunknown(&self) -> usize {
    self.u2f.len()
  }
  pub fn nknown(&self) -> usize {
    self.k2f.len()
  }
  /// Full index of each unknown, ascending.
  pub fn u2f(&self) -> &[DofIdx] {
    &self.u2f
  }
  /// Full index of each known, ascending.
  pub fn k2f(&self) -> &[DofIdx] {
    &self.k2f
  }
  pub fn f2u(&self, idof: DofIdx) -> Option<usize> {
    self.f2u.get(idof).copied().flatten()
  }
  pub fn f2k(&self, idof: DofIdx) -> Option<usize> {
    self.f2k.get(idof).copied().flatten()
  }

  pub fn locate(&self, idof: DofIdx) -> Result<Local> {
    if idof >= self.ndofs {
      return Err(FdmError::Index {
        index: idof,
        len: self.ndofs,
      });
    }
    Ok(match (self.f2u[idof], self.f2k[idof]) {
      (Some(iu), _) => Local::Unknown(iu),
      (None, Some(ik)) => Local::Known(ik),
      (None, None) => unreachable!("every dof is either known or unknown"),
    })
  }
}

// blocks
impl Equations {
  pub fn auu(&self) -> &SparseMatrix {
    &self.auu
  }
  pub fn auk(&self) -> &SparseMatrix {
    &self.auk
  }
  pub fn aku(&self) -> &SparseMatrix {
    &self.aku
  }
  pub fn akk(&self) -> &SparseMatrix {
    &self.akk
  }
  pub fn bu(&self) -> &Vector {
    &self.bu
  }
  pub fn bk(&self) -> &Vector {
    &self.bk
  }
  pub fn xu(&self) -> &Vector {
    &self.xu
  }
  pub fn xk(&self) -> &Vector {
    &self.xk
  }

  /// Sets the prescribed value of a known dof, given by its full index.
  pub fn set_known_value(&mut self, idof: DofIdx, value: f64) -> Result<()> {
    match self.locate(idof)? {
      Local::Known(ik) => {
        self.xk[ik] = value;
        Ok(())
      }
      Local::Unknown(_) => Err(FdmError::config(format!(
        "dof {idof} is not part of the known set"
      ))),
    }
  }

  pub fn set_unknown_values(&mut self, xu: Vector) {
    assert_eq!(xu.len(), self.nunknown());
    self.xu = xu;
  }
}

// assembly
impl Equations {
  /// Adds a matrix entry given in full indices to the matching block.
  pub fn push(&mut self, irow: DofIdx, icol: DofIdx, value: f64) -> Result<()> {
    let row = self.locate(irow)?;
    let col = self.locate(icol)?;
    let (block, r, c) = match (row, col) {
      (Local::Unknown(r), Local::Unknown(c)) => (&mut self.auu, r, c),
      (Local::Unknown(r), Local::Known(c)) => (&mut self.auk, r, c),
      (Local::Known(r), Local::Unknown(c)) => (&mut self.aku, r, c),
      (Local::Known(r), Local::Known(c)) => (&mut self.akk, r, c),
    };
    block.push(r, c, value);
    Ok(())
  }

  /// Adds all entries or none of them.
  pub fn push_all(&mut self, triplets: &[(DofIdx, DofIdx, f64)]) -> Result<()> {
    for &(r, c, _) in triplets {
      self.locate(r)?;
      self.locate(c)?;
    }
    for &(r, c, v) in triplets {
      self.push(r, c, v)?;
    }
    Ok(())
  }

  /// Adds a load contribution given in full index to $b_U$ or $b_K$.
  pub fn add_load(&mut self, idof: DofIdx, value: f64) -> Result<()> {
    match self.locate(idof)? {
      Local::Unknown(iu) => self.bu[iu] += value,
      Local::Known(ik) => self.bk[ik] += value,
    }
    Ok(())
  }
}

// elimination and reconstruction
impl Equations {
  /// Moves the known dofs to the right-hand side.
  ///
  /// $b_U - A_(U K) x_K$
  pub fn eliminated_rhs(&self) -> Vector {
    let mut rhs = self.bu.clone();
    self.auk.mul_vec_add(&mut rhs, -1.0, &self.xk);
    rhs
  }

  /// Recovers the known part of the right-hand side.
  ///
  /// $A_(K U) x_U + A_(K K) x_K$
  pub fn known_rhs(&self) -> Vector {
    let mut rhs = Vector::zeros(self.nknown());
    self.aku.mul_vec_add(&mut rhs, 1.0, &self.xu);
    self.akk.mul_vec_add(&mut rhs, 1.0, &self.xk);
    rhs
  }

  /// Scatters the partitioned vectors into a full vector.
  ///
  /// Panics if the lengths don't match the partition.
  pub fn join_vector(&self, xu: &Vector, xk: &Vector) -> Vector {
    assert_eq!(xu.len(), self.nunknown());
    assert_eq!(xk.len(), self.nknown());
    let mut full = Vector::zeros(self.ndofs);
    for (iu, &idof) in self.u2f.iter().enumerate() {
      full[idof] = xu[iu];
    }
    for (ik, &idof) in self.k2f.iter().enumerate() {
      full[idof] = xk[ik];
    }
    full
  }

  /// Gathers a full vector into its unknown and known parts.
  pub fn split_vector(&self, full: &Vector) -> (Vector, Vector) {
    assert_eq!(full.len(), self.ndofs);
    let xu = Vector::from_iterator(self.nunknown(), self.u2f.iter().map(|&i| full[i]));
    let xk = Vector::from_iterator(self.nknown(), self.k2f.iter().map(|&i| full[i]));
    (xu, xk)
  }

  /// Joins the current $x_U$ and $x_K$.
  pub fn solution(&self) -> Vector {
    self.join_vector(&self.xu, &self.xk)
  }
}
