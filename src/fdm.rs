//! Solver pipeline for elliptic problems on structured grids.
//!
//! `Constructed --set_bcs--> BcsSet --solve--> Solved`

use crate::{
  ebcs::EssentialBcs,
  equations::Equations,
  error::{FdmError, Result},
  grid::Grid,
  linalg::{
    self,
    faer::{FaerCholesky, FaerLu},
    nalgebra::Vector,
    LinearSolver,
  },
  operator::{FdmOperator, OperatorKind, Params},
};

use std::fmt;

/// The variable key of the scalar field solved for.
pub const FIELD_KEY: &str = "u";

pub type SourceFn = Box<dyn Fn(&Vector) -> f64>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverState {
  Constructed,
  BcsSet,
  Solved,
}

pub struct FdmSolver {
  grid: Grid,
  operator: FdmOperator,
  linear_solver: Box<dyn LinearSolver>,
  /// Whether `set_bcs` may replace the solver to match the unknown block.
  auto_solver: bool,
  source: Option<SourceFn>,
  ebcs: Option<EssentialBcs>,
  equations: Option<Equations>,
  /// Solution on all nodes.
  u: Option<Vector>,
  /// Full right-hand side $A u$.
  f: Option<Vector>,
}

impl FdmSolver {
  pub fn new(
    kind: OperatorKind,
    params: &Params,
    xmin: &[f64],
    xmax: &[f64],
    ndiv: &[usize],
  ) -> Result<Self> {
    let grid = Grid::new(xmin, xmax, ndiv)?;
    let operator = FdmOperator::new(kind, grid.dim(), params)?;
    Ok(Self {
      grid,
      operator,
      linear_solver: Box::new(FaerCholesky),
      auto_solver: true,
      source: None,
      ebcs: None,
      equations: None,
      u: None,
      f: None,
    })
  }

  /// Fixes the linear solver.
  ///
  /// Without this, sparse Cholesky is used, unless the unknown block turns
  /// out nonsymmetric (mirrored boundary rows left unknown), then sparse LU.
  pub fn with_linear_solver(mut self, solver: impl LinearSolver + 'static) -> Self {
    self.linear_solver = Box::new(solver);
    self.auto_solver = false;
    self
  }
}

impl FdmSolver {
  pub fn grid(&self) -> &Grid {
    &self.grid
  }
  pub fn operator(&self) -> &FdmOperator {
    &self.operator
  }
  pub fn linear_solver(&self) -> &dyn LinearSolver {
    self.linear_solver.as_ref()
  }
  pub fn ebcs(&self) -> Option<&EssentialBcs> {
    self.ebcs.as_ref()
  }
  pub fn equations(&self) -> Option<&Equations> {
    self.equations.as_ref()
  }
  pub fn u(&self) -> Option<&Vector> {
    self.u.as_ref()
  }
  pub fn f(&self) -> Option<&Vector> {
    self.f.as_ref()
  }
  /// The recovered right-hand side on the known dofs, in known-local order.
  pub fn reactions(&self) -> Option<Vector> {
    let f = self.f.as_ref()?;
    let equations = self.equations.as_ref()?;
    Some(equations.split_vector(f).1)
  }

  pub fn state(&self) -> SolverState {
    match (&self.equations, &self.u) {
      (None, _) => SolverState::Constructed,
      (Some(_), None) => SolverState::BcsSet,
      (Some(_), Some(_)) => SolverState::Solved,
    }
  }
}

impl FdmSolver {
  /// Registers a pointwise source term $f(x)$, assembled into the load vector.
  pub fn set_source(&mut self, source: impl Fn(&Vector) -> f64 + 'static) -> Result<()> {
    if self.state() != SolverState::Constructed {
      return Err(FdmError::state("source must be set before the boundary conditions"));
    }
    self.source = Some(Box::new(source));
    Ok(())
  }

  /// Partitions the dofs according to `ebcs`, assembles the operator and
  /// the source, and sets the prescribed values.
  pub fn set_bcs(&mut self, ebcs: EssentialBcs) -> Result<()> {
    if self.equations.is_some() {
      return Err(FdmError::config("boundary conditions have already been set"));
    }
    if let Some(key) = ebcs.keys().into_iter().find(|&key| key != FIELD_KEY) {
      return Err(FdmError::config(format!(
        "unknown variable `{key}`, only `{FIELD_KEY}` is solved for"
      )));
    }

    let nnodes = self.grid.nnodes();
    let known = ebcs.nodes(FIELD_KEY);
    if known.len() == nnodes {
      return Err(FdmError::config("boundary conditions leave no unknown dofs"));
    }
    if known.is_empty() && self.operator.requires_essential_bcs() {
      return Err(FdmError::config(format!(
        "{} operator is singular without essential boundary conditions",
        self.operator.kind()
      )));
    }

    let mut equations = Equations::new(nnodes, &known)?;
    self.operator.assemble(&self.grid, &mut equations)?;
    if let Some(source) = &self.source {
      for inode in 0..nnodes {
        equations.add_load(inode, source(&self.grid.node_pos(inode)))?;
      }
    }
    ebcs.apply(FIELD_KEY, &mut equations)?;

    if self.auto_solver && !equations.auu().is_symmetric(linalg::SYMMETRY_TOL) {
      tracing::info!(
        "unknown block is nonsymmetric, using {} instead of {}",
        FaerLu.name(),
        self.linear_solver.name()
      );
      self.linear_solver = Box::new(FaerLu);
    }

    tracing::info!(
      "set {} essential bcs: {} unknown and {} known dofs",
      ebcs.len(),
      equations.nunknown(),
      equations.nknown()
    );
    self.ebcs = Some(ebcs);
    self.equations = Some(equations);
    Ok(())
  }

  /// Solves for the unknown dofs and reconstructs the full solution.
  ///
  /// With `compute_reactions`, the unpartitioned operator is assembled once
  /// more to compute $F = A U$.
  pub fn solve(&mut self, compute_reactions: bool) -> Result<()> {
    let equations = self
      .equations
      .as_mut()
      .ok_or_else(|| FdmError::state("solve called before boundary conditions were set"))?;

    let rhs = equations.eliminated_rhs();
    let auu = equations.auu();
    let xu = self
      .linear_solver
      .solve(auu, &rhs)
      .map_err(|source| FdmError::Solve {
        block: "Auu",
        nrows: auu.nrows(),
        ncols: auu.ncols(),
        source,
      })?;
    tracing::info!(
      "solved {} unknowns with {}, residual {:.3e}",
      xu.len(),
      self.linear_solver.name(),
      linalg::residual_norm(auu, &xu, &rhs)
    );
    equations.set_unknown_values(xu);
    let u = equations.solution();

    self.f = if compute_reactions {
      let mut full = Equations::new(self.grid.nnodes(), &[])?;
      self.operator.assemble(&self.grid, &mut full)?;
      Some(full.auu().mul_vec(&u))
    } else {
      None
    };
    self.u = Some(u);
    Ok(())
  }
}

impl fmt::Debug for FdmSolver {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("FdmSolver")
      .field("grid", &self.grid)
      .field("operator", &self.operator)
      .field("linear_solver", &self.linear_solver.name())
      .field("has_source", &self.source.is_some())
      .field("state", &self.state())
      .finish()
  }
}

#[cfg(test)]
mod test {
  use super::{FdmSolver, SolverState};
  use crate::{
    ebcs::EssentialBcs,
    error::FdmError,
    linalg::{faer::FaerCholesky, LinSolveError},
    operator::{OperatorKind, Params},
  };

  fn solver() -> FdmSolver {
    let params = Params::from_iter([("kx", 1.0), ("ky", 1.0)]);
    FdmSolver::new(OperatorKind::Laplacian, &params, &[0.0, 0.0], &[3.0, 3.0], &[3, 3]).unwrap()
  }

  fn all_edges(solver: &FdmSolver, value: f64) -> EssentialBcs {
    let mut ebcs = EssentialBcs::new();
    for tag in solver.grid().boundary_tags() {
      ebcs.set_in_grid(solver.grid(), tag, "u", value, None).unwrap();
    }
    ebcs
  }

  #[test]
  fn state_machine() {
    let mut fdm = solver();
    assert_eq!(fdm.state(), SolverState::Constructed);
    assert!(matches!(fdm.solve(false), Err(FdmError::State(_))));

    let ebcs = all_edges(&fdm, 3.0);
    fdm.set_bcs(ebcs.clone()).unwrap();
    assert_eq!(fdm.state(), SolverState::BcsSet);
    assert_eq!(fdm.ebcs().map(|ebcs| ebcs.len()), Some(4));
    assert_eq!(fdm.linear_solver().name(), "faer-sparse-cholesky");
    assert!(matches!(fdm.set_bcs(ebcs), Err(FdmError::Config(_))));
    assert!(matches!(fdm.set_source(|_| 1.0), Err(FdmError::State(_))));

    fdm.solve(false).unwrap();
    assert_eq!(fdm.state(), SolverState::Solved);
    assert!(fdm.f().is_none());
    assert!(fdm.reactions().is_none());
    for &v in fdm.u().unwrap().iter() {
      approx::assert_relative_eq!(v, 3.0, epsilon = 1e-12);
    }

    // solving again starts from the same loads
    fdm.solve(true).unwrap();
    assert!(fdm.f().is_some());
  }

  #[test]
  fn invalid_bcs() {
    let mut fdm = solver();
    assert!(matches!(fdm.set_bcs(EssentialBcs::new()), Err(FdmError::Config(_))));

    let mut other_key = EssentialBcs::new();
    other_key.set_in_grid(fdm.grid(), 10, "T", 1.0, None).unwrap();
    assert!(matches!(fdm.set_bcs(other_key), Err(FdmError::Config(_))));

    // a 1x1 division grid only has boundary nodes
    let params = Params::new().with("kx", 1.0).with("ky", 1.0);
    let mut tiny =
      FdmSolver::new(OperatorKind::Laplacian, &params, &[0.0, 0.0], &[1.0, 1.0], &[1, 1]).unwrap();
    let ebcs = all_edges(&tiny, 0.0);
    assert!(matches!(tiny.set_bcs(ebcs), Err(FdmError::Config(_))));
    assert_eq!(tiny.state(), SolverState::Constructed);
  }

  #[test]
  fn helmholtz_without_bcs() {
    let params = Params::from_iter([("kx", 1.0), ("ky", 1.0), ("alpha", 2.0)]);
    let mut fdm =
      FdmSolver::new(OperatorKind::Helmholtz, &params, &[0.0, 0.0], &[1.0, 1.0], &[4, 4]).unwrap();
    fdm.set_source(|_| 4.0).unwrap();
    fdm.set_bcs(EssentialBcs::new()).unwrap();
    // every node is unknown, including the mirrored boundary rows
    assert_eq!(fdm.linear_solver().name(), "faer-sparse-lu");
    fdm.solve(true).unwrap();
    // zero flux everywhere: u = f / alpha
    for &v in fdm.u().unwrap().iter() {
      approx::assert_relative_eq!(v, 2.0, epsilon = 1e-10);
    }
    assert_eq!(fdm.reactions().unwrap().len(), 0);
  }

  #[test]
  fn nonsymmetric_block_reported() {
    // only the left edge is fixed, so Auu contains mirrored boundary rows
    let mut fdm = solver().with_linear_solver(FaerCholesky);
    let mut ebcs = EssentialBcs::new();
    ebcs.set_in_grid(fdm.grid(), 10, "u", 1.0, None).unwrap();
    fdm.set_bcs(ebcs).unwrap();
    let err = fdm.solve(false).unwrap_err();
    assert_eq!(
      err,
      FdmError::Solve {
        block: "Auu",
        nrows: 12,
        ncols: 12,
        source: LinSolveError::NotSymmetric,
      }
    );
    assert_eq!(fdm.state(), SolverState::BcsSet);
  }
}
