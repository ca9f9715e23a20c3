//! Finite difference operators.
//!
//! An operator turns every grid node into a [`Stencil`], which is then routed
//! into the blocks of an [`Equations`] instance.

use crate::{
  equations::{DofIdx, Equations},
  error::{FdmError, Result},
  grid::{Grid, NodeIdx},
  linalg::nalgebra::Vector,
  Dim,
};

use indexmap::IndexMap;
use rayon::prelude::*;
use std::{fmt, str::FromStr};

/// Names of the diffusion coefficients along each axis.
pub const DIFFUSIVITY_NAMES: [&str; 3] = ["kx", "ky", "kz"];

/// Named scalar parameters of an operator, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
  map: IndexMap<String, f64>,
}

impl Params {
  pub fn new() -> Self {
    Self::default()
  }
  pub fn with(mut self, name: impl Into<String>, value: f64) -> Self {
    self.set(name, value);
    self
  }
  pub fn set(&mut self, name: impl Into<String>, value: f64) {
    self.map.insert(name.into(), value);
  }
  pub fn get(&self, name: &str) -> Option<f64> {
    self.map.get(name).copied()
  }
  pub fn require(&self, name: &str) -> Result<f64> {
    let value = self
      .get(name)
      .ok_or_else(|| FdmError::config(format!("missing parameter `{name}`")))?;
    if !value.is_finite() {
      return Err(FdmError::config(format!(
        "parameter `{name}` must be finite, got {value}"
      )));
    }
    Ok(value)
  }
  pub fn names(&self) -> impl Iterator<Item = &str> {
    self.map.keys().map(String::as_str)
  }
  pub fn len(&self) -> usize {
    self.map.len()
  }
  pub fn is_empty(&self) -> bool {
    self.map.is_empty()
  }
}

impl<'a> FromIterator<(&'a str, f64)> for Params {
  fn from_iter<I: IntoIterator<Item = (&'a str, f64)>>(iter: I) -> Self {
    let map = iter
      .into_iter()
      .map(|(name, value)| (name.to_owned(), value))
      .collect();
    Self { map }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorKind {
  /// $-nabla dot (k nabla u)$ with axis-aligned diffusivity.
  Laplacian,
  /// $-nabla dot (k nabla u) + alpha u$
  Helmholtz,
}

impl OperatorKind {
  pub fn name(self) -> &'static str {
    match self {
      Self::Laplacian => "laplacian",
      Self::Helmholtz => "helmholtz",
    }
  }

  pub fn required_params(self, dim: Dim) -> Vec<&'static str> {
    let mut names = DIFFUSIVITY_NAMES[..dim.min(DIFFUSIVITY_NAMES.len())].to_vec();
    if self == Self::Helmholtz {
      names.push("alpha");
    }
    names
  }
}

impl FromStr for OperatorKind {
  type Err = FdmError;

  fn from_str(s: &str) -> Result<Self> {
    match s {
      "laplacian" => Ok(Self::Laplacian),
      "helmholtz" => Ok(Self::Helmholtz),
      other => Err(FdmError::config(format!("unsupported operator kind `{other}`"))),
    }
  }
}

impl fmt::Display for OperatorKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

/// Coefficients of one row of the discrete operator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stencil {
  pub center: f64,
  pub neighbors: Vec<(NodeIdx, f64)>,
}

impl Stencil {
  pub fn new(center: f64) -> Self {
    Self {
      center,
      neighbors: Vec::new(),
    }
  }

  /// Adds a neighbor weight, merging with an existing entry for the same node.
  pub fn add_neighbor(&mut self, inode: NodeIdx, weight: f64) {
    match self.neighbors.iter_mut().find(|(n, _)| *n == inode) {
      Some((_, w)) => *w += weight,
      None => self.neighbors.push((inode, weight)),
    }
  }

  /// Matrix entries of the row belonging to `inode`.
  pub fn triplets(&self, inode: NodeIdx) -> Vec<(DofIdx, DofIdx, f64)> {
    std::iter::once((inode, inode, self.center))
      .chain(self.neighbors.iter().map(|&(jnode, w)| (inode, jnode, w)))
      .filter(|&(_, _, w)| w != 0.0)
      .collect()
  }
}

pub trait StencilGenerator: Send + Sync {
  fn dim(&self) -> Dim;
  /// Panics if `grid` has a different dimension or `inode` is out of range.
  fn stencil(&self, grid: &Grid, inode: NodeIdx) -> Stencil;

  /// Whether the operator is singular without prescribed dofs.
  fn requires_essential_bcs(&self) -> bool {
    true
  }
}

/// Second order central differences along every axis.
///
/// A neighbor lying outside of the grid is replaced by its mirror image
/// (zero flux ghost node), so the opposite neighbor gets twice the weight.
#[derive(Debug, Clone, PartialEq)]
pub struct Laplacian {
  diffusivity: Vector,
}

impl Laplacian {
  pub fn new(diffusivity: Vector) -> Self {
    Self { diffusivity }
  }

  fn from_params(dim: Dim, params: &Params) -> Result<Self> {
    let diffusivity = DIFFUSIVITY_NAMES[..dim]
      .iter()
      .map(|&name| {
        let k = params.require(name)?;
        if k <= 0.0 {
          return Err(FdmError::config(format!(
            "parameter `{name}` must be positive, got {k}"
          )));
        }
        Ok(k)
      })
      .collect::<Result<Vec<_>>>()?;
    Ok(Self::new(Vector::from_vec(diffusivity)))
  }

  pub fn diffusivity(&self) -> &Vector {
    &self.diffusivity
  }
}

impl StencilGenerator for Laplacian {
  fn dim(&self) -> Dim {
    self.diffusivity.len()
  }

  fn stencil(&self, grid: &Grid, inode: NodeIdx) -> Stencil {
    assert_eq!(grid.dim(), self.dim(), "grid and operator dimension differ");
    let cart_idx = grid.node_cart_idx(inode);
    let mut stencil = Stencil::new(0.0);
    for axis in 0..self.dim() {
      let h = grid.spacing()[axis];
      let weight = self.diffusivity[axis] / (h * h);
      let nnodes = grid.nnodes_axis()[axis];
      let c = cart_idx[axis];

      let lower = if c > 0 { c - 1 } else { c + 1 };
      let upper = if c + 1 < nnodes { c + 1 } else { c - 1 };

      stencil.center += 2.0 * weight;
      for neighbor in [lower, upper] {
        let mut neighbor_idx = cart_idx.clone();
        neighbor_idx[axis] = neighbor;
        stencil.add_neighbor(grid.node_idx(&neighbor_idx), -weight);
      }
    }
    stencil
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Helmholtz {
  laplacian: Laplacian,
  alpha: f64,
}

impl Helmholtz {
  pub fn new(laplacian: Laplacian, alpha: f64) -> Self {
    Self { laplacian, alpha }
  }

  fn from_params(dim: Dim, params: &Params) -> Result<Self> {
    let laplacian = Laplacian::from_params(dim, params)?;
    let alpha = params.require("alpha")?;
    if alpha < 0.0 {
      return Err(FdmError::config(format!(
        "parameter `alpha` must be non-negative, got {alpha}"
      )));
    }
    Ok(Self::new(laplacian, alpha))
  }

  pub fn alpha(&self) -> f64 {
    self.alpha
  }
}

impl StencilGenerator for Helmholtz {
  fn dim(&self) -> Dim {
    self.laplacian.dim()
  }
  fn stencil(&self, grid: &Grid, inode: NodeIdx) -> Stencil {
    let mut stencil = self.laplacian.stencil(grid, inode);
    stencil.center += self.alpha;
    stencil
  }
  fn requires_essential_bcs(&self) -> bool {
    self.alpha == 0.0
  }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Discretization {
  Laplacian(Laplacian),
  Helmholtz(Helmholtz),
}

impl StencilGenerator for Discretization {
  fn dim(&self) -> Dim {
    match self {
      Self::Laplacian(op) => op.dim(),
      Self::Helmholtz(op) => op.dim(),
    }
  }
  fn stencil(&self, grid: &Grid, inode: NodeIdx) -> Stencil {
    match self {
      Self::Laplacian(op) => op.stencil(grid, inode),
      Self::Helmholtz(op) => op.stencil(grid, inode),
    }
  }
  fn requires_essential_bcs(&self) -> bool {
    match self {
      Self::Laplacian(op) => op.requires_essential_bcs(),
      Self::Helmholtz(op) => op.requires_essential_bcs(),
    }
  }
}

/// A differential operator discretized by finite differences.
///
/// Stateless besides its parameters, so it can be assembled into any number
/// of grids and partitions of matching dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct FdmOperator {
  kind: OperatorKind,
  params: Params,
  discretization: Discretization,
}

impl FdmOperator {
  pub fn new(kind: OperatorKind, dim: Dim, params: &Params) -> Result<Self> {
    if dim == 0 || dim > DIFFUSIVITY_NAMES.len() {
      return Err(FdmError::config(format!(
        "{kind} operator not available in {dim} dimensions"
      )));
    }
    let discretization = match kind {
      OperatorKind::Laplacian => Discretization::Laplacian(Laplacian::from_params(dim, params)?),
      OperatorKind::Helmholtz => Discretization::Helmholtz(Helmholtz::from_params(dim, params)?),
    };

    let required = kind.required_params(dim);
    for name in params.names().filter(|name| !required.iter().any(|&r| r == *name)) {
      tracing::warn!("ignoring parameter `{name}` of {kind} operator");
    }

    Ok(Self {
      kind,
      params: params.clone(),
      discretization,
    })
  }

  pub fn from_name(kind: &str, dim: Dim, params: &Params) -> Result<Self> {
    Self::new(kind.parse()?, dim, params)
  }

  pub fn kind(&self) -> OperatorKind {
    self.kind
  }
  pub fn params(&self) -> &Params {
    &self.params
  }
  pub fn dim(&self) -> Dim {
    self.discretization.dim()
  }
  pub fn discretization(&self) -> &Discretization {
    &self.discretization
  }
  pub fn requires_essential_bcs(&self) -> bool {
    self.discretization.requires_essential_bcs()
  }

  /// The stencil of node `inode` of `grid`.
  pub fn stencil(&self, grid: &Grid, inode: NodeIdx) -> Result<Stencil> {
    self.check_grid(grid)?;
    if inode >= grid.nnodes() {
      return Err(FdmError::Index {
        index: inode,
        len: grid.nnodes(),
      });
    }
    Ok(self.discretization.stencil(grid, inode))
  }

  fn check_grid(&self, grid: &Grid) -> Result<()> {
    if grid.dim() != self.dim() {
      return Err(FdmError::config(format!(
        "{}-dimensional {} operator cannot be applied on a {}-dimensional grid",
        self.dim(),
        self.kind,
        grid.dim()
      )));
    }
    Ok(())
  }

  /// Adds the stencil of every grid node to `equations`.
  ///
  /// Either all entries are added or, on error, none.
  pub fn assemble(&self, grid: &Grid, equations: &mut Equations) -> Result<()> {
    self.check_grid(grid)?;
    if equations.ndofs() != grid.nnodes() {
      return Err(FdmError::config(format!(
        "equations have {} dofs but grid has {} nodes",
        equations.ndofs(),
        grid.nnodes()
      )));
    }

    let triplets: Vec<(DofIdx, DofIdx, f64)> = (0..grid.nnodes())
      .into_par_iter()
      .flat_map_iter(|inode| self.discretization.stencil(grid, inode).triplets(inode))
      .collect();
    tracing::debug!(
      "assembled {} triplets of {} operator on {} nodes",
      triplets.len(),
      self.kind,
      grid.nnodes()
    );

    equations.push_all(&triplets)
  }
}
