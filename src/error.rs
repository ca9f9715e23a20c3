use crate::linalg::LinSolveError;

pub type Result<T, E = FdmError> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FdmError {
  #[error("invalid configuration: {0}")]
  Config(String),
  #[error("dof index {index} out of range for {len} dofs")]
  Index { index: usize, len: usize },
  #[error("invalid state: {0}")]
  State(String),
  #[error("failed to solve {block} ({nrows}x{ncols})")]
  Solve {
    block: &'static str,
    nrows: usize,
    ncols: usize,
    #[source]
    source: LinSolveError,
  },
  #[error("conflicting essential bc for `{key}` at node {node}: {first} vs {second}")]
  BoundaryConflict {
    node: usize,
    key: String,
    first: f64,
    second: f64,
  },
}

impl FdmError {
  pub fn config(msg: impl Into<String>) -> Self {
    Self::Config(msg.into())
  }
  pub fn state(msg: impl Into<String>) -> Self {
    Self::State(msg.into())
  }
}
