//! Finite difference discretization of elliptic operators on structured grids,
//! with elimination of essential boundary conditions.

extern crate nalgebra as na;
extern crate nalgebra_sparse as nas;

pub mod ebcs;
pub mod equations;
pub mod error;
pub mod fdm;
pub mod grid;
pub mod linalg;
pub mod operator;
pub mod sparse;
pub mod util;

pub type Dim = usize;

pub use ebcs::EssentialBcs;
pub use equations::Equations;
pub use error::{FdmError, Result};
pub use fdm::FdmSolver;
pub use grid::Grid;
pub use operator::{FdmOperator, OperatorKind, Params};
