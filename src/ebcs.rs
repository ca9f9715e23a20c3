//! Essential (Dirichlet) boundary conditions.

use crate::{
  equations::Equations,
  error::{FdmError, Result},
  grid::{Grid, NodeIdx, Tag},
  linalg::nalgebra::Vector,
  util,
};

use itertools::Itertools;
use std::collections::BTreeMap;

/// Prescribed values of one variable on one boundary group.
#[derive(Debug, Clone, PartialEq)]
pub struct EssentialBc {
  pub tag: Tag,
  pub key: String,
  pub value: f64,
  /// Value at every node of the group, ascending in node index.
  pub node_values: Vec<(NodeIdx, f64)>,
}

/// Registry of essential boundary conditions.
///
/// Entries are keyed by `(tag, key)`; setting the same pair again replaces it.
/// When several tags cover the same node (e.g. corners), the entry with the
/// highest tag determines the value, regardless of registration order.
/// A strict registry instead rejects differing values at shared nodes.
#[derive(Debug, Clone, Default)]
pub struct EssentialBcs {
  entries: BTreeMap<(Tag, String), EssentialBc>,
  strict: bool,
}

impl EssentialBcs {
  pub fn new() -> Self {
    Self::default()
  }
  pub fn strict() -> Self {
    Self {
      strict: true,
      ..Self::default()
    }
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }
  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
  /// Entries in ascending tag order.
  pub fn iter(&self) -> impl Iterator<Item = &EssentialBc> {
    self.entries.values()
  }
  pub fn keys(&self) -> Vec<&str> {
    self.iter().map(|bc| bc.key.as_str()).unique().collect()
  }

  /// Prescribes `key` on all nodes of the boundary group `tag`.
  ///
  /// The value is `function(x)` at node position `x` if given, `value` otherwise.
  pub fn set_in_grid(
    &mut self,
    grid: &Grid,
    tag: Tag,
    key: &str,
    value: f64,
    function: Option<&dyn Fn(&Vector) -> f64>,
  ) -> Result<()> {
    let nodes = grid.boundary(tag)?;
    let node_values = nodes
      .iter()
      .map(|&inode| {
        let v = match function {
          Some(f) => f(&grid.node_pos(inode)),
          None => value,
        };
        if v.is_finite() {
          Ok((inode, v))
        } else {
          Err(FdmError::config(format!(
            "non-finite bc value {v} for `{key}` at node {inode}"
          )))
        }
      })
      .collect::<Result<Vec<_>>>()?;

    let bc = EssentialBc {
      tag,
      key: key.to_owned(),
      value,
      node_values,
    };
    if self.entries.insert((tag, key.to_owned()), bc).is_some() {
      tracing::debug!("replaced essential bc for `{key}` on tag {tag}");
    }
    Ok(())
  }

  /// All nodes constrained for `key`, sorted.
  pub fn nodes(&self, key: &str) -> Vec<NodeIdx> {
    self
      .iter()
      .filter(|bc| bc.key == key)
      .flat_map(|bc| bc.node_values.iter().map(|&(inode, _)| inode))
      .sorted_unstable()
      .dedup()
      .collect()
  }

  /// The effective value of `key` at each constrained node, sorted by node.
  pub fn resolve(&self, key: &str, nnodes: usize) -> Result<Vec<(NodeIdx, f64)>> {
    let mut values: Vec<Option<f64>> = vec![None; nnodes];
    for bc in self.iter().filter(|bc| bc.key == key) {
      for &(inode, v) in &bc.node_values {
        let slot = values.get_mut(inode).ok_or(FdmError::Index {
          index: inode,
          len: nnodes,
        })?;
        match *slot {
          Some(prev) if prev != v && self.strict => {
            return Err(FdmError::BoundaryConflict {
              node: inode,
              key: key.to_owned(),
              first: prev,
              second: v,
            });
          }
          Some(prev) if prev != v => {
            tracing::debug!("tag {} overrides `{key}` at node {inode}: {prev} -> {v}", bc.tag);
          }
          _ => {}
        }
        *slot = Some(v);
      }
    }
    Ok(util::dense_to_sparse_data(values))
  }

  /// Writes the prescribed values of `key` into $x_K$.
  pub fn apply(&self, key: &str, equations: &mut Equations) -> Result<()> {
    for (inode, v) in self.resolve(key, equations.ndofs())? {
      equations.set_known_value(inode, v)?;
    }
    Ok(())
  }
}
