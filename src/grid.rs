//! Structured cartesian grid of nodes on an axis-aligned box.
//!
//! Nodes are numbered lexicographically with the first axis running fastest.

use crate::{
  error::{FdmError, Result},
  linalg::nalgebra::Vector,
  util, Dim,
};

pub type NodeIdx = usize;

/// Identifier of a boundary group: `10 * (axis + 1) + side`,
/// where side `0` is the lower and `1` the upper face along `axis`.
pub type Tag = i32;

pub const MAX_DIM: Dim = 3;

pub fn boundary_tag(axis: Dim, side: usize) -> Tag {
  10 * (axis as Tag + 1) + side as Tag
}

/// converts linear index to cartesian index
///
/// converts linear index in 0..prod(dim_lens) to cartesian index in (0)..(dim_lens)
pub fn linear_index2cartesian_index(mut lin_idx: usize, dim_lens: &[usize]) -> Vec<usize> {
  let mut cart_idx = vec![0; dim_lens.len()];
  for (icomp, &dim_len) in dim_lens.iter().enumerate() {
    cart_idx[icomp] = lin_idx % dim_len;
    lin_idx /= dim_len;
  }
  cart_idx
}

/// converts cartesian index to linear index
///
/// converts cartesian index in (0)..(dim_lens) to linear index in 0..prod(dim_lens)
pub fn cartesian_index2linear_index(cart_idx: &[usize], dim_lens: &[usize]) -> usize {
  assert_eq!(cart_idx.len(), dim_lens.len());
  let mut lin_idx = 0;
  for icomp in (0..cart_idx.len()).rev() {
    lin_idx *= dim_lens[icomp];
    lin_idx += cart_idx[icomp];
  }
  lin_idx
}

#[derive(Debug, Clone)]
pub struct Grid {
  min: Vector,
  max: Vector,
  ndivs: Vec<usize>,
  nnodes_axis: Vec<usize>,
  spacing: Vector,
  /// Boundary groups in tag order, each ascending in node index.
  boundaries: Vec<Vec<NodeIdx>>,
}

impl Grid {
  pub fn new(xmin: &[f64], xmax: &[f64], ndiv: &[usize]) -> Result<Self> {
    let dim = xmin.len();
    if dim == 0 || dim > MAX_DIM {
      return Err(FdmError::config(format!(
        "grid dimension must be in 1..={MAX_DIM}, got {dim}"
      )));
    }
    if xmax.len() != dim || ndiv.len() != dim {
      return Err(FdmError::config(format!(
        "xmin, xmax and ndiv must have equal lengths, got {}, {} and {}",
        dim,
        xmax.len(),
        ndiv.len()
      )));
    }
    for axis in 0..dim {
      let (lo, hi) = (xmin[axis], xmax[axis]);
      if !lo.is_finite() || !hi.is_finite() || hi <= lo {
        return Err(FdmError::config(format!(
          "invalid bounds [{lo}, {hi}] along axis {axis}"
        )));
      }
      if ndiv[axis] == 0 {
        return Err(FdmError::config(format!(
          "number of divisions along axis {axis} must be positive"
        )));
      }
    }

    let min = Vector::from_column_slice(xmin);
    let max = Vector::from_column_slice(xmax);
    let ndivs = ndiv.to_vec();
    let nnodes_axis: Vec<_> = ndivs.iter().map(|n| n + 1).collect();
    let spacing = Vector::from_iterator(
      dim,
      (0..dim).map(|axis| (xmax[axis] - xmin[axis]) / ndivs[axis] as f64),
    );
    let boundaries = compute_boundaries(&nnodes_axis);

    Ok(Self {
      min,
      max,
      ndivs,
      nnodes_axis,
      spacing,
      boundaries,
    })
  }
}

fn compute_boundaries(nnodes_axis: &[usize]) -> Vec<Vec<NodeIdx>> {
  let dim = nnodes_axis.len();
  let strides: Vec<usize> = (0..dim)
    .map(|axis| nnodes_axis[..axis].iter().product())
    .collect();

  let mut boundaries = Vec::with_capacity(2 * dim);
  for axis in 0..dim {
    let nface: usize = (0..dim)
      .filter(|&other| other != axis)
      .map(|other| nnodes_axis[other])
      .product();
    for side in 0..2 {
      let offset = side * (nnodes_axis[axis] - 1) * strides[axis];
      // the remaining axes are walked lexicographically, so the face comes out ascending
      let nodes = (0..nface)
        .map(|mut iface| {
          let mut inode = offset;
          for other in (0..dim).filter(|&other| other != axis) {
            inode += (iface % nnodes_axis[other]) * strides[other];
            iface /= nnodes_axis[other];
          }
          inode
        })
        .collect();
      boundaries.push(nodes);
    }
  }
  boundaries
}

impl Grid {
  pub fn dim(&self) -> Dim {
    self.min.len()
  }
  pub fn min(&self) -> &Vector {
    &self.min
  }
  pub fn max(&self) -> &Vector {
    &self.max
  }
  pub fn ndivs(&self) -> &[usize] {
    &self.ndivs
  }
  pub fn nnodes_axis(&self) -> &[usize] {
    &self.nnodes_axis
  }
  pub fn nnodes(&self) -> usize {
    self.nnodes_axis.iter().product()
  }
  /// Step size along each axis.
  pub fn spacing(&self) -> &Vector {
    &self.spacing
  }

  pub fn node_cart_idx(&self, inode: NodeIdx) -> Vec<usize> {
    linear_index2cartesian_index(inode, &self.nnodes_axis)
  }
  pub fn node_idx(&self, cart_idx: &[usize]) -> NodeIdx {
    cartesian_index2linear_index(cart_idx, &self.nnodes_axis)
  }
  pub fn node_pos(&self, inode: NodeIdx) -> Vector {
    let cart_idx = self.node_cart_idx(inode);
    Vector::from_iterator(
      self.dim(),
      (0..self.dim()).map(|axis| self.min[axis] + cart_idx[axis] as f64 * self.spacing[axis]),
    )
  }
  pub fn is_node_on_boundary(&self, inode: NodeIdx) -> bool {
    self
      .node_cart_idx(inode)
      .iter()
      .zip(&self.nnodes_axis)
      .any(|(&c, &n)| c == 0 || c == n - 1)
  }

  pub fn boundary_tags(&self) -> Vec<Tag> {
    (0..self.dim())
      .flat_map(|axis| [boundary_tag(axis, 0), boundary_tag(axis, 1)])
      .collect()
  }
  /// All `2 * dim` boundary groups, in the order of [`Self::boundary_tags`].
  pub fn boundaries(&self) -> &[Vec<NodeIdx>] {
    &self.boundaries
  }
  pub fn boundary(&self, tag: Tag) -> Result<&[NodeIdx]> {
    let axis = tag / 10 - 1;
    let side = tag % 10;
    if tag < 10 || axis >= self.dim() as Tag || !(0..2).contains(&side) {
      return Err(FdmError::config(format!(
        "unknown boundary tag {tag} for {}-dimensional grid",
        self.dim()
      )));
    }
    Ok(&self.boundaries[2 * axis as usize + side as usize])
  }
  /// All nodes on the boundary, sorted and without duplicates.
  pub fn boundary_nodes(&self) -> Vec<NodeIdx> {
    let nodes: Vec<_> = self.boundaries.iter().flatten().copied().collect();
    util::flags_to_indicies(&util::indicies_to_flags(&nodes, self.nnodes()))
  }
}

#[cfg(test)]
mod test {
  use super::{boundary_tag, Grid};
  use crate::error::FdmError;

  #[test]
  fn unit_square_grid() {
    let grid = Grid::new(&[0.0, 0.0], &[1.0, 1.0], &[2, 2]).unwrap();
    assert_eq!(grid.dim(), 2);
    assert_eq!(grid.nnodes(), 9);
    let positions: Vec<_> = (0..grid.nnodes())
      .map(|inode| {
        let x = grid.node_pos(inode);
        (x[0], x[1])
      })
      .collect();
    assert_eq!(
      positions,
      vec![
        (0.0, 0.0),
        (0.5, 0.0),
        (1.0, 0.0),
        (0.0, 0.5),
        (0.5, 0.5),
        (1.0, 0.5),
        (0.0, 1.0),
        (0.5, 1.0),
        (1.0, 1.0),
      ]
    );
    assert_eq!(grid.spacing().as_slice(), &[0.5, 0.5]);
  }

  #[test]
  fn boundaries_2d() {
    let grid = Grid::new(&[0.0, 0.0], &[3.0, 3.0], &[3, 3]).unwrap();
    assert_eq!(grid.boundary_tags(), vec![10, 11, 20, 21]);
    assert_eq!(grid.boundary(10).unwrap(), &[0, 4, 8, 12]);
    assert_eq!(grid.boundary(11).unwrap(), &[3, 7, 11, 15]);
    assert_eq!(grid.boundary(20).unwrap(), &[0, 1, 2, 3]);
    assert_eq!(grid.boundary(21).unwrap(), &[12, 13, 14, 15]);
    assert_eq!(
      grid.boundary_nodes(),
      vec![0, 1, 2, 3, 4, 7, 8, 11, 12, 13, 14, 15]
    );
    assert!(grid.is_node_on_boundary(4));
    assert!(!grid.is_node_on_boundary(5));
    assert!(matches!(grid.boundary(30), Err(FdmError::Config(_))));
    assert!(matches!(grid.boundary(12), Err(FdmError::Config(_))));
    assert!(matches!(grid.boundary(0), Err(FdmError::Config(_))));
  }

  #[test]
  fn anisotropic_3d() {
    let grid = Grid::new(&[0.0, -1.0, 0.0], &[2.0, 1.0, 3.0], &[2, 1, 3]).unwrap();
    assert_eq!(grid.min().as_slice(), &[0.0, -1.0, 0.0]);
    assert_eq!(grid.max().as_slice(), &[2.0, 1.0, 3.0]);
    assert_eq!(grid.ndivs(), &[2, 1, 3]);
    assert_eq!(grid.nnodes_axis(), &[3, 2, 4]);
    assert_eq!(grid.nnodes(), 24);
    assert_eq!(grid.spacing().as_slice(), &[1.0, 2.0, 1.0]);
    let inode = grid.node_idx(&[1, 1, 2]);
    assert_eq!(inode, 1 + 3 * (1 + 2 * 2));
    assert_eq!(grid.node_cart_idx(inode), vec![1, 1, 2]);
    assert_eq!(grid.node_pos(inode).as_slice(), &[1.0, 1.0, 2.0]);
    assert_eq!(grid.boundaries().len(), 6);
    assert_eq!(grid.boundary(boundary_tag(2, 0)).unwrap().len(), 6);
    // every node is on the boundary with a single division along y
    assert_eq!(grid.boundary_nodes().len(), grid.nnodes());
  }

  #[test]
  fn faces_match_cartesian_filter() {
    let grid = Grid::new(&[0.0; 3], &[1.0; 3], &[3, 1, 2]).unwrap();
    for axis in 0..3 {
      for side in 0..2 {
        let fixed = side * (grid.nnodes_axis()[axis] - 1);
        let expected: Vec<_> = (0..grid.nnodes())
          .filter(|&inode| grid.node_cart_idx(inode)[axis] == fixed)
          .collect();
        assert_eq!(grid.boundary(boundary_tag(axis, side)).unwrap(), expected);
      }
    }
    let grid_1d = Grid::new(&[0.0], &[1.0], &[5]).unwrap();
    assert_eq!(grid_1d.boundaries(), &[vec![0], vec![5]]);
  }

  #[test]
  fn invalid_grids() {
    let err = |r: Result<Grid, FdmError>| matches!(r, Err(FdmError::Config(_)));
    assert!(err(Grid::new(&[], &[], &[])));
    assert!(err(Grid::new(&[0.0; 4], &[1.0; 4], &[1; 4])));
    assert!(err(Grid::new(&[0.0, 0.0], &[1.0], &[1, 1])));
    assert!(err(Grid::new(&[0.0], &[0.0], &[1])));
    assert!(err(Grid::new(&[0.0], &[f64::NAN], &[1])));
    assert!(err(Grid::new(&[0.0], &[1.0], &[0])));
  }
}
