//! Lattice points in an ellipsoid, organised as a tree of nested slices.
//!
//! A node of dimension `d` covers the points of the ellipsoid whose last
//! `g - d` coordinates are fixed (`last_coords`); it stores the admissible
//! range `[min, max]` of coordinate `d - 1` and owns one child of dimension
//! `d - 1` per admissible value. Leaves (`d = 1`) are arithmetic
//! progressions. Nodes live in an arena owned by [`EllipsoidTree`] and refer
//! to their children by [`NodeId`].

mod build;
mod query;

pub use build::MAX_COORD_BITS;

/// Index of a node in its tree's arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    #[inline(always)]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Residue classes of `Z^g` enumerated by a tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Coset {
    /// All of `Z^g`, step 1 on every axis.
    Full,
    /// Points `m` with `m_j = a_j (mod 2)`, step 2 on every axis. Bit `g - 1 - j`
    /// of the selector is `a_j`, i.e. the first coordinate is the most
    /// significant bit.
    Parity(u64),
}

impl Coset {
    /// Step and residue of axis `j` in ambient dimension `g`.
    pub fn axis(&self, j: usize, g: usize) -> (i64, i64) {
        match self {
            Coset::Full => (1, 0),
            Coset::Parity(a) => (2, ((a >> (g - 1 - j)) & 1) as i64),
        }
    }

    pub fn contains(&self, point: &[i64]) -> bool {
        let g: usize = point.len();
        point.iter().enumerate().all(|(j, x)| {
            let (step, residue) = self.axis(j, g);
            (x - residue).rem_euclid(step) == 0
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Node {
    pub(crate) dim: usize,
    pub(crate) ambient_dim: usize,
    pub(crate) bbox: Vec<i64>,
    pub(crate) min: i64,
    pub(crate) mid: i64,
    pub(crate) max: i64,
    pub(crate) step: i64,
    pub(crate) nb_pts: u64,
    pub(crate) nb_border: u64,
    pub(crate) last_coords: Vec<i64>,
    pub(crate) rchildren: Vec<NodeId>,
    pub(crate) lchildren: Vec<NodeId>,
}

impl Node {
    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn ambient_dim(&self) -> usize {
        self.ambient_dim
    }

    /// Largest `|x_k|` over the points below this node, for `k < dim`.
    pub fn bbox(&self) -> &[i64] {
        &self.bbox
    }

    pub fn min(&self) -> i64 {
        self.min
    }

    pub fn mid(&self) -> i64 {
        self.mid
    }

    pub fn max(&self) -> i64 {
        self.max
    }

    pub fn step(&self) -> i64 {
        self.step
    }

    pub fn nb_pts(&self) -> u64 {
        self.nb_pts
    }

    pub fn nb_border(&self) -> u64 {
        self.nb_border
    }

    /// Coordinates `dim..ambient_dim` shared by every point below this node.
    pub fn last_coords(&self) -> &[i64] {
        &self.last_coords
    }

    /// Children for `mid, mid + step, ..., max`.
    pub fn rchildren(&self) -> &[NodeId] {
        &self.rchildren
    }

    /// Children for `mid - step, mid - 2 step, ..., min`.
    pub fn lchildren(&self) -> &[NodeId] {
        &self.lchildren
    }

    /// Largest number of steps between `mid` and an end of the interval.
    pub fn max_dist(&self) -> i64 {
        if self.min > self.max {
            return 0;
        }
        (self.max - self.mid).max(self.mid - self.min) / self.step
    }
}

/// Arena holding every node of an ellipsoid; the root has id `0`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EllipsoidTree {
    nodes: Vec<Node>,
    coset: Coset,
}

impl EllipsoidTree {
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn root_node(&self) -> &Node {
        self.node(self.root())
    }

    pub fn ambient_dim(&self) -> usize {
        self.root_node().ambient_dim
    }

    pub fn coset(&self) -> Coset {
        self.coset
    }

    pub fn nb_pts(&self) -> u64 {
        self.root_node().nb_pts
    }

    pub fn nb_border(&self) -> u64 {
        self.root_node().nb_border
    }

    pub fn bbox(&self) -> &[i64] {
        &self.root_node().bbox
    }

    pub fn nb_nodes(&self) -> usize {
        self.nodes.len()
    }
}
