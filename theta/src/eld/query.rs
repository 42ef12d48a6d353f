use super::{EllipsoidTree, Node, NodeId};

impl EllipsoidTree {
    /// Returns `true` if `point` is one of the enumerated lattice points.
    pub fn contains(&self, point: &[i64]) -> bool {
        if point.len() != self.ambient_dim() {
            return false;
        }
        let mut node: &Node = self.root_node();
        loop {
            let x: i64 = point[node.dim - 1];
            if node.nb_pts == 0 || x < node.min || x > node.max || (x - node.min) % node.step != 0 {
                return false;
            }
            if node.dim == 1 {
                return point[1..] == node.last_coords[..];
            }
            let child: Option<&NodeId> = if x >= node.mid {
                node.rchildren.get(((x - node.mid) / node.step) as usize)
            } else {
                node.lchildren.get(((node.mid - x) / node.step - 1) as usize)
            };
            match child {
                Some(id) => node = self.node(*id),
                None => return false,
            }
        }
    }

    /// All enumerated points, right subtrees before left ones and leaf
    /// coordinates in increasing order.
    pub fn points(&self) -> Vec<Vec<i64>> {
        let mut out: Vec<Vec<i64>> = Vec::with_capacity(self.nb_pts() as usize);
        self.visit_leaves(self.root(), &mut |leaf: &Node| {
            if leaf.nb_pts == 0 {
                return;
            }
            for x in (leaf.min..=leaf.max).step_by(leaf.step as usize) {
                out.push(leaf.point(x));
            }
        });
        out
    }

    /// For every leaf, the two coset points just outside its interval,
    /// `min - step` then `max + step`. These lie outside the ellipsoid.
    pub fn border(&self) -> Vec<Vec<i64>> {
        let mut out: Vec<Vec<i64>> = Vec::with_capacity(self.nb_border() as usize);
        self.visit_leaves(self.root(), &mut |leaf: &Node| {
            out.push(leaf.point(leaf.min - leaf.step));
            out.push(leaf.point(leaf.max + leaf.step));
        });
        out
    }

    fn visit_leaves<F: FnMut(&Node)>(&self, id: NodeId, f: &mut F) {
        let node: &Node = self.node(id);
        if node.dim == 1 {
            f(node);
            return;
        }
        node.rchildren
            .iter()
            .chain(node.lchildren.iter())
            .for_each(|child| self.visit_leaves(*child, f));
    }
}

impl Node {
    fn point(&self, x: i64) -> Vec<i64> {
        let mut p: Vec<i64> = Vec::with_capacity(self.ambient_dim);
        p.push(x);
        p.extend_from_slice(&self.last_coords);
        p
    }
}
