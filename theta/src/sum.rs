//! Precision-adaptive summation of a series over the points of an
//! [`EllipsoidTree`].
//!
//! The term at `m` is `prod_j exp(pi i tau_jj)^(m_j^2) prod_{j<k} exp(2 pi i tau_jk)^(m_j m_k) prod_j exp(2 pi i z_j)^(m_j)`.
//! The traversal fixes coordinates from the last one down; at each level the
//! contribution of the fixed coordinates is a single cofactor and the cross
//! terms with the free coordinates are folded into per-axis linear factors.
//! Moving from one slice to the next costs one multiplication per factor.
//! Slices far from the centre of their interval, whose terms are tiny, are
//! processed at a reduced precision.

use ball::{CBall, Mag};
use itertools::izip;
use tracing::{debug, instrument};

use crate::eld::{EllipsoidTree, Node, NodeId};
use crate::params::Parameters;
use crate::series::Series;

/// One term of a fiber: the free coordinate, the precision it was computed
/// at, and `lin^coord q^(coord^2)`.
#[derive(Clone, Debug)]
pub struct Term {
    pub coord: i64,
    pub prec: u32,
    pub value: CBall,
}

/// Points of a leaf of the tree, i.e. the lattice points sharing their last
/// `g - 1` coordinates.
pub struct Fiber<'a> {
    /// Coordinates `1..g`, shared by all terms.
    pub coords: &'a [i64],
    /// Contribution of the shared coordinates to every term.
    pub cofactor: &'a CBall,
    pub terms: &'a [Term],
    /// Precision assigned to the fiber.
    pub prec: u32,
    /// Precision of the outputs.
    pub out_prec: u32,
}

/// Consumes fibers and accumulates them into `len()` outputs.
pub trait FiberWorker {
    fn len(&self) -> usize;

    /// Adds the contribution of `fiber` to `out`.
    fn work(&mut self, out: &mut [CBall], fiber: &Fiber<'_>);

    /// Multiplier of the tail bound for output `i`.
    fn tail_scale(&self, _i: usize) -> Mag {
        Mag::one()
    }
}

/// Returns `x^n`, using `x_inv` for negative `n`.
fn signed_pow(x: &CBall, x_inv: &CBall, n: i64, prec: u32) -> CBall {
    if n >= 0 {
        x.pow(n as u64, prec)
    } else {
        x_inv.pow(n.unsigned_abs(), prec)
    }
}

/// `q_j^(k^2)` for `0 <= k <= bbox[j]`, via `q^((k+1)^2) = q^(k^2) q^(2k+1)`.
fn square_powers(series: &Series, bbox: &[i64], prec: u32) -> Vec<Vec<CBall>> {
    bbox.iter()
        .enumerate()
        .map(|(j, &n)| {
            let q: &CBall = series.exp_tau(j, j);
            let q2: CBall = q.sqr(prec);
            let mut odd: CBall = q.clone();
            let mut powers: Vec<CBall> = Vec::with_capacity(n as usize + 1);
            powers.push(CBall::one());
            for k in 0..n as usize {
                let next: CBall = powers[k].mul(&odd, prec);
                powers.push(next);
                odd = odd.mul(&q2, prec);
            }
            powers
        })
        .collect()
}

struct Walk<'a> {
    tree: &'a EllipsoidTree,
    series: &'a Series,
    params: &'a Parameters,
    sqr_pow: Vec<Vec<CBall>>,
    ord: usize,
    out_prec: u32,
    terms: Vec<Term>,
}

impl Walk<'_> {
    #[allow(clippy::too_many_arguments)]
    fn visit<W: FiberWorker>(
        &mut self,
        id: NodeId,
        cofactor: &CBall,
        lin_pow: &[CBall],
        lin_pow_inv: &[CBall],
        prec: u32,
        worker: &mut W,
        out: &mut [CBall],
    ) {
        let tree: &EllipsoidTree = self.tree;
        let series: &Series = self.series;
        let node: &Node = tree.node(id);
        if node.nb_pts() == 0 {
            return;
        }
        let d: usize = node.dim();
        if d == 1 {
            self.fiber(node, cofactor, &lin_pow[0], &lin_pow_inv[0], prec, worker, out);
            return;
        }

        let (mid, step, max_dist) = (node.mid(), node.step(), node.max_dist());
        let s: u64 = step as u64;

        let lin: CBall = series.exp_z(d - 1).mul(&lin_pow[d - 1], prec);
        let lin_inv: CBall = series.exp_z_inv(d - 1).mul(&lin_pow_inv[d - 1], prec);
        let start_cf: CBall = signed_pow(&lin, &lin_inv, mid, prec);
        let diff_cf: CBall = lin.pow(s, prec);
        let diff_cf_inv: CBall = lin_inv.pow(s, prec);

        let start_lin: Vec<CBall> = (0..d - 1)
            .map(|j| {
                let e: CBall = signed_pow(series.exp_tau(j, d - 1), series.exp_tau_inv(j, d - 1), mid, prec);
                lin_pow[j].mul(&e, prec)
            })
            .collect();
        let start_lin_inv: Vec<CBall> = (0..d - 1)
            .map(|j| {
                let e: CBall = signed_pow(series.exp_tau_inv(j, d - 1), series.exp_tau(j, d - 1), mid, prec);
                lin_pow_inv[j].mul(&e, prec)
            })
            .collect();
        let diff_lin: Vec<CBall> = (0..d - 1).map(|j| series.exp_tau(j, d - 1).pow(s, prec)).collect();
        let diff_lin_inv: Vec<CBall> = (0..d - 1).map(|j| series.exp_tau_inv(j, d - 1).pow(s, prec)).collect();

        let mut cf: CBall = start_cf.clone();
        let mut lp: Vec<CBall> = start_lin.clone();
        let mut lp_inv: Vec<CBall> = start_lin_inv.clone();
        for (k, child) in node.rchildren().iter().enumerate() {
            if k > 0 {
                cf = cf.mul(&diff_cf, prec);
                step_all(&mut lp, &diff_lin, prec);
                step_all(&mut lp_inv, &diff_lin_inv, prec);
            }
            let c: i64 = mid + k as i64 * step;
            self.child(*child, c, k as i64, max_dist, cofactor, &cf, &lp, &lp_inv, prec, worker, out);
        }

        cf = start_cf;
        lp = start_lin;
        lp_inv = start_lin_inv;
        for (k, child) in node.lchildren().iter().enumerate() {
            cf = cf.mul(&diff_cf_inv, prec);
            step_all(&mut lp, &diff_lin_inv, prec);
            step_all(&mut lp_inv, &diff_lin, prec);
            let c: i64 = mid - (k as i64 + 1) * step;
            self.child(*child, c, k as i64 + 1, max_dist, cofactor, &cf, &lp, &lp_inv, prec, worker, out);
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn child<W: FiberWorker>(
        &mut self,
        id: NodeId,
        c: i64,
        dist: i64,
        max_dist: i64,
        cofactor: &CBall,
        cur_cf: &CBall,
        lin_pow: &[CBall],
        lin_pow_inv: &[CBall],
        prec: u32,
        worker: &mut W,
        out: &mut [CBall],
    ) {
        let child: &Node = self.tree.node(id);
        if child.nb_pts() == 0 {
            return;
        }
        let d: usize = child.dim() + 1;
        let new_prec: u32 = self.params.newprec(prec, c, dist, max_dist, self.ord);
        let sqr: &CBall = &self.sqr_pow[d - 1][c.unsigned_abs() as usize];
        let cf: CBall = cofactor.mul(cur_cf, new_prec).mul(sqr, new_prec);
        self.visit(id, &cf, lin_pow, lin_pow_inv, new_prec, worker, out);
    }

    #[allow(clippy::too_many_arguments)]
    fn fiber<W: FiberWorker>(
        &mut self,
        node: &Node,
        cofactor: &CBall,
        lin_pow: &CBall,
        lin_pow_inv: &CBall,
        prec: u32,
        worker: &mut W,
        out: &mut [CBall],
    ) {
        let series: &Series = self.series;
        let (mid, step, max_dist) = (node.mid(), node.step(), node.max_dist());
        let s: u64 = step as u64;

        let lin: CBall = series.exp_z(0).mul(lin_pow, prec);
        let lin_inv: CBall = series.exp_z_inv(0).mul(lin_pow_inv, prec);
        let start: CBall = signed_pow(&lin, &lin_inv, mid, prec);
        let diff: CBall = lin.pow(s, prec);
        let diff_inv: CBall = lin_inv.pow(s, prec);

        self.terms.clear();
        let nb_right: i64 = (node.max() - mid) / step + 1;
        let nb_left: i64 = (mid - node.min()) / step;

        let mut cur: CBall = start.clone();
        for k in 0..nb_right {
            if k > 0 {
                cur = cur.mul(&diff, prec);
            }
            let c: i64 = mid + k * step;
            self.push_term(c, k, max_dist, &cur, prec);
        }
        cur = start;
        for k in 1..=nb_left {
            cur = cur.mul(&diff_inv, prec);
            let c: i64 = mid - k * step;
            self.push_term(c, k, max_dist, &cur, prec);
        }

        let fiber: Fiber = Fiber {
            coords: node.last_coords(),
            cofactor,
            terms: &self.terms,
            prec,
            out_prec: self.out_prec,
        };
        worker.work(out, &fiber);
    }

    fn push_term(&mut self, c: i64, dist: i64, max_dist: i64, lin_part: &CBall, prec: u32) {
        let term_prec: u32 = self.params.newprec(prec, c, dist, max_dist, self.ord);
        let value: CBall = lin_part.mul(&self.sqr_pow[0][c.unsigned_abs() as usize], term_prec);
        self.terms.push(Term {
            coord: c,
            prec: term_prec,
            value,
        });
    }
}

fn step_all(xs: &mut [CBall], diffs: &[CBall], prec: u32) {
    izip!(xs.iter_mut(), diffs.iter()).for_each(|(x, dx)| *x = x.mul(dx, prec));
}

/// Sums the series described by `series` over the points of `tree` and hands
/// each fiber to `worker`.
///
/// Returns `out[i] = factor * (raw[i] +/- eps * worker.tail_scale(i))`, where
/// `raw[i]` is what the worker accumulated into output `i` at `prec` bits and
/// `eps` bounds the tail of the series outside the tree. An empty tree yields
/// enclosures of zero.
#[allow(clippy::too_many_arguments)]
#[instrument(skip_all, level = "debug", fields(nb_pts = tree.nb_pts(), prec = prec, ord = ord))]
pub fn sum<W: FiberWorker>(
    tree: &EllipsoidTree,
    series: &Series,
    worker: &mut W,
    factor: &CBall,
    eps: &Mag,
    ord: usize,
    prec: u32,
    params: &Parameters,
) -> Vec<CBall> {
    let g: usize = tree.ambient_dim();
    assert_eq!(series.dim(), g, "series has dimension {} for a tree of dimension {g}", series.dim());

    let mut out: Vec<CBall> = vec![CBall::zero(); worker.len()];
    if tree.nb_pts() > 0 {
        let mut walk: Walk = Walk {
            tree,
            series,
            params,
            sqr_pow: square_powers(series, tree.bbox(), prec),
            ord,
            out_prec: prec,
            terms: Vec::new(),
        };
        let lin_pow: Vec<CBall> = vec![CBall::one(); g];
        walk.visit(tree.root(), &CBall::one(), &lin_pow, &lin_pow, prec, worker, &mut out);
    }

    out.iter_mut().enumerate().for_each(|(i, x)| {
        x.add_error(&eps.mul(&worker.tail_scale(i)));
        *x = x.mul(factor, prec);
    });
    debug!(outputs = out.len(), "summed");
    out
}

#[cfg(test)]
mod tests {
    use ball::{Ball, BallMat, CBallMat};
    use rug::Float;

    use super::*;
    use crate::eld::Coset;

    /// Collects every term with its full exponent recomputed from scratch.
    struct Collect {
        points: Vec<(Vec<i64>, CBall)>,
    }

    impl FiberWorker for Collect {
        fn len(&self) -> usize {
            1
        }

        fn work(&mut self, out: &mut [CBall], fiber: &Fiber<'_>) {
            for term in fiber.terms.iter() {
                let mut point: Vec<i64> = vec![term.coord];
                point.extend_from_slice(fiber.coords);
                let value: CBall = term.value.mul(fiber.cofactor, fiber.out_prec);
                out[0] = out[0].add(&value, fiber.out_prec);
                self.points.push((point, value));
            }
        }
    }

    fn exponent_term(tau: &[[f64; 2]; 2], z: &[f64; 2], m: &[i64]) -> (f64, f64) {
        // pi i (m^T tau m + 2 m^T z) for real tau and z
        let mut s: f64 = 2.0 * (m[0] as f64 * z[0] + m[1] as f64 * z[1]);
        for j in 0..2 {
            for k in 0..2 {
                s += tau[j][k] * (m[j] * m[k]) as f64;
            }
        }
        let t: f64 = std::f64::consts::PI * s;
        (t.cos(), t.sin())
    }

    #[test]
    fn terms_match_direct_evaluation() {
        let tau_re: [[f64; 2]; 2] = [[0.3, 0.1], [0.1, -0.2]];
        let z: [f64; 2] = [0.15, -0.35];
        let tau: CBallMat = CBallMat::from_f64(2, 2, &[0.3, 0.1, 0.1, -0.2], &[1.0, 0.0, 0.0, 1.0]);
        let zb: Vec<CBall> = z.iter().map(|x| CBall::from_f64(*x, 0.0)).collect();
        let series: Series = Series::new(&tau, &zb, 64);

        let c: BallMat = BallMat::from_f64(2, 2, &[1.0, 0.0, 0.0, 1.0]);
        let v: Vec<Ball> = vec![Ball::from_f64(0.0), Ball::from_f64(0.0)];
        let params: Parameters = Parameters::default();
        let tree: EllipsoidTree =
            EllipsoidTree::build(&params, &c, &Float::with_val(32, 9.0), &v, Coset::Full).unwrap();

        let mut worker: Collect = Collect { points: Vec::new() };
        let out: Vec<CBall> = sum(&tree, &series, &mut worker, &CBall::one(), &Mag::zero(), 0, 64, &params);
        assert_eq!(out.len(), 1);
        assert_eq!(worker.points.len() as u64, tree.nb_pts());

        for (m, value) in worker.points.iter() {
            assert!(tree.contains(m));
            let (re, im) = exponent_term(&tau_re, &z, m);
            let scale: f64 = (-std::f64::consts::PI * (m[0] * m[0] + m[1] * m[1]) as f64).exp();
            let got_re: f64 = value.re().mid().to_f64();
            let got_im: f64 = value.im().mid().to_f64();
            assert!((got_re - re * scale).abs() < 1e-12, "{m:?}: {got_re} vs {}", re * scale);
            assert!((got_im - im * scale).abs() < 1e-12, "{m:?}: {got_im} vs {}", im * scale);
        }
    }

    #[test]
    fn empty_tree_gives_tail_only() {
        let tau: CBallMat = CBallMat::from_f64(1, 1, &[0.0], &[1.0]);
        let series: Series = Series::new(&tau, &[CBall::zero()], 64);
        let c: BallMat = BallMat::from_f64(1, 1, &[1.0]);
        let params: Parameters = Parameters::default();
        let tree: EllipsoidTree =
            EllipsoidTree::build(&params, &c, &Float::with_val(32, 0.01), &[Ball::from_f64(0.5)], Coset::Full).unwrap();
        let mut worker: Collect = Collect { points: Vec::new() };
        let eps: Mag = Mag::pow2(-20);
        let out: Vec<CBall> = sum(&tree, &series, &mut worker, &CBall::one(), &eps, 0, 64, &params);
        assert!(worker.points.is_empty());
        assert!(out[0].contains_zero());
        assert!(out[0].re().rad() >= &eps);
    }
}
