use ball::{Ball, BallMat, Mag};
use itertools::izip;
use rug::Float;
use rug::float::Round;
use tracing::{debug, instrument};

use super::{Coset, EllipsoidTree, Node, NodeId};
use crate::error::EnumError;
use crate::params::Parameters;

/// Interval centres and radii must stay below `2^MAX_COORD_BITS` so that
/// coordinates and their squares fit comfortably in machine integers.
pub const MAX_COORD_BITS: i32 = 48;

/// Returns the coset elements `(min, mid, max)` of `residue + step Z` covering
/// `[ctr - rad, ctr + rad]`, `mid` being the element closest to `ctr` clamped
/// to `[min, max]`. `min > max` when no element qualifies.
fn coset_interval(ctr: &Ball, rad: &Float, step: i64, residue: i64, prec: u32) -> Option<(i64, i64, i64)> {
    let limit: Mag = Mag::pow2(MAX_COORD_BITS);
    if !ctr.is_finite() || !rad.is_finite() || ctr.abs_ubound() >= limit || Mag::from_float(rad) >= limit {
        return None;
    }

    // Work in units of the coset: x = residue + step t.
    let t: Ball = ctr.sub(&Ball::from_i64(residue), prec).div(&Ball::from_i64(step), prec);
    let r: Float = Float::with_val_round(prec, rad / step, Round::Up).0;
    let lo: Float = Float::with_val_round(prec, &t.lbound() - &r, Round::Down).0;
    let hi: Float = Float::with_val_round(prec, &t.ubound() + &r, Round::Up).0;

    let t_min: i64 = lo.to_integer_round(Round::Up)?.0.to_i64()?;
    let t_max: i64 = hi.to_integer_round(Round::Down)?.0.to_i64()?;
    let mut t_mid: i64 = t.mid().to_integer_round(Round::Nearest)?.0.to_i64()?;
    if t_min <= t_max {
        t_mid = t_mid.clamp(t_min, t_max);
    } else {
        t_mid = t_min;
    }

    Some((residue + step * t_min, residue + step * t_mid, residue + step * t_max))
}

/// Upper bound on `r2 - (v + gamma c)^2`.
fn next_r2(r2: &Float, gamma: &Ball, v: &Ball, c: i64, prec: u32) -> Float {
    let x: Ball = gamma.mul_si(c, prec).add(v, prec).sqr(prec);
    let lo: Float = x.lbound();
    if lo.is_sign_negative() || lo.is_zero() {
        return r2.clone();
    }
    Float::with_val_round(prec, r2 - &lo, Round::Up).0
}

struct Builder<'a> {
    params: &'a Parameters,
    c: &'a BallMat,
    coset: Coset,
    g: usize,
    nodes: Vec<Node>,
    total_pts: u64,
    nb_empty: u64,
}

impl<'a> Builder<'a> {
    fn too_many(&self) -> EnumError {
        EnumError::TooManyPoints {
            limit: self.params.max_pts,
        }
    }

    fn build(&mut self, d: usize, r2: &Float, v: &[Ball], last_coords: &[i64]) -> Result<NodeId, EnumError> {
        let lp: u32 = self.params.low_prec;
        let g: usize = self.g;
        let cm: &'a BallMat = self.c;
        let gamma: &'a Ball = cm.at(d - 1, d - 1);

        let ctr: Ball = v[d - 1].div(gamma, lp).neg();
        let rad: Float = if r2.is_sign_negative() || r2.is_zero() {
            Float::new(lp)
        } else {
            Ball::from_float(r2.clone()).sqrt(lp).div(gamma, lp).ubound()
        };

        let (step, residue) = self.coset.axis(d - 1, g);
        let (min, mid, max) = coset_interval(&ctr, &rad, step, residue, lp).ok_or(EnumError::Unrepresentable { dim: d })?;
        // A negative bound certifies an empty slice.
        let (min, max) = if r2.is_sign_negative() && !r2.is_zero() { (mid, mid - step) } else { (min, max) };

        let id: NodeId = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            dim: d,
            ambient_dim: g,
            bbox: vec![0; d],
            min,
            mid,
            max,
            step,
            nb_pts: 0,
            nb_border: 0,
            last_coords: last_coords.to_vec(),
            rchildren: Vec::new(),
            lchildren: Vec::new(),
        });

        if min > max {
            // Empty slices add no points but still occupy the arena.
            self.nb_empty += 1;
            if self.nb_empty > (g as u64).saturating_mul(self.params.max_pts) {
                return Err(self.too_many());
            }
            if d == 1 {
                self.nodes[id.index()].nb_border = 2;
            }
            return Ok(id);
        }

        let width: u64 = ((max - min) / step + 1) as u64;
        if width > self.params.max_pts {
            return Err(self.too_many());
        }

        if d == 1 {
            self.total_pts += width;
            if self.total_pts > self.params.max_pts {
                return Err(self.too_many());
            }
            let node: &mut Node = &mut self.nodes[id.index()];
            node.nb_pts = width;
            node.nb_border = 2;
            node.bbox[0] = max.max(-min);
            return Ok(id);
        }

        // The remaining offsets move by step * C[k][d-1] from one slice to the next.
        let v_diff: Vec<Ball> = (0..d - 1).map(|k| cm.at(k, d - 1).mul_si(step, lp)).collect();
        let v_mid: Vec<Ball> = (0..d - 1)
            .map(|k| v[k].add(&cm.at(k, d - 1).mul_si(mid, lp), lp))
            .collect();

        let mut coords: Vec<i64> = Vec::with_capacity(last_coords.len() + 1);
        coords.push(mid);
        coords.extend_from_slice(last_coords);

        let nb_right: usize = ((max - mid) / step + 1) as usize;
        let nb_left: usize = ((mid - min) / step) as usize;

        let mut rchildren: Vec<NodeId> = Vec::with_capacity(nb_right);
        let mut next_v: Vec<Ball> = v_mid.clone();
        for k in 0..nb_right {
            let c: i64 = mid + k as i64 * step;
            if k > 0 {
                izip!(next_v.iter_mut(), v_diff.iter()).for_each(|(x, dx)| *x = x.add(dx, lp));
            }
            coords[0] = c;
            let r2_child: Float = next_r2(r2, gamma, &v[d - 1], c, lp);
            rchildren.push(self.build(d - 1, &r2_child, &next_v, &coords)?);
        }

        let mut lchildren: Vec<NodeId> = Vec::with_capacity(nb_left);
        next_v = v_mid;
        for k in 1..=nb_left {
            let c: i64 = mid - k as i64 * step;
            izip!(next_v.iter_mut(), v_diff.iter()).for_each(|(x, dx)| *x = x.sub(dx, lp));
            coords[0] = c;
            let r2_child: Float = next_r2(r2, gamma, &v[d - 1], c, lp);
            lchildren.push(self.build(d - 1, &r2_child, &next_v, &coords)?);
        }

        let mut nb_pts: u64 = 0;
        let mut nb_border: u64 = 0;
        let mut bbox: Vec<i64> = vec![0; d];
        for child_id in rchildren.iter().chain(lchildren.iter()) {
            let child: &Node = &self.nodes[child_id.index()];
            nb_pts += child.nb_pts;
            nb_border += child.nb_border;
            if child.nb_pts > 0 {
                izip!(bbox.iter_mut(), child.bbox.iter()).for_each(|(b, cb)| *b = (*b).max(*cb));
                bbox[d - 1] = bbox[d - 1].max(child.last_coords[0].abs());
            }
        }

        let node: &mut Node = &mut self.nodes[id.index()];
        node.nb_pts = nb_pts;
        node.nb_border = nb_border;
        node.bbox = bbox;
        node.rchildren = rchildren;
        node.lchildren = lchildren;
        Ok(id)
    }
}

impl EllipsoidTree {
    /// Builds the tree of points `n` in `coset` with `|C n + v|^2 <= r2`, where
    /// `C` is upper triangular with positive diagonal.
    ///
    /// Returns [`EnumError::TooManyPoints`] if the ellipsoid holds more than
    /// `params.max_pts` points, a single slice is that wide, or the tree has
    /// more than `g * params.max_pts` empty slices, and
    /// [`EnumError::Unrepresentable`] if some interval does not fit in
    /// [`MAX_COORD_BITS`] bits. No partial tree is returned.
    #[instrument(skip_all, level = "debug", fields(g = c.rows()))]
    pub fn build(params: &Parameters, c: &BallMat, r2: &Float, v: &[Ball], coset: Coset) -> Result<EllipsoidTree, EnumError> {
        assert!(c.is_square() && c.rows() > 0, "c is {}x{}", c.rows(), c.cols());
        assert_eq!(v.len(), c.rows(), "offset has length {} for a {}x{} form", v.len(), c.rows(), c.rows());
        debug_assert!(c.is_upper_triangular());

        let g: usize = c.rows();
        let mut builder: Builder = Builder {
            params,
            c,
            coset,
            g,
            nodes: Vec::new(),
            total_pts: 0,
            nb_empty: 0,
        };
        builder.build(g, r2, v, &[])?;

        let tree: EllipsoidTree = EllipsoidTree {
            nodes: builder.nodes,
            coset,
        };
        debug!(
            nb_pts = tree.nb_pts(),
            nb_border = tree.nb_border(),
            nb_nodes = tree.nb_nodes(),
            bbox = ?tree.bbox(),
            "ellipsoid"
        );
        Ok(tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_follows_coset() {
        let ctr: Ball = Ball::from_f64(0.3);
        let rad: Float = Float::with_val(32, 2.5);
        assert_eq!(coset_interval(&ctr, &rad, 1, 0, 32), Some((-2, 0, 2)));
        assert_eq!(coset_interval(&ctr, &rad, 2, 1, 32), Some((-1, 1, 1)));
        assert_eq!(coset_interval(&ctr, &rad, 2, 0, 32), Some((-2, 0, 2)));
    }

    #[test]
    fn interval_can_be_empty() {
        let ctr: Ball = Ball::from_f64(0.5);
        let rad: Float = Float::with_val(32, 0.25);
        let (min, _, max) = coset_interval(&ctr, &rad, 1, 0, 32).unwrap();
        assert!(min > max);
    }

    #[test]
    fn huge_interval_is_unrepresentable() {
        let ctr: Ball = Ball::from_f64(0.0);
        let rad: Float = Float::with_val(32, 2f64.powi(60));
        assert_eq!(coset_interval(&ctr, &rad, 1, 0, 32), None);
        assert_eq!(coset_interval(&Ball::indeterminate(), &Float::new(32), 1, 0, 32), None);
    }

    #[test]
    fn shrinking_radius() {
        let r2: Float = Float::with_val(32, 10);
        let gamma: Ball = Ball::from_f64(1.0);
        let v: Ball = Ball::from_f64(0.5);
        let next: Float = next_r2(&r2, &gamma, &v, 2, 32);
        assert!(next >= 3.75 && next < 3.76);
        assert_eq!(next_r2(&r2, &gamma, &Ball::from_f64(0.0), 0, 32), r2);
    }
}
