//! Theta functions by direct summation over an ellipsoid.
//!
//! With characteristics `a, b in {0,1}^g` (the first coordinate being the most
//! significant bit),
//! `theta_{a,b}(z, tau) = sum_n exp(pi i (n + a/2)^T tau (n + a/2) + 2 pi i (n + a/2)^T (z + b/2))`.
//! Writing `m = 2n + a`, the terms are `exp(pi i m^T (tau/4) m + pi i m^T z) i^(m^T b)`
//! and the sum runs over the coset `m = a (mod 2)`.

use ball::{Ball, CBall, CBallMat, Mag};
use rayon::prelude::*;
use tracing::{debug, instrument, warn};

use crate::eld::{Coset, EllipsoidTree};
use crate::error::{EnumError, ThetaError};
use crate::form::QuadraticForm;
use crate::params::Parameters;
use crate::radius::{Radius, solve_radius};
use crate::series::Series;
use crate::sum::sum;
use crate::workers::{CharWorker, JetWorker};

/// Precision of the summation: `prec` plus the bits lost when adding
/// `nb_pts` terms, plus the configured guard bits.
pub fn working_prec(prec: u32, nb_pts: u64, params: &Parameters) -> u32 {
    prec + (u64::BITS - nb_pts.leading_zeros()) + params.guard_bits
}

/// Everything shared by the cosets of one evaluation.
struct Setup {
    form: QuadraticForm,
    radius: Radius,
}

impl Setup {
    fn new(z: &[CBall], tau: &CBallMat, ord: usize, prec: u32, params: &Parameters) -> Result<Self, ThetaError> {
        assert!(tau.is_square() && tau.rows() > 0, "tau is {}x{}", tau.rows(), tau.cols());
        // 4^g outputs must be addressable.
        assert!(tau.rows() < 32, "dimension {} is too large", tau.rows());
        assert_eq!(z.len(), tau.rows(), "z has length {} for a {}x{} tau", z.len(), tau.rows(), tau.rows());

        let form: QuadraticForm = QuadraticForm::new(tau, z, params.low_prec)?;
        // The coset m = a (mod 2) is a translate of the lattice 2 Z^g.
        let radius: Radius = solve_radius(&form.cho().mul_2exp(1), ord, prec, params);
        Ok(Setup { form, radius })
    }

    fn dim(&self) -> usize {
        self.form.dim()
    }

    fn tree(&self, a: u64, params: &Parameters) -> Result<EllipsoidTree, ThetaError> {
        EllipsoidTree::build(params, self.form.cho(), &self.radius.r2, self.form.offset(), Coset::Parity(a)).map_err(|err| {
            if let EnumError::TooManyPoints { .. } = err {
                warn!(%err, a, "ellipsoid too large for direct summation");
            }
            ThetaError::from(err)
        })
    }

    /// Tail bound on the absolute value of the terms outside the ellipsoid.
    fn eps(&self) -> Mag {
        self.radius.eps.mul(self.form.growth())
    }

    fn series(z: &[CBall], tau: &CBallMat, prec: u32) -> Series {
        let half_z: Vec<CBall> = z.iter().map(|x| x.mul_2exp(-1)).collect();
        Series::new(&tau.mul_2exp(-2), &half_z, prec)
    }
}

/// Values `theta_{a,b}(z, tau)` for every `b`, indexed by `b`.
#[instrument(skip_all, level = "debug", fields(g = tau.rows(), a = a, prec = prec))]
pub fn theta_naive_fixed_a(a: u64, z: &[CBall], tau: &CBallMat, prec: u32, params: &Parameters) -> Result<Vec<CBall>, ThetaError> {
    let setup: Setup = Setup::new(z, tau, 0, prec, params)?;
    let g: usize = setup.dim();
    assert!(a >> g == 0, "a={a} has more than {g} bits");

    let tree: EllipsoidTree = setup.tree(a, params)?;
    let wp: u32 = working_prec(prec, tree.nb_pts(), params);
    debug!(nb_pts = tree.nb_pts(), wp, "working precision");

    let series: Series = Setup::series(z, tau, wp);
    let mut worker: CharWorker = CharWorker::new(g);
    Ok(sum(&tree, &series, &mut worker, &CBall::one(), &setup.eps(), 0, wp, params))
}

/// Values `theta_{a,b}(z, tau)` for every pair of characteristics, at index
/// `a 2^g + b`.
#[instrument(skip_all, level = "debug", fields(g = tau.rows(), prec = prec))]
pub fn theta_naive_all(z: &[CBall], tau: &CBallMat, prec: u32, params: &Parameters) -> Result<Vec<CBall>, ThetaError> {
    let setup: Setup = Setup::new(z, tau, 0, prec, params)?;
    let g: usize = setup.dim();

    let trees: Vec<EllipsoidTree> = (0..1u64 << g)
        .map(|a| setup.tree(a, params))
        .collect::<Result<Vec<_>, _>>()?;
    let nb_pts: u64 = trees.iter().map(EllipsoidTree::nb_pts).max().unwrap_or(0);
    let wp: u32 = working_prec(prec, nb_pts, params);
    debug!(nb_pts, wp, "working precision");

    let series: Series = Setup::series(z, tau, wp);
    let eps: Mag = setup.eps();
    let mut out: Vec<CBall> = Vec::with_capacity(1 << (2 * g));
    for tree in trees.iter() {
        let mut worker: CharWorker = CharWorker::new(g);
        out.extend(sum(tree, &series, &mut worker, &CBall::one(), &eps, 0, wp, params));
    }
    Ok(out)
}

/// Partial derivatives `d^alpha theta_{a,b}(z, tau)` with respect to `z`, for
/// every `alpha` of [`jet_tuples`](crate::workers::jet_tuples)`(g, ord)`, in that order.
#[allow(clippy::too_many_arguments)]
#[instrument(skip_all, level = "debug", fields(g = tau.rows(), ord = ord, prec = prec))]
pub fn theta_naive_jet(
    a: u64,
    b: u64,
    z: &[CBall],
    tau: &CBallMat,
    ord: usize,
    prec: u32,
    params: &Parameters,
) -> Result<Vec<CBall>, ThetaError> {
    let setup: Setup = Setup::new(z, tau, ord, prec, params)?;
    let g: usize = setup.dim();
    assert!(a >> g == 0, "a={a} has more than {g} bits");

    let tree: EllipsoidTree = setup.tree(a, params)?;
    let wp: u32 = working_prec(prec, tree.nb_pts(), params);
    debug!(nb_pts = tree.nb_pts(), wp, "working precision");

    let series: Series = Setup::series(z, tau, wp);
    let mut worker: JetWorker = JetWorker::new(g, b, ord, setup.form.jet_scale());
    let raw: Vec<CBall> = sum(&tree, &series, &mut worker, &CBall::one(), &setup.eps(), ord, wp, params);

    // d/dz_j brings down pi i m_j.
    let pi_i: CBall = CBall::new(Ball::zero(), Ball::pi(wp));
    let mut powers: Vec<CBall> = vec![CBall::one()];
    (0..ord).for_each(|k| {
        let next: CBall = powers[k].mul(&pi_i, wp);
        powers.push(next);
    });
    Ok(raw
        .iter()
        .zip(worker.tuples().iter())
        .map(|(x, alpha)| x.mul(&powers[alpha.iter().sum::<u32>() as usize], wp))
        .collect())
}

/// [`theta_naive_all`] at several points `z` sharing the same `tau`, evaluated
/// in parallel.
pub fn theta_naive_batch(zs: &[Vec<CBall>], tau: &CBallMat, prec: u32, params: &Parameters) -> Vec<Result<Vec<CBall>, ThetaError>> {
    zs.par_iter().map(|z| theta_naive_all(z, tau, prec, params)).collect()
}
