use ball::{Ball, BallMat, CBall, CBallMat, Mag};
use tracing::debug;

use crate::error::ThetaError;

/// Quadratic form attached to `(z, tau)`.
///
/// `C` is upper triangular with `C^T C = pi Im(tau) / 4` and
/// `v = (pi/2) C^-T Im(z)`, so that for every integer vector `m`
/// `|exp(pi i m^T (tau/4) m + pi i m^T z)| = exp(-|C m + v|^2) exp(|v|^2)`.
#[derive(Clone, Debug)]
pub struct QuadraticForm {
    cho: BallMat,
    offset: Vec<Ball>,
    growth: Mag,
    jet_scale: Mag,
}

impl QuadraticForm {
    pub fn new(tau: &CBallMat, z: &[CBall], prec: u32) -> Result<Self, ThetaError> {
        assert!(tau.is_square() && tau.rows() > 0, "tau is {}x{}", tau.rows(), tau.cols());
        assert_eq!(z.len(), tau.rows(), "z has length {} for a {}x{} tau", z.len(), tau.rows(), tau.rows());
        let g: usize = tau.rows();

        let finite: bool = z.iter().all(CBall::is_finite) && (0..g).all(|i| (0..g).all(|j| tau.at(i, j).is_finite()));
        if !finite {
            return Err(ThetaError::NonFinite);
        }

        let pi: Ball = Ball::pi(prec);
        let gram: BallMat = tau.imag_part().scale(&pi, prec).mul_2exp(-2);
        let cho: BallMat = gram.cholesky_upper(prec).ok_or(ThetaError::NotPositiveDefinite)?;

        let y: Vec<Ball> = z.iter().map(|x| x.im().mul(&pi, prec).mul_2exp(-1)).collect();
        let offset: Vec<Ball> = cho.solve_upper_transpose(&y, prec);
        if !offset.iter().all(Ball::is_finite) {
            return Err(ThetaError::NotPositiveDefinite);
        }

        let norm2: Mag = offset.iter().fold(Mag::zero(), |acc, x| {
            let a: Mag = x.abs_ubound();
            acc.add(&a.mul(&a))
        });
        let growth: Mag = norm2.exp();

        // |m| <= |C^-1| (|C m + v| + |v|) <= |C^-1| (1 + |v|) |C m + v| once |C m + v| >= 1
        let inv: BallMat = cho.upper_inverse(prec).ok_or(ThetaError::NotPositiveDefinite)?;
        let jet_scale: Mag = inv.frobenius_ubound().mul(&Mag::one().add(&norm2.sqrt()));

        debug!(growth = growth.to_f64(), jet_scale = jet_scale.to_f64(), "quadratic form");
        Ok(QuadraticForm {
            cho,
            offset,
            growth,
            jet_scale,
        })
    }

    pub fn dim(&self) -> usize {
        self.cho.rows()
    }

    /// Upper-triangular factor `C`.
    pub fn cho(&self) -> &BallMat {
        &self.cho
    }

    /// Offset `v`.
    pub fn offset(&self) -> &[Ball] {
        &self.offset
    }

    /// Upper bound on `exp(|v|^2)`.
    pub fn growth(&self) -> &Mag {
        &self.growth
    }

    /// Upper bound on `|m| / |C m + v|` when `|C m + v| >= 1`.
    pub fn jet_scale(&self) -> &Mag {
        &self.jet_scale
    }
}
