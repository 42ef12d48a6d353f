use std::cmp::Ordering;

use ball::{BallMat, Mag};
use rug::Float;
use rug::float::{Constant, Round};
use rug::ops::AssignRound;
use tracing::{debug, instrument};

use crate::error::fatal;
use crate::params::Parameters;

/// Number of fixed-point steps used to tighten the squared radius.
const RADIUS_ITERATIONS: usize = 4;

/// Squared truncation radius and the matching tail bound.
#[derive(Clone, Debug)]
pub struct Radius {
    /// Upper bound on the squared radius of the ellipsoid.
    pub r2: Float,
    /// Bound on the tail of the series outside the ellipsoid, `2^-prec`.
    pub eps: Mag,
}

fn up<T>(prec: u32, val: T) -> Float
where
    Float: AssignRound<T, Round = Round, Ordering = Ordering>,
{
    Float::with_val_round(prec, val, Round::Up).0
}

fn down<T>(prec: u32, val: T) -> Float
where
    Float: AssignRound<T, Round = Round, Ordering = Ordering>,
{
    Float::with_val_round(prec, val, Round::Down).0
}

fn check_finite(x: &Float, what: &str) {
    if !x.is_finite() {
        fatal(format_args!("radius solver: {what} is not finite ({x})"));
    }
}

/// Chooses `R^2` such that, for the lattice `{C n + v : n in Z^g}` with `C`
/// upper triangular, the terms `|x|^ord exp(-|x|^2)` over lattice points with
/// `|x|^2 > R^2` sum to at most `eps = 2^-prec`.
///
/// Uses the tail estimate
/// `sum <= 2^(2g+2) prod_j (1 + sqrt(pi)/c_j) R^(g-1+2 ord) exp(-R^2)`,
/// valid for `R^2 >= max(4, 2 ord)`, where `c_j` are the diagonal entries of `C`.
/// Every step rounds so as to enlarge `R^2`.
///
/// Aborts through [`fatal`] if the diagonal of `cho` is not certified positive or
/// an intermediate bound is not finite.
#[instrument(skip_all, level = "debug", fields(g = cho.rows(), ord = ord, prec = prec))]
pub fn solve_radius(cho: &BallMat, ord: usize, prec: u32, params: &Parameters) -> Radius {
    assert!(cho.is_square() && cho.rows() > 0, "solve_radius: cho is {}x{}", cho.rows(), cho.cols());
    let g: usize = cho.rows();
    let lp: u32 = params.low_prec;

    let eps: Mag = Mag::pow2(-(prec as i32));

    // target = (prec + 2g + 2) log(2) + sum_j log(1 + sqrt(pi)/c_j)
    let ln2: Float = up(lp, Constant::Log2);
    let bits: Float = Float::with_val(64, prec as u64 + 2 * g as u64 + 2);
    let mut target: Float = up(lp, &ln2 * &bits);
    let sqrt_pi: Float = up(lp, up(lp, Constant::Pi).sqrt_ref());
    let one: Float = Float::with_val(lp, 1);
    for j in 0..g {
        let c: Float = cho.at(j, j).lbound();
        if c <= 0 {
            fatal(format_args!("radius solver: diagonal entry {j} is not positive ({})", cho.at(j, j)));
        }
        let mut t: Float = up(lp, &sqrt_pi / &c);
        t = up(lp, &t + &one);
        t = up(lp, t.ln_ref());
        target = up(lp, &target + &t);
    }
    check_finite(&target, "target");

    let a: u64 = (g - 1 + 2 * ord) as u64;
    let x: Float = invert_lin_plus_log(a, &target, lp, &ln2);

    // The tail estimate holds only above this floor.
    let floor: Float = Float::with_val(lp, 4.max(2 * ord as u64));
    let r2: Float = if x > floor { x } else { floor };

    debug!(r2 = r2.to_f64(), eps = eps.to_f64(), "radius");
    Radius { r2, eps }
}

/// Upper bound on the smallest `x >= a/2` such that `x - (a/2) log(x) >= target`,
/// or zero if every `x` qualifies.
fn invert_lin_plus_log(a: u64, target: &Float, lp: u32, ln2: &Float) -> Float {
    if a == 0 {
        return if target.is_sign_negative() { Float::new(lp) } else { target.clone() };
    }

    // x - (a/2) log(x) reaches its minimum a/2 - (a/2) log(a/2) at x = a/2.
    let half_a: Float = Float::with_val(64, a) / 2u32;
    let ln_half_a: Float = up(lp, half_a.ln_ref());
    let min: Float = down(lp, &half_a - &up(lp, &half_a * &ln_half_a));
    if *target < min {
        return Float::new(lp);
    }

    // f(x) >= x/2 + min - (a/2) log(2), hence f(x0) >= target for this x0.
    let mut x: Float = up(lp, target - &min);
    x <<= 1;
    x = up(lp, &x + &up(lp, ln2 * &Float::with_val(64, a)));
    if x < a {
        x = Float::with_val(lp, a);
    }
    check_finite(&x, "initial radius");

    // x -> target + (a/2) log(x) decreases towards the largest root and never crosses it.
    for _ in 0..RADIUS_ITERATIONS {
        let l: Float = up(lp, x.ln_ref());
        x = up(lp, target + &up(lp, &half_a * &l));
        check_finite(&x, "iterated radius");
    }
    x
}
