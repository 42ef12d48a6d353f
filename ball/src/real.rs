use std::cmp::Ordering;
use std::fmt;

use rug::Float;
use rug::float::{Constant, Round, exp_min};
use rug::ops::AssignRound;

use crate::mag::{MAG_PREC, Mag, abs_lower, float_down, float_up};

/// Rounds `val` to `prec` bits to nearest and returns the result together
/// with a bound on the rounding error.
pub(crate) fn round_nearest<T>(prec: u32, val: T) -> (Float, Mag)
where
    Float: AssignRound<T, Round = Round, Ordering = Ordering>,
{
    let (x, dir) = Float::with_val_round(prec, val, Round::Nearest);
    let err: Mag = if dir == Ordering::Equal {
        Mag::zero()
    } else if x.is_zero() {
        Mag::pow2(exp_min())
    } else {
        Mag::ulp(&x)
    };
    (x, err)
}

/// Exact product of two floats.
pub(crate) fn exact_mul(a: &Float, b: &Float) -> Float {
    Float::with_val(a.prec() + b.prec(), a * b)
}

/// Radius of the product of two balls, excluding rounding.
pub(crate) fn prod_rad(a: &Ball, b: &Ball) -> Mag {
    Mag::from_float(&a.mid)
        .mul(&b.rad)
        .add(&Mag::from_float(&b.mid).mul(&a.rad))
        .add(&a.rad.mul(&b.rad))
}

/// A real ball `[mid - rad, mid + rad]`.
///
/// The midpoint is an arbitrary-precision float; arithmetic methods take the
/// target precision of the result midpoint and fold every rounding error into
/// the radius, so the result always encloses the exact result on all inputs
/// from the operand balls.
#[derive(Clone, Debug)]
pub struct Ball {
    mid: Float,
    rad: Mag,
}

impl Ball {
    pub fn new(mid: Float, rad: Mag) -> Self {
        Ball { mid, rad }
    }

    pub fn zero() -> Self {
        Ball::new(Float::new(MAG_PREC), Mag::zero())
    }

    pub fn one() -> Self {
        Ball::new(Float::with_val(MAG_PREC, 1), Mag::zero())
    }

    /// Ball with infinite radius.
    pub fn indeterminate() -> Self {
        Ball::new(Float::new(MAG_PREC), Mag::inf())
    }

    /// Exact ball around `x`.
    pub fn from_f64(x: f64) -> Self {
        Ball::new(Float::with_val(53, x), Mag::zero())
    }

    /// Exact ball around `x`.
    pub fn from_i64(x: i64) -> Self {
        Ball::new(Float::with_val(64, x), Mag::zero())
    }

    /// Exact ball around `x`.
    pub fn from_float(x: Float) -> Self {
        Ball::new(x, Mag::zero())
    }

    pub fn pi(prec: u32) -> Self {
        let (mid, err) = round_nearest(prec, Constant::Pi);
        Ball::new(mid, err)
    }

    pub fn mid(&self) -> &Float {
        &self.mid
    }

    pub fn rad(&self) -> &Mag {
        &self.rad
    }

    pub fn is_finite(&self) -> bool {
        self.mid.is_finite() && self.rad.is_finite()
    }

    pub fn is_exact(&self) -> bool {
        self.rad.is_zero()
    }

    pub fn add_error(&mut self, err: &Mag) {
        self.rad = self.rad.add(err);
    }

    /// Lower bound of the ball.
    pub fn lbound(&self) -> Float {
        let prec: u32 = self.mid.prec().max(MAG_PREC);
        Float::with_val_round(prec, &self.mid - self.rad.as_float(), Round::Down).0
    }

    /// Upper bound of the ball.
    pub fn ubound(&self) -> Float {
        let prec: u32 = self.mid.prec().max(MAG_PREC);
        Float::with_val_round(prec, &self.mid + self.rad.as_float(), Round::Up).0
    }

    /// Upper bound of `|x|` over the ball.
    pub fn abs_ubound(&self) -> Mag {
        Mag::from_float(&self.mid).add(&self.rad)
    }

    /// Lower bound of `|x|` over the ball, clamped at zero.
    pub fn abs_lbound(&self) -> Float {
        let lo: Float = float_down(&abs_lower(&self.mid) - self.rad.as_float());
        if lo.is_sign_negative() { Float::new(MAG_PREC) } else { lo }
    }

    pub fn contains_zero(&self) -> bool {
        self.lbound() <= 0 && self.ubound() >= 0
    }

    pub fn is_positive(&self) -> bool {
        self.lbound() > 0
    }

    /// Bounds on `|self.mid - other.mid|` as `(lower, upper)`.
    fn mid_distance(&self, other: &Ball) -> (Float, Mag) {
        let hi: Float = float_up(&self.mid - &other.mid);
        let lo: Float = float_down(&self.mid - &other.mid);
        let lower: Float = if lo > 0 {
            lo.clone()
        } else if hi < 0 {
            -hi.clone()
        } else {
            Float::new(MAG_PREC)
        };
        (lower, Mag::from_float(&hi).max(&Mag::from_float(&lo)))
    }

    /// Returns `true` if the two balls intersect.
    pub fn overlaps(&self, other: &Ball) -> bool {
        let (lower, _) = self.mid_distance(other);
        lower <= *self.rad.add(&other.rad).as_float()
    }

    /// Returns `true` if `other` lies entirely inside `self`.
    pub fn contains(&self, other: &Ball) -> bool {
        let (_, upper) = self.mid_distance(other);
        upper.add(&other.rad) <= self.rad
    }

    pub fn contains_float(&self, x: &Float) -> bool {
        self.contains(&Ball::new(x.clone(), Mag::zero()))
    }

    pub fn neg(&self) -> Ball {
        Ball::new(-self.mid.clone(), self.rad.clone())
    }

    pub fn add(&self, other: &Ball, prec: u32) -> Ball {
        let (mid, err) = round_nearest(prec, &self.mid + &other.mid);
        Ball::new(mid, self.rad.add(&other.rad).add(&err))
    }

    pub fn sub(&self, other: &Ball, prec: u32) -> Ball {
        let (mid, err) = round_nearest(prec, &self.mid - &other.mid);
        Ball::new(mid, self.rad.add(&other.rad).add(&err))
    }

    pub fn mul(&self, other: &Ball, prec: u32) -> Ball {
        let (mid, err) = round_nearest(prec, &self.mid * &other.mid);
        Ball::new(mid, prod_rad(self, other).add(&err))
    }

    pub fn sqr(&self, prec: u32) -> Ball {
        self.mul(self, prec)
    }

    /// Returns `a * b + c * d` (or `a * b - c * d` when `negate` is set) with a
    /// single rounding of the midpoint.
    pub fn mul_add_mul(a: &Ball, b: &Ball, c: &Ball, d: &Ball, negate: bool, prec: u32) -> Ball {
        let ab: Float = exact_mul(&a.mid, &b.mid);
        let cd: Float = exact_mul(&c.mid, &d.mid);
        let (mid, err) = if negate {
            round_nearest(prec, &ab - &cd)
        } else {
            round_nearest(prec, &ab + &cd)
        };
        Ball::new(mid, prod_rad(a, b).add(&prod_rad(c, d)).add(&err))
    }

    pub fn mul_si(&self, k: i64, prec: u32) -> Ball {
        let kf: Float = Float::with_val(64, k);
        let (mid, err) = round_nearest(prec, &self.mid * &kf);
        Ball::new(mid, self.rad.mul(&Mag::from_float(&kf)).add(&err))
    }

    /// Exact multiplication by `2^e`.
    pub fn mul_2exp(&self, e: i32) -> Ball {
        let mut mid: Float = self.mid.clone();
        mid <<= e;
        Ball::new(mid, self.rad.mul_2exp(e))
    }

    pub fn div(&self, other: &Ball, prec: u32) -> Ball {
        let den_lo: Float = other.abs_lbound();
        if den_lo <= 0 {
            return Ball::indeterminate();
        }
        let (mid, err) = round_nearest(prec, &self.mid / &other.mid);
        // |a/b - am/bm| <= (|am| rb + |bm| ra) / (|bm| (|bm| - rb))
        let num: Mag = Mag::from_float(&self.mid)
            .mul(&other.rad)
            .add(&Mag::from_float(&other.mid).mul(&self.rad));
        let den: Float = float_down(&abs_lower(&other.mid) * &den_lo);
        Ball::new(mid, num.div_lower(&den).add(&err))
    }

    /// Square root; indeterminate unless the ball is certified positive, or
    /// exactly zero.
    pub fn sqrt(&self, prec: u32) -> Ball {
        if self.is_exact() && self.mid.is_zero() {
            return Ball::zero();
        }
        let lo: Float = self.lbound();
        if lo <= 0 {
            return Ball::indeterminate();
        }
        let (mid, err) = round_nearest(prec, self.mid.sqrt_ref());
        // sqrt is 1/(2 sqrt(lo))-Lipschitz on [lo, inf)
        let mut den: Float = float_down(lo.sqrt_ref());
        den <<= 1;
        Ball::new(mid, self.rad.div_lower(&den).add(&err))
    }

    pub fn exp(&self, prec: u32) -> Ball {
        let (mid, err) = round_nearest(prec, self.mid.exp_ref());
        // |exp(m + t) - exp(m)| <= exp(m) (exp(r) - 1)
        let rad: Mag = Mag::from_float(&mid).add(&err).mul(&self.rad.exp_m1()).add(&err);
        Ball::new(mid, rad)
    }

    pub fn sin(&self, prec: u32) -> Ball {
        let (mid, err) = round_nearest(prec, self.mid.sin_ref());
        Ball::new(mid, self.rad.add(&err))
    }

    pub fn cos(&self, prec: u32) -> Ball {
        let (mid, err) = round_nearest(prec, self.mid.cos_ref());
        Ball::new(mid, self.rad.add(&err))
    }
}

impl From<f64> for Ball {
    fn from(x: f64) -> Self {
        Ball::from_f64(x)
    }
}

impl fmt::Display for Ball {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} +/- {}]", self.mid.to_f64(), self.rad)
    }
}
