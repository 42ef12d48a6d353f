use std::fmt;

use crate::mag::Mag;
use crate::real::Ball;

/// A complex ball: a rectangle `re + i im` with ball-valued components.
#[derive(Clone, Debug)]
pub struct CBall {
    re: Ball,
    im: Ball,
}

impl CBall {
    pub fn new(re: Ball, im: Ball) -> Self {
        CBall { re, im }
    }

    pub fn zero() -> Self {
        CBall::new(Ball::zero(), Ball::zero())
    }

    pub fn one() -> Self {
        CBall::new(Ball::one(), Ball::zero())
    }

    pub fn i() -> Self {
        CBall::new(Ball::zero(), Ball::one())
    }

    pub fn from_f64(re: f64, im: f64) -> Self {
        CBall::new(Ball::from_f64(re), Ball::from_f64(im))
    }

    pub fn from_real(re: Ball) -> Self {
        CBall::new(re, Ball::zero())
    }

    pub fn re(&self) -> &Ball {
        &self.re
    }

    pub fn im(&self) -> &Ball {
        &self.im
    }

    pub fn is_finite(&self) -> bool {
        self.re.is_finite() && self.im.is_finite()
    }

    /// Adds `[-err, err]` to both components.
    pub fn add_error(&mut self, err: &Mag) {
        self.re.add_error(err);
        self.im.add_error(err);
    }

    /// Upper bound on the modulus.
    pub fn abs_ubound(&self) -> Mag {
        let re: Mag = self.re.abs_ubound();
        let im: Mag = self.im.abs_ubound();
        re.mul(&re).add(&im.mul(&im)).sqrt()
    }

    pub fn overlaps(&self, other: &CBall) -> bool {
        self.re.overlaps(&other.re) && self.im.overlaps(&other.im)
    }

    pub fn contains(&self, other: &CBall) -> bool {
        self.re.contains(&other.re) && self.im.contains(&other.im)
    }

    pub fn contains_zero(&self) -> bool {
        self.re.contains_zero() && self.im.contains_zero()
    }

    pub fn neg(&self) -> CBall {
        CBall::new(self.re.neg(), self.im.neg())
    }

    /// Exact multiplication by `i^k`.
    pub fn mul_i_pow(&self, k: i64) -> CBall {
        match k.rem_euclid(4) {
            0 => self.clone(),
            1 => CBall::new(self.im.neg(), self.re.clone()),
            2 => self.neg(),
            _ => CBall::new(self.im.clone(), self.re.neg()),
        }
    }

    pub fn mul_2exp(&self, e: i32) -> CBall {
        CBall::new(self.re.mul_2exp(e), self.im.mul_2exp(e))
    }

    pub fn add(&self, other: &CBall, prec: u32) -> CBall {
        CBall::new(self.re.add(&other.re, prec), self.im.add(&other.im, prec))
    }

    pub fn sub(&self, other: &CBall, prec: u32) -> CBall {
        CBall::new(self.re.sub(&other.re, prec), self.im.sub(&other.im, prec))
    }

    pub fn mul(&self, other: &CBall, prec: u32) -> CBall {
        let re: Ball = Ball::mul_add_mul(&self.re, &other.re, &self.im, &other.im, true, prec);
        let im: Ball = Ball::mul_add_mul(&self.re, &other.im, &self.im, &other.re, false, prec);
        CBall::new(re, im)
    }

    pub fn mul_ball(&self, x: &Ball, prec: u32) -> CBall {
        CBall::new(self.re.mul(x, prec), self.im.mul(x, prec))
    }

    pub fn sqr(&self, prec: u32) -> CBall {
        self.mul(self, prec)
    }

    /// Computes `self^n` by binary powering.
    pub fn pow(&self, n: u64, prec: u32) -> CBall {
        let mut out: CBall = CBall::one();
        let mut base: CBall = self.clone();
        let mut e: u64 = n;
        while e > 0 {
            if e & 1 == 1 {
                out = out.mul(&base, prec);
            }
            e >>= 1;
            if e > 0 {
                base = base.sqr(prec);
            }
        }
        out
    }

    pub fn exp(&self, prec: u32) -> CBall {
        let e: Ball = self.re.exp(prec);
        let c: Ball = self.im.cos(prec);
        let s: Ball = self.im.sin(prec);
        CBall::new(e.mul(&c, prec), e.mul(&s, prec))
    }

    /// Returns `exp(pi i self)`.
    pub fn exp_pi_i(&self, prec: u32) -> CBall {
        let pi: Ball = Ball::pi(prec + 8);
        // pi i (x + i y) = -pi y + i pi x
        let w: CBall = CBall::new(self.im.mul(&pi, prec).neg(), self.re.mul(&pi, prec));
        w.exp(prec)
    }
}

impl fmt::Display for CBall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} + {}*I", self.re, self.im)
    }
}
