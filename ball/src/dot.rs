use itertools::izip;
use rug::Float;
use rug::float::Round;
use rug::ops::AddAssignRound;

use crate::complex::CBall;
use crate::mag::Mag;
use crate::real::{Ball, exact_mul, prod_rad, round_nearest};

/// Extra bits carried by the running sums of an [`Accumulator`].
pub const DOT_GUARD_BITS: u32 = 32;

/// Running sum of (products of) complex balls.
///
/// Products are formed exactly and added into midpoints carried at
/// `prec + DOT_GUARD_BITS` bits; the radii of the inputs and the rounding
/// errors of the running sums are tracked separately, and the midpoint is
/// rounded to `prec` bits only once, in [`Accumulator::finish`].
pub struct Accumulator {
    prec: u32,
    re: Float,
    im: Float,
    rad_re: Mag,
    rad_im: Mag,
    err: Mag,
}

impl Accumulator {
    pub fn new(prec: u32) -> Self {
        Accumulator {
            prec,
            re: Float::new(prec + DOT_GUARD_BITS),
            im: Float::new(prec + DOT_GUARD_BITS),
            rad_re: Mag::zero(),
            rad_im: Mag::zero(),
            err: Mag::zero(),
        }
    }

    fn push(err: &mut Mag, sum: &mut Float, x: &Float) {
        if sum.add_assign_round(x, Round::Nearest) != std::cmp::Ordering::Equal {
            *err = err.add(&Mag::ulp(sum));
        }
    }

    fn push_neg(err: &mut Mag, sum: &mut Float, x: &Float) {
        let neg: Float = -x.clone();
        Self::push(err, sum, &neg);
    }

    pub fn add(&mut self, x: &CBall) {
        Self::push(&mut self.err, &mut self.re, x.re().mid());
        Self::push(&mut self.err, &mut self.im, x.im().mid());
        self.rad_re = self.rad_re.add(x.re().rad());
        self.rad_im = self.rad_im.add(x.im().rad());
    }

    /// Adds `x * y`.
    pub fn add_mul(&mut self, x: &CBall, y: &CBall) {
        let (xr, xi, yr, yi) = (x.re(), x.im(), y.re(), y.im());
        Self::push(&mut self.err, &mut self.re, &exact_mul(xr.mid(), yr.mid()));
        Self::push_neg(&mut self.err, &mut self.re, &exact_mul(xi.mid(), yi.mid()));
        Self::push(&mut self.err, &mut self.im, &exact_mul(xr.mid(), yi.mid()));
        Self::push(&mut self.err, &mut self.im, &exact_mul(xi.mid(), yr.mid()));
        self.rad_re = self.rad_re.add(&prod_rad(xr, yr)).add(&prod_rad(xi, yi));
        self.rad_im = self.rad_im.add(&prod_rad(xr, yi)).add(&prod_rad(xi, yr));
    }

    pub fn finish(self) -> CBall {
        let (re, err_re) = round_nearest(self.prec, &self.re);
        let (im, err_im) = round_nearest(self.prec, &self.im);
        CBall::new(
            Ball::new(re, self.rad_re.add(&self.err).add(&err_re)),
            Ball::new(im, self.rad_im.add(&self.err).add(&err_im)),
        )
    }
}

/// Generalized dot product `init +/- sum_k x[k] y[k]`, rounded once to `prec` bits.
pub fn dot(init: Option<&CBall>, subtract: bool, x: &[CBall], y: &[CBall], prec: u32) -> CBall {
    assert_eq!(x.len(), y.len(), "dot: x.len()={} != y.len()={}", x.len(), y.len());
    let mut acc: Accumulator = Accumulator::new(prec);
    izip!(x.iter(), y.iter()).for_each(|(a, b)| {
        if subtract {
            acc.add_mul(&a.neg(), b);
        } else {
            acc.add_mul(a, b);
        }
    });
    if let Some(init) = init {
        acc.add(init);
    }
    acc.finish()
}

/// Sum of the given complex balls, rounded once to `prec` bits.
pub fn sum(x: &[CBall], prec: u32) -> CBall {
    let mut acc: Accumulator = Accumulator::new(prec);
    x.iter().for_each(|a| acc.add(a));
    acc.finish()
}

#[cfg(test)]
mod tests {
    use sampling::source::Source;

    use super::*;

    #[test]
    fn dot_matches_naive_accumulation() {
        let mut source: Source = Source::new([7u8; 32]);
        let n: usize = 40;
        let x: Vec<CBall> = (0..n)
            .map(|_| CBall::from_f64(source.next_f64(-1.0, 1.0), source.next_f64(-1.0, 1.0)))
            .collect();
        let y: Vec<CBall> = (0..n)
            .map(|_| CBall::from_f64(source.next_f64(-1.0, 1.0), source.next_f64(-1.0, 1.0)))
            .collect();
        let init: CBall = CBall::from_f64(0.5, -0.25);

        let mut want: CBall = init.clone();
        izip!(x.iter(), y.iter()).for_each(|(a, b)| want = want.add(&a.mul(b, 200), 200));

        let have: CBall = dot(Some(&init), false, &x, &y, 64);
        assert!(have.overlaps(&want));
        assert!(have.re().rad().to_f64() < 1e-15);

        let neg: CBall = dot(Some(&init), true, &x, &y, 64);
        let want_neg: CBall = init.add(&init, 200).sub(&want, 200);
        assert!(neg.overlaps(&want_neg));
    }

    #[test]
    fn cancellation_is_tracked_in_guard_bits() {
        let big: CBall = CBall::from_f64(1e20, 0.0);
        let tiny: CBall = CBall::from_f64(1.0, 0.0);
        let s: CBall = sum(&[big.clone(), tiny.clone(), big.neg()], 53);
        assert!(s.overlaps(&tiny));
        assert!(s.re().rad().to_f64() < 1e-3);
    }
}
