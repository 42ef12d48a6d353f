use std::cmp::Ordering;
use std::fmt;

use rug::Float;
use rug::float::{Round, Special};
use rug::ops::AssignRound;

/// Precision, in bits, of the floats backing a [`Mag`].
pub const MAG_PREC: u32 = 30;

/// Rounds `val` to [`MAG_PREC`] bits towards `+inf`.
pub(crate) fn float_up<T>(val: T) -> Float
where
    Float: AssignRound<T, Round = Round, Ordering = Ordering>,
{
    Float::with_val_round(MAG_PREC, val, Round::Up).0
}

/// Rounds `val` to [`MAG_PREC`] bits towards `-inf`.
pub(crate) fn float_down<T>(val: T) -> Float
where
    Float: AssignRound<T, Round = Round, Ordering = Ordering>,
{
    Float::with_val_round(MAG_PREC, val, Round::Down).0
}

/// Lower bound on `|x|` at [`MAG_PREC`] bits.
pub(crate) fn abs_lower(x: &Float) -> Float {
    let round: Round = if x.is_sign_negative() { Round::Up } else { Round::Down };
    let mut y: Float = Float::with_val_round(MAG_PREC, x, round).0;
    y.abs_mut();
    y
}

/// Upper bound on a non-negative real number.
///
/// Every operation rounds towards `+inf`, so a [`Mag`] obtained from upper
/// bounds is again an upper bound. A [`Mag`] may be `+inf`, which is how an
/// indeterminate radius is represented.
#[derive(Clone, Debug, PartialEq, PartialOrd)]
pub struct Mag(Float);

impl Mag {
    pub fn zero() -> Self {
        Mag(Float::new(MAG_PREC))
    }

    pub fn one() -> Self {
        Mag(Float::with_val(MAG_PREC, 1))
    }

    pub fn inf() -> Self {
        Mag(Float::with_val(MAG_PREC, Special::Infinity))
    }

    /// Returns `2^e`.
    pub fn pow2(e: i32) -> Self {
        let mut x: Float = Float::with_val(MAG_PREC, 1);
        x <<= e;
        Mag(x)
    }

    /// Upper bound on `|x|`.
    pub fn from_f64(x: f64) -> Self {
        Self::from_float(&Float::with_val(53, x))
    }

    /// Upper bound on `|x|`; `NaN` maps to `+inf`.
    pub fn from_float(x: &Float) -> Self {
        if x.is_nan() {
            return Self::inf();
        }
        let round: Round = if x.is_sign_negative() { Round::Down } else { Round::Up };
        let mut y: Float = Float::with_val_round(MAG_PREC, x, round).0;
        y.abs_mut();
        Mag(y)
    }

    /// Unit in the last place of `x` at its own precision.
    ///
    /// This bounds the error of any correctly rounded operation whose result is `x`.
    pub fn ulp(x: &Float) -> Self {
        match x.get_exp() {
            Some(e) => Self::pow2(e.saturating_sub(x.prec() as i32)),
            None if x.is_zero() => Self::zero(),
            None => Self::inf(),
        }
    }

    pub fn as_float(&self) -> &Float {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_finite(&self) -> bool {
        self.0.is_finite()
    }

    pub fn to_f64(&self) -> f64 {
        self.0.to_f64_round(Round::Up)
    }

    pub fn add(&self, other: &Mag) -> Mag {
        Mag(float_up(&self.0 + &other.0))
    }

    pub fn mul(&self, other: &Mag) -> Mag {
        if self.is_zero() || other.is_zero() {
            return Mag::zero();
        }
        Mag(float_up(&self.0 * &other.0))
    }

    pub fn mul_2exp(&self, e: i32) -> Mag {
        let mut x: Float = self.0.clone();
        x <<= e;
        Mag(x)
    }

    pub fn max(&self, other: &Mag) -> Mag {
        if self.0 >= other.0 { self.clone() } else { other.clone() }
    }

    pub fn sqrt(&self) -> Mag {
        Mag(float_up(self.0.sqrt_ref()))
    }

    pub fn exp(&self) -> Mag {
        Mag(float_up(self.0.exp_ref()))
    }

    /// Upper bound on `e^self - 1`.
    pub fn exp_m1(&self) -> Mag {
        Mag(float_up(self.0.exp_m1_ref()))
    }

    pub fn pow(&self, n: u32) -> Mag {
        let mut out: Mag = Mag::one();
        (0..n).for_each(|_| out = out.mul(self));
        out
    }

    /// Upper bound on `self / den`, where `den` is a lower bound of the true
    /// denominator. Non-positive `den` yields `+inf`.
    pub fn div_lower(&self, den: &Float) -> Mag {
        if *den <= 0 {
            return Mag::inf();
        }
        Mag(float_up(&self.0 / den))
    }
}

impl fmt::Display for Mag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:e}", self.to_f64())
    }
}
