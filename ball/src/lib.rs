//! # ball
//!
//! Arbitrary-precision ball arithmetic on top of `rug` (MPFR).
//!
//! A [`Ball`] is a midpoint `mid` (a [`rug::Float`] of any precision) and a
//! radius `rad` (a [`Mag`], an upper bound kept at [`MAG_PREC`] bits). Every
//! operation takes the precision of the result midpoint as an argument and
//! folds its rounding error into the radius, so results always enclose the
//! exact value. [`CBall`] is the complex counterpart, [`BallMat`] and
//! [`CBallMat`] are dense matrices of both, and [`dot`] is a generalized dot
//! product that rounds once at the end.

pub mod complex;
pub mod dot;
pub mod mag;
pub mod mat;
pub mod real;

pub use complex::CBall;
pub use dot::{Accumulator, dot, sum};
pub use mag::{MAG_PREC, Mag};
pub use mat::{BallMat, CBallMat};
pub use real::Ball;
