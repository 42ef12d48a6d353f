//! # theta
//!
//! Rigorous evaluation of Riemann theta functions by direct summation.
//!
//! The pipeline has four stages:
//!
//! 1. [`radius::solve_radius`] picks a squared radius `R^2` such that the
//!    terms outside the ellipsoid `|C n + v|^2 <= R^2` sum to at most `2^-prec`.
//! 2. [`eld::EllipsoidTree::build`] enumerates the lattice points of that
//!    ellipsoid as a tree of nested one-dimensional slices.
//! 3. [`sum::sum`] walks the tree, forms every term with a handful of
//!    multiplications, lowers the working precision of terms far from the
//!    centre of their slice ([`precision::newprec`]), and hands each
//!    one-dimensional fiber to a [`sum::FiberWorker`].
//! 4. The worker ([`workers::CharWorker`], [`workers::JetWorker`] or a custom
//!    one) folds the fiber into its outputs.
//!
//! [`naive`] wires these stages together for theta values with
//! characteristics and their derivatives. Results are [`ball::CBall`]s that
//! contain the exact value.

pub mod eld;
pub mod error;
pub mod form;
pub mod naive;
pub mod params;
pub mod precision;
pub mod radius;
pub mod series;
pub mod sum;
pub mod workers;

#[cfg(test)]
mod tests;

pub use eld::{Coset, EllipsoidTree, Node, NodeId};
pub use error::{EnumError, ThetaError};
pub use form::QuadraticForm;
pub use naive::{theta_naive_all, theta_naive_batch, theta_naive_fixed_a, theta_naive_jet};
pub use params::Parameters;
pub use radius::{Radius, solve_radius};
pub use series::Series;
pub use sum::{Fiber, FiberWorker, Term};
pub use workers::{CharWorker, JetWorker, jet_tuples};
