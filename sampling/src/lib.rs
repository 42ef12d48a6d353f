//! Deterministic randomness for tests and benchmarks: a seeded ChaCha8
//! [`source::Source`] and samplers for the matrices and vectors fed to the
//! theta engine.

pub mod distributions;
pub mod source;
