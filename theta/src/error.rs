use std::fmt::Display;

use thiserror::Error;
use tracing::error;

/// Recoverable failures of the ellipsoid builder. Callers are expected to
/// switch to another evaluation strategy rather than retry.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum EnumError {
    #[error("ellipsoid holds more than {limit} lattice points")]
    TooManyPoints { limit: u64 },
    #[error("interval bounds at dimension {dim} do not fit in machine integers")]
    Unrepresentable { dim: usize },
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ThetaError {
    #[error(transparent)]
    Enum(#[from] EnumError),
    #[error("imaginary part of tau is not certified positive definite")]
    NotPositiveDefinite,
    #[error("input is not finite")]
    NonFinite,
}

/// Logs `msg` and panics. Used for violated preconditions the caller is
/// responsible for; continuing would yield an unsound enclosure.
#[cold]
pub fn fatal(msg: impl Display) -> ! {
    error!("fatal: {msg}");
    panic!("fatal: {msg}")
}
