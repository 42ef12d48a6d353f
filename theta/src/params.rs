use crate::precision::newprec;

/// Default floor on per-term working precision, in bits.
pub const LOW_PREC: u32 = 32;

/// Default ceiling on the number of enumerated lattice points.
pub const MAX_PTS: u64 = 1_000_000;

/// Default extra bits added to the working precision of a summation.
pub const GUARD_BITS: u32 = 10;

/// Configuration shared by the radius solver, the ellipsoid builder and the
/// summation worker.
///
/// Passed explicitly to every call: two invocations with different ceilings
/// can run side by side.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Parameters {
    /// Floor on the working precision of any single term; also the precision
    /// of the ellipsoid interval computations.
    pub low_prec: u32,
    /// Maximal number of lattice points in an ellipsoid before the builder
    /// gives up.
    pub max_pts: u64,
    /// Extra bits on top of the requested precision for the summation.
    pub guard_bits: u32,
}

impl Default for Parameters {
    fn default() -> Self {
        Parameters {
            low_prec: LOW_PREC,
            max_pts: MAX_PTS,
            guard_bits: GUARD_BITS,
        }
    }
}

impl Parameters {
    pub fn with_low_prec(mut self, low_prec: u32) -> Self {
        assert!(low_prec >= 2, "low_prec={low_prec} must be at least 2");
        self.low_prec = low_prec;
        self
    }

    pub fn with_max_pts(mut self, max_pts: u64) -> Self {
        self.max_pts = max_pts;
        self
    }

    pub fn with_guard_bits(mut self, guard_bits: u32) -> Self {
        self.guard_bits = guard_bits;
        self
    }

    /// [`newprec`] with this configuration's precision floor.
    pub fn newprec(&self, prec: u32, coord: i64, dist: i64, max_dist: i64, ord: usize) -> u32 {
        newprec(prec, coord, dist, max_dist, ord, self.low_prec)
    }
}
