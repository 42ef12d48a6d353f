/// Working precision for a term at `coord`, `dist` steps away from the
/// midpoint of an interval whose farthest point is `max_dist` steps away.
///
/// Terms far from the midpoint are exponentially smaller than the leading
/// ones, so their relative precision can drop quadratically with the
/// distance without hurting the absolute precision of the sum. The `ord`
/// term compensates for polynomial weights `|coord|^ord` attached to each term.
///
/// The result is non-increasing in `dist`, non-decreasing in `prec`, and never
/// below `low_prec`.
pub fn newprec(prec: u32, coord: i64, dist: i64, max_dist: i64, ord: usize, low_prec: u32) -> u32 {
    debug_assert!(dist >= 0 && dist <= max_dist, "dist={dist} not in [0, {max_dist}]");
    let r: f64 = dist as f64 / (max_dist + 2) as f64;
    let neg: f64 = r * r * prec as f64;
    let pos: f64 = ord as f64 * (1.0 + coord.unsigned_abs() as f64).log2();
    let p: f64 = (prec as f64 - neg + pos).ceil();
    if p <= low_prec as f64 {
        low_prec
    } else {
        p.min(u32::MAX as f64) as u32
    }
}
