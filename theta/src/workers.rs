use ball::{Accumulator, Ball, CBall, Mag};
use itertools::izip;
use rug::ops::Pow;
use rug::{Float, Integer};

use crate::sum::{Fiber, FiberWorker};

/// Bit of `b` holding the characteristic of coordinate `j` in dimension `g`.
#[inline(always)]
fn char_bit(b: u64, j: usize, g: usize) -> i64 {
    ((b >> (g - 1 - j)) & 1) as i64
}

/// `sum_{j >= 1} m_j b_j` over the shared coordinates of a fiber.
fn fixed_quarter_turns(coords: &[i64], b: u64, g: usize) -> i64 {
    coords
        .iter()
        .enumerate()
        .map(|(j, m)| m.rem_euclid(4) * char_bit(b, j + 1, g))
        .sum::<i64>()
}

/// Exact conversion of an integer to a float.
fn exact_float(x: &Integer) -> Float {
    Float::with_val(x.significant_bits().max(1), x)
}

/// Sums every characteristic `b` at once: output `b` receives the terms
/// weighted by `i^(m^T b)`.
pub struct CharWorker {
    g: usize,
}

impl CharWorker {
    pub fn new(g: usize) -> Self {
        assert!(g > 0 && g < 64, "g={g} out of range");
        CharWorker { g }
    }
}

impl FiberWorker for CharWorker {
    fn len(&self) -> usize {
        1 << self.g
    }

    fn work(&mut self, out: &mut [CBall], fiber: &Fiber<'_>) {
        let g: usize = self.g;

        // Split the fiber by the free coordinate mod 4.
        let mut classes: [Accumulator; 4] = std::array::from_fn(|_| Accumulator::new(fiber.prec));
        fiber
            .terms
            .iter()
            .for_each(|t| classes[t.coord.rem_euclid(4) as usize].add(&t.value));
        let classes: Vec<CBall> = classes.into_iter().map(Accumulator::finish).collect();

        // b_0 = 0 and b_0 = 1
        let mut even: Accumulator = Accumulator::new(fiber.prec);
        let mut odd: Accumulator = Accumulator::new(fiber.prec);
        for (r, s) in classes.iter().enumerate() {
            even.add(s);
            odd.add(&s.mul_i_pow(r as i64));
        }
        let sums: [CBall; 2] = [
            even.finish().mul(fiber.cofactor, fiber.out_prec),
            odd.finish().mul(fiber.cofactor, fiber.out_prec),
        ];

        for (b, x) in out.iter_mut().enumerate() {
            let b: u64 = b as u64;
            let s: &CBall = &sums[char_bit(b, 0, g) as usize];
            *x = x.add(&s.mul_i_pow(fixed_quarter_turns(fiber.coords, b, g)), fiber.out_prec);
        }
    }
}

/// Multi-indices `alpha` in `N^g` with `|alpha| <= ord`, by increasing total
/// degree and, within a degree, by decreasing first entries.
pub fn jet_tuples(g: usize, ord: usize) -> Vec<Vec<u32>> {
    fn rec(prefix: &mut Vec<u32>, left: usize, g: usize, out: &mut Vec<Vec<u32>>) {
        if prefix.len() + 1 == g {
            prefix.push(left as u32);
            out.push(prefix.clone());
            prefix.pop();
            return;
        }
        for a in (0..=left).rev() {
            prefix.push(a as u32);
            rec(prefix, left - a, g, out);
            prefix.pop();
        }
    }

    let mut out: Vec<Vec<u32>> = Vec::new();
    let mut prefix: Vec<u32> = Vec::with_capacity(g);
    (0..=ord).for_each(|n| rec(&mut prefix, n, g, &mut out));
    out
}

/// Sums `m^alpha i^(m^T b)` times the term for every `alpha` of
/// [`jet_tuples`], i.e. the partial derivatives of the series up to `(pi i)^|alpha|`.
pub struct JetWorker {
    g: usize,
    b: u64,
    tuples: Vec<Vec<u32>>,
    tail: Vec<Mag>,
}

impl JetWorker {
    /// `k` bounds `|m| / |C m + v|` over the points outside the ellipsoid.
    pub fn new(g: usize, b: u64, ord: usize, k: &Mag) -> Self {
        assert!(g > 0 && g < 64, "g={g} out of range");
        assert!(b >> g == 0, "b={b} has more than {g} bits");
        let tuples: Vec<Vec<u32>> = jet_tuples(g, ord);
        let tail: Vec<Mag> = tuples.iter().map(|t| k.pow(t.iter().sum::<u32>())).collect();
        JetWorker { g, b, tuples, tail }
    }

    pub fn tuples(&self) -> &[Vec<u32>] {
        &self.tuples
    }
}

impl FiberWorker for JetWorker {
    fn len(&self) -> usize {
        self.tuples.len()
    }

    fn tail_scale(&self, i: usize) -> Mag {
        self.tail[i].clone()
    }

    fn work(&mut self, out: &mut [CBall], fiber: &Fiber<'_>) {
        let (g, b) = (self.g, self.b);
        let b0: i64 = char_bit(b, 0, g);
        let quarter: i64 = fixed_quarter_turns(fiber.coords, b, g);

        // The free coordinate's quarter turns are folded into the terms once.
        let turned: Vec<CBall> = fiber.terms.iter().map(|t| t.value.mul_i_pow(t.coord * b0)).collect();

        // Free-coordinate weights m_0^e, shared by every alpha with alpha_0 = e.
        let max_e: u32 = self.tuples.iter().map(|alpha| alpha[0]).max().unwrap_or(0);
        let weights: Vec<Vec<CBall>> = (1..=max_e)
            .map(|e| {
                fiber
                    .terms
                    .iter()
                    .map(|t| CBall::from_real(Ball::from_float(exact_float(&Integer::from(t.coord).pow(e)))))
                    .collect()
            })
            .collect();

        for (alpha, x) in izip!(self.tuples.iter(), out.iter_mut()) {
            let fixed: Integer = fiber
                .coords
                .iter()
                .zip(alpha[1..].iter())
                .fold(Integer::from(1), |acc, (m, e)| acc * Integer::from(*m).pow(*e));
            if fixed.is_zero() {
                continue;
            }
            let folded: CBall = match alpha[0] {
                0 => ball::dot::sum(&turned, fiber.prec),
                e => ball::dot::dot(None, false, &turned, &weights[e as usize - 1], fiber.prec),
            };
            let s: CBall = folded
                .mul_i_pow(quarter)
                .mul_ball(&Ball::from_float(exact_float(&fixed)), fiber.out_prec)
                .mul(fiber.cofactor, fiber.out_prec);
            *x = x.add(&s, fiber.out_prec);
        }
    }
}
