use std::f64::consts::PI;

use ball::{CBall, CBallMat};
use sampling::{distributions::SiegelSampler, source::Source};

use crate::{
    naive::{theta_naive_all, theta_naive_fixed_a, theta_naive_jet},
    params::Parameters,
    workers::jet_tuples,
};

/// Truncation of the f64 reference sums; the sampled imaginary parts make
/// terms beyond it negligible.
const BOX: i64 = 7;

pub(crate) struct RandomInput {
    pub(crate) g: usize,
    pub(crate) tau_re: Vec<f64>,
    pub(crate) tau_im: Vec<f64>,
    pub(crate) z_re: Vec<f64>,
    pub(crate) z_im: Vec<f64>,
}

impl RandomInput {
    pub(crate) fn sample(source: &mut Source, g: usize) -> Self {
        let sampler: SiegelSampler = SiegelSampler::new(0.3, 0.9).unwrap();
        let (tau_re, tau_im) = sampler.sample_tau(source, g);
        let (z_re, z_im) = sampler.sample_z(source, g, 0.3);
        RandomInput {
            g,
            tau_re,
            tau_im,
            z_re,
            z_im,
        }
    }

    pub(crate) fn tau(&self) -> CBallMat {
        CBallMat::from_f64(self.g, self.g, &self.tau_re, &self.tau_im)
    }

    pub(crate) fn z(&self) -> Vec<CBall> {
        self.z_re.iter().zip(self.z_im.iter()).map(|(x, y)| CBall::from_f64(*x, *y)).collect()
    }

    /// `sum_n (2 pi i (n + a/2))^alpha exp(pi i (n+a/2)^T tau (n+a/2) + 2 pi i (n+a/2)^T (z + b/2))`
    /// over `n` in a box, in f64.
    pub(crate) fn reference(&self, a: u64, b: u64, alpha: &[u32]) -> (f64, f64) {
        let g: usize = self.g;
        let bit = |x: u64, j: usize| ((x >> (g - 1 - j)) & 1) as f64;
        let mut acc: (f64, f64) = (0.0, 0.0);
        for n in box_points(g, BOX).iter() {
            let m: Vec<f64> = (0..g).map(|j| n[j] as f64 + bit(a, j) / 2.0).collect();
            let (mut re, mut im) = (0.0, 0.0);
            for j in 0..g {
                for k in 0..g {
                    re += -PI * m[j] * self.tau_im[j * g + k] * m[k];
                    im += PI * m[j] * self.tau_re[j * g + k] * m[k];
                }
                re += -2.0 * PI * m[j] * self.z_im[j];
                im += 2.0 * PI * m[j] * (self.z_re[j] + bit(b, j) / 2.0);
            }
            let modulus: f64 = re.exp();
            let mut term: (f64, f64) = (modulus * im.cos(), modulus * im.sin());
            for (j, e) in alpha.iter().enumerate() {
                for _ in 0..*e {
                    // multiply by 2 pi i m_j
                    term = (-2.0 * PI * m[j] * term.1, 2.0 * PI * m[j] * term.0);
                }
            }
            acc.0 += term.0;
            acc.1 += term.1;
        }
        acc
    }
}

pub(crate) fn box_points(g: usize, b: i64) -> Vec<Vec<i64>> {
    let mut out: Vec<Vec<i64>> = vec![Vec::new()];
    for _ in 0..g {
        out = out
            .into_iter()
            .flat_map(|p| {
                (-b..=b).map(move |x| {
                    let mut q: Vec<i64> = p.clone();
                    q.push(x);
                    q
                })
            })
            .collect();
    }
    out
}

fn assert_close(x: &CBall, expected: (f64, f64), tol: f64, what: &str) {
    let re: f64 = x.re().mid().to_f64();
    let im: f64 = x.im().mid().to_f64();
    let scale: f64 = 1.0 + expected.0.abs() + expected.1.abs();
    assert!((re - expected.0).abs() <= tol * scale, "{what}: re {re} vs {}", expected.0);
    assert!((im - expected.1).abs() <= tol * scale, "{what}: im {im} vs {}", expected.1);
    assert!(x.re().rad().to_f64() <= tol && x.im().rad().to_f64() <= tol, "{what}: radius too large: {x}");
}

/// Every `theta_{a,b}` agrees with a truncated f64 sum.
pub(crate) fn test_all_characteristics(params: &Parameters, g: usize, prec: u32, seed: u8) {
    let mut source: Source = Source::new([seed; 32]);
    let input: RandomInput = RandomInput::sample(&mut source, g);
    let values: Vec<CBall> = theta_naive_all(&input.z(), &input.tau(), prec, params).unwrap();
    assert_eq!(values.len(), 1 << (2 * g));
    for a in 0..1u64 << g {
        for b in 0..1u64 << g {
            let x: &CBall = &values[((a << g) + b) as usize];
            assert_close(x, input.reference(a, b, &vec![0; g]), 1e-10, &format!("a={a} b={b}"));
        }
    }
}

/// Summing one coset gives the same balls as the corresponding slice of
/// [`theta_naive_all`].
pub(crate) fn test_fixed_a_matches_all(params: &Parameters, g: usize, prec: u32, seed: u8) {
    let mut source: Source = Source::new([seed; 32]);
    let input: RandomInput = RandomInput::sample(&mut source, g);
    let all: Vec<CBall> = theta_naive_all(&input.z(), &input.tau(), prec, params).unwrap();
    let a: u64 = source.next_bits(g);
    let fixed: Vec<CBall> = theta_naive_fixed_a(a, &input.z(), &input.tau(), prec, params).unwrap();
    for (b, x) in fixed.iter().enumerate() {
        assert!(x.overlaps(&all[((a as usize) << g) + b]), "a={a} b={b}");
    }
}

/// Derivatives up to `ord` agree with truncated f64 sums.
pub(crate) fn test_jet(params: &Parameters, g: usize, ord: usize, prec: u32, seed: u8) {
    let mut source: Source = Source::new([seed; 32]);
    let input: RandomInput = RandomInput::sample(&mut source, g);
    let a: u64 = source.next_bits(g);
    let b: u64 = source.next_bits(g);
    let values: Vec<CBall> = theta_naive_jet(a, b, &input.z(), &input.tau(), ord, prec, params).unwrap();
    let tuples: Vec<Vec<u32>> = jet_tuples(g, ord);
    assert_eq!(values.len(), tuples.len());
    for (x, alpha) in values.iter().zip(tuples.iter()) {
        assert_close(x, input.reference(a, b, alpha), 1e-8, &format!("a={a} b={b} alpha={alpha:?}"));
    }
}
