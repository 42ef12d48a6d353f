use rand_distr::{Distribution, Normal, NormalError};

use crate::source::Source;

/// Samples period matrices `tau = X + iY` with `X` symmetric in `[-1/2, 1/2]`
/// and `Y = A^T A + shift * I` positive definite, `A` having Gaussian entries.
pub struct SiegelSampler {
    normal: Normal<f64>,
    shift: f64,
}

impl SiegelSampler {
    pub fn new(sigma: f64, shift: f64) -> Result<Self, NormalError> {
        Ok(SiegelSampler {
            normal: Normal::new(0.0, sigma)?,
            shift,
        })
    }

    /// Returns the row-major real and imaginary parts of a `g x g` matrix.
    pub fn sample_tau(&self, source: &mut Source, g: usize) -> (Vec<f64>, Vec<f64>) {
        let mut re: Vec<f64> = vec![0.0; g * g];
        for i in 0..g {
            for j in i..g {
                let x: f64 = source.next_f64(-0.5, 0.5);
                re[i * g + j] = x;
                re[j * g + i] = x;
            }
        }
        let a: Vec<f64> = (0..g * g).map(|_| self.normal.sample(source)).collect();
        let mut im: Vec<f64> = vec![0.0; g * g];
        for i in 0..g {
            for j in 0..g {
                im[i * g + j] = (0..g).map(|k| a[k * g + i] * a[k * g + j]).sum::<f64>();
            }
            im[i * g + i] += self.shift;
        }
        (re, im)
    }

    /// Returns the real and imaginary parts of a vector `z` with real parts in
    /// `[-1, 1)` and imaginary parts in `[-max_im, max_im)`.
    pub fn sample_z(&self, source: &mut Source, g: usize, max_im: f64) -> (Vec<f64>, Vec<f64>) {
        let re: Vec<f64> = (0..g).map(|_| source.next_f64(-1.0, 1.0)).collect();
        let im: Vec<f64> = (0..g).map(|_| source.next_f64(-max_im, max_im)).collect();
        (re, im)
    }
}

/// Samples upper-triangular quadratic forms and offsets for enumeration tests.
pub struct FormSampler {
    pub diag_min: f64,
    pub diag_max: f64,
    pub off_diag: f64,
}

impl Default for FormSampler {
    fn default() -> Self {
        FormSampler {
            diag_min: 0.6,
            diag_max: 1.4,
            off_diag: 0.5,
        }
    }
}

impl FormSampler {
    /// Row-major `g x g` upper-triangular matrix with positive diagonal.
    pub fn sample_upper(&self, source: &mut Source, g: usize) -> Vec<f64> {
        let mut c: Vec<f64> = vec![0.0; g * g];
        for i in 0..g {
            c[i * g + i] = source.next_f64(self.diag_min, self.diag_max);
            for j in i + 1..g {
                c[i * g + j] = source.next_f64(-self.off_diag, self.off_diag);
            }
        }
        c
    }

    pub fn sample_offset(&self, source: &mut Source, g: usize, bound: f64) -> Vec<f64> {
        (0..g).map(|_| source.next_f64(-bound, bound)).collect()
    }
}
