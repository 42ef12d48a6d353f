use ball::{CBall, CBallMat};

/// Exponential factors of the series `sum_n exp(pi i n^T tau n + 2 pi i n^T z)`.
///
/// Holds `exp(pi i tau_jj)` on the diagonal, `exp(2 pi i tau_jk)` above it,
/// `exp(2 pi i z_j)`, and the inverses of all of them. Every lattice term is a
/// product of integer powers of these factors.
#[derive(Clone, Debug)]
pub struct Series {
    g: usize,
    exp_z: Vec<CBall>,
    exp_z_inv: Vec<CBall>,
    exp_tau: Vec<CBall>,
    exp_tau_inv: Vec<CBall>,
}

impl Series {
    /// Takes `tau` (symmetric, only the upper triangle is read) and `z` as they
    /// appear in the exponent.
    pub fn new(tau: &CBallMat, z: &[CBall], prec: u32) -> Self {
        assert!(tau.is_square(), "tau is {}x{}", tau.rows(), tau.cols());
        assert_eq!(z.len(), tau.rows(), "z has length {} for a {}x{} tau", z.len(), tau.rows(), tau.rows());
        let g: usize = tau.rows();

        let exp_z: Vec<CBall> = z.iter().map(|x| x.mul_2exp(1).exp_pi_i(prec)).collect();
        let exp_z_inv: Vec<CBall> = z.iter().map(|x| x.mul_2exp(1).neg().exp_pi_i(prec)).collect();

        let mut exp_tau: Vec<CBall> = vec![CBall::one(); g * g];
        let mut exp_tau_inv: Vec<CBall> = vec![CBall::one(); g * g];
        for j in 0..g {
            for k in j..g {
                let e: CBall = if j == k { tau.at(j, k).clone() } else { tau.at(j, k).mul_2exp(1) };
                exp_tau[j * g + k] = e.exp_pi_i(prec);
                exp_tau_inv[j * g + k] = e.neg().exp_pi_i(prec);
            }
        }

        Series {
            g,
            exp_z,
            exp_z_inv,
            exp_tau,
            exp_tau_inv,
        }
    }

    pub fn dim(&self) -> usize {
        self.g
    }

    pub fn exp_z(&self, j: usize) -> &CBall {
        &self.exp_z[j]
    }

    pub fn exp_z_inv(&self, j: usize) -> &CBall {
        &self.exp_z_inv[j]
    }

    /// Requires `j <= k`.
    pub fn exp_tau(&self, j: usize, k: usize) -> &CBall {
        debug_assert!(j <= k && k < self.g);
        &self.exp_tau[j * self.g + k]
    }

    /// Requires `j <= k`.
    pub fn exp_tau_inv(&self, j: usize, k: usize) -> &CBall {
        debug_assert!(j <= k && k < self.g);
        &self.exp_tau_inv[j * self.g + k]
    }
}
