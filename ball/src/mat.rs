use itertools::izip;

use crate::complex::CBall;
use crate::mag::Mag;
use crate::real::Ball;

/// Dense row-major matrix of real balls.
#[derive(Clone, Debug)]
pub struct BallMat {
    rows: usize,
    cols: usize,
    data: Vec<Ball>,
}

impl BallMat {
    pub fn new(rows: usize, cols: usize) -> Self {
        BallMat {
            rows,
            cols,
            data: vec![Ball::zero(); rows * cols],
        }
    }

    /// Builds an exact matrix from row-major `f64` data.
    pub fn from_f64(rows: usize, cols: usize, data: &[f64]) -> Self {
        assert_eq!(data.len(), rows * cols, "invalid data: data.len()={} != {}x{}", data.len(), rows, cols);
        BallMat {
            rows,
            cols,
            data: data.iter().map(|x| Ball::from_f64(*x)).collect(),
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    pub fn at(&self, i: usize, j: usize) -> &Ball {
        debug_assert!(i < self.rows && j < self.cols);
        &self.data[i * self.cols + j]
    }

    pub fn at_mut(&mut self, i: usize, j: usize) -> &mut Ball {
        debug_assert!(i < self.rows && j < self.cols);
        &mut self.data[i * self.cols + j]
    }

    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|x| x.is_finite())
    }

    pub fn is_upper_triangular(&self) -> bool {
        (0..self.rows).all(|i| (0..i.min(self.cols)).all(|j| self.at(i, j).is_exact() && self.at(i, j).mid().is_zero()))
    }

    pub fn scale(&self, x: &Ball, prec: u32) -> BallMat {
        BallMat {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|a| a.mul(x, prec)).collect(),
        }
    }

    pub fn mul_2exp(&self, e: i32) -> BallMat {
        BallMat {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|a| a.mul_2exp(e)).collect(),
        }
    }

    /// Upper-triangular `C` with `C^T C = self`, reading the upper triangle of
    /// `self` only.
    ///
    /// Returns `None` when a pivot cannot be certified positive, i.e. when the
    /// matrix is not (provably) positive definite at this precision.
    pub fn cholesky_upper(&self, prec: u32) -> Option<BallMat> {
        assert!(self.is_square(), "cholesky_upper: matrix is {}x{}", self.rows, self.cols);
        let n: usize = self.rows;
        let mut c: BallMat = BallMat::new(n, n);
        for j in 0..n {
            let mut pivot: Ball = self.at(j, j).clone();
            (0..j).for_each(|k| pivot = pivot.sub(&c.at(k, j).sqr(prec), prec));
            if !pivot.is_positive() {
                return None;
            }
            let d: Ball = pivot.sqrt(prec);
            for i in j + 1..n {
                let mut s: Ball = self.at(j, i).clone();
                (0..j).for_each(|k| s = s.sub(&c.at(k, j).mul(c.at(k, i), prec), prec));
                *c.at_mut(j, i) = s.div(&d, prec);
            }
            *c.at_mut(j, j) = d;
        }
        Some(c)
    }

    /// Inverse of an upper-triangular matrix by back substitution.
    pub fn upper_inverse(&self, prec: u32) -> Option<BallMat> {
        assert!(self.is_square(), "upper_inverse: matrix is {}x{}", self.rows, self.cols);
        let n: usize = self.rows;
        if (0..n).any(|i| self.at(i, i).contains_zero()) {
            return None;
        }
        let mut x: BallMat = BallMat::new(n, n);
        for j in 0..n {
            *x.at_mut(j, j) = Ball::one().div(self.at(j, j), prec);
            for i in (0..j).rev() {
                let mut s: Ball = Ball::zero();
                (i + 1..=j).for_each(|k| s = s.add(&self.at(i, k).mul(x.at(k, j), prec), prec));
                *x.at_mut(i, j) = s.neg().div(self.at(i, i), prec);
            }
        }
        Some(x)
    }

    /// Solves `self^T w = y` for upper-triangular `self` (forward substitution).
    pub fn solve_upper_transpose(&self, y: &[Ball], prec: u32) -> Vec<Ball> {
        assert!(self.is_square());
        assert_eq!(y.len(), self.rows);
        let n: usize = self.rows;
        let mut w: Vec<Ball> = Vec::with_capacity(n);
        for i in 0..n {
            let mut s: Ball = y[i].clone();
            izip!(0..i, w.iter()).for_each(|(k, wk)| s = s.sub(&self.at(k, i).mul(wk, prec), prec));
            w.push(s.div(self.at(i, i), prec));
        }
        w
    }

    /// Upper bound on the Frobenius norm.
    pub fn frobenius_ubound(&self) -> Mag {
        self.data
            .iter()
            .fold(Mag::zero(), |acc, x| {
                let a: Mag = x.abs_ubound();
                acc.add(&a.mul(&a))
            })
            .sqrt()
    }
}

/// Dense row-major matrix of complex balls.
#[derive(Clone, Debug)]
pub struct CBallMat {
    rows: usize,
    cols: usize,
    data: Vec<CBall>,
}

impl CBallMat {
    pub fn new(rows: usize, cols: usize) -> Self {
        CBallMat {
            rows,
            cols,
            data: vec![CBall::zero(); rows * cols],
        }
    }

    /// Builds an exact matrix from row-major real and imaginary parts.
    pub fn from_f64(rows: usize, cols: usize, re: &[f64], im: &[f64]) -> Self {
        assert_eq!(re.len(), rows * cols);
        assert_eq!(im.len(), rows * cols);
        CBallMat {
            rows,
            cols,
            data: izip!(re.iter(), im.iter()).map(|(x, y)| CBall::from_f64(*x, *y)).collect(),
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    pub fn at(&self, i: usize, j: usize) -> &CBall {
        debug_assert!(i < self.rows && j < self.cols);
        &self.data[i * self.cols + j]
    }

    pub fn at_mut(&mut self, i: usize, j: usize) -> &mut CBall {
        debug_assert!(i < self.rows && j < self.cols);
        &mut self.data[i * self.cols + j]
    }

    pub fn real_part(&self) -> BallMat {
        BallMat {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|x| x.re().clone()).collect(),
        }
    }

    pub fn imag_part(&self) -> BallMat {
        BallMat {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|x| x.im().clone()).collect(),
        }
    }

    pub fn mul_2exp(&self, e: i32) -> CBallMat {
        CBallMat {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|x| x.mul_2exp(e)).collect(),
        }
    }
}
