//! Dense direct solvers for real linear systems.

use farad_core::{Error, Result};
use nalgebra::{DMatrix, DVector};

/// Pivot magnitude below which a system is reported singular.
pub const PIVOT_FLOOR: f64 = 1e-12;

/// A dense direct solver for `Ax = b` over the reals.
///
/// Implementations work on copies; the caller's matrix and right-hand
/// side are never mutated.
pub trait LinearSolver {
    fn solve(&self, a: &DMatrix<f64>, b: &DVector<f64>) -> Result<DVector<f64>>;
}

fn check_dimensions(a: &DMatrix<f64>, b: &DVector<f64>) -> Result<()> {
    if a.nrows() != a.ncols() {
        return Err(Error::DimensionMismatch {
            expected: a.nrows(),
            actual: a.ncols(),
        });
    }
    if a.nrows() != b.len() {
        return Err(Error::DimensionMismatch {
            expected: a.nrows(),
            actual: b.len(),
        });
    }
    Ok(())
}

/// Gaussian elimination with partial pivoting.
///
/// The robust default: each column pivots on the largest remaining
/// magnitude before eliminating below it.
#[derive(Debug, Clone, Copy, Default)]
pub struct GaussianElimination;

impl LinearSolver for GaussianElimination {
    fn solve(&self, a: &DMatrix<f64>, b: &DVector<f64>) -> Result<DVector<f64>> {
        check_dimensions(a, b)?;
        let n = a.nrows();
        if n == 0 {
            return Ok(DVector::zeros(0));
        }
        let mut a = a.clone_owned();
        let mut b = b.clone_owned();

        for k in 0..n {
            let mut pivot = k;
            for i in (k + 1)..n {
                if a[(i, k)].abs() > a[(pivot, k)].abs() {
                    pivot = i;
                }
            }
            if pivot != k {
                a.swap_rows(k, pivot);
                b.swap_rows(k, pivot);
            }
            if a[(k, k)].abs() < PIVOT_FLOOR {
                return Err(Error::Singular);
            }
            for i in (k + 1)..n {
                let factor = a[(i, k)] / a[(k, k)];
                for j in k..n {
                    a[(i, j)] -= factor * a[(k, j)];
                }
                b[i] -= factor * b[k];
            }
        }

        let mut x = DVector::zeros(n);
        for i in (0..n).rev() {
            let mut sum = 0.0;
            for j in (i + 1)..n {
                sum += a[(i, j)] * x[j];
            }
            x[i] = (b[i] - sum) / a[(i, i)];
        }
        Ok(x)
    }
}

/// Doolittle LU factorization without pivoting.
///
/// L is unit-lower-triangular, U upper-triangular. No row exchanges are
/// performed, so results match `GaussianElimination` bit-for-bit only on
/// systems that never need a pivot swap; prefer the elimination solver
/// when conditioning is unknown.
#[derive(Debug, Clone, Copy, Default)]
pub struct LuDecomposition;

impl LinearSolver for LuDecomposition {
    fn solve(&self, a: &DMatrix<f64>, b: &DVector<f64>) -> Result<DVector<f64>> {
        check_dimensions(a, b)?;
        let n = a.nrows();
        if n == 0 {
            return Ok(DVector::zeros(0));
        }

        let mut l = DMatrix::zeros(n, n);
        let mut u = DMatrix::zeros(n, n);
        for i in 0..n {
            l[(i, i)] = 1.0;
            for k in i..n {
                let mut sum = 0.0;
                for j in 0..i {
                    sum += l[(i, j)] * u[(j, k)];
                }
                u[(i, k)] = a[(i, k)] - sum;
            }
            for k in (i + 1)..n {
                if u[(i, i)].abs() < PIVOT_FLOOR {
                    return Err(Error::Singular);
                }
                let mut sum = 0.0;
                for j in 0..i {
                    sum += l[(k, j)] * u[(j, i)];
                }
                l[(k, i)] = (a[(k, i)] - sum) / u[(i, i)];
            }
        }

        // Forward-substitute Ly = b, then back-substitute Ux = y.
        let mut y = DVector::zeros(n);
        for i in 0..n {
            let mut sum = 0.0;
            for j in 0..i {
                sum += l[(i, j)] * y[j];
            }
            y[i] = (b[i] - sum) / l[(i, i)];
        }

        let mut x = DVector::zeros(n);
        for i in (0..n).rev() {
            if u[(i, i)].abs() < PIVOT_FLOOR {
                return Err(Error::Singular);
            }
            let mut sum = 0.0;
            for j in (i + 1)..n {
                sum += u[(i, j)] * x[j];
            }
            x[i] = (y[i] - sum) / u[(i, i)];
        }
        Ok(x)
    }
}
