//! Gaussian elimination over the complex field, for AC analysis.

use farad_core::{Error, Result};
use nalgebra::{DMatrix, DVector};
use num_complex::Complex;

use crate::linear::PIVOT_FLOOR;

/// Solve a complex system `Ax = b` by Gaussian elimination with partial
/// pivoting on the modulus. The caller's system is not mutated.
pub fn solve_complex(
    a: &DMatrix<Complex<f64>>,
    b: &DVector<Complex<f64>>,
) -> Result<DVector<Complex<f64>>> {
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
    let n = a.nrows();
    if n == 0 {
        return Ok(DVector::zeros(0));
    }
    let mut a = a.clone_owned();
    let mut b = b.clone_owned();

    for k in 0..n {
        let mut pivot = k;
        for i in (k + 1)..n {
            if a[(i, k)].norm() > a[(pivot, k)].norm() {
                pivot = i;
            }
        }
        if pivot != k {
            a.swap_rows(k, pivot);
            b.swap_rows(k, pivot);
        }
        if a[(k, k)].norm() < PIVOT_FLOOR {
            return Err(Error::Singular);
        }
        for i in (k + 1)..n {
            let factor = a[(i, k)] / a[(k, k)];
            for j in k..n {
                let delta = factor * a[(k, j)];
                a[(i, j)] -= delta;
            }
            let delta = factor * b[k];
            b[i] -= delta;
        }
    }

    let mut x = DVector::zeros(n);
    for i in (0..n).rev() {
        let mut sum = Complex::new(0.0, 0.0);
        for j in (i + 1)..n {
            sum += a[(i, j)] * x[j];
        }
        x[i] = (b[i] - sum) / a[(i, i)];
    }
    Ok(x)
}
