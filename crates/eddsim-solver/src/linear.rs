//! Dense linear system solvers.

use nalgebra::{DMatrix, DVector};
use num_complex::Complex;

use crate::error::{Error, Result};

fn check_dimensions(rows: usize, cols: usize, rhs: usize) -> Result<()> {
    if rows != cols {
        return Err(Error::DimensionMismatch {
            expected: rows,
            actual: cols,
        });
    }
    if rows != rhs {
        return Err(Error::DimensionMismatch {
            expected: rows,
            actual: rhs,
        });
    }
    Ok(())
}

/// Solve a linear system Ax = b using LU decomposition.
pub fn solve_dense(a: &DMatrix<f64>, b: &DVector<f64>) -> Result<DVector<f64>> {
    check_dimensions(a.nrows(), a.ncols(), b.len())?;
    a.clone().lu().solve(b).ok_or(Error::SingularMatrix)
}

/// Solve a complex linear system Ax = b using LU decomposition.
pub fn solve_complex(
    a: &DMatrix<Complex<f64>>,
    b: &DVector<Complex<f64>>,
) -> Result<DVector<Complex<f64>>> {
    check_dimensions(a.nrows(), a.ncols(), b.len())?;
    a.clone().lu().solve(b).ok_or(Error::SingularMatrix)
}
