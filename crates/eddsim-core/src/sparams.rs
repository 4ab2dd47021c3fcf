//! Admittance to scattering parameter conversion.

use nalgebra::DMatrix;
use num_complex::Complex;

use crate::error::{Error, Result};

/// Convert an admittance matrix to S-parameters with a common reference
/// impedance `z0` on every port:
///
/// S = (I - Z0·Y) · (I + Z0·Y)^{-1}
pub fn y_to_s(y: &DMatrix<Complex<f64>>, z0: f64) -> Result<DMatrix<Complex<f64>>> {
    if y.nrows() != y.ncols() {
        return Err(Error::DimensionMismatch {
            expected: y.nrows(),
            actual: y.ncols(),
        });
    }

    let n = y.nrows();
    let identity = DMatrix::<Complex<f64>>::identity(n, n);
    let zy = y * Complex::new(z0, 0.0);

    let inverse = (&identity + &zy)
        .try_inverse()
        .ok_or(Error::SingularConversion)?;

    Ok((identity - zy) * inverse)
}
