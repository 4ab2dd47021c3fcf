//! S-parameter extraction for a single equation-defined device.

use eddsim_devices::EqnDefined;
use nalgebra::{DMatrix, DVector};
use num_complex::Complex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// S-parameter analysis options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpParams {
    /// Reference impedance of every port (Ω).
    pub z0: f64,
}

impl Default for SpParams {
    fn default() -> Self {
        Self { z0: 50.0 }
    }
}

/// Scattering matrix at one frequency.
#[derive(Debug, Clone)]
pub struct SpPoint {
    pub frequency: f64,
    pub s: DMatrix<Complex<f64>>,
}

/// Scattering matrices of `device` biased at `bias`, one per frequency.
///
/// Every terminal is a port referenced to ground, so a device with `2n`
/// terminals yields `2n × 2n` matrices.
pub fn device_sparameters(
    device: &mut EqnDefined,
    bias: &DVector<f64>,
    frequencies: &[f64],
    params: &SpParams,
) -> Result<Vec<SpPoint>> {
    device.init_sp()?;
    device.save_operating_points(bias)?;

    frequencies
        .iter()
        .map(|&frequency| {
            device.calc_sp(frequency, params.z0)?;
            let s = device
                .stamps()
                .matrix_s()
                .cloned()
                .ok_or_else(|| Error::MissingSParameters(device.name().to_string()))?;
            Ok(SpPoint { frequency, s })
        })
        .collect()
}
