//! AC small-signal frequency-domain analysis.

use std::f64::consts::PI;

use eddsim_core::{AnalysisMode, ComplexMna, Netlist, NodeId};
use nalgebra::DVector;
use num_complex::Complex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::linear::solve_complex;

/// AC sweep type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AcSweepType {
    /// Linear frequency spacing.
    Linear,
    /// Logarithmic spacing, points per decade.
    Decade,
    /// Logarithmic spacing, points per octave.
    Octave,
}

/// AC analysis parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcParams {
    /// Start frequency (Hz).
    pub fstart: f64,
    /// Stop frequency (Hz).
    pub fstop: f64,
    /// Number of points (total for Linear, per decade/octave for log sweeps).
    pub num_points: usize,
    /// Sweep type.
    pub sweep_type: AcSweepType,
}

impl Default for AcParams {
    fn default() -> Self {
        Self {
            fstart: 1.0,
            fstop: 1e9,
            num_points: 10,
            sweep_type: AcSweepType::Decade,
        }
    }
}

impl AcParams {
    /// Reject sweeps that would yield no points or non-finite frequencies.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(Error::InvalidParameter(msg));
        if self.num_points == 0 {
            return invalid("AC sweep needs at least one point".into());
        }
        if !self.fstart.is_finite() || !self.fstop.is_finite() {
            return invalid(format!(
                "AC sweep bounds must be finite, got {} to {}",
                self.fstart, self.fstop
            ));
        }
        if self.fstop < self.fstart {
            return invalid(format!(
                "AC sweep stop {} Hz is below start {} Hz",
                self.fstop, self.fstart
            ));
        }
        match self.sweep_type {
            AcSweepType::Linear if self.fstart < 0.0 => {
                invalid(format!("negative start frequency {} Hz", self.fstart))
            }
            AcSweepType::Decade | AcSweepType::Octave if self.fstart <= 0.0 => invalid(format!(
                "logarithmic sweep needs a positive start frequency, got {} Hz",
                self.fstart
            )),
            _ => Ok(()),
        }
    }
}

/// Frequencies visited by a sweep.
pub fn generate_frequencies(params: &AcParams) -> Result<Vec<f64>> {
    params.validate()?;
    let freqs = match params.sweep_type {
        AcSweepType::Linear if params.num_points == 1 => vec![params.fstart],
        AcSweepType::Linear => {
            let step = (params.fstop - params.fstart) / (params.num_points as f64 - 1.0);
            (0..params.num_points)
                .map(|i| params.fstart + step * i as f64)
                .collect()
        }
        AcSweepType::Decade => log_sweep(params, 10.0),
        AcSweepType::Octave => log_sweep(params, 2.0),
    };
    Ok(freqs)
}

fn log_sweep(params: &AcParams, base: f64) -> Vec<f64> {
    let spans = (params.fstop / params.fstart).log(base);
    let total_points = (params.num_points as f64 * spans).ceil() as usize + 1;
    (0..total_points)
        .map(|i| params.fstart * base.powf(i as f64 / params.num_points as f64))
        .filter(|&f| f <= params.fstop * 1.001)
        .collect()
}

/// Solution at one frequency.
#[derive(Debug, Clone)]
pub struct AcPoint {
    pub frequency: f64,
    pub solution: DVector<Complex<f64>>,
}

/// Result of an AC sweep.
#[derive(Debug, Clone)]
pub struct AcResult {
    pub points: Vec<AcPoint>,
    pub num_nodes: usize,
}

impl AcResult {
    /// Complex voltage at `node` across the sweep.
    pub fn voltage_at(&self, node: NodeId) -> Vec<(f64, Complex<f64>)> {
        self.points
            .iter()
            .map(|p| {
                let v = node
                    .mna_index()
                    .map_or(Complex::new(0.0, 0.0), |idx| p.solution[idx]);
                (p.frequency, v)
            })
            .collect()
    }

    pub fn magnitude_db(&self, node: NodeId) -> Vec<(f64, f64)> {
        self.voltage_at(node)
            .into_iter()
            .map(|(f, v)| (f, 20.0 * v.norm().log10()))
            .collect()
    }

    pub fn phase_deg(&self, node: NodeId) -> Vec<(f64, f64)> {
        self.voltage_at(node)
            .into_iter()
            .map(|(f, v)| (f, v.arg() * 180.0 / PI))
            .collect()
    }

    pub fn frequencies(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.frequency).collect()
    }
}

/// Run an AC sweep around the operating point saved by the last DC solve.
pub fn solve_ac(netlist: &mut Netlist, params: &AcParams) -> Result<AcResult> {
    netlist.validate()?;
    let num_nodes = netlist.num_nodes();
    let num_vsources = netlist.num_current_vars();
    let frequencies = generate_frequencies(params)?;
    log::debug!("AC sweep: {} frequency points", frequencies.len());

    netlist.init(AnalysisMode::Ac)?;

    let mut result = AcResult {
        points: Vec::with_capacity(frequencies.len()),
        num_nodes,
    };

    for frequency in frequencies {
        let mut mna = ComplexMna::new(num_nodes, num_vsources);
        netlist.stamp_ac(&mut mna, frequency)?;
        let solution = solve_complex(mna.matrix(), mna.rhs())?;
        result.points.push(AcPoint {
            frequency,
            solution,
        });
    }

    Ok(result)
}
