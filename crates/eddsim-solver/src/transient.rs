//! Transient time-domain analysis.
//!
//! Fixed-step integration starting from a DC operating point. Each step
//! runs a Newton loop over the devices' transient companion models and,
//! once converged, commits every device's charge history.

use eddsim_core::{AnalysisMode, IntegrationMethod, Integrator, Netlist, NodeId};
use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use crate::dc::DcSolution;
use crate::error::{Error, Result};
use crate::newton::{solve_newton_raphson, ConvergenceCriteria};

/// Transient analysis parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransientParams {
    /// Stop time (s).
    pub tstop: f64,
    /// Timestep (s).
    pub tstep: f64,
    /// Integration method.
    pub method: IntegrationMethod,
}

impl TransientParams {
    /// Number of fixed steps needed to reach `tstop`.
    ///
    /// A `tstop/tstep` ratio landing a rounding error above an integer does
    /// not add a step.
    pub fn num_steps(&self) -> Result<usize> {
        if !(self.tstep.is_finite() && self.tstep > 0.0) {
            return Err(Error::InvalidParameter(format!(
                "timestep must be positive and finite, got {}",
                self.tstep
            )));
        }
        if !(self.tstop.is_finite() && self.tstop >= 0.0) {
            return Err(Error::InvalidParameter(format!(
                "stop time must be non-negative and finite, got {}",
                self.tstop
            )));
        }
        Ok((self.tstop / self.tstep - 1e-9).ceil().max(0.0) as usize)
    }
}

impl Default for TransientParams {
    fn default() -> Self {
        Self {
            tstop: 1e-6,
            tstep: 1e-9,
            method: IntegrationMethod::Trapezoidal,
        }
    }
}

/// Solution at one timepoint.
#[derive(Debug, Clone)]
pub struct TimePoint {
    pub time: f64,
    pub solution: DVector<f64>,
}

/// Result of a transient simulation.
#[derive(Debug, Clone)]
pub struct TransientResult {
    pub points: Vec<TimePoint>,
    pub num_nodes: usize,
}

impl TransientResult {
    /// Get the voltage at a node across all timepoints.
    pub fn voltage_waveform(&self, node: NodeId) -> Vec<(f64, f64)> {
        self.points
            .iter()
            .map(|tp| (tp.time, node.voltage_in(&tp.solution)))
            .collect()
    }

    /// Get all time values.
    pub fn times(&self) -> Vec<f64> {
        self.points.iter().map(|tp| tp.time).collect()
    }
}

/// Run a transient simulation from the operating point `dc`.
pub fn solve_transient(
    netlist: &mut Netlist,
    params: &TransientParams,
    dc: &DcSolution,
) -> Result<TransientResult> {
    netlist.validate()?;
    let num_steps = params.num_steps()?;
    let num_nodes = netlist.num_nodes();
    let num_vsources = netlist.num_current_vars();
    let criteria = ConvergenceCriteria::default();
    let integrator = Integrator::new(params.method, params.tstep);

    netlist.init(AnalysisMode::Transient)?;
    let mut solution = dc.to_vector();
    netlist.init_transient_states(&solution)?;

    let mut result = TransientResult {
        points: vec![TimePoint {
            time: 0.0,
            solution: solution.clone(),
        }],
        num_nodes,
    };

    log::debug!(
        "transient: {} steps of {} s ({:?})",
        num_steps,
        params.tstep,
        params.method
    );

    for step in 1..=num_steps {
        let time = step as f64 * params.tstep;
        let nr = solve_newton_raphson(
            num_nodes,
            num_vsources,
            &criteria,
            Some(&solution),
            |mna, x| {
                netlist.stamp_transient(mna, x, &integrator, time)?;
                Ok(())
            },
        )?;

        if !nr.converged {
            log::warn!("transient step at t = {} s did not converge", time);
            return Err(Error::ConvergenceFailed {
                iterations: nr.iterations,
            });
        }

        netlist.accept_step();
        solution = nr.solution;
        result.points.push(TimePoint {
            time,
            solution: solution.clone(),
        });
    }

    Ok(result)
}
