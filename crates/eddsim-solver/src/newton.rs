//! Damping-free Newton iteration over a re-stamped MNA system.
//!
//! Every iteration clears the system, lets the caller linearize all
//! devices at the present solution, and solves for the next one. The
//! caller decides what "stamp" means (DC, or one transient timestep).

use eddsim_core::MnaSystem;
use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::linear::solve_dense;

/// Per-unknown update tolerances and the iteration cap.
///
/// Node rows use `v_reltol·|x| + v_abstol`, branch-current rows use
/// `v_reltol·|x| + i_abstol`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvergenceCriteria {
    pub v_abstol: f64,
    pub v_reltol: f64,
    pub i_abstol: f64,
    pub max_iterations: usize,
}

impl Default for ConvergenceCriteria {
    fn default() -> Self {
        Self {
            v_abstol: 1e-6,
            v_reltol: 1e-3,
            i_abstol: 1e-12,
            max_iterations: 50,
        }
    }
}

impl ConvergenceCriteria {
    /// Whether the step `old → new` is small enough on every row.
    pub fn settled(&self, old: &DVector<f64>, new: &DVector<f64>, num_nodes: usize) -> bool {
        old.iter().zip(new.iter()).enumerate().all(|(row, (a, b))| {
            let abstol = if row < num_nodes {
                self.v_abstol
            } else {
                self.i_abstol
            };
            (b - a).abs() <= self.v_reltol * a.abs().max(b.abs()) + abstol
        })
    }
}

/// Where the iteration stopped.
#[derive(Debug, Clone)]
pub struct NewtonOutcome {
    pub solution: DVector<f64>,
    pub iterations: usize,
    pub converged: bool,
}

/// Iterate until [`ConvergenceCriteria::settled`] or the cap is hit.
///
/// `stamp` receives a cleared system and the solution to linearize at.
/// A non-converged run is not an error here; the last iterate is returned
/// with `converged == false` and the analysis decides what to do.
pub fn solve_newton_raphson<F>(
    num_nodes: usize,
    num_branches: usize,
    criteria: &ConvergenceCriteria,
    start: Option<&DVector<f64>>,
    mut stamp: F,
) -> Result<NewtonOutcome>
where
    F: FnMut(&mut MnaSystem, &DVector<f64>) -> Result<()>,
{
    let mut mna = MnaSystem::new(num_nodes, num_branches);
    let mut solution = start
        .cloned()
        .unwrap_or_else(|| DVector::zeros(mna.size()));

    for iteration in 1..=criteria.max_iterations {
        mna.clear();
        stamp(&mut mna, &solution)?;
        let next = solve_dense(mna.matrix(), mna.rhs())?;
        let converged = criteria.settled(&solution, &next, num_nodes);
        solution = next;
        if converged {
            return Ok(NewtonOutcome {
                solution,
                iterations: iteration,
                converged,
            });
        }
    }

    Ok(NewtonOutcome {
        solution,
        iterations: criteria.max_iterations,
        converged: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const IS: f64 = 1e-14;
    const NVT: f64 = 0.02585;

    /// 5V → 1k → junction → exponential diode → ground.
    fn stamp_diode_circuit(mna: &mut MnaSystem, x: &DVector<f64>) -> Result<()> {
        mna.stamp_voltage_source(Some(0), None, 0, 5.0);
        mna.stamp_conductance(Some(0), Some(1), 1e-3);

        let vd = x[1].min(0.8);
        let id = IS * ((vd / NVT).exp() - 1.0);
        let gd = IS / NVT * (vd / NVT).exp();
        mna.stamp_conductance(Some(1), None, gd);
        mna.stamp_current_source(Some(1), None, id - gd * vd);
        Ok(())
    }

    #[test]
    fn test_diode_junction_balances_kcl() {
        let out = solve_newton_raphson(
            2,
            1,
            &ConvergenceCriteria::default(),
            None,
            stamp_diode_circuit,
        )
        .unwrap();

        assert!(out.converged);
        let vd = out.solution[1];
        assert!(vd > 0.6 && vd < 0.75, "junction at {vd} V");
        let ir = (5.0 - vd) / 1e3;
        let id = IS * ((vd / NVT).exp() - 1.0);
        assert!((ir - id).abs() < 1e-5, "ir = {ir}, id = {id}");
    }

    #[test]
    fn test_linear_system_settles_on_second_pass() {
        let out = solve_newton_raphson(2, 1, &ConvergenceCriteria::default(), None, |mna, _| {
            mna.stamp_voltage_source(Some(0), None, 0, 10.0);
            mna.stamp_conductance(Some(0), Some(1), 1e-3);
            mna.stamp_conductance(Some(1), None, 1e-3);
            Ok(())
        })
        .unwrap();

        assert!(out.converged);
        assert_eq!(out.iterations, 2);
        assert!((out.solution[1] - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_iteration_cap() {
        let criteria = ConvergenceCriteria {
            max_iterations: 3,
            ..Default::default()
        };
        // The target moves by 1V every pass, so it never settles.
        let mut target = 0.0;
        let out = solve_newton_raphson(1, 0, &criteria, None, |mna, _| {
            target += 1.0;
            mna.stamp_conductance(Some(0), None, 1.0);
            mna.stamp_current_source(None, Some(0), target);
            Ok(())
        })
        .unwrap();

        assert!(!out.converged);
        assert_eq!(out.iterations, 3);
        assert_eq!(out.solution[0], 3.0);
    }

    #[test]
    fn test_branch_rows_use_current_tolerance() {
        let criteria = ConvergenceCriteria::default();
        let old = DVector::from_vec(vec![1.0, 0.0]);
        let new = DVector::from_vec(vec![1.0 + 5e-7, 1e-9]);
        assert!(criteria.settled(&old, &new, 2));
        // The same 1nA step on a branch-current row exceeds i_abstol.
        assert!(!criteria.settled(&old, &new, 1));
    }
}
