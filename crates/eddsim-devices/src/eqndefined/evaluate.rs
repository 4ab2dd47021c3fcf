//! Evaluation of the compiled equations at a solution point.

use std::f64::consts::PI;

use nalgebra::{DMatrix, DVector};
use num_complex::Complex;

use crate::error::{Error, Result};
use crate::expression::{EqnId, EquationRegistry};

use super::EqnDefined;

/// Charges and Jacobians captured at a converged operating point.
///
/// Indexed by branch: `jstat[(i, j)] = ∂I_i/∂V_j`,
/// `jdyna[(i, j)] = dQ_i/dV_j`, `charges[i] = Q_i`.
#[derive(Debug, Clone, PartialEq)]
pub struct OperatingPoint {
    pub jstat: DMatrix<f64>,
    pub jdyna: DMatrix<f64>,
    pub charges: DVector<f64>,
}

impl OperatingPoint {
    pub fn zeros(branches: usize) -> Self {
        Self {
            jstat: DMatrix::zeros(branches, branches),
            jdyna: DMatrix::zeros(branches, branches),
            charges: DVector::zeros(branches),
        }
    }
}

/// Evaluate an equation, treating an absent one as zero.
pub(crate) fn evaluate(registry: &mut EquationRegistry, eqn: Option<EqnId>) -> Result<f64> {
    match eqn {
        Some(id) => registry.evaluate(id),
        None => Ok(0.0),
    }
}

impl EqnDefined {
    /// Voltage across branch `i` (port `2i` minus port `2i+1`).
    fn branch_voltage(&self, solution: &DVector<f64>, i: usize) -> f64 {
        self.terminals[2 * i].voltage_in(solution) - self.terminals[2 * i + 1].voltage_in(solution)
    }

    /// Bind every branch-voltage unknown to the potentials in `solution`.
    pub(crate) fn update_operating_point(&mut self, solution: &DVector<f64>) {
        let voltages: Vec<f64> = (0..self.branches())
            .map(|i| self.branch_voltage(solution, i))
            .collect();
        if let Some(model) = &self.model {
            let mut registry = self.registry.borrow_mut();
            for (i, v) in voltages.iter().enumerate() {
                registry.set_value(model.voltage(i), *v);
            }
        }
        self.voltages = voltages;
    }

    /// Stamp the Newton companion of every branch current.
    ///
    /// Branch `i` drives `I_i` from port `2i` to port `2i+1` and carries the
    /// conductances `G_ij` as four-entry blocks between branch `i` and `j`.
    pub(crate) fn stamp_currents(&mut self) -> Result<()> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| Error::NotCompiled(self.name.clone()))?;
        let mut registry = self.registry.borrow_mut();
        let n = model.branches();
        for i in 0..n {
            let r = 2 * i;
            let current = evaluate(&mut registry, model.current(i))?;
            self.stamps.set_i(r, -current);
            self.stamps.set_i(r + 1, current);

            let mut gv = 0.0;
            for j in 0..n {
                let c = 2 * j;
                let g = evaluate(&mut registry, model.conductance(i, j))?;
                self.stamps.set_y(r, c, g);
                self.stamps.set_y(r + 1, c + 1, g);
                self.stamps.set_y(r, c + 1, -g);
                self.stamps.set_y(r + 1, c, -g);
                gv += g * self.voltages[j];
            }

            if self.do_hb {
                self.stamps.set_gv(r, gv);
                self.stamps.set_gv(r + 1, -gv);
            } else {
                self.stamps.add_i(r, gv);
                self.stamps.add_i(r + 1, -gv);
            }
        }
        Ok(())
    }

    /// Evaluate charges and both Jacobians at the bound voltages.
    pub(crate) fn capture_operating_point(&mut self) -> Result<()> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| Error::NotCompiled(self.name.clone()))?;
        let mut registry = self.registry.borrow_mut();
        let n = model.branches();
        for i in 0..n {
            self.op.charges[i] = evaluate(&mut registry, model.charge(i))?;
            for j in 0..n {
                self.op.jstat[(i, j)] = evaluate(&mut registry, model.conductance(i, j))?;
                self.op.jdyna[(i, j)] = evaluate(&mut registry, model.capacitance(i, j))?;
            }
        }
        Ok(())
    }

    /// Port admittance `Y = jstat + j·2πf·jdyna` expanded into four-entry
    /// blocks over the `2n` ports.
    pub fn build_admittance(&self, frequency: f64) -> DMatrix<Complex<f64>> {
        let n = self.branches();
        let omega = 2.0 * PI * frequency;
        let mut y = DMatrix::from_element(2 * n, 2 * n, Complex::new(0.0, 0.0));
        for i in 0..n {
            let r = 2 * i;
            for j in 0..n {
                let c = 2 * j;
                let val = Complex::new(self.op.jstat[(i, j)], omega * self.op.jdyna[(i, j)]);
                y[(r, c)] += val;
                y[(r + 1, c + 1)] += val;
                y[(r, c + 1)] -= val;
                y[(r + 1, c)] -= val;
            }
        }
        y
    }
}
