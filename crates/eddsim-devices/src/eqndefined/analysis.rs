//! Per-analysis entry points: DC, AC, transient, S-parameter and
//! harmonic balance.

use eddsim_core::{y_to_s, ChargeState, DeviceStamps, Integrator};
use nalgebra::DVector;

use crate::error::Result;

use super::EqnDefined;

impl EqnDefined {
    /// Prepare for DC analysis.
    pub fn init_dc(&mut self) -> Result<()> {
        self.do_hb = false;
        self.stamps = DeviceStamps::alloc_mna(self.terminals.len());
        self.ensure_compiled()
    }

    /// Linearize the branch currents around `solution`.
    pub fn calc_dc(&mut self, solution: &DVector<f64>) -> Result<()> {
        self.ensure_compiled()?;
        self.update_operating_point(solution);
        self.stamp_currents()
    }

    /// Record charges and Jacobians at a converged `solution`.
    pub fn save_operating_points(&mut self, solution: &DVector<f64>) -> Result<()> {
        self.ensure_compiled()?;
        self.update_operating_point(solution);
        self.capture_operating_point()
    }

    pub fn init_ac(&mut self) -> Result<()> {
        self.init_dc()
    }

    /// Stamp the small-signal admittance from the saved operating point.
    pub fn calc_ac(&mut self, frequency: f64) {
        let y = self.build_admittance(frequency);
        self.stamps.set_matrix_y(y);
    }

    pub fn init_sp(&mut self) -> Result<()> {
        self.do_hb = false;
        self.stamps = DeviceStamps::alloc_s(self.terminals.len());
        self.ensure_compiled()
    }

    /// Scattering matrix of the device at `frequency` against `z0` ohms.
    pub fn calc_sp(&mut self, frequency: f64, z0: f64) -> Result<()> {
        let s = y_to_s(&self.build_admittance(frequency), z0)?;
        self.stamps.set_matrix_s(s);
        Ok(())
    }

    /// Prepare for transient analysis: one charge history per branch.
    pub fn init_tr(&mut self) -> Result<()> {
        self.init_dc()?;
        self.states = vec![ChargeState::default(); self.branches()];
        Ok(())
    }

    /// Seed the charge histories from the DC `solution`.
    pub fn init_transient_state(&mut self, solution: &DVector<f64>) -> Result<()> {
        self.save_operating_points(solution)?;
        let charges = &self.op.charges;
        for (state, q) in self.states.iter_mut().zip(charges.iter()) {
            state.prime(*q);
        }
        Ok(())
    }

    /// Stamp the companion model of the present timestep.
    ///
    /// Without a prior `init_transient_state` the histories start at rest
    /// from the charges at `solution`.
    pub fn calc_tr(&mut self, solution: &DVector<f64>, integrator: &Integrator) -> Result<()> {
        self.calc_dc(solution)?;
        self.capture_operating_point()?;

        let n = self.branches();
        if self.states.len() != n {
            self.states = self
                .op
                .charges
                .iter()
                .map(|q| {
                    let mut state = ChargeState::default();
                    state.prime(*q);
                    state
                })
                .collect();
        }
        for i in 0..n {
            let r = 2 * i;
            let current = integrator.integrate(&mut self.states[i], self.op.charges[i]);
            self.stamps.transient_charge(r, r + 1, current);
            for j in 0..n {
                let c = 2 * j;
                let g = integrator.conductance(self.op.jdyna[(i, j)]);
                self.stamps
                    .transient_capacitance(r, r + 1, c, c + 1, g, self.voltages[j]);
            }
        }
        Ok(())
    }

    /// Commit the present charges as history.
    pub fn accept_step(&mut self) {
        for state in &mut self.states {
            state.accept();
        }
    }

    /// Prepare for harmonic balance.
    pub fn init_hb(&mut self) -> Result<()> {
        self.do_hb = true;
        self.stamps = DeviceStamps::alloc_hb(self.terminals.len());
        self.ensure_compiled()
    }

    /// Stamp the currents, charges and charge Jacobian at `solution`.
    pub fn calc_hb(&mut self, solution: &DVector<f64>) -> Result<()> {
        if !self.do_hb || self.stamps.hb().is_none() {
            self.init_hb()?;
        }
        self.calc_dc(solution)?;
        self.capture_operating_point()?;

        let n = self.branches();
        for i in 0..n {
            let r = 2 * i;
            let q = self.op.charges[i];
            self.stamps.set_q(r, -q);
            self.stamps.set_q(r + 1, q);

            let mut cv = 0.0;
            for j in 0..n {
                let c = 2 * j;
                let val = self.op.jdyna[(i, j)];
                self.stamps.set_qv(r, c, val);
                self.stamps.set_qv(r + 1, c + 1, val);
                self.stamps.set_qv(r, c + 1, -val);
                self.stamps.set_qv(r + 1, c, -val);
                cv += val * self.voltages[j];
            }
            self.stamps.set_cv(r, cv);
            self.stamps.set_cv(r + 1, -cv);
        }
        Ok(())
    }
}
