//! Numerical integration of device charges for transient analysis.
//!
//! A charge `q(t)` is discretized into an equivalent current `i = dq/dt`
//! and a companion conductance `g = coefficient · dq/dv`.

use serde::{Deserialize, Serialize};

/// Integration method for transient analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntegrationMethod {
    /// Backward Euler (first order, A-stable).
    BackwardEuler,
    /// Trapezoidal (second order, A-stable).
    Trapezoidal,
}

/// History of one integrated charge.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChargeState {
    /// Charge at the point being solved.
    pub q: f64,
    /// Current at the point being solved.
    pub i: f64,
    /// Charge at the last accepted timepoint.
    pub q_prev: f64,
    /// Current at the last accepted timepoint.
    pub i_prev: f64,
}

impl ChargeState {
    /// Start integration from a settled (DC) charge with no current flowing.
    pub fn prime(&mut self, q: f64) {
        *self = ChargeState {
            q,
            i: 0.0,
            q_prev: q,
            i_prev: 0.0,
        };
    }

    /// Make the present point the history for the next timestep.
    pub fn accept(&mut self) {
        self.q_prev = self.q;
        self.i_prev = self.i;
    }
}

/// Integrator for a single timestep of size `h`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Integrator {
    pub method: IntegrationMethod,
    pub h: f64,
}

impl Integrator {
    pub fn new(method: IntegrationMethod, h: f64) -> Self {
        Self { method, h }
    }

    /// Coefficient of the present value in the discretized derivative.
    pub fn coefficient(&self) -> f64 {
        match self.method {
            IntegrationMethod::BackwardEuler => 1.0 / self.h,
            IntegrationMethod::Trapezoidal => 2.0 / self.h,
        }
    }

    /// Companion conductance of a capacitance.
    pub fn conductance(&self, capacitance: f64) -> f64 {
        capacitance * self.coefficient()
    }

    /// Store `q` into `state` and return the resulting current `dq/dt`.
    pub fn integrate(&self, state: &mut ChargeState, q: f64) -> f64 {
        state.q = q;
        let dq = self.coefficient() * (q - state.q_prev);
        state.i = match self.method {
            IntegrationMethod::BackwardEuler => dq,
            IntegrationMethod::Trapezoidal => dq - state.i_prev,
        };
        state.i
    }
}
