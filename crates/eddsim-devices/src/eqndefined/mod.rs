//! Equation-defined device (EDD): an arbitrary multi-branch element whose
//! branch currents and charges are user-written expressions of its own
//! branch voltages and currents.
//!
//! A device with `2n` terminals has `n` branches; branch `i` spans
//! terminals `2i` (positive) and `2i+1` (negative). Its equations live in a
//! shared [`EquationRegistry`] under the names `I<i>`/`Q<i>`, either scoped
//! to the instance (`D1.I1`) or canonical (`I1`). The scoped form wins.
//!
//! # Example
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use eddsim_core::NodeId;
//! use eddsim_devices::eqndefined::EqnDefined;
//! use eddsim_devices::expression::EquationRegistry;
//!
//! let mut registry = EquationRegistry::new();
//! registry.define("D1.I1", "1e-14 * (exp(V1 / 0.025) - 1)").unwrap();
//! registry.define("D1.Q1", "1p * V1").unwrap();
//! let registry = Rc::new(RefCell::new(registry));
//!
//! let mut d1 = EqnDefined::new("D1", vec![NodeId::new(1), NodeId::GROUND], registry).unwrap();
//! d1.init_dc().unwrap();
//! assert_eq!(d1.branches(), 1);
//! ```

mod analysis;
mod evaluate;
mod model;
mod naming;

use std::cell::RefCell;
use std::rc::Rc;

use eddsim_core::{
    AnalysisMode, ChargeState, ComplexMna, DeviceStamps, Integrator, MnaSystem, NodeId, Stamper,
};
use nalgebra::DVector;

use crate::component::ComponentType;
use crate::error::{Error, Result};
use crate::expression::EquationRegistry;

pub use evaluate::OperatingPoint;
pub use model::CompiledModel;
pub use naming::VariableNames;

/// Registry shared by every equation-defined device of a circuit.
pub type RegistryHandle = Rc<RefCell<EquationRegistry>>;

/// An equation-defined device instance.
#[derive(Debug)]
pub struct EqnDefined {
    name: String,
    terminals: Vec<NodeId>,
    names: VariableNames,
    registry: RegistryHandle,
    model: Option<CompiledModel>,
    op: OperatingPoint,
    /// Branch voltages at the last bound solution.
    voltages: Vec<f64>,
    stamps: DeviceStamps,
    states: Vec<ChargeState>,
    /// Route `G·V` into the HB vector instead of the RHS.
    do_hb: bool,
}

impl EqnDefined {
    /// Create a device over `terminals`, which must be a non-zero even count.
    pub fn new(
        name: impl Into<String>,
        terminals: Vec<NodeId>,
        registry: RegistryHandle,
    ) -> Result<Self> {
        let name = name.into();
        if terminals.is_empty() || terminals.len() % 2 != 0 {
            return Err(Error::InvalidParameter(format!(
                "{}: equation-defined device needs an even, non-zero terminal count, got {}",
                name,
                terminals.len()
            )));
        }
        let branches = terminals.len() / 2;
        Ok(Self {
            names: VariableNames::new(&name),
            stamps: DeviceStamps::alloc_mna(terminals.len()),
            op: OperatingPoint::zeros(branches),
            voltages: vec![0.0; branches],
            states: Vec::new(),
            model: None,
            do_hb: false,
            name,
            terminals,
            registry,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of branches (half the terminal count).
    pub fn branches(&self) -> usize {
        self.terminals.len() / 2
    }

    pub fn terminals(&self) -> &[NodeId] {
        &self.terminals
    }

    pub fn component_type(&self) -> ComponentType {
        ComponentType::EqnDefined
    }

    /// Scoped symbol names of this instance.
    pub fn variable_names(&self) -> &VariableNames {
        &self.names
    }

    /// Compiled equations, once an analysis has been initialized.
    pub fn model(&self) -> Option<&CompiledModel> {
        self.model.as_ref()
    }

    /// Charges and Jacobians from the last captured operating point.
    pub fn operating_point(&self) -> &OperatingPoint {
        &self.op
    }

    /// Port-local stamps of the last calc call.
    pub fn stamps(&self) -> &DeviceStamps {
        &self.stamps
    }

    /// Charge histories used by transient analysis.
    pub fn charge_states(&self) -> &[ChargeState] {
        &self.states
    }

    fn ensure_compiled(&mut self) -> Result<()> {
        if self.model.is_none() {
            let model = CompiledModel::compile(
                &self.names,
                self.branches(),
                &mut self.registry.borrow_mut(),
            )?;
            self.model = Some(model);
        }
        Ok(())
    }

    fn node_indices(&self) -> Vec<Option<usize>> {
        self.terminals.iter().map(|n| n.mna_index()).collect()
    }

    fn device_error(&self, err: Error) -> eddsim_core::Error {
        match err {
            Error::Core(inner) => inner,
            other => eddsim_core::Error::Device {
                name: self.name.clone(),
                message: other.to_string(),
            },
        }
    }
}

impl Stamper for EqnDefined {
    fn device_name(&self) -> &str {
        &self.name
    }

    fn nodes(&self) -> Vec<NodeId> {
        self.terminals.clone()
    }

    fn init(&mut self, mode: AnalysisMode) -> eddsim_core::Result<()> {
        let result = match mode {
            AnalysisMode::Dc => self.init_dc(),
            AnalysisMode::Ac => self.init_ac(),
            AnalysisMode::Transient => self.init_tr(),
            AnalysisMode::SParameter => self.init_sp(),
            AnalysisMode::HarmonicBalance => self.init_hb(),
        };
        result.map_err(|e| self.device_error(e))
    }

    fn stamp_dc(&mut self, mna: &mut MnaSystem, solution: &DVector<f64>) -> eddsim_core::Result<()> {
        self.calc_dc(solution).map_err(|e| self.device_error(e))?;
        self.stamps.scatter_into(&self.node_indices(), mna);
        Ok(())
    }

    fn save_operating_point(&mut self, solution: &DVector<f64>) -> eddsim_core::Result<()> {
        self.save_operating_points(solution)
            .map_err(|e| self.device_error(e))
    }

    fn stamp_ac(&mut self, mna: &mut ComplexMna, frequency: f64) -> eddsim_core::Result<()> {
        self.calc_ac(frequency);
        self.stamps.scatter_ac_into(&self.node_indices(), mna);
        Ok(())
    }

    fn init_transient_state(&mut self, solution: &DVector<f64>) -> eddsim_core::Result<()> {
        EqnDefined::init_transient_state(self, solution).map_err(|e| self.device_error(e))
    }

    fn stamp_transient(
        &mut self,
        mna: &mut MnaSystem,
        solution: &DVector<f64>,
        integrator: &Integrator,
        _time: f64,
    ) -> eddsim_core::Result<()> {
        self.calc_tr(solution, integrator)
            .map_err(|e| self.device_error(e))?;
        self.stamps.scatter_into(&self.node_indices(), mna);
        Ok(())
    }

    fn accept_step(&mut self) {
        EqnDefined::accept_step(self);
    }
}

#[cfg(test)]
mod tests;
