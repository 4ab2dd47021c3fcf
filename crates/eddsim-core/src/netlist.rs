//! Netlist: devices plus the node/current-variable bookkeeping an analysis needs.

use indexmap::IndexMap;
use nalgebra::DVector;

use crate::error::{Error, Result};
use crate::integrate::Integrator;
use crate::mna::{ComplexMna, MnaSystem};
use crate::node::NodeId;

/// Analysis a device is being prepared for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisMode {
    Dc,
    Ac,
    Transient,
    SParameter,
    HarmonicBalance,
}

/// A boxed device that can stamp into an MNA matrix.
pub type BoxedStamper = Box<dyn Stamper>;

/// Trait for devices that can stamp into the MNA systems of each analysis.
///
/// Calls are sequential: an analysis initializes every device, then
/// stamps them once per Newton iteration, frequency point or timestep.
pub trait Stamper: std::fmt::Debug {
    /// Device name (e.g., "R1", "D1").
    fn device_name(&self) -> &str;

    /// Terminal nodes, in port order.
    fn nodes(&self) -> Vec<NodeId>;

    /// Number of auxiliary current variables this device requires.
    fn num_current_vars(&self) -> usize {
        0
    }

    /// Prepare for an analysis.
    fn init(&mut self, _mode: AnalysisMode) -> Result<()> {
        Ok(())
    }

    /// Stamp the device linearized at `solution`.
    fn stamp_dc(&mut self, mna: &mut MnaSystem, solution: &DVector<f64>) -> Result<()>;

    /// Record the operating point at a converged `solution`.
    fn save_operating_point(&mut self, _solution: &DVector<f64>) -> Result<()> {
        Ok(())
    }

    /// Stamp the small-signal admittance at `frequency` (Hz).
    fn stamp_ac(&mut self, mna: &mut ComplexMna, frequency: f64) -> Result<()>;

    /// Seed integration history from the DC operating point.
    fn init_transient_state(&mut self, _solution: &DVector<f64>) -> Result<()> {
        Ok(())
    }

    /// Stamp the transient companion model at `time`.
    fn stamp_transient(
        &mut self,
        mna: &mut MnaSystem,
        solution: &DVector<f64>,
        _integrator: &Integrator,
        _time: f64,
    ) -> Result<()> {
        self.stamp_dc(mna, solution)
    }

    /// Commit the present timepoint as integration history.
    fn accept_step(&mut self) {}
}

/// A complete netlist ready for simulation.
#[derive(Debug, Default)]
pub struct Netlist {
    /// Circuit title.
    title: Option<String>,
    /// Highest node number used.
    max_node: u32,
    /// All devices, keyed by upper-cased name.
    devices: IndexMap<String, BoxedStamper>,
    /// Total number of auxiliary current variables.
    num_current_vars: usize,
}

impl Netlist {
    /// Create a new empty netlist.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a netlist with a title.
    pub fn with_title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    /// Get the netlist title.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Register a node, updating max_node if necessary.
    pub fn register_node(&mut self, node: NodeId) {
        if !node.is_ground() && node.as_u32() > self.max_node {
            self.max_node = node.as_u32();
        }
    }

    /// Add a device to the netlist, registering its nodes.
    pub fn add_device(&mut self, device: impl Stamper + 'static) -> Result<()> {
        let key = device.device_name().to_uppercase();
        if self.devices.contains_key(&key) {
            return Err(Error::DuplicateDevice(device.device_name().to_string()));
        }
        for node in device.nodes() {
            self.register_node(node);
        }
        self.num_current_vars += device.num_current_vars();
        self.devices.insert(key, Box::new(device));
        Ok(())
    }

    /// Get the number of nodes (excluding ground).
    pub fn num_nodes(&self) -> usize {
        self.max_node as usize
    }

    /// Get the number of auxiliary current variables.
    pub fn num_current_vars(&self) -> usize {
        self.num_current_vars
    }

    /// Get the next available current variable index.
    pub fn next_current_index(&self) -> usize {
        self.num_current_vars
    }

    /// Size of the MNA system.
    pub fn size(&self) -> usize {
        self.num_nodes() + self.num_current_vars
    }

    /// Look up a device by name (case-insensitive).
    pub fn device(&self, name: &str) -> Option<&dyn Stamper> {
        self.devices.get(&name.to_uppercase()).map(|d| d.as_ref())
    }

    /// Look up a device mutably by name (case-insensitive).
    pub fn device_mut(&mut self, name: &str) -> Result<&mut BoxedStamper> {
        self.devices
            .get_mut(&name.to_uppercase())
            .ok_or_else(|| Error::DeviceNotFound(name.to_string()))
    }

    /// Get the number of devices.
    pub fn num_devices(&self) -> usize {
        self.devices.len()
    }

    /// Check that the netlist describes something solvable.
    pub fn validate(&self) -> Result<()> {
        if self.devices.is_empty() {
            return Err(Error::InvalidCircuit("netlist has no devices".into()));
        }
        if self.size() == 0 {
            return Err(Error::InvalidCircuit("every device is grounded".into()));
        }
        Ok(())
    }

    /// Prepare every device for an analysis.
    pub fn init(&mut self, mode: AnalysisMode) -> Result<()> {
        for device in self.devices.values_mut() {
            device.init(mode)?;
        }
        Ok(())
    }

    /// Stamp all devices linearized at `solution`.
    pub fn stamp_dc(&mut self, mna: &mut MnaSystem, solution: &DVector<f64>) -> Result<()> {
        for device in self.devices.values_mut() {
            device.stamp_dc(mna, solution)?;
        }
        Ok(())
    }

    /// Record every device's operating point at `solution`.
    pub fn save_operating_points(&mut self, solution: &DVector<f64>) -> Result<()> {
        for device in self.devices.values_mut() {
            device.save_operating_point(solution)?;
        }
        Ok(())
    }

    /// Stamp all devices into a complex system at `frequency`.
    pub fn stamp_ac(&mut self, mna: &mut ComplexMna, frequency: f64) -> Result<()> {
        for device in self.devices.values_mut() {
            device.stamp_ac(mna, frequency)?;
        }
        Ok(())
    }

    /// Seed every device's integration history.
    pub fn init_transient_states(&mut self, solution: &DVector<f64>) -> Result<()> {
        for device in self.devices.values_mut() {
            device.init_transient_state(solution)?;
        }
        Ok(())
    }

    /// Stamp all transient companion models.
    pub fn stamp_transient(
        &mut self,
        mna: &mut MnaSystem,
        solution: &DVector<f64>,
        integrator: &Integrator,
        time: f64,
    ) -> Result<()> {
        for device in self.devices.values_mut() {
            device.stamp_transient(mna, solution, integrator, time)?;
        }
        Ok(())
    }

    /// Commit the present timepoint on every device.
    pub fn accept_step(&mut self) {
        for device in self.devices.values_mut() {
            device.accept_step();
        }
    }
}
