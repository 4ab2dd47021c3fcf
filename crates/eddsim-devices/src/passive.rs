//! Linear resistor.

use eddsim_core::{ComplexMna, MnaSystem, NodeId, Stamper};
use nalgebra::DVector;
use num_complex::Complex;

use crate::component::ComponentType;

/// A resistor element.
#[derive(Debug, Clone)]
pub struct Resistor {
    /// Device name (e.g., "R1").
    pub name: String,
    /// Positive terminal node.
    pub node_pos: NodeId,
    /// Negative terminal node.
    pub node_neg: NodeId,
    /// Resistance value in ohms.
    pub resistance: f64,
}

impl Resistor {
    /// Create a new resistor.
    pub fn new(
        name: impl Into<String>,
        node_pos: NodeId,
        node_neg: NodeId,
        resistance: f64,
    ) -> Self {
        Self {
            name: name.into(),
            node_pos,
            node_neg,
            resistance,
        }
    }

    /// Get the conductance (1/R).
    pub fn conductance(&self) -> f64 {
        1.0 / self.resistance
    }

    pub fn component_type(&self) -> ComponentType {
        ComponentType::Resistor
    }
}

impl Stamper for Resistor {
    fn device_name(&self) -> &str {
        &self.name
    }

    fn nodes(&self) -> Vec<NodeId> {
        vec![self.node_pos, self.node_neg]
    }

    fn stamp_dc(&mut self, mna: &mut MnaSystem, _solution: &DVector<f64>) -> eddsim_core::Result<()> {
        mna.stamp_conductance(
            self.node_pos.mna_index(),
            self.node_neg.mna_index(),
            self.conductance(),
        );
        Ok(())
    }

    fn stamp_ac(&mut self, mna: &mut ComplexMna, _frequency: f64) -> eddsim_core::Result<()> {
        mna.stamp_admittance(
            self.node_pos.mna_index(),
            self.node_neg.mna_index(),
            Complex::new(self.conductance(), 0.0),
        );
        Ok(())
    }
}
