//! Independent source models: Voltage and Current sources.

use eddsim_core::{ComplexMna, MnaSystem, NodeId, Stamper};
use nalgebra::DVector;
use num_complex::Complex;

use crate::component::ComponentType;

/// An independent voltage source.
#[derive(Debug, Clone)]
pub struct VoltageSource {
    /// Device name (e.g., "V1").
    pub name: String,
    /// Positive terminal node.
    pub node_pos: NodeId,
    /// Negative terminal node.
    pub node_neg: NodeId,
    /// DC voltage value in volts.
    pub voltage: f64,
    /// Small-signal magnitude for AC analysis.
    pub ac_mag: f64,
    /// Index of the current variable for this source.
    pub current_index: usize,
}

impl VoltageSource {
    /// Create a new voltage source.
    pub fn new(
        name: impl Into<String>,
        node_pos: NodeId,
        node_neg: NodeId,
        voltage: f64,
        current_index: usize,
    ) -> Self {
        Self {
            name: name.into(),
            node_pos,
            node_neg,
            voltage,
            ac_mag: 0.0,
            current_index,
        }
    }

    /// Set the AC magnitude.
    pub fn with_ac(mut self, ac_mag: f64) -> Self {
        self.ac_mag = ac_mag;
        self
    }

    pub fn component_type(&self) -> ComponentType {
        ComponentType::VoltageSource
    }
}

impl Stamper for VoltageSource {
    fn device_name(&self) -> &str {
        &self.name
    }

    fn nodes(&self) -> Vec<NodeId> {
        vec![self.node_pos, self.node_neg]
    }

    fn num_current_vars(&self) -> usize {
        1
    }

    fn stamp_dc(&mut self, mna: &mut MnaSystem, _solution: &DVector<f64>) -> eddsim_core::Result<()> {
        mna.stamp_voltage_source(
            self.node_pos.mna_index(),
            self.node_neg.mna_index(),
            self.current_index,
            self.voltage,
        );
        Ok(())
    }

    fn stamp_ac(&mut self, mna: &mut ComplexMna, _frequency: f64) -> eddsim_core::Result<()> {
        mna.stamp_voltage_source(
            self.node_pos.mna_index(),
            self.node_neg.mna_index(),
            self.current_index,
            Complex::new(self.ac_mag, 0.0),
        );
        Ok(())
    }
}

/// An independent current source.
#[derive(Debug, Clone)]
pub struct CurrentSource {
    /// Device name (e.g., "I1").
    pub name: String,
    /// Positive terminal node (current flows out of this node into the source).
    pub node_pos: NodeId,
    /// Negative terminal node (current flows into this node from the source).
    pub node_neg: NodeId,
    /// DC current value in amperes.
    pub current: f64,
    /// Small-signal magnitude for AC analysis.
    pub ac_mag: f64,
}

impl CurrentSource {
    /// Create a new current source.
    pub fn new(name: impl Into<String>, node_pos: NodeId, node_neg: NodeId, current: f64) -> Self {
        Self {
            name: name.into(),
            node_pos,
            node_neg,
            current,
            ac_mag: 0.0,
        }
    }

    /// Set the AC magnitude.
    pub fn with_ac(mut self, ac_mag: f64) -> Self {
        self.ac_mag = ac_mag;
        self
    }

    pub fn component_type(&self) -> ComponentType {
        ComponentType::CurrentSource
    }
}

impl Stamper for CurrentSource {
    fn device_name(&self) -> &str {
        &self.name
    }

    fn nodes(&self) -> Vec<NodeId> {
        vec![self.node_pos, self.node_neg]
    }

    fn stamp_dc(&mut self, mna: &mut MnaSystem, _solution: &DVector<f64>) -> eddsim_core::Result<()> {
        mna.stamp_current_source(
            self.node_pos.mna_index(),
            self.node_neg.mna_index(),
            self.current,
        );
        Ok(())
    }

    fn stamp_ac(&mut self, mna: &mut ComplexMna, _frequency: f64) -> eddsim_core::Result<()> {
        mna.stamp_current_source(
            self.node_pos.mna_index(),
            self.node_neg.mna_index(),
            Complex::new(self.ac_mag, 0.0),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voltage_source_stamp() {
        let mut v = VoltageSource::new("V1", NodeId::new(1), NodeId::GROUND, 5.0, 0);
        let mut mna = MnaSystem::new(1, 1);
        v.stamp_dc(&mut mna, &DVector::zeros(2)).unwrap();

        assert_eq!(mna.matrix()[(0, 1)], 1.0);
        assert_eq!(mna.matrix()[(1, 0)], 1.0);
        assert_eq!(mna.rhs()[1], 5.0);
    }

    #[test]
    fn test_voltage_source_ac_magnitude() {
        let mut v = VoltageSource::new("V1", NodeId::new(1), NodeId::GROUND, 5.0, 0).with_ac(1.0);
        let mut mna = ComplexMna::new(1, 1);
        v.stamp_ac(&mut mna, 1e3).unwrap();
        assert_eq!(mna.rhs()[1], Complex::new(1.0, 0.0));
    }

    #[test]
    fn test_current_source_stamp() {
        let mut i = CurrentSource::new("I1", NodeId::GROUND, NodeId::new(1), 1e-3);
        let mut mna = MnaSystem::new(1, 0);
        i.stamp_dc(&mut mna, &DVector::zeros(1)).unwrap();
        assert_eq!(mna.rhs()[0], 1e-3);
    }
}
