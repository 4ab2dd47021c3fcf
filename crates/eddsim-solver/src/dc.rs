//! DC operating point analysis.

use eddsim_core::{AnalysisMode, Netlist, NodeId};
use nalgebra::DVector;

use crate::error::{Error, Result};
use crate::newton::{solve_newton_raphson, ConvergenceCriteria};

/// Result of a DC operating point analysis.
#[derive(Debug, Clone)]
pub struct DcSolution {
    /// Node voltages (indexed by node number - 1, ground is implicit 0V).
    pub node_voltages: DVector<f64>,
    /// Auxiliary currents (voltage sources), in current-variable order.
    pub branch_currents: DVector<f64>,
    /// Number of nodes (excluding ground).
    pub num_nodes: usize,
    /// Newton iterations taken.
    pub iterations: usize,
}

impl DcSolution {
    fn from_vector(solution: &DVector<f64>, num_nodes: usize, iterations: usize) -> Self {
        Self {
            node_voltages: solution.rows(0, num_nodes).into_owned(),
            branch_currents: solution
                .rows(num_nodes, solution.len() - num_nodes)
                .into_owned(),
            num_nodes,
            iterations,
        }
    }

    /// Get the voltage at a node.
    pub fn voltage(&self, node: NodeId) -> f64 {
        match node.mna_index() {
            Some(idx) if idx < self.num_nodes => self.node_voltages[idx],
            _ => 0.0,
        }
    }

    /// Get the voltage difference between two nodes.
    pub fn voltage_diff(&self, node_pos: NodeId, node_neg: NodeId) -> f64 {
        self.voltage(node_pos) - self.voltage(node_neg)
    }

    /// Get a branch current by index.
    pub fn current(&self, index: usize) -> f64 {
        if index < self.branch_currents.len() {
            self.branch_currents[index]
        } else {
            0.0
        }
    }

    /// The full MNA solution vector (voltages then currents).
    pub fn to_vector(&self) -> DVector<f64> {
        let mut v = DVector::zeros(self.node_voltages.len() + self.branch_currents.len());
        v.rows_mut(0, self.node_voltages.len())
            .copy_from(&self.node_voltages);
        v.rows_mut(self.node_voltages.len(), self.branch_currents.len())
            .copy_from(&self.branch_currents);
        v
    }
}

/// Solve the DC operating point of `netlist`.
///
/// On convergence every device records its operating point, which the
/// AC and transient analyses linearize around.
pub fn solve_dc(netlist: &mut Netlist, criteria: &ConvergenceCriteria) -> Result<DcSolution> {
    netlist.validate()?;
    let num_nodes = netlist.num_nodes();
    let num_vsources = netlist.num_current_vars();
    log::debug!(
        "DC operating point: {} nodes, {} current variables",
        num_nodes,
        num_vsources
    );

    netlist.init(AnalysisMode::Dc)?;
    let result = solve_newton_raphson(num_nodes, num_vsources, criteria, None, |mna, x| {
        netlist.stamp_dc(mna, x)?;
        Ok(())
    })?;

    if !result.converged {
        log::warn!(
            "DC operating point did not converge after {} iterations",
            result.iterations
        );
        return Err(Error::ConvergenceFailed {
            iterations: result.iterations,
        });
    }

    netlist.save_operating_points(&result.solution)?;
    log::debug!("DC converged in {} iterations", result.iterations);
    Ok(DcSolution::from_vector(
        &result.solution,
        num_nodes,
        result.iterations,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use eddsim_devices::{CurrentSource, Resistor, VoltageSource};

    #[test]
    fn test_voltage_divider() {
        let mut netlist = Netlist::new();
        netlist
            .add_device(VoltageSource::new("V1", NodeId::new(1), NodeId::GROUND, 10.0, 0))
            .unwrap();
        netlist
            .add_device(Resistor::new("R1", NodeId::new(1), NodeId::new(2), 1000.0))
            .unwrap();
        netlist
            .add_device(Resistor::new("R2", NodeId::new(2), NodeId::GROUND, 1000.0))
            .unwrap();

        let dc = solve_dc(&mut netlist, &ConvergenceCriteria::default()).unwrap();
        assert!((dc.voltage(NodeId::new(1)) - 10.0).abs() < 1e-9);
        assert!((dc.voltage(NodeId::new(2)) - 5.0).abs() < 1e-9);
        // Source current flows out of the positive terminal: -5 mA.
        assert!((dc.current(0) + 5e-3).abs() < 1e-12);
        assert_eq!(dc.voltage(NodeId::GROUND), 0.0);
    }

    #[test]
    fn test_current_source_into_resistor() {
        let mut netlist = Netlist::new();
        netlist
            .add_device(CurrentSource::new("I1", NodeId::GROUND, NodeId::new(1), 2e-3))
            .unwrap();
        netlist
            .add_device(Resistor::new("R1", NodeId::new(1), NodeId::GROUND, 500.0))
            .unwrap();

        let dc = solve_dc(&mut netlist, &ConvergenceCriteria::default()).unwrap();
        assert!((dc.voltage(NodeId::new(1)) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_to_vector_round_trips_layout() {
        let solution = DVector::from_vec(vec![1.0, 2.0, 3.0]);
        let dc = DcSolution::from_vector(&solution, 2, 1);
        assert_eq!(dc.current(0), 3.0);
        assert_eq!(dc.current(5), 0.0);
        assert_eq!(dc.to_vector(), solution);
    }

    #[test]
    fn test_floating_node_is_singular() {
        let mut netlist = Netlist::new();
        netlist
            .add_device(Resistor::new("R1", NodeId::new(1), NodeId::new(2), 1000.0))
            .unwrap();
        let result = solve_dc(&mut netlist, &ConvergenceCriteria::default());
        assert!(matches!(result, Err(Error::SingularMatrix)));
    }
}
