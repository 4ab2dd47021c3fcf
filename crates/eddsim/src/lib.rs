//! # eddsim
//!
//! Circuit simulation around the equation-defined device (EDD): a
//! multi-terminal element whose branch currents and charges are written as
//! symbolic equations of its own branch voltages and currents.
//!
//! eddsim provides:
//! - An equation registry with parsing, evaluation and symbolic
//!   differentiation
//! - The EDD engine: model compilation, Jacobians, and stamps for DC, AC,
//!   transient, S-parameter and harmonic-balance analyses
//! - DC operating point, AC sweep and transient solvers
//!
//! ## Quick Start
//!
//! ```rust
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use eddsim::prelude::*;
//!
//! // A square-law conductor driven through 1k from a 1 V source.
//! let mut registry = EquationRegistry::new();
//! registry.define("I1", "1m * V1^2").unwrap();
//! let registry = Rc::new(RefCell::new(registry));
//!
//! let mut netlist = Netlist::new();
//! netlist
//!     .add_device(VoltageSource::new("V1", NodeId::new(1), NodeId::GROUND, 1.0, 0))
//!     .unwrap();
//! netlist
//!     .add_device(Resistor::new("R1", NodeId::new(1), NodeId::new(2), 1000.0))
//!     .unwrap();
//! netlist
//!     .add_device(EqnDefined::new("D1", vec![NodeId::new(2), NodeId::GROUND], registry).unwrap())
//!     .unwrap();
//!
//! let dc = solve_dc(&mut netlist, &ConvergenceCriteria::default()).unwrap();
//! assert!((dc.voltage(NodeId::new(2)) - 0.618034).abs() < 1e-5);
//! ```

// Re-export core crates
pub use eddsim_core as core;
pub use eddsim_devices as devices;
pub use eddsim_solver as solver;

// ============================================================================
// Convenient re-exports from eddsim_core
// ============================================================================

pub use eddsim_core::{
    AnalysisMode, ComplexMna, DeviceStamps, Error as CoreError, IntegrationMethod, Integrator,
    MnaSystem, Netlist, NodeId, Stamper,
};

// ============================================================================
// Convenient re-exports from eddsim_devices
// ============================================================================

pub use eddsim_devices::{
    parse_expression, ComponentType, CurrentSource, EqnDefined, EqnId, EquationRegistry,
    Error as DeviceError, Expr, RegistryHandle, Resistor, VoltageSource,
};

// ============================================================================
// Convenient re-exports from eddsim_solver
// ============================================================================

pub use eddsim_solver::{
    device_sparameters, solve_ac, solve_dc, solve_newton_raphson, solve_transient, AcParams,
    AcResult, AcSweepType, ConvergenceCriteria, DcSolution, Error as SolverError, SpParams,
    SpPoint, TransientParams, TransientResult,
};

/// Re-export of nalgebra's dynamic vector type.
pub use nalgebra::DVector;

/// Re-export of nalgebra's dynamic matrix type.
pub use nalgebra::DMatrix;

/// Re-export of num_complex's Complex type.
pub use num_complex::Complex;

/// Prelude module containing commonly used types and traits.
///
/// ```rust
/// use eddsim::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use crate::{MnaSystem, Netlist, NodeId, Stamper};

    // Equations and devices
    pub use crate::{
        CurrentSource, EqnDefined, EquationRegistry, Expr, RegistryHandle, Resistor,
        VoltageSource,
    };

    // Analyses
    pub use crate::{
        device_sparameters, solve_ac, solve_dc, solve_transient, AcParams, AcSweepType,
        ConvergenceCriteria, DcSolution, IntegrationMethod, SpParams, TransientParams,
    };

    // Common external types
    pub use crate::{Complex, DMatrix, DVector};
}
