//! Core circuit representation and MNA matrix structures for eddsim.
//!
//! This crate provides the fundamental data structures shared by devices
//! and analyses: node identifiers, the real and complex Modified Nodal
//! Analysis (MNA) systems, port-local device stamp matrices, the charge
//! integrator used by transient analysis and the admittance to scattering
//! parameter conversion.

pub mod error;
pub mod integrate;
pub mod mna;
pub mod netlist;
pub mod node;
pub mod sparams;
pub mod stamps;

pub use error::{Error, Result};
pub use integrate::{ChargeState, IntegrationMethod, Integrator};
pub use mna::{ComplexMna, MnaSystem};
pub use netlist::{AnalysisMode, Netlist, Stamper};
pub use node::NodeId;
pub use sparams::y_to_s;
pub use stamps::{DeviceStamps, HbStamps};
