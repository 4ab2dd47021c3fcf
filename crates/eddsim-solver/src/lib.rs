//! Analyses for eddsim circuits.
//!
//! This crate provides:
//! - Dense linear system solvers (real and complex)
//! - Newton-Raphson iteration for nonlinear circuits
//! - DC operating point analysis
//! - AC small-signal frequency-domain analysis
//! - Transient time-domain analysis with device charge histories
//! - S-parameter extraction for a single equation-defined device

pub mod ac;
pub mod dc;
pub mod error;
pub mod linear;
pub mod newton;
pub mod sparams;
pub mod transient;

pub use ac::{generate_frequencies, solve_ac, AcParams, AcPoint, AcResult, AcSweepType};
pub use dc::{solve_dc, DcSolution};
pub use error::{Error, Result};
pub use linear::{solve_complex, solve_dense};
pub use newton::{solve_newton_raphson, ConvergenceCriteria, NewtonOutcome};
pub use sparams::{device_sparameters, SpParams, SpPoint};
pub use transient::{solve_transient, TimePoint, TransientParams, TransientResult};
