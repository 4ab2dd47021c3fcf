//! Device models and MNA stamps for eddsim.
//!
//! This crate provides:
//! - The equation-defined device (EDD): multi-branch elements described by
//!   symbolic current and charge equations, with symbolic Jacobians
//! - The expression layer behind it: parser, evaluator, symbolic
//!   differentiation and the shared equation registry
//! - Linear elements used to build test circuits around an EDD: R, V, I

pub mod component;
pub mod eqndefined;
pub mod error;
pub mod expression;
pub mod passive;
pub mod sources;

pub use component::ComponentType;
pub use eqndefined::{EqnDefined, RegistryHandle};
pub use error::{Error, Result};
pub use expression::{parse_expression, EqnId, EquationRegistry, Expr};
pub use passive::Resistor;
pub use sources::{CurrentSource, VoltageSource};
