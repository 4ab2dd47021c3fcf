//! Symbolic expressions and the equation registry.
//!
//! Supports expressions like:
//! - `D1.V1 / 1k` - scaled reference to a registered unknown
//! - `1e-12 * (exp(V1 / 0.025) - 1)` - built-in functions
//! - `I1 * 1n` - reference to another equation
//!
//! Expressions can be differentiated symbolically; the derivative is a
//! new expression that can itself be registered and evaluated.

mod ast;
mod derive;
mod eval;
mod functions;
mod parser;
mod registry;

pub use ast::{BinaryOp, Expr, UnaryOp};
pub use functions::{arity, eval_function};
pub use parser::parse_expression;
pub use registry::{EqnId, EquationRegistry};
