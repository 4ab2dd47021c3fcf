//! Expression evaluation.

use super::ast::{BinaryOp, Expr, UnaryOp};
use super::functions::eval_function;
use crate::error::Result;

impl Expr {
    /// Evaluate the expression, resolving symbols through `lookup`.
    pub fn eval_with<F>(&self, lookup: &mut F) -> Result<f64>
    where
        F: FnMut(&str) -> Result<f64>,
    {
        match self {
            Expr::Constant(v) => Ok(*v),
            Expr::Symbol(name) => lookup(name),
            Expr::BinaryOp { op, left, right } => {
                let l = left.eval_with(lookup)?;
                let r = right.eval_with(lookup)?;
                Ok(match op {
                    BinaryOp::Add => l + r,
                    BinaryOp::Sub => l - r,
                    BinaryOp::Mul => l * r,
                    BinaryOp::Div => {
                        if r.abs() < 1e-30 {
                            if l >= 0.0 {
                                1e30
                            } else {
                                -1e30
                            }
                        } else {
                            l / r
                        }
                    }
                    BinaryOp::Pow => l.powf(r),
                })
            }
            Expr::UnaryOp {
                op: UnaryOp::Neg,
                operand,
            } => Ok(-operand.eval_with(lookup)?),
            Expr::Function { name, args } => {
                let values = args
                    .iter()
                    .map(|a| a.eval_with(lookup))
                    .collect::<Result<Vec<f64>>>()?;
                eval_function(name, &values)
            }
        }
    }
}
