//! Built-in functions: evaluation, arity and symbolic derivatives.

use std::f64::consts::LN_10;

use super::ast::Expr;
use crate::error::{Error, Result};

/// Number of arguments a built-in takes, or None if unknown.
pub fn arity(name: &str) -> Option<usize> {
    match name {
        "exp" | "ln" | "log" | "log10" | "sqrt" | "sin" | "cos" | "tan" | "sinh" | "cosh"
        | "tanh" | "atan" | "abs" | "sgn" | "step" => Some(1),
        "pow" => Some(2),
        _ => None,
    }
}

/// Check that `name` is a built-in called with the right number of arguments.
pub fn check_call(name: &str, found: usize) -> Result<()> {
    let expected = arity(name).ok_or_else(|| Error::UnknownFunction(name.to_string()))?;
    if expected != found {
        return Err(Error::Arity {
            function: name.to_string(),
            expected,
            found,
        });
    }
    Ok(())
}

/// Evaluate a built-in function.
pub fn eval_function(name: &str, args: &[f64]) -> Result<f64> {
    check_call(name, args.len())?;
    let x = args[0];
    let value = match name {
        "exp" => x.exp(),
        "ln" | "log" => {
            if x > 0.0 {
                x.ln()
            } else {
                -1e30
            }
        }
        "log10" => {
            if x > 0.0 {
                x.log10()
            } else {
                -1e30
            }
        }
        "sqrt" => {
            if x >= 0.0 {
                x.sqrt()
            } else {
                0.0
            }
        }
        "sin" => x.sin(),
        "cos" => x.cos(),
        "tan" => x.tan(),
        "sinh" => x.sinh(),
        "cosh" => x.cosh(),
        "tanh" => x.tanh(),
        "atan" => x.atan(),
        "abs" => x.abs(),
        "sgn" => {
            if x > 0.0 {
                1.0
            } else if x < 0.0 {
                -1.0
            } else {
                0.0
            }
        }
        "step" => {
            if x >= 0.0 {
                1.0
            } else {
                0.0
            }
        }
        "pow" => x.powf(args[1]),
        _ => return Err(Error::UnknownFunction(name.to_string())),
    };
    Ok(value)
}

/// Symbolic derivative of `name(args)` with respect to `wrt`.
///
/// Single-argument functions use the chain rule `f'(u) · du`.
pub fn derivative_function(name: &str, args: &[Expr], wrt: &str) -> Result<Expr> {
    check_call(name, args.len())?;

    if name == "pow" {
        return args[0].clone().pow(args[1].clone()).differentiate(wrt);
    }

    let u = args[0].clone();
    let du = u.differentiate(wrt)?;
    if du == Expr::Constant(0.0) {
        return Ok(Expr::Constant(0.0));
    }

    let outer = match name {
        "exp" => Expr::call("exp", vec![u]),
        "ln" | "log" => Expr::Constant(1.0) / u,
        "log10" => Expr::Constant(1.0) / (u * Expr::Constant(LN_10)),
        "sqrt" => Expr::Constant(1.0) / (Expr::Constant(2.0) * Expr::call("sqrt", vec![u])),
        "sin" => Expr::call("cos", vec![u]),
        "cos" => -Expr::call("sin", vec![u]),
        "tan" => Expr::Constant(1.0) / Expr::call("cos", vec![u]).pow(Expr::Constant(2.0)),
        "sinh" => Expr::call("cosh", vec![u]),
        "cosh" => Expr::call("sinh", vec![u]),
        "tanh" => Expr::Constant(1.0) - Expr::call("tanh", vec![u]).pow(Expr::Constant(2.0)),
        "atan" => Expr::Constant(1.0) / (Expr::Constant(1.0) + u.pow(Expr::Constant(2.0))),
        "abs" => Expr::call("sgn", vec![u]),
        "sgn" | "step" => Expr::Constant(0.0),
        _ => return Err(Error::UnknownFunction(name.to_string())),
    };

    Ok(outer * du)
}
