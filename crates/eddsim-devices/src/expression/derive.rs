//! Symbolic differentiation and algebraic simplification.

use super::ast::{BinaryOp, Expr, UnaryOp};
use super::functions::{derivative_function, eval_function};
use crate::error::Result;

impl Expr {
    /// Symbolic partial derivative with respect to the symbol `wrt`.
    ///
    /// Every other symbol is held constant, so a reference to another
    /// equation differentiates to zero; callers apply the chain rule
    /// through such references themselves.
    pub fn differentiate(&self, wrt: &str) -> Result<Expr> {
        Ok(self.derive(wrt)?.simplify())
    }

    fn derive(&self, wrt: &str) -> Result<Expr> {
        if !self.depends_on(wrt) {
            return Ok(Expr::Constant(0.0));
        }

        let d = match self {
            Expr::Constant(_) => Expr::Constant(0.0),
            Expr::Symbol(_) => Expr::Constant(1.0),
            Expr::UnaryOp {
                op: UnaryOp::Neg,
                operand,
            } => -operand.derive(wrt)?,
            Expr::Function { name, args } => derivative_function(name, args, wrt)?,
            Expr::BinaryOp { op, left, right } => {
                let (f, g) = (left.as_ref().clone(), right.as_ref().clone());
                let df = left.derive(wrt)?;
                let dg = right.derive(wrt)?;
                match op {
                    BinaryOp::Add => df + dg,
                    BinaryOp::Sub => df - dg,
                    BinaryOp::Mul => {
                        if !right.depends_on(wrt) {
                            df * g
                        } else if !left.depends_on(wrt) {
                            f * dg
                        } else {
                            df * g + f * dg
                        }
                    }
                    BinaryOp::Div => {
                        if !right.depends_on(wrt) {
                            df / g
                        } else {
                            (df * g.clone() - f * dg) / g.pow(Expr::Constant(2.0))
                        }
                    }
                    BinaryOp::Pow => {
                        if !right.depends_on(wrt) {
                            // d(f^n) = n * f^(n-1) * f'
                            g.clone() * f.pow(g - Expr::Constant(1.0)) * df
                        } else {
                            // d(f^g) = f^g * (g' * ln(f) + g * f'/f)
                            self.clone()
                                * (dg * Expr::call("ln", vec![f.clone()]) + g * df / f)
                        }
                    }
                }
            }
        };
        Ok(d)
    }

    /// Fold constants and drop additive/multiplicative identities.
    pub fn simplify(self) -> Expr {
        match self {
            Expr::Constant(_) | Expr::Symbol(_) => self,
            Expr::UnaryOp {
                op: UnaryOp::Neg,
                operand,
            } => match operand.simplify() {
                Expr::Constant(v) => Expr::Constant(-v),
                Expr::UnaryOp {
                    op: UnaryOp::Neg,
                    operand: inner,
                } => *inner,
                other => -other,
            },
            Expr::Function { name, args } => {
                let args: Vec<Expr> = args.into_iter().map(Expr::simplify).collect();
                let values: Option<Vec<f64>> = args
                    .iter()
                    .map(|a| match a {
                        Expr::Constant(v) => Some(*v),
                        _ => None,
                    })
                    .collect();
                match values.and_then(|v| eval_function(&name, &v).ok()) {
                    Some(v) => Expr::Constant(v),
                    None => Expr::Function { name, args },
                }
            }
            Expr::BinaryOp { op, left, right } => {
                simplify_binary(op, left.simplify(), right.simplify())
            }
        }
    }
}

fn simplify_binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    use Expr::Constant as C;

    match (op, &left, &right) {
        (BinaryOp::Add, C(a), C(b)) => C(a + b),
        (BinaryOp::Sub, C(a), C(b)) => C(a - b),
        (BinaryOp::Mul, C(a), C(b)) => C(a * b),
        (BinaryOp::Div, C(a), C(b)) if *b != 0.0 => C(a / b),
        (BinaryOp::Pow, C(a), C(b)) => C(a.powf(*b)),

        (BinaryOp::Add, C(z), _) if *z == 0.0 => right,
        (BinaryOp::Add, _, C(z)) if *z == 0.0 => left,
        (BinaryOp::Sub, _, C(z)) if *z == 0.0 => left,
        (BinaryOp::Sub, C(z), _) if *z == 0.0 => (-right).simplify(),
        (BinaryOp::Mul, C(z), _) | (BinaryOp::Mul, _, C(z)) if *z == 0.0 => C(0.0),
        (BinaryOp::Mul, C(one), _) if *one == 1.0 => right,
        (BinaryOp::Mul, _, C(one)) if *one == 1.0 => left,
        (BinaryOp::Div, C(z), _) if *z == 0.0 => C(0.0),
        (BinaryOp::Div, _, C(one)) if *one == 1.0 => left,
        (BinaryOp::Pow, _, C(z)) if *z == 0.0 => C(1.0),
        (BinaryOp::Pow, _, C(one)) if *one == 1.0 => left,

        _ => Expr::binary(op, left, right),
    }
}
