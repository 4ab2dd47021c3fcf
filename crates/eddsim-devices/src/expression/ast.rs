//! Expression AST types.

use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// Expression AST node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Numeric constant.
    Constant(f64),
    /// Named operand: an unknown or another registered equation.
    Symbol(String),
    /// Binary operation.
    BinaryOp {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Unary operation.
    UnaryOp { op: UnaryOp, operand: Box<Expr> },
    /// Function call.
    Function { name: String, args: Vec<Expr> },
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
}

impl Expr {
    pub fn symbol(name: impl Into<String>) -> Self {
        Expr::Symbol(name.into())
    }

    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Function {
            name: name.into(),
            args,
        }
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Expr::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn pow(self, exponent: Expr) -> Self {
        Expr::binary(BinaryOp::Pow, self, exponent)
    }

    /// Whether the expression mentions the symbol `name`.
    pub fn depends_on(&self, name: &str) -> bool {
        match self {
            Expr::Constant(_) => false,
            Expr::Symbol(s) => s == name,
            Expr::BinaryOp { left, right, .. } => left.depends_on(name) || right.depends_on(name),
            Expr::UnaryOp { operand, .. } => operand.depends_on(name),
            Expr::Function { args, .. } => args.iter().any(|a| a.depends_on(name)),
        }
    }

    /// All symbol names referenced, in first-occurrence order.
    pub fn symbols(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_symbols(&mut out);
        out
    }

    fn collect_symbols(&self, out: &mut Vec<String>) {
        match self {
            Expr::Constant(_) => {}
            Expr::Symbol(s) => {
                if !out.contains(s) {
                    out.push(s.clone());
                }
            }
            Expr::BinaryOp { left, right, .. } => {
                left.collect_symbols(out);
                right.collect_symbols(out);
            }
            Expr::UnaryOp { operand, .. } => operand.collect_symbols(out),
            Expr::Function { args, .. } => {
                for arg in args {
                    arg.collect_symbols(out);
                }
            }
        }
    }

    /// Replace every occurrence of symbol `old` with `new`.
    ///
    /// Returns the number of replaced occurrences.
    pub fn substitute(&mut self, old: &str, new: &str) -> usize {
        match self {
            Expr::Constant(_) => 0,
            Expr::Symbol(s) => {
                if s == old {
                    *s = new.to_string();
                    1
                } else {
                    0
                }
            }
            Expr::BinaryOp { left, right, .. } => {
                left.substitute(old, new) + right.substitute(old, new)
            }
            Expr::UnaryOp { operand, .. } => operand.substitute(old, new),
            Expr::Function { args, .. } => args.iter_mut().map(|a| a.substitute(old, new)).sum(),
        }
    }
}

impl Add for Expr {
    type Output = Expr;

    fn add(self, rhs: Expr) -> Expr {
        Expr::binary(BinaryOp::Add, self, rhs)
    }
}

impl Sub for Expr {
    type Output = Expr;

    fn sub(self, rhs: Expr) -> Expr {
        Expr::binary(BinaryOp::Sub, self, rhs)
    }
}

impl Mul for Expr {
    type Output = Expr;

    fn mul(self, rhs: Expr) -> Expr {
        Expr::binary(BinaryOp::Mul, self, rhs)
    }
}

impl Div for Expr {
    type Output = Expr;

    fn div(self, rhs: Expr) -> Expr {
        Expr::binary(BinaryOp::Div, self, rhs)
    }
}

impl Neg for Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        Expr::UnaryOp {
            op: UnaryOp::Neg,
            operand: Box::new(self),
        }
    }
}

impl BinaryOp {
    fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Pow => "^",
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Constant(v) => write!(f, "{}", v),
            Expr::Symbol(s) => write!(f, "{}", s),
            Expr::BinaryOp { op, left, right } => write!(f, "({} {} {})", left, op.symbol(), right),
            Expr::UnaryOp {
                op: UnaryOp::Neg,
                operand,
            } => write!(f, "-{}", operand),
            Expr::Function { name, args } => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}
