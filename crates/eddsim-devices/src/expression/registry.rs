//! Named equation registry.
//!
//! Holds the unknowns a solver updates (e.g. branch voltages) and the
//! expressions defined over them. Expressions may reference other
//! entries by name; evaluation resolves those references recursively.

use indexmap::IndexMap;

use super::ast::Expr;
use super::functions::check_call;
use super::parser::parse_expression;
use crate::error::{Error, Result};

/// Handle to a registry entry. Handles stay valid across renames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EqnId(usize);

impl EqnId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
enum Definition {
    /// A value assigned from outside, e.g. an MNA unknown.
    Unknown,
    Expression(Expr),
}

#[derive(Debug, Clone)]
struct Equation {
    name: String,
    definition: Definition,
    /// Value of an unknown, or the last evaluated result of an expression.
    result: f64,
}

/// Registry of unknowns and equations addressed by name or handle.
#[derive(Debug, Clone, Default)]
pub struct EquationRegistry {
    equations: Vec<Equation>,
    names: IndexMap<String, EqnId>,
}

impl EquationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.equations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.equations.is_empty()
    }

    /// Declare a mutable unknown with an initial value.
    ///
    /// Re-declaring an existing name turns that entry into an unknown.
    pub fn declare_unknown(&mut self, name: &str, value: f64) -> EqnId {
        self.insert(name, Definition::Unknown, value)
    }

    /// Parse `source` and register it under `name`.
    pub fn define(&mut self, name: &str, source: &str) -> Result<EqnId> {
        let expr = parse_expression(source)?;
        Ok(self.add_equation(name, expr))
    }

    /// Register an expression under `name`, replacing any previous entry.
    pub fn add_equation(&mut self, name: &str, expr: Expr) -> EqnId {
        self.insert(name, Definition::Expression(expr), 0.0)
    }

    fn insert(&mut self, name: &str, definition: Definition, result: f64) -> EqnId {
        if let Some(&id) = self.names.get(name) {
            let eqn = &mut self.equations[id.0];
            eqn.definition = definition;
            eqn.result = result;
            return id;
        }
        let id = EqnId(self.equations.len());
        self.equations.push(Equation {
            name: name.to_string(),
            definition,
            result,
        });
        self.names.insert(name.to_string(), id);
        id
    }

    /// Find an entry by name.
    pub fn find(&self, name: &str) -> Option<EqnId> {
        self.names.get(name).copied()
    }

    /// Name of an entry.
    pub fn name(&self, id: EqnId) -> &str {
        &self.equations[id.0].name
    }

    /// Expression of an entry, or None for an unknown.
    pub fn expr(&self, id: EqnId) -> Option<&Expr> {
        match &self.equations[id.0].definition {
            Definition::Expression(expr) => Some(expr),
            Definition::Unknown => None,
        }
    }

    /// Whether the entry is an unknown.
    pub fn is_unknown(&self, id: EqnId) -> bool {
        matches!(self.equations[id.0].definition, Definition::Unknown)
    }

    /// Entry names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.keys().map(String::as_str)
    }

    /// Recompute an entry and store its result.
    pub fn evaluate(&mut self, id: EqnId) -> Result<f64> {
        let mut stack = Vec::new();
        let value = self.compute(id, &mut stack)?;
        self.equations[id.0].result = value;
        Ok(value)
    }

    fn compute(&self, id: EqnId, stack: &mut Vec<EqnId>) -> Result<f64> {
        let eqn = &self.equations[id.0];
        let expr = match &eqn.definition {
            Definition::Unknown => return Ok(eqn.result),
            Definition::Expression(expr) => expr,
        };
        if stack.contains(&id) {
            return Err(Error::Cycle(eqn.name.clone()));
        }
        stack.push(id);
        let value = expr.eval_with(&mut |symbol: &str| {
            let dep = self.find(symbol).ok_or_else(|| Error::UnknownSymbol {
                equation: eqn.name.clone(),
                symbol: symbol.to_string(),
            })?;
            self.compute(dep, stack)
        });
        stack.pop();
        value
    }

    /// Last stored result of an entry (the value, for an unknown).
    pub fn result(&self, id: EqnId) -> f64 {
        self.equations[id.0].result
    }

    /// Overwrite the stored value of an entry.
    pub fn set_value(&mut self, id: EqnId, value: f64) {
        self.equations[id.0].result = value;
    }

    /// Give an entry a new name. The handle stays valid.
    pub fn rename(&mut self, id: EqnId, new_name: &str) {
        let old = std::mem::replace(&mut self.equations[id.0].name, new_name.to_string());
        self.names.shift_remove(&old);
        self.names.insert(new_name.to_string(), id);
    }

    /// Rewrite references to `old` as references to `new` inside an entry.
    pub fn substitute(&mut self, id: EqnId, old: &str, new: &str) -> usize {
        match &mut self.equations[id.0].definition {
            Definition::Expression(expr) => expr.substitute(old, new),
            Definition::Unknown => 0,
        }
    }

    /// Symbolic derivative of an entry's expression with respect to `wrt`.
    pub fn differentiate(&self, id: EqnId, wrt: &str) -> Result<Expr> {
        let expr = self
            .expr(id)
            .ok_or_else(|| Error::NotAnExpression(self.name(id).to_string()))?;
        expr.differentiate(wrt)
    }

    /// Type-check an entry: every symbol resolves, every function is a
    /// known built-in with the right arity, and no reference cycle exists.
    pub fn check(&self, id: EqnId) -> Result<()> {
        self.check_inner(id, &mut Vec::new())
    }

    fn check_inner(&self, id: EqnId, stack: &mut Vec<EqnId>) -> Result<()> {
        let eqn = &self.equations[id.0];
        let Definition::Expression(expr) = &eqn.definition else {
            return Ok(());
        };
        if stack.contains(&id) {
            return Err(Error::Cycle(eqn.name.clone()));
        }
        check_functions(expr)?;
        stack.push(id);
        for symbol in expr.symbols() {
            let dep = self.find(&symbol).ok_or_else(|| Error::UnknownSymbol {
                equation: eqn.name.clone(),
                symbol: symbol.clone(),
            })?;
            self.check_inner(dep, stack)?;
        }
        stack.pop();
        Ok(())
    }

    /// Diagnostic string form: `name = expression`.
    pub fn describe(&self, id: EqnId) -> String {
        let eqn = &self.equations[id.0];
        match &eqn.definition {
            Definition::Expression(expr) => format!("{} = {}", eqn.name, expr),
            Definition::Unknown => format!("{} = {} (unknown)", eqn.name, eqn.result),
        }
    }
}

fn check_functions(expr: &Expr) -> Result<()> {
    match expr {
        Expr::Constant(_) | Expr::Symbol(_) => Ok(()),
        Expr::BinaryOp { left, right, .. } => {
            check_functions(left)?;
            check_functions(right)
        }
        Expr::UnaryOp { operand, .. } => check_functions(operand),
        Expr::Function { name, args } => {
            check_call(name, args.len())?;
            args.iter().try_for_each(check_functions)
        }
    }
}
