//! Compiles the user's branch equations into bound, differentiated form.
//!
//! For a device with `n` branches the compiled model holds:
//! - `n` voltage unknowns `<inst>.V<i>` bound to the branch voltages,
//! - up to `n` current equations `<inst>.I<i>` and charge equations
//!   `<inst>.Q<i>`,
//! - `n²` conductance partials `<inst>.G<i><j> = ∂I_i/∂V_j`,
//! - `n²` capacitance partials `<inst>.C<i><j>` including the chain term
//!   through charges that reference currents.

use crate::error::Result;
use crate::expression::{EqnId, EquationRegistry, Expr};

use super::naming::VariableNames;

/// Equation handles for one compiled device. `None` marks an absent
/// equation or partial; evaluating it yields zero.
#[derive(Debug, Clone)]
pub struct CompiledModel {
    branches: usize,
    pub(crate) veqn: Vec<EqnId>,
    pub(crate) ieqn: Vec<Option<EqnId>>,
    pub(crate) qeqn: Vec<Option<EqnId>>,
    pub(crate) geqn: Vec<Option<EqnId>>,
    pub(crate) ceqn: Vec<Option<EqnId>>,
}

impl CompiledModel {
    /// Build the model for `branches` branches of the instance `names`.
    pub fn compile(
        names: &VariableNames,
        branches: usize,
        registry: &mut EquationRegistry,
    ) -> Result<Self> {
        log::debug!(
            "compiling equation-defined device {} ({} branches)",
            names.instance(),
            branches
        );

        let veqn = (1..=branches)
            .map(|i| registry.declare_unknown(&names.name("V", i, true), 0.0))
            .collect();

        let mut ieqn: Vec<_> = (1..=branches)
            .map(|i| resolve(names, registry, "I", i))
            .collect();
        let mut qeqn: Vec<_> = (1..=branches)
            .map(|i| resolve(names, registry, "Q", i))
            .collect();

        for id in ieqn.iter().chain(qeqn.iter()).flatten() {
            bind_symbols(names, registry, *id, branches);
        }

        // Type-check only after every equation is registered and scoped,
        // since one branch may reference another's current.
        for slot in ieqn.iter_mut().chain(qeqn.iter_mut()) {
            if let Some(id) = *slot {
                if let Err(err) = registry.check(id) {
                    log::error!(
                        "equation-defined device {}: {} is invalid: {}",
                        names.instance(),
                        registry.name(id),
                        err
                    );
                    *slot = None;
                }
            }
        }

        let mut model = Self {
            branches,
            veqn,
            ieqn,
            qeqn,
            geqn: vec![None; branches * branches],
            ceqn: vec![None; branches * branches],
        };
        model.derive_conductances(names, registry)?;
        model.derive_capacitances(names, registry)?;
        Ok(model)
    }

    /// Number of branches (half the terminal count).
    pub fn branches(&self) -> usize {
        self.branches
    }

    /// Row-major slot of partial `(i, j)`.
    pub fn index(&self, i: usize, j: usize) -> usize {
        i * self.branches + j
    }

    pub fn conductance(&self, i: usize, j: usize) -> Option<EqnId> {
        self.geqn[self.index(i, j)]
    }

    pub fn capacitance(&self, i: usize, j: usize) -> Option<EqnId> {
        self.ceqn[self.index(i, j)]
    }

    pub fn current(&self, i: usize) -> Option<EqnId> {
        self.ieqn[i]
    }

    pub fn charge(&self, i: usize) -> Option<EqnId> {
        self.qeqn[i]
    }

    pub fn voltage(&self, i: usize) -> EqnId {
        self.veqn[i]
    }

    fn derive_conductances(
        &mut self,
        names: &VariableNames,
        registry: &mut EquationRegistry,
    ) -> Result<()> {
        let n = self.branches;
        for i in 0..n {
            let Some(current) = self.ieqn[i] else {
                continue;
            };
            for j in 0..n {
                let wrt = names.name("V", j + 1, true);
                let partial = registry.differentiate(current, &wrt)?;
                let id = registry.add_equation(&names.name2("G", i + 1, j + 1, true), partial);
                log::debug!("{}", registry.describe(id));
                let k = self.index(i, j);
                self.geqn[k] = Some(id);
            }
        }
        Ok(())
    }

    fn derive_capacitances(
        &mut self,
        names: &VariableNames,
        registry: &mut EquationRegistry,
    ) -> Result<()> {
        let n = self.branches;
        for i in 0..n {
            let Some(charge) = self.qeqn[i] else {
                continue;
            };
            for j in 0..n {
                let wrt = names.name("V", j + 1, true);
                let mut partial = registry.differentiate(charge, &wrt)?;

                // Q may depend on V indirectly through branch currents:
                // dQ_i/dV_j += dQ_i/dI_l * G_lj.
                for l in 0..n {
                    let Some(g) = self.geqn[self.index(l, j)] else {
                        continue;
                    };
                    let through = registry.differentiate(charge, &names.name("I", l + 1, true))?;
                    if through == Expr::Constant(0.0) {
                        continue;
                    }
                    partial = partial + through * Expr::symbol(registry.name(g));
                }

                let id = registry.add_equation(
                    &names.name2("C", i + 1, j + 1, true),
                    partial.simplify(),
                );
                log::debug!("{}", registry.describe(id));
                let k = self.index(i, j);
                self.ceqn[k] = Some(id);
            }
        }
        Ok(())
    }
}

/// Find the equation for `<base><index>`: the scoped name wins, else the
/// canonical one is copied under the scoped name.
fn resolve(
    names: &VariableNames,
    registry: &mut EquationRegistry,
    base: &str,
    index: usize,
) -> Option<EqnId> {
    let scoped = names.name(base, index, true);
    let canonical = names.name(base, index, false);

    let found = registry.find(&scoped).or_else(|| {
        let expr = registry.find(&canonical).and_then(|id| registry.expr(id))?.clone();
        Some(registry.add_equation(&scoped, expr))
    });

    match found {
        Some(id) if registry.is_unknown(id) => {
            log::error!(
                "equation-defined device {}: {} is not an expression",
                names.instance(),
                scoped
            );
            None
        }
        Some(id) => Some(id),
        None => {
            log::error!(
                "equation-defined device {}: no equation {} or {}",
                names.instance(),
                scoped,
                canonical
            );
            None
        }
    }
}

/// Rewrite canonical `V<j>`/`I<j>` references to this instance's scoped names.
fn bind_symbols(names: &VariableNames, registry: &mut EquationRegistry, id: EqnId, n: usize) {
    for j in 1..=n {
        for base in ["V", "I"] {
            registry.substitute(id, &names.name(base, j, false), &names.name(base, j, true));
        }
    }
}
