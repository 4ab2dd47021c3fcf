//! Symbol names for the unknowns and equations of one device instance.

/// Derives scoped (`D1.V1`) and canonical (`V1`) symbol names.
///
/// The scope is the part of the device name after its last `.`, so a
/// device `X1.D1` inside a subcircuit scopes its symbols as `D1.*`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableNames {
    instance: String,
}

impl VariableNames {
    pub fn new(device_name: &str) -> Self {
        let instance = device_name
            .rsplit_once('.')
            .map_or(device_name, |(_, last)| last);
        Self {
            instance: instance.to_string(),
        }
    }

    /// Scope prefix used for this instance.
    pub fn instance(&self) -> &str {
        &self.instance
    }

    /// `<instance>.<base><index>` when scoped, `<base><index>` otherwise.
    pub fn name(&self, base: &str, index: usize, scoped: bool) -> String {
        if scoped {
            format!("{}.{}{}", self.instance, base, index)
        } else {
            format!("{}{}", base, index)
        }
    }

    /// Two-index form, e.g. `G12` or `D1.C21`.
    pub fn name2(&self, base: &str, row: usize, col: usize, scoped: bool) -> String {
        if scoped {
            format!("{}.{}{}{}", self.instance, base, row, col)
        } else {
            format!("{}{}{}", base, row, col)
        }
    }
}
