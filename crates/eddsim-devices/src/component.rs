//! Component kind tags.

use std::fmt;

/// Kind of a device, independent of its instance parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentType {
    Resistor,
    VoltageSource,
    CurrentSource,
    EqnDefined,
}

impl ComponentType {
    /// Whether the terminal count is chosen per instance rather than fixed.
    pub fn is_variable_sized(self) -> bool {
        matches!(self, ComponentType::EqnDefined)
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ComponentType::Resistor => "resistor",
            ComponentType::VoltageSource => "voltage source",
            ComponentType::CurrentSource => "current source",
            ComponentType::EqnDefined => "equation-defined device",
        };
        f.write_str(name)
    }
}
