//! The standard compound operators.

pub mod color;
pub mod feature;
pub mod filter;
pub mod logic;
pub mod math;
pub mod string;

use crate::registry::{CompoundDefinition, OperatorRegistry};

/// Every standard compound operator.
pub fn all_operators() -> Vec<CompoundDefinition> {
    let mut ops = Vec::new();
    ops.extend(math::operators());
    ops.extend(string::operators());
    ops.extend(color::operators());
    ops.extend(feature::operators());
    ops.extend(logic::operators());
    ops.extend(filter::operators());
    ops
}

pub(crate) fn register_all(registry: &mut OperatorRegistry) {
    for definition in all_operators() {
        registry.register_compound(definition);
    }
}
