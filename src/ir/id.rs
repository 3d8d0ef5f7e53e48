//! Global output ids: `<nodeId>#<outputId>`.

use std::collections::HashMap;

use crate::metadata::{TransformSchema, ValueType};

pub const SEPARATOR: char = '#';

/// Declared input id prefix for positional slots.
const SLOT_MARKER: char = '*';
const SLOT_PREFIX: &str = "SLOT";

pub fn qualify(node_id: &str, output_id: &str) -> String {
    format!("{node_id}{SEPARATOR}{output_id}")
}

/// Split a qualified reference into `(node, output)`.
///
/// Splits on the last separator. Returns `None` when either half is empty.
pub fn resolve(reference: &str) -> Option<(&str, &str)> {
    let (node, output) = reference.rsplit_once(SEPARATOR)?;
    if node.is_empty() || output.is_empty() {
        return None;
    }
    Some((node, output))
}

/// The key an input is wired under: `*` becomes `SLOT`, `*N` becomes `SLOTN`.
pub fn binding_id(input_id: &str) -> String {
    match input_id.strip_prefix(SLOT_MARKER) {
        Some(index) => format!("{SLOT_PREFIX}{index}"),
        None => input_id.to_string(),
    }
}

/// Qualified output ids of every registered node, with their value types.
#[derive(Debug, Default, Clone)]
pub struct OutputNamespace {
    outputs: HashMap<String, ValueType>,
}

impl OutputNamespace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every declared output (and alias) of `node_id`.
    pub fn register_node(&mut self, node_id: &str, schema: &TransformSchema) {
        for output in &schema.outputs {
            self.outputs
                .insert(qualify(node_id, &output.id), output.value_type);
        }
        for (alias, target) in &schema.output_aliases {
            if let Some(output) = schema.find_output(target) {
                self.outputs.insert(qualify(node_id, alias), output.value_type);
            }
        }
    }

    /// Override the recorded type of one output.
    pub fn set_type(&mut self, reference: &str, value_type: ValueType) {
        if let Some(slot) = self.outputs.get_mut(reference) {
            *slot = value_type;
        }
    }

    pub fn lookup(&self, reference: &str) -> Option<ValueType> {
        self.outputs.get(reference).copied()
    }

    pub fn contains(&self, reference: &str) -> bool {
        self.outputs.contains_key(reference)
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }
}
