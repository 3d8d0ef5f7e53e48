//! Transform schema types.
//!
//! A schema is the registered description of a transform: the options it
//! accepts, the inputs it consumes, the outputs it produces and a handful of
//! flags the compiler enforces. Schemas are plain serde types so they can be
//! loaded from JSON documents at startup.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::option::OptionValue;

// =============================================================================
// VALUE TYPES
// =============================================================================

/// Data type carried on a transform input or output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    Boolean,
    Integer,
    Decimal,
    /// Accepts either Integer or Decimal.
    Number,
    String,
    Timestamp,
    /// Not concretely known until runtime.
    Any,
}

impl ValueType {
    pub fn is_numeric(self) -> bool {
        matches!(self, ValueType::Integer | ValueType::Decimal | ValueType::Number)
    }

    pub fn is_concrete(self) -> bool {
        self != ValueType::Any
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ValueType::Boolean => "Boolean",
            ValueType::Integer => "Integer",
            ValueType::Decimal => "Decimal",
            ValueType::Number => "Number",
            ValueType::String => "String",
            ValueType::Timestamp => "Timestamp",
            ValueType::Any => "Any",
        }
    }
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared type of a transform option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionType {
    Integer,
    Decimal,
    Boolean,
    String,
    /// A string restricted to `OptionSpec::select_options`.
    Select,
}

impl OptionType {
    pub fn as_str(self) -> &'static str {
        match self {
            OptionType::Integer => "Integer",
            OptionType::Decimal => "Decimal",
            OptionType::Boolean => "Boolean",
            OptionType::String => "String",
            OptionType::Select => "Select",
        }
    }
}

impl std::fmt::Display for OptionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TransformCategory {
    Scalar,
    Operator,
    Math,
    Indicator,
    DataSource,
    Executor,
    Utility,
    #[default]
    Other,
}

// =============================================================================
// SCHEMA PARTS
// =============================================================================

/// One declared option of a transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionSpec {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub option_type: OptionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<OptionValue>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub select_options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl OptionSpec {
    pub fn new(id: impl Into<String>, option_type: OptionType) -> Self {
        let id = id.into();
        OptionSpec {
            name: id.clone(),
            id,
            option_type,
            default: None,
            required: false,
            select_options: Vec::new(),
            min: None,
            max: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, value: OptionValue) -> Self {
        self.default = Some(value);
        self
    }

    pub fn with_bounds(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    pub fn with_selections<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select_options = values.into_iter().map(Into::into).collect();
        self
    }
}

/// A declared input or output handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IoSpec {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub value_type: ValueType,
    #[serde(default)]
    pub allow_multiple_connections: bool,
}

impl IoSpec {
    pub fn new(id: impl Into<String>, value_type: ValueType) -> Self {
        IoSpec {
            id: id.into(),
            name: String::new(),
            value_type,
            allow_multiple_connections: false,
        }
    }

    pub fn multiple(mut self) -> Self {
        self.allow_multiple_connections = true;
        self
    }

    /// The key this input is wired under in a node's input map.
    pub fn binding_id(&self) -> String {
        crate::ir::id::binding_id(&self.id)
    }
}

// =============================================================================
// TRANSFORM SCHEMA
// =============================================================================

/// Registered description of a transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformSchema {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: TransformCategory,
    #[serde(default)]
    pub options: Vec<OptionSpec>,
    #[serde(default)]
    pub inputs: Vec<IoSpec>,
    #[serde(default)]
    pub outputs: Vec<IoSpec>,
    /// Alternate handle names accepted on attribute access, alias -> output id.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub output_aliases: BTreeMap<String, String>,
    #[serde(default)]
    pub requires_timeframe: bool,
    #[serde(default)]
    pub intraday_only: bool,
    #[serde(default)]
    pub at_least_one_input_required: bool,
    #[serde(default)]
    pub allow_null_inputs: bool,
}

impl TransformSchema {
    pub fn new(id: impl Into<String>, category: TransformCategory) -> Self {
        let id = id.into();
        TransformSchema {
            name: id.clone(),
            id,
            category,
            options: Vec::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            output_aliases: BTreeMap::new(),
            requires_timeframe: false,
            intraday_only: false,
            at_least_one_input_required: false,
            allow_null_inputs: false,
        }
    }

    pub fn option(mut self, spec: OptionSpec) -> Self {
        self.options.push(spec);
        self
    }

    pub fn input(mut self, spec: IoSpec) -> Self {
        self.inputs.push(spec);
        self
    }

    pub fn output(mut self, spec: IoSpec) -> Self {
        self.outputs.push(spec);
        self
    }

    pub fn alias(mut self, alias: impl Into<String>, output: impl Into<String>) -> Self {
        self.output_aliases.insert(alias.into(), output.into());
        self
    }

    pub fn requires_timeframe(mut self) -> Self {
        self.requires_timeframe = true;
        self
    }

    pub fn intraday_only(mut self) -> Self {
        self.intraday_only = true;
        self
    }

    pub fn at_least_one_input(mut self) -> Self {
        self.at_least_one_input_required = true;
        self
    }

    pub fn allow_null_inputs(mut self) -> Self {
        self.allow_null_inputs = true;
        self
    }

    pub fn find_option(&self, id: &str) -> Option<&OptionSpec> {
        self.options.iter().find(|o| o.id == id)
    }

    /// Look up an input by the key it is wired under (`SLOT0` for `*0`).
    pub fn find_input(&self, binding_id: &str) -> Option<&IoSpec> {
        self.inputs.iter().find(|i| i.binding_id() == binding_id)
    }

    /// Resolve an output handle, following aliases.
    pub fn find_output(&self, handle: &str) -> Option<&IoSpec> {
        let id = self
            .output_aliases
            .get(handle)
            .map(String::as_str)
            .unwrap_or(handle);
        self.outputs.iter().find(|o| o.id == id)
    }

    pub fn output_ids(&self) -> Vec<String> {
        self.outputs.iter().map(|o| o.id.clone()).collect()
    }

    /// All handles accepted on attribute access: declared outputs, then aliases.
    pub fn valid_handles(&self) -> Vec<String> {
        let mut handles = self.output_ids();
        handles.extend(self.output_aliases.keys().cloned());
        handles
    }

    pub fn is_sink(&self) -> bool {
        self.outputs.is_empty()
    }
}
