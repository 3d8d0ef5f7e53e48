//! Option values attached to schema defaults and compiled nodes.

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use super::schema::{OptionSpec, OptionType};

/// Marks a raw textual option value as a reference to a named parameter.
pub const REFERENCE_MARKER: char = '$';

/// A concrete option value.
///
/// `Reference` names an external parameter that the caller binds later. It is
/// decided when the raw value is parsed, never inferred afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum OptionValue {
    Decimal(f64),
    Integer(i64),
    Boolean(bool),
    String(String),
    #[serde(rename = "ref")]
    Reference(String),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OptionError {
    #[error("option '{option}' expects {expected}, got {found}")]
    TypeMismatch {
        option: String,
        expected: OptionType,
        found: &'static str,
    },
    #[error("option '{option}' has invalid value '{value}'. Valid options: {}", .allowed.join(", "))]
    InvalidSelection {
        option: String,
        value: String,
        allowed: Vec<String>,
    },
    #[error("'{text}' is not a valid {expected} value")]
    Unparsable { text: String, expected: OptionType },
    #[error("reference marker '$' must be followed by a parameter name")]
    EmptyReference,
    #[error("option '{option}' must be a literal value, got a {found}")]
    NotLiteral { option: String, found: &'static str },
}

impl OptionValue {
    pub fn decimal(value: f64) -> Self {
        OptionValue::Decimal(value)
    }

    pub fn string(value: impl Into<String>) -> Self {
        OptionValue::String(value.into())
    }

    pub fn reference(name: impl Into<String>) -> Self {
        OptionValue::Reference(name.into())
    }

    /// Check this value against a declared option and normalise it.
    ///
    /// Integer and Decimal options both store a `Decimal`, clamped to the
    /// declared bounds. References pass through untouched.
    pub fn validate(self, spec: &OptionSpec) -> Result<OptionValue, OptionError> {
        if let OptionValue::Reference(_) = self {
            return Ok(self);
        }

        match spec.option_type {
            OptionType::Integer | OptionType::Decimal => match self.as_decimal() {
                Some(v) => Ok(OptionValue::Decimal(clamp(v, spec.min, spec.max))),
                None => Err(self.mismatch(spec)),
            },
            OptionType::Boolean => match self {
                OptionValue::Boolean(_) => Ok(self),
                _ => Err(self.mismatch(spec)),
            },
            OptionType::String => match self {
                OptionValue::String(_) => Ok(self),
                _ => Err(self.mismatch(spec)),
            },
            OptionType::Select => match self {
                OptionValue::String(ref s)
                    if spec.select_options.is_empty() || spec.select_options.contains(s) =>
                {
                    Ok(self)
                }
                OptionValue::String(s) => Err(OptionError::InvalidSelection {
                    option: spec.id.clone(),
                    value: s,
                    allowed: spec.select_options.clone(),
                }),
                _ => Err(self.mismatch(spec)),
            },
        }
    }

    /// Parse a raw textual value for an option of the given type.
    pub fn parse_raw(text: &str, option_type: OptionType) -> Result<OptionValue, OptionError> {
        let text = text.trim();
        if let Some(name) = text.strip_prefix(REFERENCE_MARKER) {
            if name.is_empty() {
                return Err(OptionError::EmptyReference);
            }
            return Ok(OptionValue::Reference(name.to_string()));
        }

        let unparsable = || OptionError::Unparsable {
            text: text.to_string(),
            expected: option_type,
        };

        match option_type {
            OptionType::Integer | OptionType::Decimal => text
                .parse::<f64>()
                .map(OptionValue::Decimal)
                .map_err(|_| unparsable()),
            OptionType::Boolean => match text.to_ascii_lowercase().as_str() {
                "true" => Ok(OptionValue::Boolean(true)),
                "false" => Ok(OptionValue::Boolean(false)),
                _ => Err(unparsable()),
            },
            OptionType::String | OptionType::Select => Ok(OptionValue::String(text.to_string())),
        }
    }

    fn mismatch(&self, spec: &OptionSpec) -> OptionError {
        OptionError::TypeMismatch {
            option: spec.id.clone(),
            expected: spec.option_type,
            found: self.type_name(),
        }
    }

    // =========================================================================
    // Read-back
    // =========================================================================

    pub fn as_decimal(&self) -> Option<f64> {
        match self {
            OptionValue::Decimal(v) => Some(*v),
            OptionValue::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Integral read-back. Decimals with a fractional part yield `None`.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            OptionValue::Integer(v) => Some(*v),
            OptionValue::Decimal(v) if v.fract() == 0.0 => Some(*v as i64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OptionValue::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            OptionValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn reference_name(&self) -> Option<&str> {
        match self {
            OptionValue::Reference(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, OptionValue::Reference(_))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            OptionValue::Decimal(_) => "decimal",
            OptionValue::Integer(_) => "integer",
            OptionValue::Boolean(_) => "boolean",
            OptionValue::String(_) => "string",
            OptionValue::Reference(_) => "ref",
        }
    }
}

fn clamp(value: f64, min: Option<f64>, max: Option<f64>) -> f64 {
    let value = min.map_or(value, |m| value.max(m));
    max.map_or(value, |m| value.min(m))
}

impl PartialEq for OptionValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (OptionValue::Decimal(a), OptionValue::Decimal(b)) => a.to_bits() == b.to_bits(),
            (OptionValue::Integer(a), OptionValue::Integer(b)) => a == b,
            (OptionValue::Boolean(a), OptionValue::Boolean(b)) => a == b,
            (OptionValue::String(a), OptionValue::String(b)) => a == b,
            (OptionValue::Reference(a), OptionValue::Reference(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for OptionValue {}

impl Hash for OptionValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            OptionValue::Decimal(v) => {
                0u8.hash(state);
                v.to_bits().hash(state);
            }
            OptionValue::Integer(v) => {
                1u8.hash(state);
                v.hash(state);
            }
            OptionValue::Boolean(v) => {
                2u8.hash(state);
                v.hash(state);
            }
            OptionValue::String(s) => {
                3u8.hash(state);
                s.hash(state);
            }
            // Only the parameter name identifies a reference.
            OptionValue::Reference(name) => name.hash(state),
        }
    }
}

impl std::fmt::Display for OptionValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptionValue::Decimal(v) => write!(f, "{v}"),
            OptionValue::Integer(v) => write!(f, "{v}"),
            OptionValue::Boolean(v) => write!(f, "{v}"),
            OptionValue::String(s) => write!(f, "{s}"),
            OptionValue::Reference(name) => write!(f, "{REFERENCE_MARKER}{name}"),
        }
    }
}
