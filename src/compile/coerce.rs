//! Operand type coercion.
//!
//! A single table decides which value types convert into which, and through
//! which adapter transform. Adding a convertible pair is a table row.

use crate::metadata::builtins;
use crate::metadata::ValueType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterKind {
    /// `neq(x, 0)`
    NumericToBoolean,
    /// `boolean_select(x, 1, 0)`
    BooleanToNumeric,
    /// `static_cast_to_<type>(x)`: fixes the type tag of an untyped value.
    Materialize(ValueType),
}

impl AdapterKind {
    pub fn transform_id(self) -> &'static str {
        match self {
            AdapterKind::NumericToBoolean => builtins::NEQ,
            AdapterKind::BooleanToNumeric => builtins::BOOLEAN_SELECT,
            AdapterKind::Materialize(ValueType::Integer) => builtins::STATIC_CAST_TO_INTEGER,
            AdapterKind::Materialize(ValueType::Boolean) => builtins::STATIC_CAST_TO_BOOLEAN,
            AdapterKind::Materialize(ValueType::String) => builtins::STATIC_CAST_TO_STRING,
            AdapterKind::Materialize(ValueType::Timestamp) => builtins::STATIC_CAST_TO_TIMESTAMP,
            AdapterKind::Materialize(_) => builtins::STATIC_CAST_TO_DECIMAL,
        }
    }

    /// Prefix for the adapter node's generated id.
    pub fn id_base(self) -> &'static str {
        match self {
            AdapterKind::NumericToBoolean => "num_to_bool_cast",
            AdapterKind::BooleanToNumeric => "bool_to_num_cast",
            AdapterKind::Materialize(_) => self.transform_id(),
        }
    }

    /// Type of the adapter's output.
    pub fn output_type(self) -> ValueType {
        match self {
            AdapterKind::NumericToBoolean => ValueType::Boolean,
            AdapterKind::BooleanToNumeric => ValueType::Decimal,
            AdapterKind::Materialize(ValueType::Number) => ValueType::Decimal,
            AdapterKind::Materialize(t) => t,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coercion {
    Compatible,
    Adapter(AdapterKind),
    Incompatible,
}

/// `(from, to, adapter)` for every convertible pair that is not already
/// compatible.
pub const COERCION_TABLE: &[(ValueType, ValueType, AdapterKind)] = &[
    (ValueType::Integer, ValueType::Boolean, AdapterKind::NumericToBoolean),
    (ValueType::Decimal, ValueType::Boolean, AdapterKind::NumericToBoolean),
    (ValueType::Number, ValueType::Boolean, AdapterKind::NumericToBoolean),
    (ValueType::Boolean, ValueType::Integer, AdapterKind::BooleanToNumeric),
    (ValueType::Boolean, ValueType::Decimal, AdapterKind::BooleanToNumeric),
    (ValueType::Boolean, ValueType::Number, AdapterKind::BooleanToNumeric),
    (ValueType::Any, ValueType::Integer, AdapterKind::Materialize(ValueType::Integer)),
    (ValueType::Any, ValueType::Decimal, AdapterKind::Materialize(ValueType::Decimal)),
    (ValueType::Any, ValueType::Number, AdapterKind::Materialize(ValueType::Decimal)),
    (ValueType::Any, ValueType::Boolean, AdapterKind::Materialize(ValueType::Boolean)),
    (ValueType::Any, ValueType::String, AdapterKind::Materialize(ValueType::String)),
    (ValueType::Any, ValueType::Timestamp, AdapterKind::Materialize(ValueType::Timestamp)),
];

pub fn is_compatible(from: ValueType, to: ValueType) -> bool {
    from == to || to == ValueType::Any || (from.is_numeric() && to.is_numeric())
}

pub fn plan(from: ValueType, to: ValueType) -> Coercion {
    if is_compatible(from, to) {
        return Coercion::Compatible;
    }
    COERCION_TABLE
        .iter()
        .find(|(f, t, _)| *f == from && *t == to)
        .map_or(Coercion::Incompatible, |(_, _, adapter)| {
            Coercion::Adapter(*adapter)
        })
}
