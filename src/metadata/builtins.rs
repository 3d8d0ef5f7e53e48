//! Transforms the compiler synthesises on its own: literals, operators and
//! type adapters.

use super::option::OptionValue;
use super::schema::{IoSpec, OptionSpec, OptionType, TransformCategory, TransformSchema, ValueType};

/// Output handle shared by every builtin.
pub const RESULT: &str = "result";
/// Option carrying a literal's value.
pub const VALUE: &str = "value";
/// Option carrying a lag distance.
pub const PERIOD: &str = "period";

pub const NUMBER: &str = "number";
pub const TEXT: &str = "text";
pub const BOOL_TRUE: &str = "bool_true";
pub const BOOL_FALSE: &str = "bool_false";
pub const NULL: &str = "null";

pub const GT: &str = "gt";
pub const GTE: &str = "gte";
pub const LT: &str = "lt";
pub const LTE: &str = "lte";
pub const EQ: &str = "eq";
pub const NEQ: &str = "neq";

pub const LOGICAL_AND: &str = "logical_and";
pub const LOGICAL_OR: &str = "logical_or";
pub const LOGICAL_NOT: &str = "logical_not";

pub const ADD: &str = "add";
pub const SUB: &str = "sub";
pub const MUL: &str = "mul";
pub const DIV: &str = "div";

pub const BOOLEAN_SELECT: &str = "boolean_select";
pub const LAG: &str = "lag";

pub const STATIC_CAST_TO_INTEGER: &str = "static_cast_to_integer";
pub const STATIC_CAST_TO_DECIMAL: &str = "static_cast_to_decimal";
pub const STATIC_CAST_TO_BOOLEAN: &str = "static_cast_to_boolean";
pub const STATIC_CAST_TO_STRING: &str = "static_cast_to_string";
pub const STATIC_CAST_TO_TIMESTAMP: &str = "static_cast_to_timestamp";

/// Input ids of binary operators, in operand order.
pub const LEFT_INPUT: &str = "*0";
pub const RIGHT_INPUT: &str = "*1";
/// Input id of unary operators and adapters.
pub const UNARY_INPUT: &str = "*";

pub const SELECT_CONDITION: &str = "condition";
pub const SELECT_TRUE: &str = "true";
pub const SELECT_FALSE: &str = "false";

pub fn builtin_schemas() -> Vec<TransformSchema> {
    let mut schemas = vec![
        TransformSchema::new(NUMBER, TransformCategory::Scalar)
            .option(OptionSpec::new(VALUE, OptionType::Decimal).required())
            .output(IoSpec::new(RESULT, ValueType::Decimal)),
        TransformSchema::new(TEXT, TransformCategory::Scalar)
            .option(OptionSpec::new(VALUE, OptionType::String).required())
            .output(IoSpec::new(RESULT, ValueType::String)),
        TransformSchema::new(BOOL_TRUE, TransformCategory::Scalar)
            .output(IoSpec::new(RESULT, ValueType::Boolean)),
        TransformSchema::new(BOOL_FALSE, TransformCategory::Scalar)
            .output(IoSpec::new(RESULT, ValueType::Boolean)),
        TransformSchema::new(NULL, TransformCategory::Scalar)
            .output(IoSpec::new(RESULT, ValueType::Any)),
        TransformSchema::new(LOGICAL_NOT, TransformCategory::Operator)
            .input(IoSpec::new(UNARY_INPUT, ValueType::Boolean))
            .output(IoSpec::new(RESULT, ValueType::Boolean)),
        TransformSchema::new(BOOLEAN_SELECT, TransformCategory::Operator)
            .input(IoSpec::new(SELECT_CONDITION, ValueType::Boolean))
            .input(IoSpec::new(SELECT_TRUE, ValueType::Any))
            .input(IoSpec::new(SELECT_FALSE, ValueType::Any))
            .output(IoSpec::new(RESULT, ValueType::Any)),
        TransformSchema::new(LAG, TransformCategory::Utility)
            .option(
                OptionSpec::new(PERIOD, OptionType::Integer)
                    .with_default(OptionValue::Decimal(1.0)),
            )
            .input(IoSpec::new(UNARY_INPUT, ValueType::Any))
            .output(IoSpec::new(RESULT, ValueType::Any)),
    ];

    for id in [GT, GTE, LT, LTE] {
        schemas.push(binary(id, ValueType::Number, ValueType::Boolean));
    }
    for id in [EQ, NEQ] {
        schemas.push(binary(id, ValueType::Any, ValueType::Boolean));
    }
    for id in [LOGICAL_AND, LOGICAL_OR] {
        schemas.push(binary(id, ValueType::Boolean, ValueType::Boolean));
    }
    for id in [ADD, SUB, MUL, DIV] {
        schemas.push(
            binary(id, ValueType::Number, ValueType::Decimal).with_category(TransformCategory::Math),
        );
    }

    for (id, target) in [
        (STATIC_CAST_TO_INTEGER, ValueType::Integer),
        (STATIC_CAST_TO_DECIMAL, ValueType::Decimal),
        (STATIC_CAST_TO_BOOLEAN, ValueType::Boolean),
        (STATIC_CAST_TO_STRING, ValueType::String),
        (STATIC_CAST_TO_TIMESTAMP, ValueType::Timestamp),
    ] {
        schemas.push(
            TransformSchema::new(id, TransformCategory::Utility)
                .input(IoSpec::new(UNARY_INPUT, ValueType::Any))
                .output(IoSpec::new(RESULT, target))
                .allow_null_inputs(),
        );
    }

    schemas
}

/// Materializing casts; these pass `null` through to their consumer.
pub fn is_static_cast(id: &str) -> bool {
    matches!(
        id,
        STATIC_CAST_TO_INTEGER
            | STATIC_CAST_TO_DECIMAL
            | STATIC_CAST_TO_BOOLEAN
            | STATIC_CAST_TO_STRING
            | STATIC_CAST_TO_TIMESTAMP
    )
}

fn binary(id: &str, operand: ValueType, result: ValueType) -> TransformSchema {
    TransformSchema::new(id, TransformCategory::Operator)
        .input(IoSpec::new(LEFT_INPUT, operand))
        .input(IoSpec::new(RIGHT_INPUT, operand))
        .output(IoSpec::new(RESULT, result))
}

impl TransformSchema {
    fn with_category(mut self, category: TransformCategory) -> Self {
        self.category = category;
        self
    }
}
