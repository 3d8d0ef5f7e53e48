//! Expression compilation. Operands are always emitted before the node that
//! consumes them.

use super::context::{Binding, Context, ValueHandle};
use crate::diagnostics::Diagnostic;
use crate::error::CompilerError;
use crate::ir::Node;
use crate::ir::id;
use crate::metadata::{OptionValue, ValueType, builtins};
use crate::parse::{BinOp, BoolOp, CmpOp, Expr, ExprKind, Literal, UnaryOp};

impl Context<'_> {
    pub(crate) fn compile_expr(&mut self, expr: &Expr) -> Result<ValueHandle, CompilerError> {
        let location = expr.location();
        match &expr.kind {
            ExprKind::Name { id } => self.resolve_name(id, expr),
            ExprKind::Constant { value } => self.literal(value, expr),
            ExprKind::Attribute { value, attr } => self.attribute(value, attr, expr),
            ExprKind::Call { .. } => {
                let node = self.compile_call(expr, None)?;
                let name = format!("{}()", node.transform);
                self.sole_output(&node, &name)
                    .map_err(|d| self.error(d, location))
            }
            ExprKind::Compare { left, op, right } => self.compare(left, *op, right, expr),
            ExprKind::BoolOp { op, values } => self.bool_op(*op, values, expr),
            ExprKind::BinOp { left, op, right } => {
                let transform = match op {
                    BinOp::Add => builtins::ADD,
                    BinOp::Sub => builtins::SUB,
                    BinOp::Mult => builtins::MUL,
                    BinOp::Div => builtins::DIV,
                };
                let left = self.compile_expr(left)?;
                let right = self.compile_expr(right)?;
                self.binary(transform, left, right, expr)
            }
            ExprKind::UnaryOp { op, operand } => self.unary(*op, operand, expr),
            ExprKind::IfExp { test, body, orelse } => self.if_exp(test, body, orelse, expr),
            ExprKind::Subscript { value, index } => self.subscript(value, index, expr),
            ExprKind::Tuple { .. } => Err(self.error(
                Diagnostic::Unsupported {
                    construct: "tuple used as a value".into(),
                },
                location,
            )),
        }
    }

    fn resolve_name(&mut self, name: &str, expr: &Expr) -> Result<ValueHandle, CompilerError> {
        let result = match self.binding(name) {
            Some(Binding::Handle(handle)) => Ok(handle.clone()),
            Some(Binding::Node(node)) => self.sole_output(node, name),
            None => Err(Diagnostic::UnknownVariable {
                name: name.to_string(),
            }),
        };
        result.map_err(|d| self.error(d, expr.location()))
    }

    fn literal(&mut self, value: &Literal, expr: &Expr) -> Result<ValueHandle, CompilerError> {
        let (transform, option) = match value {
            Literal::Int(v) => (builtins::NUMBER, Some(OptionValue::Decimal(*v as f64))),
            Literal::Float(v) => (builtins::NUMBER, Some(OptionValue::Decimal(*v))),
            Literal::Bool(true) => (builtins::BOOL_TRUE, None),
            Literal::Bool(false) => (builtins::BOOL_FALSE, None),
            Literal::Str(s) => (builtins::TEXT, Some(OptionValue::String(s.clone()))),
            Literal::None => (builtins::NULL, None),
        };

        let node_id = self.unique_id(transform);
        let mut node = Node::new(&node_id, transform);
        if let Some(option) = option {
            node.options.insert(builtins::VALUE.to_string(), option);
        }
        self.emit(node, expr.location())?;
        Ok(ValueHandle::new(node_id, builtins::RESULT))
    }

    fn attribute(
        &mut self,
        value: &Expr,
        attr: &str,
        expr: &Expr,
    ) -> Result<ValueHandle, CompilerError> {
        let location = expr.location();
        let node = match &value.kind {
            ExprKind::Name { id } => match self.binding(id) {
                Some(Binding::Node(node)) => node.clone(),
                Some(Binding::Handle(_)) => {
                    return Err(self.error(
                        Diagnostic::Unsupported {
                            construct: format!(
                                "attribute access on '{id}', which already names a single output"
                            ),
                        },
                        location,
                    ));
                }
                None => {
                    return Err(self.error(
                        Diagnostic::UnknownVariable { name: id.clone() },
                        location,
                    ));
                }
            },
            ExprKind::Call { .. } => self.compile_call(value, None)?,
            _ => {
                return Err(self.error(
                    Diagnostic::Unsupported {
                        construct: format!("attribute access on a {}", value.describe()),
                    },
                    location,
                ));
            }
        };
        self.output(&node, attr)
            .map_err(|d| self.error(d, location))
    }

    fn compare(
        &mut self,
        left: &Expr,
        op: CmpOp,
        right: &Expr,
        expr: &Expr,
    ) -> Result<ValueHandle, CompilerError> {
        let transform = match op {
            CmpOp::Gt => builtins::GT,
            CmpOp::GtE => builtins::GTE,
            CmpOp::Lt => builtins::LT,
            CmpOp::LtE => builtins::LTE,
            CmpOp::Eq => builtins::EQ,
            CmpOp::NotEq => builtins::NEQ,
        };
        let left = self.compile_expr(left)?;
        let mut right = self.compile_expr(right)?;

        // Equality compares like with like: bring the right operand to the
        // left operand's kind.
        if matches!(op, CmpOp::Eq | CmpOp::NotEq) {
            let left_type = self.type_of(&left);
            let right_type = self.type_of(&right);
            if left_type.is_concrete() && right_type.is_concrete() {
                let node_id = self.unique_id(transform);
                right = self.coerce(
                    right,
                    left_type,
                    &id::binding_id(builtins::RIGHT_INPUT),
                    &node_id,
                    expr.location(),
                )?;
                return self.wire_binary(node_id, transform, left, right, expr);
            }
        }

        self.binary(transform, left, right, expr)
    }

    fn bool_op(
        &mut self,
        op: BoolOp,
        values: &[Expr],
        expr: &Expr,
    ) -> Result<ValueHandle, CompilerError> {
        let transform = match op {
            BoolOp::And => builtins::LOGICAL_AND,
            BoolOp::Or => builtins::LOGICAL_OR,
        };
        if values.len() < 2 {
            return Err(self.error(
                Diagnostic::Unsupported {
                    construct: "boolean operation with fewer than two operands".into(),
                },
                expr.location(),
            ));
        }

        let (rest, last) = values.split_at(values.len() - 1);
        let operands = rest
            .iter()
            .map(|value| self.compile_expr(value))
            .collect::<Result<Vec<_>, _>>()?;
        let mut acc = self.compile_expr(&last[0])?;

        // a and b and c  =>  and(a, and(b, c)), innermost first.
        for left in operands.into_iter().rev() {
            acc = self.binary(transform, left, acc, expr)?;
        }
        Ok(acc)
    }

    fn unary(&mut self, op: UnaryOp, operand: &Expr, expr: &Expr) -> Result<ValueHandle, CompilerError> {
        match op {
            UnaryOp::UAdd => self.compile_expr(operand),
            UnaryOp::USub => {
                let minus_one = self.number(-1.0)?;
                let operand = self.compile_expr(operand)?;
                self.binary(builtins::MUL, minus_one, operand, expr)
            }
            UnaryOp::Not => {
                let operand = self.compile_expr(operand)?;
                let node_id = self.unique_id(builtins::LOGICAL_NOT);
                let input = id::binding_id(builtins::UNARY_INPUT);
                let operand =
                    self.coerce(operand, ValueType::Boolean, &input, &node_id, expr.location())?;
                let node = Node::new(&node_id, builtins::LOGICAL_NOT)
                    .with_input(input, operand.reference());
                self.emit(node, expr.location())?;
                Ok(ValueHandle::new(node_id, builtins::RESULT))
            }
        }
    }

    fn if_exp(
        &mut self,
        test: &Expr,
        body: &Expr,
        orelse: &Expr,
        expr: &Expr,
    ) -> Result<ValueHandle, CompilerError> {
        let condition = self.compile_expr(test)?;
        let when_true = self.compile_expr(body)?;
        let when_false = self.compile_expr(orelse)?;

        let node_id = self.unique_id("ifexp");
        let condition = self.coerce(
            condition,
            ValueType::Boolean,
            builtins::SELECT_CONDITION,
            &node_id,
            expr.location(),
        )?;

        let result_type = match (self.type_of(&when_true), self.type_of(&when_false)) {
            (a, b) if a == b => a,
            (a, b) if a.is_numeric() && b.is_numeric() => ValueType::Decimal,
            _ => ValueType::Any,
        };

        let node = Node::new(&node_id, builtins::BOOLEAN_SELECT)
            .with_input(builtins::SELECT_CONDITION, condition.reference())
            .with_input(builtins::SELECT_TRUE, when_true.reference())
            .with_input(builtins::SELECT_FALSE, when_false.reference());
        self.emit(node, expr.location())?;

        let handle = ValueHandle::new(node_id, builtins::RESULT);
        self.set_type(&handle, result_type);
        Ok(handle)
    }

    /// `x[n]` reads `x` from `n` bars back.
    fn subscript(&mut self, value: &Expr, index: &Expr, expr: &Expr) -> Result<ValueHandle, CompilerError> {
        let period = match &index.kind {
            ExprKind::Constant {
                value: Literal::Int(n),
            } => Some(*n),
            ExprKind::UnaryOp {
                op: UnaryOp::USub,
                operand,
            } => match &operand.kind {
                ExprKind::Constant {
                    value: Literal::Int(n),
                } => Some(-*n),
                _ => None,
            },
            _ => None,
        };
        let period = match period {
            Some(0) => {
                return Err(self.error(
                    Diagnostic::Unsupported {
                        construct: "subscript index 0; a lag must be non-zero".into(),
                    },
                    expr.location(),
                ));
            }
            Some(n) => n,
            None => {
                return Err(self.error(
                    Diagnostic::Unsupported {
                        construct: "subscript index that is not a constant integer".into(),
                    },
                    expr.location(),
                ));
            }
        };

        let operand = self.compile_expr(value)?;
        let operand_type = self.type_of(&operand);
        let node_id = self.unique_id(builtins::LAG);
        let node = Node::new(&node_id, builtins::LAG)
            .with_option(builtins::PERIOD, OptionValue::Decimal(period as f64))
            .with_input(id::binding_id(builtins::UNARY_INPUT), operand.reference());
        self.emit(node, expr.location())?;

        let handle = ValueHandle::new(node_id, builtins::RESULT);
        self.set_type(&handle, operand_type);
        Ok(handle)
    }

    /// Emit a two-slot operator, coercing both operands to its input types.
    pub(crate) fn binary(
        &mut self,
        transform: &str,
        left: ValueHandle,
        right: ValueHandle,
        expr: &Expr,
    ) -> Result<ValueHandle, CompilerError> {
        let node_id = self.unique_id(transform);
        self.wire_binary(node_id, transform, left, right, expr)
    }

    fn wire_binary(
        &mut self,
        node_id: String,
        transform: &str,
        left: ValueHandle,
        right: ValueHandle,
        expr: &Expr,
    ) -> Result<ValueHandle, CompilerError> {
        let location = expr.location();
        let schema = self.schema(transform).map_err(|d| self.error(d, location))?;

        let mut node = Node::new(&node_id, transform);
        for (input_id, operand) in [(builtins::LEFT_INPUT, left), (builtins::RIGHT_INPUT, right)] {
            let binding = id::binding_id(input_id);
            let expected = schema
                .find_input(&binding)
                .map_or(ValueType::Any, |i| i.value_type);
            let operand = self.coerce(operand, expected, &binding, &node_id, location)?;
            node.connect(binding, operand.reference());
        }
        self.emit(node, location)?;

        let output = schema
            .outputs
            .first()
            .map_or(builtins::RESULT, |o| o.id.as_str());
        Ok(ValueHandle::new(node_id, output))
    }
}
