//! Option accumulation for component calls.
//!
//! Keyword arguments of the constructor call are matched against the
//! schema's declared options. `timeframe` and `session` are special
//! parameters that land on the node itself rather than in its option map.

use std::collections::BTreeMap;

use super::context::{Binding, Context};
use crate::diagnostics::Diagnostic;
use crate::error::{CompilerError, Location};
use crate::metadata::{OptionError, OptionType, OptionValue, REFERENCE_MARKER, TransformSchema, builtins};
use crate::parse::{Expr, ExprKind, Keyword, Literal, UnaryOp};
use crate::timeframe::{Session, Timeframe};

pub const TIMEFRAME_PARAMETER: &str = "timeframe";
pub const SESSION_PARAMETER: &str = "session";

/// Everything the constructor call contributes to a node.
#[derive(Debug, Default)]
pub(crate) struct Configured {
    pub options: BTreeMap<String, OptionValue>,
    pub timeframe: Option<Timeframe>,
    pub session: Option<Session>,
}

impl Context<'_> {
    pub(crate) fn configure(
        &self,
        schema: &TransformSchema,
        node_id: &str,
        keywords: &[Keyword],
        location: Option<Location>,
    ) -> Result<Configured, CompilerError> {
        let mut configured = Configured::default();
        let mut supplied: BTreeMap<&str, (OptionValue, Option<Location>)> = BTreeMap::new();

        for keyword in keywords {
            let arg_location = keyword.value.location().or(location);
            let invalid_option = |source: OptionError| Diagnostic::InvalidOption {
                node: node_id.to_string(),
                component: schema.id.clone(),
                source,
            };

            match keyword.arg.as_str() {
                TIMEFRAME_PARAMETER => {
                    configured.timeframe = special(TIMEFRAME_PARAMETER, &keyword.value)
                        .and_then(|text| text.map(|t| parse_special(TIMEFRAME_PARAMETER, &t)).transpose())
                        .map_err(|d| self.error(d, arg_location))?;
                    continue;
                }
                SESSION_PARAMETER => {
                    let session: Option<Session> = special(SESSION_PARAMETER, &keyword.value)
                        .and_then(|text| text.map(|t| parse_special(SESSION_PARAMETER, &t)).transpose())
                        .map_err(|d| self.error(d, arg_location))?;
                    if session.is_some() && !schema.requires_timeframe {
                        return Err(self.error(
                            Diagnostic::InvalidSpecial {
                                parameter: SESSION_PARAMETER.into(),
                                reason: format!("'{}()' does not run on a timeframe", schema.id),
                            },
                            arg_location,
                        ));
                    }
                    configured.session = session;
                    continue;
                }
                _ => {}
            }

            let value = self
                .option_literal(&keyword.arg, &keyword.value)
                .map_err(|source| self.error(invalid_option(source), arg_location))?;
            if supplied
                .insert(keyword.arg.as_str(), (value, arg_location))
                .is_some()
            {
                return Err(self.error(
                    Diagnostic::Unsupported {
                        construct: format!("keyword argument '{}' given more than once", keyword.arg),
                    },
                    arg_location,
                ));
            }
        }

        for spec in &schema.options {
            match supplied.remove(spec.id.as_str()) {
                Some((value, arg_location)) => {
                    let value = value.validate(spec).map_err(|source| {
                        self.error(
                            Diagnostic::InvalidOption {
                                node: node_id.to_string(),
                                component: schema.id.clone(),
                                source,
                            },
                            arg_location,
                        )
                    })?;
                    configured.options.insert(spec.id.clone(), value);
                }
                None => match &spec.default {
                    Some(default) => {
                        configured.options.insert(spec.id.clone(), default.clone());
                    }
                    None if spec.required => {
                        return Err(self.error(
                            Diagnostic::MissingOption {
                                node: node_id.to_string(),
                                component: schema.id.clone(),
                                option: spec.id.clone(),
                            },
                            location,
                        ));
                    }
                    None => {}
                },
            }
        }

        if !supplied.is_empty() {
            return Err(self.error(
                Diagnostic::UnknownOptions {
                    component: schema.id.clone(),
                    keys: supplied.keys().map(|k| k.to_string()).collect(),
                },
                location,
            ));
        }

        Ok(configured)
    }

    /// The literal value a keyword argument denotes.
    fn option_literal(&self, option: &str, expr: &Expr) -> Result<OptionValue, OptionError> {
        let not_literal = || OptionError::NotLiteral {
            option: option.to_string(),
            found: expr.describe(),
        };

        match &expr.kind {
            ExprKind::Constant { value } => match value {
                Literal::Int(v) => Ok(OptionValue::Integer(*v)),
                Literal::Float(v) => Ok(OptionValue::Decimal(*v)),
                Literal::Bool(v) => Ok(OptionValue::Boolean(*v)),
                Literal::Str(s) if s.trim_start().starts_with(REFERENCE_MARKER) => {
                    OptionValue::parse_raw(s, OptionType::String)
                }
                Literal::Str(s) => Ok(OptionValue::String(s.clone())),
                Literal::None => Err(not_literal()),
            },
            ExprKind::UnaryOp {
                op: UnaryOp::USub,
                operand,
            } => match &operand.kind {
                ExprKind::Constant {
                    value: Literal::Int(v),
                } => Ok(OptionValue::Integer(-*v)),
                ExprKind::Constant {
                    value: Literal::Float(v),
                } => Ok(OptionValue::Decimal(-*v)),
                _ => Err(not_literal()),
            },
            // A name bound to a literal node carries that literal; an unbound
            // identifier is taken as a bare string.
            ExprKind::Name { id } => match self.binding(id) {
                Some(Binding::Handle(handle)) => {
                    let node = self.node(&handle.node_id).ok_or_else(not_literal)?;
                    match node.transform.as_str() {
                        builtins::BOOL_TRUE => Ok(OptionValue::Boolean(true)),
                        builtins::BOOL_FALSE => Ok(OptionValue::Boolean(false)),
                        builtins::NUMBER | builtins::TEXT => node
                            .options
                            .get(builtins::VALUE)
                            .cloned()
                            .ok_or_else(not_literal),
                        _ => Err(not_literal()),
                    }
                }
                Some(Binding::Node(_)) => Err(not_literal()),
                None => Ok(OptionValue::String(id.clone())),
            },
            _ => Err(not_literal()),
        }
    }
}

/// The string a special parameter was given. An empty string means the
/// parameter is not specified.
fn special(parameter: &str, expr: &Expr) -> Result<Option<String>, Diagnostic> {
    match &expr.kind {
        ExprKind::Constant {
            value: Literal::Str(text),
        } => Ok((!text.is_empty()).then(|| text.clone())),
        _ => Err(Diagnostic::InvalidSpecial {
            parameter: parameter.to_string(),
            reason: format!("must be a string, got a {}", expr.describe()),
        }),
    }
}

fn parse_special<T>(parameter: &str, text: &str) -> Result<T, Diagnostic>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    text.parse::<T>().map_err(|e| Diagnostic::InvalidSpecial {
        parameter: parameter.to_string(),
        reason: e.to_string(),
    })
}
