//! Statements: assignments, tuple unpacking and sink calls.

use std::collections::HashSet;

use super::call::CallChain;
use super::context::{Binding, Context, ValueHandle};
use crate::diagnostics::Diagnostic;
use crate::error::CompilerError;
use crate::parse::{Expr, ExprKind, Stmt, StmtKind};

/// Assignment target that binds nothing.
pub const DISCARD: &str = "_";

impl Context<'_> {
    pub(crate) fn compile_stmt(&mut self, stmt: &Stmt) -> Result<(), CompilerError> {
        self.location = stmt.location();
        match &stmt.kind {
            StmtKind::Assign { target, value } => match &target.kind {
                ExprKind::Name { id } => self.assign_name(id, target, value),
                ExprKind::Tuple { elts } => self.assign_tuple(elts, target, value),
                _ => Err(self.error(
                    Diagnostic::Unsupported {
                        construct: format!("cannot assign to {}", target.describe()),
                    },
                    target.location(),
                )),
            },
            StmtKind::Expr { value } => self.sink_call(value),
        }
    }

    fn assign_name(&mut self, name: &str, target: &Expr, value: &Expr) -> Result<(), CompilerError> {
        let is_call = matches!(value.kind, ExprKind::Call { .. });

        if name == DISCARD {
            if is_call {
                self.compile_call(value, None)?;
            } else {
                self.compile_expr(value)?;
            }
            return Ok(());
        }

        if self.is_bound(name) {
            return Err(self.error(
                Diagnostic::Redefinition {
                    name: name.to_string(),
                },
                target.location(),
            ));
        }

        let binding = if is_call {
            Binding::Node(self.compile_call(value, Some(name))?)
        } else {
            Binding::Handle(self.compile_expr(value)?)
        };
        self.bind(name, binding);
        Ok(())
    }

    fn assign_tuple(&mut self, elts: &[Expr], target: &Expr, value: &Expr) -> Result<(), CompilerError> {
        let mut names = Vec::with_capacity(elts.len());
        let mut seen = HashSet::new();
        for elt in elts {
            let Some(name) = elt.as_name() else {
                return Err(self.error(
                    Diagnostic::Unsupported {
                        construct: format!("{} inside a tuple target", elt.describe()),
                    },
                    elt.location(),
                ));
            };
            if name != DISCARD && (self.is_bound(name) || !seen.insert(name)) {
                return Err(self.error(
                    Diagnostic::Redefinition {
                        name: name.to_string(),
                    },
                    elt.location().or(target.location()),
                ));
            }
            names.push(name);
        }

        if !matches!(value.kind, ExprKind::Call { .. }) {
            return Err(self.error(
                Diagnostic::Unsupported {
                    construct: format!("unpacking a {}; only component calls have several outputs", value.describe()),
                },
                value.location(),
            ));
        }

        // Arity is checked before anything is emitted.
        let schema = CallChain::of(value)
            .and_then(|chain| self.schema(chain.component))
            .map_err(|d| self.error(d, value.location()))?;
        if schema.outputs.len() != names.len() {
            return Err(self.error(
                Diagnostic::TupleUnpack {
                    component: schema.id.clone(),
                    outputs: schema.output_ids(),
                    requested: names.len(),
                },
                value.location(),
            ));
        }

        let node = self.compile_call(value, None)?;
        for (name, output) in names.into_iter().zip(&schema.outputs) {
            if name != DISCARD {
                let handle = ValueHandle::new(&node.node_id, &output.id);
                self.bind(name, Binding::Handle(handle));
            }
        }
        Ok(())
    }

    /// A bare call statement; its result is dropped, so only sinks qualify.
    fn sink_call(&mut self, value: &Expr) -> Result<(), CompilerError> {
        let location = value.location();
        if !matches!(value.kind, ExprKind::Call { .. }) {
            return Err(self.error(
                Diagnostic::Unsupported {
                    construct: format!("{} used as a statement", value.describe()),
                },
                location,
            ));
        }

        let schema = CallChain::of(value)
            .and_then(|chain| self.schema(chain.component))
            .map_err(|d| self.error(d, location))?;
        if !schema.is_sink() {
            return Err(self.error(
                Diagnostic::Unsupported {
                    construct: format!(
                        "discarded result of '{}()'; assign it to a variable",
                        schema.id
                    ),
                },
                location,
            ));
        }

        self.compile_call(value, None)?;
        Ok(())
    }
}
