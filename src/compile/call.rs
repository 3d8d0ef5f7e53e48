//! Component calls: `ctor(options...)(inputs...)`.

use std::collections::BTreeMap;

use super::context::{Context, NodeRef, ValueHandle};
use crate::diagnostics::Diagnostic;
use crate::error::{CompilerError, Location};
use crate::ir::Node;
use crate::metadata::{IoSpec, TransformSchema};
use crate::parse::{Expr, ExprKind, Keyword};

/// A call expression flattened into its constructor name and argument lists,
/// outermost call last.
pub(crate) struct CallChain<'e> {
    pub component: &'e str,
    pub calls: Vec<(&'e [Expr], &'e [Keyword])>,
}

impl<'e> CallChain<'e> {
    pub fn of(expr: &'e Expr) -> Result<Self, Diagnostic> {
        let mut calls = Vec::new();
        let mut current = expr;
        let component = loop {
            match &current.kind {
                ExprKind::Call {
                    func,
                    args,
                    keywords,
                } => {
                    calls.push((args.as_slice(), keywords.as_slice()));
                    current = func;
                }
                ExprKind::Name { id } => break id.as_str(),
                _ => {
                    return Err(Diagnostic::Unsupported {
                        construct: format!("calling a {}", current.describe()),
                    });
                }
            }
        };
        calls.reverse();
        Ok(CallChain { component, calls })
    }
}

impl Context<'_> {
    /// Compile a component call into one node. `node_id` is the variable the
    /// node is assigned to, if any; otherwise an id is generated.
    pub(crate) fn compile_call(
        &mut self,
        expr: &Expr,
        node_id: Option<&str>,
    ) -> Result<NodeRef, CompilerError> {
        let location = expr.location();
        let chain = CallChain::of(expr).map_err(|d| self.error(d, location))?;
        let schema = self
            .schema(chain.component)
            .map_err(|d| self.error(d, location))?;

        let Some(&(ctor_args, ctor_keywords)) = chain.calls.first() else {
            return Err(self.error(
                Diagnostic::Unsupported {
                    construct: format!("bare reference to component '{}'", chain.component),
                },
                location,
            ));
        };

        // Shorthand `ctor(x, y)` feeds inputs directly when there is nothing
        // to configure.
        let mut feed_args: Vec<&Expr> = Vec::new();
        let mut feed_keywords: Vec<&Keyword> = Vec::new();
        if !ctor_args.is_empty() {
            if !schema.options.is_empty() || chain.calls.len() > 1 {
                return Err(self.error(
                    Diagnostic::Unsupported {
                        construct: format!(
                            "positional arguments to '{}()'; pass options by keyword",
                            schema.id
                        ),
                    },
                    location,
                ));
            }
            feed_args.extend(ctor_args);
        }
        for &(args, keywords) in &chain.calls[1..] {
            feed_args.extend(args);
            feed_keywords.extend(keywords);
        }

        let node_id = match node_id {
            Some(name) => {
                self.reserve(name).map_err(|d| self.error(d, location))?;
                name.to_string()
            }
            None => self.unique_id(&schema.id),
        };

        let configured = self.configure(schema, &node_id, ctor_keywords, location)?;
        let inputs = self.feed(schema, &node_id, &feed_args, &feed_keywords, location)?;

        let node = Node {
            id: node_id.clone(),
            transform: schema.id.clone(),
            options: configured.options,
            inputs,
            timeframe: configured.timeframe,
            session: configured.session,
        };
        self.emit(node, location)?;
        Ok(NodeRef::new(node_id, &schema.id))
    }

    /// Compile and wire the feed arguments of a call, positional first.
    fn feed(
        &mut self,
        schema: &TransformSchema,
        node_id: &str,
        args: &[&Expr],
        keywords: &[&Keyword],
        location: Option<Location>,
    ) -> Result<BTreeMap<String, Vec<String>>, CompilerError> {
        let invalid = |reason: String| Diagnostic::InvalidInput {
            node: node_id.to_string(),
            component: schema.id.clone(),
            reason,
        };

        let mut inputs: BTreeMap<String, Vec<String>> = BTreeMap::new();

        for (position, arg) in args.iter().enumerate() {
            let spec = match schema.inputs.get(position) {
                Some(spec) => spec,
                None => match schema.inputs.last() {
                    Some(last) if last.allow_multiple_connections => last,
                    _ => {
                        let reason = format!(
                            "takes {} input(s) but {} were given",
                            schema.inputs.len(),
                            args.len()
                        );
                        return Err(self.error(invalid(reason), arg.location().or(location)));
                    }
                },
            };
            let value = self.compile_expr(arg)?;
            self.connect(&mut inputs, schema, spec, value, node_id, arg.location().or(location))?;
        }

        for keyword in keywords {
            let arg_location = keyword.value.location().or(location);
            let Some(spec) = schema
                .inputs
                .iter()
                .find(|i| i.id == keyword.arg || i.binding_id() == keyword.arg)
            else {
                let reason = format!("unknown input '{}'", keyword.arg);
                return Err(self.error(invalid(reason), arg_location));
            };
            let value = self.compile_expr(&keyword.value)?;
            self.connect(&mut inputs, schema, spec, value, node_id, arg_location)?;
        }

        Ok(inputs)
    }

    fn connect(
        &mut self,
        inputs: &mut BTreeMap<String, Vec<String>>,
        schema: &TransformSchema,
        spec: &IoSpec,
        value: ValueHandle,
        node_id: &str,
        location: Option<Location>,
    ) -> Result<(), CompilerError> {
        let binding = spec.binding_id();
        let occupied = inputs.get(&binding).is_some_and(|refs| !refs.is_empty());
        if occupied && !spec.allow_multiple_connections {
            return Err(self.error(
                Diagnostic::InvalidInput {
                    node: node_id.to_string(),
                    component: schema.id.clone(),
                    reason: format!("input '{}' is already connected", spec.id),
                },
                location,
            ));
        }

        let value = self.coerce(value, spec.value_type, &binding, node_id, location)?;
        inputs.entry(binding).or_default().push(value.reference());
        Ok(())
    }
}
