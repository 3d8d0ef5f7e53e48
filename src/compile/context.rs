//! Per-compilation state: emitted nodes, symbol table and output types.

use std::collections::{HashMap, HashSet};

use super::TRACING_TARGET;
use super::coerce::{self, AdapterKind, Coercion};
use crate::diagnostics::Diagnostic;
use crate::error::{CompilerError, Location};
use crate::ir::id::{self, OutputNamespace};
use crate::ir::{CompiledGraph, Node};
use crate::metadata::{OptionValue, Registry, TransformSchema, ValueType, builtins};
use crate::timeframe::{Timeframe, TimeframeResolver};

/// One output of one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ValueHandle {
    pub node_id: String,
    pub handle: String,
}

impl ValueHandle {
    pub fn new(node_id: impl Into<String>, handle: impl Into<String>) -> Self {
        ValueHandle {
            node_id: node_id.into(),
            handle: handle.into(),
        }
    }

    pub fn reference(&self) -> String {
        id::qualify(&self.node_id, &self.handle)
    }
}

/// A whole node produced by a component call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct NodeRef {
    pub node_id: String,
    pub transform: String,
}

impl NodeRef {
    pub fn new(node_id: impl Into<String>, transform: impl Into<String>) -> Self {
        NodeRef {
            node_id: node_id.into(),
            transform: transform.into(),
        }
    }
}

/// What a script variable denotes.
#[derive(Debug, Clone)]
pub(crate) enum Binding {
    Node(NodeRef),
    Handle(ValueHandle),
}

pub(crate) struct Context<'r> {
    pub registry: &'r Registry,
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
    locations: HashMap<String, Location>,
    used_ids: HashSet<String>,
    bindings: HashMap<String, Binding>,
    namespace: OutputNamespace,
    /// Location of the statement being compiled.
    pub location: Option<Location>,
}

impl<'r> Context<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Context {
            registry,
            nodes: Vec::new(),
            index: HashMap::new(),
            locations: HashMap::new(),
            used_ids: HashSet::new(),
            bindings: HashMap::new(),
            namespace: OutputNamespace::new(),
            location: None,
        }
    }

    /// Raise `diagnostic` at `location`, or at the current statement.
    pub fn error(&self, diagnostic: Diagnostic, location: Option<Location>) -> CompilerError {
        CompilerError::compile(diagnostic, location.or(self.location))
    }

    // =========================================================================
    // Registry
    // =========================================================================

    pub fn schema(&self, transform: &str) -> Result<&'r TransformSchema, Diagnostic> {
        let registry: &'r Registry = self.registry;
        registry
            .lookup(transform)
            .ok_or_else(|| Diagnostic::UnknownComponent {
                name: transform.to_string(),
            })
    }

    // =========================================================================
    // Node ids
    // =========================================================================

    /// First free `<base>_<n>`, counting from zero. The id is reserved.
    pub fn unique_id(&mut self, base: &str) -> String {
        let mut idx = 0usize;
        loop {
            let candidate = format!("{base}_{idx}");
            if self.used_ids.insert(candidate.clone()) {
                return candidate;
            }
            idx += 1;
        }
    }

    /// Reserve a user-chosen node id.
    pub fn reserve(&mut self, node_id: &str) -> Result<(), Diagnostic> {
        if self.used_ids.insert(node_id.to_string()) {
            Ok(())
        } else {
            Err(Diagnostic::DuplicateNode {
                id: node_id.to_string(),
            })
        }
    }

    // =========================================================================
    // Symbols
    // =========================================================================

    pub fn binding(&self, name: &str) -> Option<&Binding> {
        self.bindings.get(name)
    }

    pub fn is_bound(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    pub fn bind(&mut self, name: &str, binding: Binding) {
        self.bindings.insert(name.to_string(), binding);
    }

    pub fn node(&self, node_id: &str) -> Option<&Node> {
        self.index.get(node_id).map(|&i| &self.nodes[i])
    }

    // =========================================================================
    // Types
    // =========================================================================

    pub fn type_of(&self, handle: &ValueHandle) -> ValueType {
        self.namespace
            .lookup(&handle.reference())
            .unwrap_or(ValueType::Any)
    }

    pub fn set_type(&mut self, handle: &ValueHandle, value_type: ValueType) {
        self.namespace.set_type(&handle.reference(), value_type);
    }

    /// The single output of `node`. Sinks and multi-output nodes have none.
    pub fn sole_output(&self, node: &NodeRef, name: &str) -> Result<ValueHandle, Diagnostic> {
        let schema = self.schema(&node.transform)?;
        match schema.outputs.as_slice() {
            [output] => Ok(ValueHandle::new(&node.node_id, &output.id)),
            [] => Err(Diagnostic::Unsupported {
                construct: format!(
                    "use of '{name}' as a value; '{}()' produces no output",
                    node.transform
                ),
            }),
            outputs => Err(Diagnostic::AmbiguousOutput {
                name: name.to_string(),
                component: node.transform.clone(),
                outputs: outputs.iter().map(|o| o.id.clone()).collect(),
            }),
        }
    }

    /// Resolve `node.handle`, following schema aliases.
    pub fn output(&self, node: &NodeRef, handle: &str) -> Result<ValueHandle, Diagnostic> {
        let schema = self.schema(&node.transform)?;
        match schema.find_output(handle) {
            Some(output) => Ok(ValueHandle::new(&node.node_id, &output.id)),
            None => Err(Diagnostic::UnknownHandle {
                handle: handle.to_string(),
                node: node.node_id.clone(),
                component: node.transform.clone(),
                valid: schema.valid_handles(),
            }),
        }
    }

    // =========================================================================
    // Emission
    // =========================================================================

    /// Append a fully wired node.
    ///
    /// Every node passes through here, so input flags are checked uniformly.
    pub fn emit(&mut self, node: Node, location: Option<Location>) -> Result<(), CompilerError> {
        let location = location.or(self.location);
        let schema = self
            .schema(&node.transform)
            .map_err(|d| self.error(d, location))?;

        if self.index.contains_key(&node.id) {
            return Err(self.error(
                Diagnostic::DuplicateNode {
                    id: node.id.clone(),
                },
                location,
            ));
        }

        for reference in node.references() {
            assert!(
                self.namespace.contains(reference),
                "node '{}' references '{}', which no earlier node produces",
                node.id,
                reference
            );
        }

        self.check_inputs(&node, schema)
            .map_err(|d| self.error(d, location))?;

        tracing::trace!(target: TRACING_TARGET, node = %node.id, transform = %node.transform, "Emitted node");
        self.namespace.register_node(&node.id, schema);
        self.used_ids.insert(node.id.clone());
        if let Some(location) = location {
            self.locations.insert(node.id.clone(), location);
        }
        self.index.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(node);
        Ok(())
    }

    fn check_inputs(&self, node: &Node, schema: &TransformSchema) -> Result<(), Diagnostic> {
        let invalid = |reason: String| Diagnostic::InvalidInput {
            node: node.id.clone(),
            component: schema.id.clone(),
            reason,
        };

        if schema.at_least_one_input_required && !node.has_connections() {
            return Err(invalid("at least one input must be connected".into()));
        }

        if !schema.allow_null_inputs {
            for (input, references) in &node.inputs {
                if references.iter().any(|r| self.carries_null(r)) {
                    return Err(invalid(format!("input '{input}' does not accept null")));
                }
            }
        }

        Ok(())
    }

    /// Whether `reference` is a `null` literal, directly or through the casts
    /// inserted to materialize it for a typed input.
    fn carries_null(&self, reference: &str) -> bool {
        let Some(producer) = id::resolve(reference).and_then(|(p, _)| self.node(p)) else {
            return false;
        };
        if producer.transform == builtins::NULL {
            return true;
        }
        builtins::is_static_cast(&producer.transform)
            && producer.references().any(|r| self.carries_null(r))
    }

    // =========================================================================
    // Literals and coercion
    // =========================================================================

    /// A fresh `number` node carrying `value`.
    pub fn number(&mut self, value: f64) -> Result<ValueHandle, CompilerError> {
        let node_id = self.unique_id(builtins::NUMBER);
        let node = Node::new(&node_id, builtins::NUMBER)
            .with_option(builtins::VALUE, OptionValue::Decimal(value));
        self.emit(node, None)?;
        Ok(ValueHandle::new(node_id, builtins::RESULT))
    }

    /// Convert `value` to the type an input of `node_id` expects.
    pub fn coerce(
        &mut self,
        value: ValueHandle,
        expected: ValueType,
        input: &str,
        node_id: &str,
        location: Option<Location>,
    ) -> Result<ValueHandle, CompilerError> {
        let found = self.type_of(&value);
        match coerce::plan(found, expected) {
            Coercion::Compatible => Ok(value),
            Coercion::Incompatible => Err(self.error(
                Diagnostic::IncompatibleType {
                    found,
                    expected,
                    input: input.to_string(),
                    node: node_id.to_string(),
                },
                location,
            )),
            Coercion::Adapter(adapter) => {
                let handle = self.adapter(adapter, value, location)?;
                tracing::debug!(
                    target: TRACING_TARGET,
                    adapter = adapter.transform_id(),
                    from = %found,
                    to = %expected,
                    node = %node_id,
                    input = %input,
                    "Inserted coercion"
                );
                Ok(handle)
            }
        }
    }

    fn adapter(
        &mut self,
        adapter: AdapterKind,
        value: ValueHandle,
        location: Option<Location>,
    ) -> Result<ValueHandle, CompilerError> {
        let node_id = self.unique_id(adapter.id_base());
        let mut node = Node::new(&node_id, adapter.transform_id());

        match adapter {
            AdapterKind::NumericToBoolean => {
                let zero = self.number(0.0)?;
                node.connect(id::binding_id(builtins::LEFT_INPUT), value.reference());
                node.connect(id::binding_id(builtins::RIGHT_INPUT), zero.reference());
            }
            AdapterKind::BooleanToNumeric => {
                let one = self.number(1.0)?;
                let zero = self.number(0.0)?;
                node.connect(builtins::SELECT_CONDITION, value.reference());
                node.connect(builtins::SELECT_TRUE, one.reference());
                node.connect(builtins::SELECT_FALSE, zero.reference());
            }
            AdapterKind::Materialize(_) => {
                node.connect(id::binding_id(builtins::UNARY_INPUT), value.reference());
            }
        }

        self.emit(node, location)?;
        let handle = ValueHandle::new(node_id, builtins::RESULT);
        self.set_type(&handle, adapter.output_type());
        Ok(handle)
    }

    // =========================================================================
    // Finish
    // =========================================================================

    /// Resolve every node's timeframe and hand over the graph.
    pub fn finish(self, base: Option<Timeframe>) -> Result<CompiledGraph, CompilerError> {
        let registry = self.registry;
        let mut graph = CompiledGraph::new(self.nodes);

        let mut resolver = TimeframeResolver::new().with_base(base);
        let resolved: Vec<Option<Timeframe>> = graph
            .iter()
            .map(|node| resolver.resolve(&node.id, &graph, registry))
            .collect();

        for (node, timeframe) in graph.nodes.iter_mut().zip(resolved) {
            let requires = registry
                .lookup(&node.transform)
                .is_some_and(|s| s.requires_timeframe);
            if requires && timeframe.is_none() {
                return Err(CompilerError::compile(
                    Diagnostic::TimeframeRequired {
                        node: node.id.clone(),
                        component: node.transform.clone(),
                    },
                    self.locations.get(&node.id).copied(),
                ));
            }
            node.timeframe = timeframe;
        }

        tracing::debug!(
            target: TRACING_TARGET,
            nodes = graph.len(),
            input_resolutions = resolver.input_resolutions(),
            "Resolved timeframes"
        );
        Ok(graph)
    }
}
