//! Compiled graph validation.
//!
//! Checks a `CompiledGraph` against the registry: ids, transforms, options,
//! input wiring, node order and acyclicity. Used on documents read back from JSON and, on
//! request, on the compiler's own output.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::ir::graph::DependencyGraph;
use crate::ir::id;
use crate::ir::types::*;
use crate::metadata::{Registry, TransformSchema};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub code: &'static str,
    pub message: String,
    /// The node where the error was found, if applicable.
    pub node_id: Option<String>,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.node_id {
            Some(id) => write!(f, "[{}] {} (at node '{}')", self.code, self.message, id),
            None => write!(f, "[{}] {}", self.code, self.message),
        }
    }
}

impl ValidationError {
    fn at(code: &'static str, node: &Node, message: impl Into<String>) -> Self {
        ValidationError {
            code,
            message: message.into(),
            node_id: Some(node.id.clone()),
        }
    }
}

/// Validate a compiled graph. Returns all errors found.
pub fn validate_graph(graph: &CompiledGraph, registry: &Registry) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    validate_unique_ids(graph, &mut errors);

    // First occurrence wins; later duplicates are reported as V001.
    let mut by_id: HashMap<&str, (usize, &Node)> = HashMap::new();
    for (position, n) in graph.iter().enumerate() {
        by_id.entry(n.id.as_str()).or_insert((position, n));
    }
    for (position, node) in graph.iter().enumerate() {
        let Some(schema) = registry.lookup(&node.transform) else {
            errors.push(ValidationError::at(
                "V002",
                node,
                format!("Unknown transform type '{}'", node.transform),
            ));
            continue;
        };
        validate_options(node, schema, &mut errors);
        validate_inputs(node, position, schema, &by_id, registry, &mut errors);
        validate_session(node, schema, &mut errors);
    }

    validate_acyclic(graph, &mut errors);

    errors
}

// ---------------------------------------------------------------------------
// Invariant: node ids are unique
// ---------------------------------------------------------------------------

fn validate_unique_ids(graph: &CompiledGraph, errors: &mut Vec<ValidationError>) {
    let mut seen = HashSet::new();
    for node in graph {
        if !seen.insert(node.id.as_str()) {
            errors.push(ValidationError::at(
                "V001",
                node,
                format!("Duplicate node ID '{}'", node.id),
            ));
        }
    }
}

// ---------------------------------------------------------------------------
// Invariant: options are exactly the declared ones, each well typed
// ---------------------------------------------------------------------------

fn validate_options(node: &Node, schema: &TransformSchema, errors: &mut Vec<ValidationError>) {
    for spec in &schema.options {
        match node.options.get(&spec.id) {
            Some(value) => {
                if let Err(e) = value.clone().validate(spec) {
                    errors.push(ValidationError::at("V005", node, e.to_string()));
                }
            }
            None if spec.required => errors.push(ValidationError::at(
                "V003",
                node,
                format!(
                    "Missing required option: {} for transform {}",
                    spec.id, schema.id
                ),
            )),
            None => {}
        }
    }

    let unknown: BTreeSet<&str> = node
        .options
        .keys()
        .map(String::as_str)
        .filter(|key| schema.find_option(key).is_none())
        .collect();
    if !unknown.is_empty() {
        errors.push(ValidationError::at(
            "V004",
            node,
            format!(
                "Unknown options: {}",
                unknown.into_iter().collect::<Vec<_>>().join(", ")
            ),
        ));
    }
}

// ---------------------------------------------------------------------------
// Invariant: inputs are declared and reference existing producer outputs
// ---------------------------------------------------------------------------

fn validate_inputs(
    node: &Node,
    position: usize,
    schema: &TransformSchema,
    by_id: &HashMap<&str, (usize, &Node)>,
    registry: &Registry,
    errors: &mut Vec<ValidationError>,
) {
    for (input_id, references) in &node.inputs {
        match schema.find_input(input_id) {
            None => errors.push(ValidationError::at(
                "V009",
                node,
                format!(
                    "Input '{}' is not declared by transform '{}'",
                    input_id, schema.id
                ),
            )),
            Some(spec) if !spec.allow_multiple_connections && references.len() > 1 => {
                errors.push(ValidationError::at(
                    "V012",
                    node,
                    format!(
                        "Input '{}' accepts a single connection, got {}",
                        input_id,
                        references.len()
                    ),
                ))
            }
            Some(_) => {}
        }

        for reference in references.iter().filter(|r| !r.is_empty()) {
            let Some((producer_id, output_id)) = id::resolve(reference) else {
                errors.push(ValidationError::at(
                    "V006",
                    node,
                    format!("Malformed reference '{reference}'"),
                ));
                continue;
            };
            let Some(&(producer_position, producer)) = by_id.get(producer_id) else {
                errors.push(ValidationError::at(
                    "V007",
                    node,
                    format!("Reference '{reference}' names unknown node '{producer_id}'"),
                ));
                continue;
            };
            if producer_position >= position {
                errors.push(ValidationError::at(
                    "V013",
                    node,
                    format!("Reference '{reference}' names node '{producer_id}', which is not emitted earlier"),
                ));
            }
            let declared = registry
                .lookup(&producer.transform)
                .is_none_or(|p| p.find_output(output_id).is_some());
            if !declared {
                errors.push(ValidationError::at(
                    "V008",
                    node,
                    format!(
                        "Reference '{}' names unknown output '{}' of '{}'",
                        reference, output_id, producer.transform
                    ),
                ));
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Invariant: sessions only on timeframe-bearing transforms
// ---------------------------------------------------------------------------

fn validate_session(node: &Node, schema: &TransformSchema, errors: &mut Vec<ValidationError>) {
    if node.session.is_some() && !schema.requires_timeframe {
        errors.push(ValidationError::at(
            "V011",
            node,
            format!(
                "Transform '{}' does not take a timeframe, so it cannot carry a session",
                schema.id
            ),
        ));
    }
}

// ---------------------------------------------------------------------------
// Invariant: the graph is acyclic
// ---------------------------------------------------------------------------

fn validate_acyclic(graph: &CompiledGraph, errors: &mut Vec<ValidationError>) {
    let deps = DependencyGraph::build(graph);
    if let Err(node_id) = deps.topo_order() {
        errors.push(ValidationError {
            code: "V010",
            message: "Graph contains a dependency cycle".into(),
            node_id: Some(node_id.to_string()),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::*;
    use crate::timeframe::{Session, SessionKind, Timeframe};

    fn registry() -> Registry {
        let mut builder = RegistryBuilder::with_builtins();
        builder
            .register_all([
                TransformSchema::new("src", TransformCategory::DataSource)
                    .output(IoSpec::new("c", ValueType::Decimal))
                    .requires_timeframe(),
                TransformSchema::new("sma", TransformCategory::Indicator)
                    .option(OptionSpec::new("period", OptionType::Integer).required())
                    .input(IoSpec::new("*", ValueType::Decimal))
                    .output(IoSpec::new("result", ValueType::Decimal)),
            ])
            .unwrap();
        builder.build()
    }

    fn codes(errors: &[ValidationError]) -> Vec<&str> {
        errors.iter().map(|e| e.code).collect()
    }

    fn valid() -> CompiledGraph {
        CompiledGraph::new(vec![
            Node::new("c", "src").with_timeframe(Timeframe::days(1)),
            Node::new("s", "sma")
                .with_option("period", OptionValue::Decimal(20.0))
                .with_input("SLOT", "c#c"),
        ])
    }

    #[test]
    fn valid_graph_passes() {
        assert!(validate_graph(&valid(), &registry()).is_empty());
    }

    #[test]
    fn option_rules() {
        let mut graph = valid();
        graph.nodes[1].options.clear();
        graph.nodes[1]
            .options
            .insert("window".into(), OptionValue::Decimal(3.0));
        graph.nodes[1]
            .options
            .insert("alpha".into(), OptionValue::Decimal(3.0));
        let errors = validate_graph(&graph, &registry());
        assert_eq!(codes(&errors), vec!["V003", "V004"]);
        assert_eq!(errors[0].message, "Missing required option: period for transform sma");
        assert_eq!(errors[1].message, "Unknown options: alpha, window");
    }

    #[test]
    fn reference_rules() {
        let mut graph = valid();
        graph.push(
            Node::new("bad", "sma")
                .with_option("period", OptionValue::Decimal(2.0))
                .with_input("SLOT", "nowhere#c"),
        );
        graph.push(
            Node::new("bad2", "sma")
                .with_option("period", OptionValue::Decimal(2.0))
                .with_input("SLOT", "c#volume"),
        );
        graph.push(
            Node::new("bad3", "sma")
                .with_option("period", OptionValue::Decimal(2.0))
                .with_input("SLOT", "c")
                .with_input("extra", "c#c"),
        );
        let errors = validate_graph(&graph, &registry());
        assert_eq!(codes(&errors), vec!["V007", "V008", "V006", "V009"]);
    }

    #[test]
    fn duplicate_ids_unknown_types_and_sessions() {
        let mut graph = valid();
        graph.push(Node::new("c", "src").with_timeframe(Timeframe::days(1)));
        graph.push(Node::new("m", "mystery"));
        graph.push(
            Node::new("x", "number")
                .with_option("value", OptionValue::Decimal(1.0))
                .with_session(Session::Named(SessionKind::Tokyo)),
        );
        let errors = validate_graph(&graph, &registry());
        assert_eq!(codes(&errors), vec!["V001", "V002", "V011"]);
    }

    #[test]
    fn cycles_are_reported() {
        let graph = CompiledGraph::new(vec![
            Node::new("a", "sma")
                .with_option("period", OptionValue::Decimal(2.0))
                .with_input("SLOT", "b#result"),
            Node::new("b", "sma")
                .with_option("period", OptionValue::Decimal(2.0))
                .with_input("SLOT", "a#result"),
        ]);
        let errors = validate_graph(&graph, &registry());
        assert_eq!(codes(&errors), vec!["V013", "V010"]);
    }

    #[test]
    fn producers_come_first() {
        let mut graph = valid();
        graph.nodes.reverse();
        let errors = validate_graph(&graph, &registry());
        assert_eq!(codes(&errors), vec!["V013"]);
        assert_eq!(errors[0].node_id.as_deref(), Some("s"));
    }
}
