#[allow(dead_code)]
mod helpers;

use helpers::*;
use strategy_compiler::ir::{CompiledGraph, DependencyGraph, validate_graph};
use strategy_compiler::parse::{self, CmpOp, Expr};

fn sample_graph() -> CompiledGraph {
    compile_ok(vec![
        assign("src", source("1H")),
        assign("fast", feed(ctor("sma", vec![("period", Expr::int(10))]), vec![attr("src", "c")])),
        assign("slow", feed(ctor("sma", vec![("period", Expr::string("$slow_period"))]), vec![attr("src", "c")])),
        assign("cross", Expr::compare(name("fast"), CmpOp::Gt, name("slow"))),
    ])
}

fn codes(graph_json: &str) -> Vec<&'static str> {
    let graph = parse::parse_graph(graph_json).expect("graph document parses");
    validate_graph(&graph, &registry())
        .into_iter()
        .map(|e| e.code)
        .collect()
}

// =============================================================================
// Round trip
// =============================================================================

#[test]
fn test_compiled_graph_round_trips_through_json() {
    let graph = sample_graph();
    let json = graph.to_json();
    let back = parse::parse_graph(&json).expect("compiled graph parses back");

    assert!(graph.equivalent(&back), "round trip changed the graph:\n{json}");
    assert!(validate_graph(&back, &registry()).is_empty());
}

#[test]
fn test_equivalence_ignores_node_order() {
    let graph = sample_graph();
    let mut reversed = graph.clone();
    reversed.nodes.reverse();
    assert!(graph.equivalent(&reversed));

    let mut changed = graph.clone();
    changed.nodes[1].options.clear();
    assert!(!graph.equivalent(&changed));
}

#[test]
fn test_document_shape() {
    let graph = sample_graph();
    let json: serde_json::Value = serde_json::from_str(&graph.to_json()).unwrap();

    let fast = json
        .as_array()
        .unwrap()
        .iter()
        .find(|n| n["id"] == "fast")
        .unwrap();
    assert_eq!(
        *fast,
        serde_json::json!({
            "id": "fast",
            "type": "sma",
            "options": {"period": {"type": "decimal", "value": 10.0}},
            "inputs": {"SLOT": ["src#c"]},
            "timeframe": "1H"
        })
    );

    let slow = json.as_array().unwrap().iter().find(|n| n["id"] == "slow").unwrap();
    assert_eq!(
        slow["options"]["period"],
        serde_json::json!({"type": "ref", "value": "slow_period"})
    );
}

#[test]
fn test_compiled_graph_is_in_dependency_order() {
    let graph = sample_graph();
    let deps = DependencyGraph::build(&graph);

    let order = deps.topo_order().expect("acyclic");
    let position = |id: &str| order.iter().position(|n| *n == id).unwrap();
    assert!(position("src") < position("fast"));
    assert!(position("fast") < position("cross"));
    assert!(position("slow") < position("cross"));
}

// =============================================================================
// Validation of hand-written documents
// =============================================================================

#[test]
fn test_valid_document() {
    let json = r#"[
        {"id": "src", "type": "market_data_source",
         "options": {"symbol": {"type": "string", "value": "BTCUSD"}}, "timeframe": "1D"},
        {"id": "avg", "type": "sma",
         "options": {"period": {"type": "decimal", "value": 14.0}},
         "inputs": {"SLOT": ["src#close"]}}
    ]"#;
    assert!(codes(json).is_empty(), "aliases are accepted: {:?}", codes(json));
}

#[test]
fn test_document_violations() {
    let json = r#"[
        {"id": "src", "type": "market_data_source", "options": {}, "session": "Tokyo"},
        {"id": "avg", "type": "sma",
         "options": {"period": {"type": "string", "value": "x"}, "alpha": {"type": "decimal", "value": 1.0}},
         "inputs": {"SLOT": ["src#open", "src#c"], "extra": ["ghost#result"]}},
        {"id": "what", "type": "not_a_transform"}
    ]"#;

    let found = codes(json);
    for code in ["V003", "V004", "V005", "V008", "V009", "V007", "V012", "V002"] {
        assert!(found.contains(&code), "Expected {code}, got {found:?}");
    }
    assert!(!found.contains(&"V011"), "session on a timeframe-bearing transform is legal");
}

#[test]
fn test_forward_reference_is_reported() {
    let json = r#"[
        {"id": "avg", "type": "sma",
         "options": {"period": {"type": "decimal", "value": 3.0}},
         "inputs": {"SLOT": ["src#c"]}},
        {"id": "src", "type": "market_data_source",
         "options": {"symbol": {"type": "string", "value": "BTCUSD"}}, "timeframe": "1D"}
    ]"#;
    assert_eq!(codes(json), vec!["V013"]);
}

#[test]
fn test_malformed_document_is_a_parse_error() {
    let err = parse::parse_graph(r#"[{"id": "a"}]"#).unwrap_err();
    assert_eq!(err.code, "P001");
    assert!(err.message.starts_with("Failed to parse graph document"));

    let err = parse::parse_graph(r#"[{"id": "a", "type": "number", "timeframe": "3X"}]"#).unwrap_err();
    assert_eq!(err.code, "P001");
}
