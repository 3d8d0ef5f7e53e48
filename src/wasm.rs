//! WASM entry points for browser use.
//!
//! The registry is built once through [`init_registry`]; every later call
//! reads the sealed copy.

use std::collections::BTreeMap;
use std::error::Error as _;
use std::sync::OnceLock;

use wasm_bindgen::prelude::*;

use crate::compile;
use crate::error::CompilerError;
use crate::ir::{CompiledGraph, ValidationError};
use crate::metadata::{InMemorySource, Registry, RegistryBuilder, RegistryError};
use crate::parse;

static REGISTRY: OnceLock<Registry> = OnceLock::new();

/// Load transform schemas on top of the builtins.
///
/// `documents_json` maps a document name to a schema document (one schema
/// or an array of schemas). Returns `ready` with the transform count, or
/// `errors`.
#[wasm_bindgen]
pub fn init_registry(documents_json: &str) -> JsValue {
    let result = init_registry_inner(documents_json);
    serde_wasm_bindgen::to_value(&result).unwrap_or(JsValue::NULL)
}

fn init_registry_inner(documents_json: &str) -> InitResult {
    if REGISTRY.get().is_some() {
        return InitResult::Errors {
            errors: vec![ErrorDto::registry("transform registry is already initialised")],
        };
    }

    let registry = match build_registry(documents_json) {
        Ok(registry) => registry,
        Err(error) => return InitResult::Errors { errors: vec![error] },
    };
    let transforms = registry.len();
    match REGISTRY.set(registry) {
        Ok(()) => InitResult::Ready { transforms },
        Err(_) => InitResult::Errors {
            errors: vec![ErrorDto::registry("transform registry is already initialised")],
        },
    }
}

fn build_registry(documents_json: &str) -> Result<Registry, ErrorDto> {
    let documents: BTreeMap<String, serde_json::Value> = serde_json::from_str(documents_json)
        .map_err(|e| {
            ErrorDto::from(CompilerError::parse(format!(
                "Failed to parse schema documents: {}",
                e
            )))
        })?;

    let mut source = InMemorySource::new();
    for (name, document) in &documents {
        source.insert(name, document.to_string());
    }
    let names: Vec<&str> = documents.keys().map(String::as_str).collect();

    let mut builder = RegistryBuilder::with_builtins();
    builder
        .load_documents(&source, &names)
        .map_err(ErrorDto::from)?;
    Ok(builder.build())
}

/// Compile a script syntax tree. Returns `success` with the graph, or
/// `errors`.
#[wasm_bindgen]
pub fn compile_script(ast_json: &str) -> JsValue {
    let result = compile_script_inner(REGISTRY.get(), ast_json);
    serde_wasm_bindgen::to_value(&result).unwrap_or(JsValue::NULL)
}

fn compile_script_inner(registry: Option<&Registry>, ast_json: &str) -> CompileResult {
    let Some(registry) = registry else {
        return CompileResult::Errors {
            errors: vec![ErrorDto::registry(
                "transform registry is not initialised; call init_registry first",
            )],
        };
    };

    match compile::compile_json(ast_json, registry) {
        Ok(graph) => CompileResult::Success { graph },
        Err(error) => CompileResult::Errors {
            errors: vec![ErrorDto::from(error)],
        },
    }
}

/// Check a graph document against the registry.
/// Returns a JSON array of error objects; empty when the graph is valid.
#[wasm_bindgen]
pub fn validate_graph_document(graph_json: &str) -> JsValue {
    let result = validate_graph_document_inner(REGISTRY.get(), graph_json);
    serde_wasm_bindgen::to_value(&result).unwrap_or(JsValue::NULL)
}

fn validate_graph_document_inner(registry: Option<&Registry>, graph_json: &str) -> Vec<ErrorDto> {
    let Some(registry) = registry else {
        return vec![ErrorDto::registry(
            "transform registry is not initialised; call init_registry first",
        )];
    };

    let graph: CompiledGraph = match parse::parse_graph(graph_json) {
        Ok(graph) => graph,
        Err(error) => return vec![ErrorDto::from(error)],
    };
    crate::ir::validate_graph(&graph, registry)
        .into_iter()
        .map(ErrorDto::from)
        .collect()
}

// ---------------------------------------------------------------------------
// DTOs for serialization to JS
// ---------------------------------------------------------------------------

#[derive(Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorDto {
    code: String,
    phase: String,
    message: String,
    node_id: Option<String>,
    line: Option<u32>,
    col: Option<u32>,
}

impl ErrorDto {
    fn registry(message: impl Into<String>) -> Self {
        ErrorDto {
            code: "R001".into(),
            phase: "Registry".into(),
            message: message.into(),
            node_id: None,
            line: None,
            col: None,
        }
    }
}

impl From<CompilerError> for ErrorDto {
    fn from(e: CompilerError) -> Self {
        ErrorDto {
            code: e.code,
            phase: e.phase.to_string(),
            message: e.message,
            node_id: e.node_id,
            line: e.location.map(|l| l.line),
            col: e.location.map(|l| l.col),
        }
    }
}

impl From<RegistryError> for ErrorDto {
    fn from(e: RegistryError) -> Self {
        let message = match e.source() {
            Some(source) => format!("{e}: {source}"),
            None => e.to_string(),
        };
        ErrorDto {
            code: "R002".into(),
            ..ErrorDto::registry(message)
        }
    }
}

impl From<ValidationError> for ErrorDto {
    fn from(e: ValidationError) -> Self {
        ErrorDto {
            code: e.code.into(),
            phase: "Validate".into(),
            message: e.message,
            node_id: e.node_id,
            line: None,
            col: None,
        }
    }
}

#[derive(Debug, serde::Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
enum InitResult {
    Ready { transforms: usize },
    Errors { errors: Vec<ErrorDto> },
}

#[derive(Debug, serde::Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
enum CompileResult {
    Success { graph: CompiledGraph },
    Errors { errors: Vec<ErrorDto> },
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMA_DOCUMENT: &str = r#"{
        "indicators": [{
            "id": "sma",
            "name": "Simple Moving Average",
            "options": [{"id": "period", "name": "Period", "type": "Integer", "required": true}],
            "inputs": [{"id": "*", "name": "Source", "type": "Number"}],
            "outputs": [{"id": "result", "name": "Result", "type": "Decimal"}]
        }]
    }"#;

    fn sma_registry() -> Registry {
        build_registry(SMA_DOCUMENT).unwrap()
    }

    #[test]
    fn build_registry_loads_documents_over_builtins() {
        let registry = sma_registry();
        assert!(registry.contains("sma"));
        assert!(registry.contains("number"));
    }

    #[test]
    fn build_registry_reports_bad_json() {
        let err = build_registry("not json").unwrap_err();
        assert_eq!(err.code, "P001");
        assert_eq!(err.phase, "Parse");
    }

    #[test]
    fn compile_before_init_is_an_error() {
        let CompileResult::Errors { errors } = compile_script_inner(None, r#"{"body": []}"#) else {
            panic!("expected errors");
        };
        assert_eq!(errors[0].code, "R001");
        assert!(errors[0].message.contains("init_registry"));
    }

    #[test]
    fn compile_script_returns_graph() {
        let registry = sma_registry();
        let ast = r#"{"body": [
            {"kind": "assign", "line": 1, "col": 1,
             "target": {"kind": "name", "id": "x"},
             "value": {"kind": "constant", "value": {"type": "float", "value": 5.0}}}
        ]}"#;
        let CompileResult::Success { graph } = compile_script_inner(Some(&registry), ast) else {
            panic!("expected success");
        };
        assert_eq!(graph.len(), 1);

        let json = serde_json::to_value(CompileResult::Success { graph }).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["graph"][0]["type"], "number");
    }

    #[test]
    fn compile_script_reports_location() {
        let registry = sma_registry();
        let ast = r#"{"body": [
            {"kind": "assign", "line": 3, "col": 1,
             "target": {"kind": "name", "id": "x"},
             "value": {"kind": "call", "line": 3, "col": 5,
                       "func": {"kind": "name", "id": "nope"}}}
        ]}"#;
        let CompileResult::Errors { errors } = compile_script_inner(Some(&registry), ast) else {
            panic!("expected errors");
        };
        assert_eq!(errors[0].code, "C001");
        assert_eq!(errors[0].line, Some(3));
        assert_eq!(errors[0].col, Some(5));
    }

    #[test]
    fn validate_graph_document_lists_violations() {
        let registry = sma_registry();
        let graph = r#"[{"id": "s", "type": "sma", "options": {}, "inputs": {}}]"#;
        let errors = validate_graph_document_inner(Some(&registry), graph);
        assert!(errors.iter().any(|e| e.code == "V003"), "{errors:?}");
        assert!(errors.iter().all(|e| e.phase == "Validate"));
    }
}
