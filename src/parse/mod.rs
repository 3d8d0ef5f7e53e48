//! Parse phase: JSON documents → Rust types.

pub mod ast;

pub use ast::*;

use crate::error::CompilerError;
use crate::ir::CompiledGraph;

/// Deserialize a script syntax tree produced by the external parser.
pub fn parse(json: &str) -> Result<Module, CompilerError> {
    serde_json::from_str::<Module>(json)
        .map_err(|e| CompilerError::parse(format!("Failed to parse script AST: {}", e)))
}

/// Deserialize a compiled graph document.
pub fn parse_graph(json: &str) -> Result<CompiledGraph, CompilerError> {
    serde_json::from_str::<CompiledGraph>(json)
        .map_err(|e| CompilerError::parse(format!("Failed to parse graph document: {}", e)))
}
