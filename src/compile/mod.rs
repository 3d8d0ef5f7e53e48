//! Compile phase: script syntax tree → CompiledGraph.
//!
//! Statements are compiled in order. Every node is emitted after the nodes it
//! reads from, so the output list is already in dependency order. Timeframes
//! are resolved once the whole script has been walked.

pub mod coerce;
mod call;
mod context;
mod expr;
mod options;
mod stmt;

pub use options::{SESSION_PARAMETER, TIMEFRAME_PARAMETER};
pub use stmt::DISCARD;

use serde::{Deserialize, Serialize};

use crate::error::CompilerError;
use crate::ir::{self, CompiledGraph};
use crate::metadata::Registry;
use crate::parse::{self, Module};
use crate::timeframe::Timeframe;
use context::Context;

pub const TRACING_TARGET: &str = "strategy_compiler::compile";

/// Compiler settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompileOptions {
    /// Used for nodes whose transform needs a timeframe but whose inputs
    /// carry none.
    pub base_timeframe: Option<Timeframe>,
    /// Re-validate the produced graph. A violation is a compiler bug.
    pub verify_output: bool,
}

pub struct Compiler<'r> {
    registry: &'r Registry,
    options: CompileOptions,
}

impl<'r> Compiler<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Compiler {
            registry,
            options: CompileOptions::default(),
        }
    }

    pub fn with_options(mut self, options: CompileOptions) -> Self {
        self.options = options;
        self
    }

    pub fn compile(&self, module: &Module) -> Result<CompiledGraph, CompilerError> {
        tracing::debug!(
            target: TRACING_TARGET,
            statements = module.body.len(),
            "Compiling script"
        );

        let mut ctx = Context::new(self.registry);
        for stmt in &module.body {
            ctx.compile_stmt(stmt)?;
        }
        let graph = ctx.finish(self.options.base_timeframe)?;

        if self.options.verify_output {
            let violations = ir::validate_graph(&graph, self.registry);
            assert!(
                violations.is_empty(),
                "compiled graph failed validation: {}",
                violations
                    .iter()
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>()
                    .join("; ")
            );
        }

        tracing::debug!(target: TRACING_TARGET, nodes = graph.len(), "Compiled script");
        Ok(graph)
    }
}

/// Compile `module` with default options.
pub fn compile(module: &Module, registry: &Registry) -> Result<CompiledGraph, CompilerError> {
    Compiler::new(registry).compile(module)
}

/// Parse a syntax tree document and compile it.
pub fn compile_json(json: &str, registry: &Registry) -> Result<CompiledGraph, CompilerError> {
    let module = parse::parse(json)?;
    compile(&module, registry)
}
