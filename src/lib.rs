//! Strategy script compiler.
//!
//! Turns the syntax tree of a strategy script into a validated dataflow graph
//! of transform nodes, ready for an execution engine.

pub mod compile;
pub mod diagnostics;
pub mod error;
pub mod ir;
pub mod metadata;
pub mod parse;
pub mod timeframe;
pub mod wasm;

pub use compile::{CompileOptions, Compiler, compile, compile_json};
pub use error::{CompilerError, ErrorKind, Phase};
pub use ir::CompiledGraph;
pub use metadata::{Registry, RegistryBuilder};
