//! Compiled graph model: nodes, qualified output ids and validation.

pub mod graph;
pub mod id;
pub mod types;
pub mod validate;

pub use graph::DependencyGraph;
pub use types::*;
pub use validate::{ValidationError, validate_graph};
