//! Transform metadata: schemas, option values and the registry.

pub mod builtins;
pub mod loader;
pub mod option;
pub mod registry;
pub mod schema;

pub use loader::{DirectorySource, InMemorySource, SchemaSource};
pub use option::{OptionError, OptionValue, REFERENCE_MARKER};
pub use registry::{Registry, RegistryBuilder, RegistryError};
pub use schema::*;
