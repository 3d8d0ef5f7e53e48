//! Transform registry: a builder during startup, immutable afterwards.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::builtins;
use super::loader::{SchemaDocument, SchemaSource};
use super::schema::TransformSchema;

pub const TRACING_TARGET: &str = "strategy_compiler::metadata";

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("transform '{0}' is already registered")]
    Duplicate(String),
    #[error("transform '{id}' has an invalid schema: {reason}")]
    InvalidSchema { id: String, reason: String },
    #[error("schema document '{0}' was not found")]
    MissingDocument(String),
    #[error("schema document '{name}' could not be read")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },
    #[error("schema document '{name}' is not valid")]
    InvalidDocument {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Registration phase. Consumed by [`RegistryBuilder::build`].
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    schemas: HashMap<String, TransformSchema>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A builder preloaded with the transforms the compiler synthesises itself.
    pub fn with_builtins() -> Self {
        let mut builder = Self::new();
        for schema in builtins::builtin_schemas() {
            // Builtin ids are distinct and their schemas well formed.
            builder.schemas.insert(schema.id.clone(), schema);
        }
        builder
    }

    /// Check `schema` and add it. Option defaults are stored in their
    /// validated form, so `14` on an integer option becomes `14.0`.
    pub fn register(&mut self, mut schema: TransformSchema) -> Result<(), RegistryError> {
        check_schema(&mut schema)?;
        if self.schemas.contains_key(&schema.id) {
            return Err(RegistryError::Duplicate(schema.id));
        }
        tracing::trace!(target: TRACING_TARGET, transform = %schema.id, "Registered transform");
        self.schemas.insert(schema.id.clone(), schema);
        Ok(())
    }

    pub fn register_all<I>(&mut self, schemas: I) -> Result<(), RegistryError>
    where
        I: IntoIterator<Item = TransformSchema>,
    {
        schemas.into_iter().try_for_each(|s| self.register(s))
    }

    /// Register every schema found in the named documents of `source`.
    /// Returns the number of schemas registered.
    pub fn load_documents<S>(&mut self, source: &S, names: &[&str]) -> Result<usize, RegistryError>
    where
        S: SchemaSource + ?Sized,
    {
        let mut count = 0;
        for name in names {
            let text = source.document(name)?;
            let document: SchemaDocument =
                serde_json::from_str(&text).map_err(|source| RegistryError::InvalidDocument {
                    name: name.to_string(),
                    source,
                })?;
            let schemas = document.into_schemas();
            count += schemas.len();
            self.register_all(schemas)?;
            tracing::debug!(target: TRACING_TARGET, document = %name, "Loaded schema document");
        }
        Ok(count)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.schemas.contains_key(id)
    }

    pub fn build(self) -> Registry {
        tracing::info!(
            target: TRACING_TARGET,
            transforms = self.schemas.len(),
            "Sealed transform registry"
        );
        Registry {
            schemas: Arc::new(self.schemas),
        }
    }
}

/// Immutable transform table shared by every compilation.
#[derive(Debug, Clone)]
pub struct Registry {
    schemas: Arc<HashMap<String, TransformSchema>>,
}

impl Registry {
    pub fn builtins() -> Self {
        RegistryBuilder::with_builtins().build()
    }

    pub fn lookup(&self, id: &str) -> Option<&TransformSchema> {
        self.schemas.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.schemas.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Registered ids, sorted.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.schemas.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

fn check_schema(schema: &mut TransformSchema) -> Result<(), RegistryError> {
    let id = schema.id.clone();
    let invalid = |reason: String| RegistryError::InvalidSchema {
        id: id.clone(),
        reason,
    };

    if schema.id.trim().is_empty() {
        return Err(invalid("id must not be empty".into()));
    }

    let mut seen = HashSet::new();
    for option in &mut schema.options {
        if !seen.insert(option.id.clone()) {
            return Err(invalid(format!("duplicate option '{}'", option.id)));
        }
        if let Some(default) = option.default.take() {
            let normalized = default
                .validate(option)
                .map_err(|e| invalid(format!("default does not fit: {e}")))?;
            option.default = Some(normalized);
        }
    }

    let mut seen = HashSet::new();
    for input in &schema.inputs {
        if !seen.insert(input.binding_id()) {
            return Err(invalid(format!("duplicate input '{}'", input.id)));
        }
    }

    let mut seen = HashSet::new();
    for output in &schema.outputs {
        if !seen.insert(output.id.as_str()) {
            return Err(invalid(format!("duplicate output '{}'", output.id)));
        }
    }

    for (alias, target) in &schema.output_aliases {
        if !schema.outputs.iter().any(|o| &o.id == target) {
            return Err(invalid(format!(
                "alias '{alias}' names undeclared output '{target}'"
            )));
        }
    }

    Ok(())
}
