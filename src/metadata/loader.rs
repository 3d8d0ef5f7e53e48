//! Schema document sources for registry bootstrap.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::Deserialize;

use super::registry::RegistryError;
use super::schema::TransformSchema;

/// Supplies schema documents by logical name.
pub trait SchemaSource {
    fn document(&self, name: &str) -> Result<String, RegistryError>;
}

/// A document holds one schema or a list of them.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum SchemaDocument {
    Many(Vec<TransformSchema>),
    One(Box<TransformSchema>),
}

impl SchemaDocument {
    pub(crate) fn into_schemas(self) -> Vec<TransformSchema> {
        match self {
            SchemaDocument::Many(schemas) => schemas,
            SchemaDocument::One(schema) => vec![*schema],
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    documents: HashMap<String, String>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, name: impl Into<String>, json: impl Into<String>) -> Self {
        self.insert(name, json);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, json: impl Into<String>) {
        self.documents.insert(name.into(), json.into());
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.documents.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl SchemaSource for InMemorySource {
    fn document(&self, name: &str) -> Result<String, RegistryError> {
        self.documents
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::MissingDocument(name.to_string()))
    }
}

/// Reads `<root>/<name>.json`.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirectorySource { root: root.into() }
    }
}

impl SchemaSource for DirectorySource {
    fn document(&self, name: &str) -> Result<String, RegistryError> {
        let path = self.root.join(format!("{name}.json"));
        std::fs::read_to_string(&path).map_err(|source| match source.kind() {
            std::io::ErrorKind::NotFound => RegistryError::MissingDocument(name.to_string()),
            _ => RegistryError::Io {
                name: name.to_string(),
                source,
            },
        })
    }
}
