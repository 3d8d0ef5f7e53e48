//! Compiled graph types.
//!
//! A `CompiledGraph` is an ordered list of fully specified nodes. It serializes
//! transparently as a JSON array, one object per node.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::metadata::OptionValue;
use crate::timeframe::{Session, Timeframe};

// =============================================================================
// NODE
// =============================================================================

/// One instantiated transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    /// Transform id, a key into the registry.
    #[serde(rename = "type")]
    pub transform: String,
    #[serde(default)]
    pub options: BTreeMap<String, OptionValue>,
    /// Input binding id -> qualified references, in connection order.
    #[serde(default)]
    pub inputs: BTreeMap<String, Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeframe: Option<Timeframe>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<Session>,
}

impl Node {
    pub fn new(id: impl Into<String>, transform: impl Into<String>) -> Self {
        Node {
            id: id.into(),
            transform: transform.into(),
            options: BTreeMap::new(),
            inputs: BTreeMap::new(),
            timeframe: None,
            session: None,
        }
    }

    pub fn with_option(mut self, id: impl Into<String>, value: OptionValue) -> Self {
        self.options.insert(id.into(), value);
        self
    }

    pub fn with_input(mut self, id: impl Into<String>, reference: impl Into<String>) -> Self {
        self.connect(id, reference);
        self
    }

    pub fn with_timeframe(mut self, timeframe: Timeframe) -> Self {
        self.timeframe = Some(timeframe);
        self
    }

    pub fn with_session(mut self, session: Session) -> Self {
        self.session = Some(session);
        self
    }

    /// Append a reference to an input's connection list.
    pub fn connect(&mut self, id: impl Into<String>, reference: impl Into<String>) {
        self.inputs.entry(id.into()).or_default().push(reference.into());
    }

    /// Every non-empty input reference, in input-id order.
    pub fn references(&self) -> impl Iterator<Item = &str> {
        self.inputs
            .values()
            .flatten()
            .map(String::as_str)
            .filter(|r| !r.is_empty())
    }

    pub fn has_connections(&self) -> bool {
        self.references().next().is_some()
    }
}

// =============================================================================
// COMPILED GRAPH
// =============================================================================

/// Read access to nodes by id.
pub trait NodeLookup {
    fn node(&self, id: &str) -> Option<&Node>;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompiledGraph {
    pub nodes: Vec<Node>,
}

impl CompiledGraph {
    pub fn new(nodes: Vec<Node>) -> Self {
        CompiledGraph { nodes }
    }

    pub fn push(&mut self, node: Node) {
        self.nodes.push(node);
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Node> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes of the given transform type, in graph order.
    pub fn of_type<'a>(&'a self, transform: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.nodes.iter().filter(move |n| n.transform == transform)
    }

    pub fn sorted_by_id(&self) -> Vec<&Node> {
        let mut nodes: Vec<&Node> = self.nodes.iter().collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));
        nodes
    }

    /// Order-insensitive equality.
    pub fn equivalent(&self, other: &CompiledGraph) -> bool {
        self.len() == other.len() && self.sorted_by_id() == other.sorted_by_id()
    }

    pub fn to_json(&self) -> String {
        // Serialization of plain maps and strings cannot fail.
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

impl NodeLookup for CompiledGraph {
    fn node(&self, id: &str) -> Option<&Node> {
        self.get(id)
    }
}

impl<'a> IntoIterator for &'a CompiledGraph {
    type Item = &'a Node;
    type IntoIter = std::slice::Iter<'a, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}
