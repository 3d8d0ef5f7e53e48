//! petgraph view of a compiled graph: producer -> consumer edges.

use std::collections::HashMap;

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};

use super::id;
use super::types::CompiledGraph;

pub struct DependencyGraph {
    /// Node weights are node ids, edge weights the consuming input id.
    pub graph: DiGraph<String, String>,
    pub node_indices: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
    /// Build the dependency view. References to unknown or malformed
    /// producers are skipped; document validation reports them.
    pub fn build(compiled: &CompiledGraph) -> Self {
        let mut graph = DiGraph::new();
        let mut node_indices = HashMap::new();

        for node in compiled {
            let idx = graph.add_node(node.id.clone());
            node_indices.entry(node.id.clone()).or_insert(idx);
        }

        for node in compiled {
            let consumer = node_indices[&node.id];
            for (input, references) in &node.inputs {
                for reference in references {
                    let Some((producer, _)) = id::resolve(reference) else {
                        continue;
                    };
                    if let Some(&producer) = node_indices.get(producer) {
                        graph.add_edge(producer, consumer, input.clone());
                    }
                }
            }
        }

        DependencyGraph {
            graph,
            node_indices,
        }
    }

    /// Producers before consumers. On a cycle, returns the id of a node on it.
    pub fn topo_order(&self) -> Result<Vec<&str>, &str> {
        toposort(&self.graph, None)
            .map(|order| order.into_iter().map(|idx| self.graph[idx].as_str()).collect())
            .map_err(|cycle| self.graph[cycle.node_id()].as_str())
    }
}
