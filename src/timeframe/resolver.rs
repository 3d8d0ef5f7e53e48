//! Per-compilation timeframe resolution with memoisation.

use std::collections::HashMap;

use super::{Timeframe, TRACING_TARGET};
use crate::ir::id;
use crate::ir::types::NodeLookup;
use crate::metadata::Registry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resolution {
    Resolving,
    Resolved(Option<Timeframe>),
}

/// Assigns each node its effective sampling frequency.
///
/// Explicit timeframes win. Otherwise a node samples at the coarsest
/// timeframe among its producers, or at one minute when it, or one of its
/// producers, is intraday-only or the node carries a session. A node whose
/// schema requires a timeframe falls back to the base timeframe.
#[derive(Debug, Default)]
pub struct TimeframeResolver {
    cache: HashMap<String, Resolution>,
    base: Option<Timeframe>,
    input_resolutions: usize,
}

impl TimeframeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base(mut self, base: Option<Timeframe>) -> Self {
        self.base = base;
        self
    }

    /// Resolve `node_id`, recursing into its producers.
    ///
    /// # Panics
    ///
    /// When `node_id` is not in `nodes`, or when resolution re-enters a node
    /// that is still being resolved. Both mean the graph handed over was not
    /// built from earlier statements only.
    pub fn resolve<L>(&mut self, node_id: &str, nodes: &L, registry: &Registry) -> Option<Timeframe>
    where
        L: NodeLookup + ?Sized,
    {
        match self.cache.get(node_id) {
            Some(Resolution::Resolved(timeframe)) => return *timeframe,
            Some(Resolution::Resolving) => {
                panic!("timeframe resolution re-entered node '{node_id}': dependency cycle")
            }
            None => {}
        }

        let node = nodes
            .node(node_id)
            .unwrap_or_else(|| panic!("timeframe resolution reached unknown node '{node_id}'"));

        if let Some(explicit) = node.timeframe {
            self.cache
                .insert(node_id.to_string(), Resolution::Resolved(Some(explicit)));
            return Some(explicit);
        }

        self.cache.insert(node_id.to_string(), Resolution::Resolving);
        self.input_resolutions += 1;

        let schema = registry.lookup(&node.transform);
        let mut intraday = node.session.is_some() || schema.is_some_and(|s| s.intraday_only);
        let mut coarsest: Option<Timeframe> = None;

        for reference in node.references() {
            let Some((producer_id, _)) = id::resolve(reference) else {
                continue;
            };
            let resolved = self.resolve(producer_id, nodes, registry);

            let producer_intraday = nodes
                .node(producer_id)
                .and_then(|p| registry.lookup(&p.transform))
                .is_some_and(|s| s.intraday_only);
            intraday |= producer_intraday;

            if let Some(timeframe) = resolved {
                if coarsest.is_none_or(|c| timeframe.is_coarser_than(&c)) {
                    coarsest = Some(timeframe);
                }
            }
        }

        let result = if intraday {
            Some(Timeframe::finest_intraday())
        } else if coarsest.is_some() {
            coarsest
        } else if schema.is_some_and(|s| s.requires_timeframe) {
            self.base
        } else {
            None
        };

        tracing::trace!(
            target: TRACING_TARGET,
            node = %node_id,
            timeframe = ?result.map(|t| t.to_string()),
            "Resolved timeframe"
        );
        self.cache
            .insert(node_id.to_string(), Resolution::Resolved(result));
        result
    }

    /// `Some(resolved)` once `node_id` has been resolved.
    pub fn cached(&self, node_id: &str) -> Option<Option<Timeframe>> {
        match self.cache.get(node_id) {
            Some(Resolution::Resolved(timeframe)) => Some(*timeframe),
            _ => None,
        }
    }

    /// Number of times a timeframe was derived from a node's inputs.
    pub fn input_resolutions(&self) -> usize {
        self.input_resolutions
    }
}
