use std::collections::{BTreeMap, BTreeSet};

use crate::ir::MethodSignature;

/// Directed call graph over method signatures. Nodes and edges are deduplicated
/// and iterate in signature order.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CallGraph {
    nodes: BTreeSet<MethodSignature>,
    /// Callees keyed by caller.
    edges: BTreeMap<MethodSignature, BTreeSet<MethodSignature>>,
    edge_count: usize,
}

impl CallGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_node(&self, sig: &MethodSignature) -> bool {
        self.nodes.contains(sig)
    }

    /// Insert a node; returns `false` when it was already present.
    pub fn add_node(&mut self, sig: MethodSignature) -> bool {
        self.nodes.insert(sig)
    }

    pub fn has_edge(&self, caller: &MethodSignature, callee: &MethodSignature) -> bool {
        self.edges
            .get(caller)
            .is_some_and(|callees| callees.contains(callee))
    }

    /// Insert a directed edge. Both endpoints must already be nodes.
    pub fn add_edge(&mut self, caller: MethodSignature, callee: MethodSignature) -> bool {
        debug_assert!(
            self.has_node(&caller) && self.has_node(&callee),
            "edge {caller} -> {callee} added before its endpoints"
        );
        let inserted = self.edges.entry(caller).or_default().insert(callee);
        if inserted {
            self.edge_count += 1;
        }
        inserted
    }

    pub fn nodes(&self) -> impl Iterator<Item = &MethodSignature> {
        self.nodes.iter()
    }

    pub fn edges(&self) -> impl Iterator<Item = (&MethodSignature, &MethodSignature)> {
        self.edges
            .iter()
            .flat_map(|(caller, callees)| callees.iter().map(move |callee| (caller, callee)))
    }

    pub fn callees(&self, caller: &MethodSignature) -> impl Iterator<Item = &MethodSignature> {
        self.edges.get(caller).into_iter().flatten()
    }

    pub fn callers<'a>(
        &'a self,
        callee: &'a MethodSignature,
    ) -> impl Iterator<Item = &'a MethodSignature> + 'a {
        self.edges()
            .filter(move |(_, to)| *to == callee)
            .map(|(from, _)| from)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }
}
