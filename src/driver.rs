use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::call_graph::CallGraph;
use crate::hierarchy::TypeHierarchy;
use crate::ir::{CallKind, MethodSignature};
use crate::model::ProgramModel;
use crate::resolver::Resolver;
use crate::scanner::call_sites;

/// Call kinds behind each edge, keyed by caller then callee.
pub type CallKinds = BTreeMap<MethodSignature, BTreeMap<MethodSignature, BTreeSet<CallKind>>>;

/// Limit on the number of methods processed by one construction.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Budget {
    pub max_methods: Option<usize>,
}

impl Budget {
    pub fn unlimited() -> Self {
        Self::default()
    }

    pub fn max_methods(limit: usize) -> Self {
        Self {
            max_methods: Some(limit),
        }
    }
}

/// Counters collected while building the graph.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Stats {
    pub methods_processed: usize,
    pub call_sites: usize,
    pub unresolved_call_sites: usize,
}

/// Result of a construction run.
///
/// When `complete` is false the budget stopped the worklist early and the graph
/// under-approximates the reachable calls.
#[derive(Clone, Debug)]
pub struct Construction {
    pub graph: CallGraph,
    pub complete: bool,
    pub stats: Stats,
    pub call_kinds: CallKinds,
}

impl Construction {
    /// Kinds of the call sites that produced the edge, in declaration order of
    /// `CallKind`. Empty when the edge is absent.
    pub fn call_kinds(
        &self,
        caller: &MethodSignature,
        callee: &MethodSignature,
    ) -> impl Iterator<Item = CallKind> + '_ {
        self.call_kinds
            .get(caller)
            .and_then(|callees| callees.get(callee))
            .into_iter()
            .flatten()
            .copied()
    }
}

/// Build the CHA call graph reachable from `entry_points`.
pub fn build_call_graph(
    model: &dyn ProgramModel,
    hierarchy: &dyn TypeHierarchy,
    entry_points: impl IntoIterator<Item = MethodSignature>,
) -> CallGraph {
    construct(model, hierarchy, entry_points, Budget::unlimited()).graph
}

/// Worklist fixed point: every discovered method is scanned exactly once.
pub fn construct(
    model: &dyn ProgramModel,
    hierarchy: &dyn TypeHierarchy,
    entry_points: impl IntoIterator<Item = MethodSignature>,
    budget: Budget,
) -> Construction {
    let resolver = Resolver::new(model, hierarchy);
    let mut graph = CallGraph::new();
    let mut worklist = VecDeque::new();
    let mut stats = Stats::default();
    let mut call_kinds = CallKinds::new();

    for entry in entry_points {
        if graph.add_node(entry.clone()) {
            worklist.push_back(entry);
        }
    }

    while let Some(caller) = worklist.pop_front() {
        if budget
            .max_methods
            .is_some_and(|limit| stats.methods_processed >= limit)
        {
            worklist.push_front(caller);
            tracing::warn!(
                target: "chagraph",
                processed = stats.methods_processed,
                pending = worklist.len(),
                "method budget exhausted; call graph is partial"
            );
            return Construction {
                graph,
                complete: false,
                stats,
                call_kinds,
            };
        }
        stats.methods_processed += 1;
        graph.add_node(caller.clone());

        let mut callees: BTreeMap<MethodSignature, BTreeSet<CallKind>> = BTreeMap::new();
        for call in call_sites(model, &caller) {
            stats.call_sites += 1;
            let candidates = resolver.resolve(&call.target);
            if candidates.is_empty() {
                stats.unresolved_call_sites += 1;
            }
            for candidate in candidates {
                callees.entry(candidate).or_default().insert(call.kind);
            }
        }
        tracing::debug!(
            target: "chagraph",
            method = %caller,
            callees = callees.len(),
            "processed method"
        );

        for callee in callees.keys() {
            if graph.add_node(callee.clone()) {
                worklist.push_back(callee.clone());
            }
            if !graph.has_edge(&caller, callee) {
                graph.add_edge(caller.clone(), callee.clone());
            }
        }
        if !callees.is_empty() {
            call_kinds.insert(caller, callees);
        }
    }

    Construction {
        graph,
        complete: true,
        stats,
        call_kinds,
    }
}
