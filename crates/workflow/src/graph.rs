//! DAG validation and traversal helpers shared by the graph runtime (C5)
//! and the debug stepper (C9).

use std::collections::{HashMap, HashSet};

use nebula_core::id::NodeId;
use petgraph::graphmap::DiGraphMap;
use petgraph::visit::Dfs;

use crate::edge::Edge;
use crate::error::WorkflowError;
use crate::workflow::Workflow;

/// A validated view over a [`Workflow`]'s nodes and edges, with the
/// adjacency indices the runtime needs for traversal.
///
/// Construction validates invariant 1 (`§8`): every edge's `source` and
/// `target` name an existing node, node ids are unique, and every node is
/// reachable from some root.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    node_ids: HashSet<NodeId>,
    outgoing: HashMap<NodeId, Vec<Edge>>,
    incoming: HashMap<NodeId, Vec<Edge>>,
    roots: Vec<NodeId>,
}

impl DependencyGraph {
    /// Validate `workflow` and build its dependency graph.
    pub fn build(workflow: &Workflow) -> Result<Self, WorkflowError> {
        let mut node_ids = HashSet::with_capacity(workflow.nodes.len());
        for node in &workflow.nodes {
            if !node_ids.insert(node.id) {
                return Err(WorkflowError::DuplicateNodeId(node.id));
            }
        }

        for edge in &workflow.edges {
            if !node_ids.contains(&edge.source) {
                return Err(WorkflowError::DanglingEdge {
                    edge: edge.id,
                    node: edge.source,
                });
            }
            if !node_ids.contains(&edge.target) {
                return Err(WorkflowError::DanglingEdge {
                    edge: edge.id,
                    node: edge.target,
                });
            }
        }

        let mut outgoing: HashMap<NodeId, Vec<Edge>> = HashMap::new();
        let mut incoming: HashMap<NodeId, Vec<Edge>> = HashMap::new();
        let mut non_error_inbound: HashMap<NodeId, usize> =
            node_ids.iter().map(|&id| (id, 0)).collect();

        for edge in &workflow.edges {
            outgoing.entry(edge.source).or_default().push(edge.clone());
            incoming.entry(edge.target).or_default().push(edge.clone());
            if !edge.is_error_edge() {
                *non_error_inbound.entry(edge.target).or_insert(0) += 1;
            }
        }

        let mut roots: Vec<NodeId> = workflow
            .nodes
            .iter()
            .map(|n| n.id)
            .filter(|id| non_error_inbound.get(id).copied().unwrap_or(0) == 0)
            .collect();
        roots.sort_by_key(|id| {
            workflow
                .nodes
                .iter()
                .position(|n| n.id == *id)
                .unwrap_or(usize::MAX)
        });

        if roots.is_empty() && !workflow.nodes.is_empty() {
            return Err(WorkflowError::NoRoot);
        }

        // `roots` (no non-error inbound edge) is the set the reachability
        // DFS seeds from below, but it is not by itself sufficient: a node
        // whose only inbound edge is an error edge counts as a root there,
        // yet the runtime's actual start frontier (`GraphRuntime::run`,
        // `run_subgraph`) only ever begins from nodes with *zero* inbound
        // edges of any kind. A workflow can satisfy the check above while
        // having no such node — e.g. a single node whose only edge is an
        // error edge back to itself — and would otherwise validate clean
        // while running zero nodes at execution time. Reject that case
        // here so it fails validation instead (`§8`).
        let has_execution_root = workflow
            .nodes
            .iter()
            .any(|n| incoming.get(&n.id).map_or(true, Vec::is_empty));
        if !has_execution_root && !workflow.nodes.is_empty() {
            return Err(WorkflowError::NoRoot);
        }

        let graph = Self {
            node_ids,
            outgoing,
            incoming,
            roots,
        };
        graph.check_all_reachable(workflow)?;
        Ok(graph)
    }

    fn check_all_reachable(&self, workflow: &Workflow) -> Result<(), WorkflowError> {
        let mut pg = DiGraphMap::<NodeId, ()>::new();
        for &id in &self.node_ids {
            pg.add_node(id);
        }
        for edges in self.outgoing.values() {
            for edge in edges {
                pg.add_edge(edge.source, edge.target, ());
            }
        }

        let mut reached = HashSet::new();
        for &root in &self.roots {
            let mut dfs = Dfs::new(&pg, root);
            while let Some(n) = dfs.next(&pg) {
                reached.insert(n);
            }
        }

        for node in &workflow.nodes {
            if !reached.contains(&node.id) {
                return Err(WorkflowError::NodeNotFound(node.id));
            }
        }
        Ok(())
    }

    /// Root nodes — those with no non-error inbound edge — in declaration
    /// order.
    #[must_use]
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Outgoing edges of `node`, in insertion order.
    #[must_use]
    pub fn outgoing(&self, node: NodeId) -> &[Edge] {
        self.outgoing.get(&node).map_or(&[], Vec::as_slice)
    }

    /// Incoming edges of `node`, in insertion order.
    #[must_use]
    pub fn incoming(&self, node: NodeId) -> &[Edge] {
        self.incoming.get(&node).map_or(&[], Vec::as_slice)
    }

    /// Nodes with zero inbound edges of any kind, in declaration order —
    /// the graph runtime's actual execution start frontier
    /// (`GraphRuntime::run`, `run_subgraph`). Distinct from
    /// [`roots`](Self::roots), which also counts a node fed solely by an
    /// error edge; use this wherever traversal actually begins.
    #[must_use]
    pub fn execution_roots(&self, workflow: &Workflow) -> Vec<NodeId> {
        workflow
            .nodes
            .iter()
            .map(|n| n.id)
            .filter(|&id| self.incoming(id).is_empty())
            .collect()
    }

    /// Upstream node ids feeding `node` via untagged (ordinary data-flow)
    /// edges — used by the input resolver (C2) rule 3.
    #[must_use]
    pub fn untagged_predecessors(&self, node: NodeId) -> Vec<NodeId> {
        self.incoming(node)
            .iter()
            .filter(|e| e.is_untagged())
            .map(|e| e.source)
            .collect()
    }

    /// The first (by insertion order) outgoing error edge from `node`, if
    /// any. Duplicate error edges from one source: the first wins (`§3`).
    #[must_use]
    pub fn error_edge(&self, node: NodeId) -> Option<&Edge> {
        self.outgoing(node).iter().find(|e| e.is_error_edge())
    }

    /// `true` if `node` exists in this workflow.
    #[must_use]
    pub fn contains(&self, node: NodeId) -> bool {
        self.node_ids.contains(&node)
    }
}
