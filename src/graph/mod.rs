//! The mutable pipeline graph.
//!
//! [`Graph`] is the single owner of nodes and edges. Every structural change
//! goes through its methods, which keep two invariants:
//!
//! * every edge references two existing nodes, leaving an outgoing socket and
//!   entering an incoming socket;
//! * node and edge ids are unique within the instance.

use crate::catalog::{NodeKind, SocketSide};
use crate::config::{ConfigPatch, NodeConfig};
use crate::error::{ConnectionRejection, GraphError, ValidationError};
use ahash::AHashSet;

mod ids;
mod node;
mod policy;

use ids::IdAllocator;
pub use node::{Edge, GraphSnapshot, Node, Position, Viewport};
pub use policy::ConnectionPolicy;

/// Tracing target for graph mutations.
pub const TRACING_TARGET: &str = "docflow::graph";

#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    viewport: Viewport,
    ids: IdAllocator,
    policy: ConnectionPolicy,
}

pub struct GraphBuilder {
    policy: ConnectionPolicy,
    viewport: Viewport,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self {
            policy: ConnectionPolicy::default(),
            viewport: Viewport::default(),
        }
    }

    pub fn policy(mut self, policy: ConnectionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn allow_multi_edge(mut self, kind: NodeKind, side: SocketSide, allow: bool) -> Self {
        self.policy.set_allow_multi_edge(kind, side, allow);
        self
    }

    pub fn viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = viewport;
        self
    }

    pub fn build(self) -> Graph {
        Graph {
            nodes: Vec::new(),
            edges: Vec::new(),
            viewport: self.viewport,
            ids: IdAllocator::default(),
            policy: self.policy,
        }
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {
    /// An empty graph with the permissive connection policy.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> GraphBuilder {
        GraphBuilder::new()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn policy(&self) -> &ConnectionPolicy {
        &self.policy
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id() == id)
    }

    fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id() == id)
    }

    /// All edges that start or end at `node_id`.
    pub fn edges_touching<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.touches(node_id))
    }

    /// Inserts a node of `kind` with the catalog default config and a fresh id.
    pub fn add_node(&mut self, kind: NodeKind, label: impl Into<String>, position: Position) -> &Node {
        let mut id = self.ids.next_node_id();
        // Restored graphs may contain ids the allocator did not produce.
        while self.node(&id).is_some() {
            id = self.ids.next_node_id();
        }
        let node = Node::new(id, label.into(), position, NodeConfig::default_for(kind));
        tracing::debug!(
            target: TRACING_TARGET,
            node_id = node.id(),
            kind = %kind,
            "Node added"
        );
        self.nodes.push(node);
        let index = self.nodes.len() - 1;
        &self.nodes[index]
    }

    /// Shallow-merges `patch` into the config of `node_id`.
    ///
    /// A missing node is a deliberate no-op returning `Ok(None)`: the editor can
    /// race a deletion against a pending field edit. A rejected patch leaves the
    /// config unchanged.
    pub fn update_node_config(
        &mut self,
        node_id: &str,
        patch: &ConfigPatch,
    ) -> Result<Option<&Node>, ValidationError> {
        let Some(node) = self.node_mut(node_id) else {
            tracing::debug!(
                target: TRACING_TARGET,
                node_id,
                "Config update for a missing node ignored"
            );
            return Ok(None);
        };
        node.config_mut().apply(patch)?;
        tracing::debug!(
            target: TRACING_TARGET,
            node_id,
            fields = patch.len(),
            "Node config updated"
        );
        Ok(Some(&*node))
    }

    /// Connects the outgoing socket of `source_id` to the incoming socket of `target_id`.
    pub fn connect(&mut self, source_id: &str, target_id: &str) -> Result<&Edge, GraphError> {
        if let Err(reason) = self.check_connection(source_id, target_id) {
            tracing::warn!(
                target: TRACING_TARGET,
                source_id,
                target_id,
                %reason,
                "Connection rejected"
            );
            return Err(GraphError::InvalidConnection {
                source_id: source_id.to_string(),
                target_id: target_id.to_string(),
                reason,
            });
        }

        let edge = Edge {
            id: self.ids.next_edge_id(),
            source: source_id.to_string(),
            target: target_id.to_string(),
        };
        tracing::debug!(
            target: TRACING_TARGET,
            edge_id = %edge.id,
            source_id,
            target_id,
            "Edge added"
        );
        self.edges.push(edge);
        let index = self.edges.len() - 1;
        Ok(&self.edges[index])
    }

    fn check_connection(&self, source_id: &str, target_id: &str) -> Result<(), ConnectionRejection> {
        if source_id == target_id {
            return Err(ConnectionRejection::SelfLoop);
        }
        let source = self
            .node(source_id)
            .ok_or_else(|| ConnectionRejection::MissingNode(source_id.to_string()))?;
        let target = self
            .node(target_id)
            .ok_or_else(|| ConnectionRejection::MissingNode(target_id.to_string()))?;

        let endpoints = [
            (source.kind(), SocketSide::Outgoing, source_id),
            (target.kind(), SocketSide::Incoming, target_id),
        ];
        for (kind, side, _) in endpoints {
            if !kind.sockets().has(side) {
                return Err(ConnectionRejection::NoSocket { kind, side });
            }
        }
        if self
            .edges
            .iter()
            .any(|e| e.source == source_id && e.target == target_id)
        {
            return Err(ConnectionRejection::Duplicate);
        }
        for (kind, side, id) in endpoints {
            if self.policy.allow_multi_edge(kind, side) {
                continue;
            }
            let occupied = self.edges.iter().any(|e| match side {
                SocketSide::Outgoing => e.source == id,
                SocketSide::Incoming => e.target == id,
            });
            if occupied {
                return Err(ConnectionRejection::SocketOccupied { kind, side });
            }
        }
        Ok(())
    }

    /// Removes a node together with every edge that references it.
    pub fn remove_node(&mut self, node_id: &str) -> Option<Node> {
        let index = self.nodes.iter().position(|n| n.id() == node_id)?;
        let node = self.nodes.remove(index);
        let before = self.edges.len();
        self.edges.retain(|e| !e.touches(node_id));
        tracing::debug!(
            target: TRACING_TARGET,
            node_id,
            edges_removed = before - self.edges.len(),
            "Node removed"
        );
        Some(node)
    }

    pub fn remove_edge(&mut self, edge_id: &str) -> Option<Edge> {
        let index = self.edges.iter().position(|e| e.id == edge_id)?;
        Some(self.edges.remove(index))
    }

    /// Moves a node on the canvas. Returns `false` if the node does not exist.
    pub fn move_node(&mut self, node_id: &str, position: Position) -> bool {
        self.node_mut(node_id)
            .map(|n| n.set_position(position))
            .is_some()
    }

    /// Relabels a node. Returns `false` if the node does not exist.
    pub fn rename_node(&mut self, node_id: &str, label: impl Into<String>) -> bool {
        let label = label.into();
        self.node_mut(node_id).map(|n| n.set_label(label)).is_some()
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Removes every node and edge. The id counters keep running.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
    }

    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
            viewport: self.viewport,
        }
    }

    /// Builds a graph from a snapshot after checking it against the graph invariants.
    ///
    /// Socket rules are checked, but the connection policy is not: a snapshot
    /// saved under a looser policy still loads.
    pub fn from_snapshot(
        snapshot: GraphSnapshot,
        policy: ConnectionPolicy,
    ) -> Result<Graph, GraphError> {
        validate_snapshot(&snapshot)?;
        let mut ids = IdAllocator::default();
        ids.reseed(
            snapshot.nodes.iter().map(Node::id),
            snapshot.edges.iter().map(|e| e.id.as_str()),
        );
        Ok(Graph {
            nodes: snapshot.nodes,
            edges: snapshot.edges,
            viewport: snapshot.viewport,
            ids,
            policy,
        })
    }

    /// Replaces the whole graph with `snapshot`, keeping this graph's policy.
    ///
    /// Nothing changes if the snapshot is rejected.
    pub fn restore(&mut self, snapshot: GraphSnapshot) -> Result<(), GraphError> {
        *self = Graph::from_snapshot(snapshot, self.policy.clone())?;
        Ok(())
    }
}

fn validate_snapshot(snapshot: &GraphSnapshot) -> Result<(), GraphError> {
    let invalid = |message: String| GraphError::InvalidSnapshot(message);

    let mut node_ids = AHashSet::new();
    for node in &snapshot.nodes {
        if !node_ids.insert(node.id()) {
            return Err(invalid(format!("duplicate node id '{}'", node.id())));
        }
        node.config()
            .validate()
            .map_err(|e| invalid(format!("node '{}': {}", node.id(), e)))?;
    }

    let mut edge_ids = AHashSet::new();
    for edge in &snapshot.edges {
        if !edge_ids.insert(edge.id.as_str()) {
            return Err(invalid(format!("duplicate edge id '{}'", edge.id)));
        }
        let endpoints = [
            (&edge.source, SocketSide::Outgoing),
            (&edge.target, SocketSide::Incoming),
        ];
        for (node_id, side) in endpoints {
            let node = snapshot
                .nodes
                .iter()
                .find(|n| n.id() == node_id)
                .ok_or_else(|| {
                    invalid(format!(
                        "edge '{}' references missing node '{}'",
                        edge.id, node_id
                    ))
                })?;
            if !node.kind().sockets().has(side) {
                return Err(invalid(format!(
                    "edge '{}' uses the {} socket of '{}', which has none",
                    edge.id,
                    side,
                    node.kind()
                )));
            }
        }
    }
    Ok(())
}
