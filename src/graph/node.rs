use crate::catalog::NodeKind;
use crate::config::NodeConfig;
use serde::{Deserialize, Serialize, Serializer};

/// Canvas coordinates of a node.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Pan and zoom of the editor canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            zoom: 1.0,
        }
    }
}

/// A typed stage of the pipeline.
///
/// The kind is derived from the configuration variant, so the two cannot disagree.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawNode")]
pub struct Node {
    id: String,
    position: Position,
    label: String,
    config: NodeConfig,
}

impl Node {
    pub(crate) fn new(id: String, label: String, position: Position, config: NodeConfig) -> Self {
        Self {
            id,
            position,
            label,
            config,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> NodeKind {
        self.config.kind()
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub(crate) fn config_mut(&mut self) -> &mut NodeConfig {
        &mut self.config
    }

    pub(crate) fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    pub(crate) fn set_label(&mut self, label: String) {
        self.label = label;
    }
}

/// Persisted form of a node: `{id, type, position, label, config}`.
#[derive(Deserialize)]
struct RawNode {
    id: String,
    #[serde(rename = "type")]
    kind: NodeKind,
    #[serde(default)]
    position: Position,
    #[serde(default)]
    label: String,
    #[serde(default)]
    config: serde_json::Value,
}

impl TryFrom<RawNode> for Node {
    type Error = String;

    fn try_from(raw: RawNode) -> Result<Self, Self::Error> {
        let config = NodeConfig::from_value(raw.kind, raw.config)
            .map_err(|e| format!("node '{}' has an invalid config: {}", raw.id, e))?;
        Ok(Node::new(raw.id, raw.label, raw.position, config))
    }
}

/// Borrowed counterpart of [`RawNode`], so the config is written in place.
#[derive(Serialize)]
struct NodeRecord<'a> {
    id: &'a str,
    #[serde(rename = "type")]
    kind: NodeKind,
    position: Position,
    label: &'a str,
    config: &'a NodeConfig,
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        NodeRecord {
            id: &self.id,
            kind: self.kind(),
            position: self.position,
            label: &self.label,
            config: &self.config,
        }
        .serialize(serializer)
    }
}

/// A directed connection from one node's outgoing socket to another's incoming socket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
}

impl Edge {
    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }
}

/// The persisted and comparable form of a graph.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub viewport: Viewport,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn node_serializes_with_type_tag() {
        let node = Node::new(
            "node-1".into(),
            "Chunk".into(),
            Position::new(10.0, 20.0),
            NodeConfig::default_for(NodeKind::Chunk),
        );
        assert_eq!(
            serde_json::to_value(&node).unwrap(),
            json!({
                "id": "node-1",
                "type": "chunkNode",
                "position": {"x": 10.0, "y": 20.0},
                "label": "Chunk",
                "config": {"chunkingStrategy": "none"}
            })
        );
    }

    #[test]
    fn unknown_type_is_rejected() {
        let result: Result<Node, _> =
            serde_json::from_value(json!({"id": "a", "type": "embedNode", "config": {}}));
        assert!(result.is_err());
    }

    #[test]
    fn snapshot_requires_all_sections() {
        let result: Result<GraphSnapshot, _> =
            serde_json::from_value(json!({"nodes": [], "edges": []}));
        assert!(result.is_err());
    }

    #[test]
    fn every_kind_writes_its_own_config() {
        for kind in NodeKind::ALL {
            let node = Node::new(
                "node-0".into(),
                kind.to_string(),
                Position::default(),
                NodeConfig::default_for(kind),
            );
            let value = serde_json::to_value(&node).unwrap();
            assert_eq!(value["type"], kind.type_name());
            assert_eq!(value["config"], serde_json::to_value(node.config()).unwrap());

            let back: Node = serde_json::from_value(value).unwrap();
            assert_eq!(back, node);
        }
    }
}
