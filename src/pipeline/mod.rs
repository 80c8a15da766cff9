//! Flattening the graph into what the external processor executes.
//!
//! A [`PipelineSubmission`] is derived from the graph right before each
//! request. It carries no labels and no canvas state, only
//! `{nodes: [{id, type, config}], edges: [{id, source, target}]}` with every
//! config written in the processor's snake_case schema.

use crate::catalog::NodeKind;
use crate::config::{LlmDefaults, NodeConfig};
use crate::graph::{Edge, Graph};
use serde::Serialize;

mod path;
mod wire;

pub use path::determine_path;
pub use wire::WireConfig;

/// Tracing target for serialization and path checks.
pub const TRACING_TARGET: &str = "docflow::pipeline";

/// A node as the processor sees it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionNode {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(serialize_with = "wire::serialize_config")]
    pub config: NodeConfig,
}

/// An edge as the processor sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionEdge {
    pub id: String,
    pub source: String,
    pub target: String,
}

impl From<&Edge> for SubmissionEdge {
    fn from(edge: &Edge) -> Self {
        Self {
            id: edge.id.clone(),
            source: edge.source.clone(),
            target: edge.target.clone(),
        }
    }
}

/// The flattened, owned description of a pipeline sent for execution.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PipelineSubmission {
    pub nodes: Vec<SubmissionNode>,
    pub edges: Vec<SubmissionEdge>,
}

impl PipelineSubmission {
    pub fn node(&self, id: &str) -> Option<&SubmissionNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// The wire JSON of this submission.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Builds [`PipelineSubmission`]s from a graph.
///
/// Without LLM defaults, extraction nodes carry only their own overrides and
/// the processor applies its defaults. With them, every extraction node is
/// sent fully resolved.
#[derive(Debug, Clone, Default)]
pub struct PipelineSerializer {
    llm_defaults: Option<LlmDefaults>,
}

impl PipelineSerializer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_llm_defaults(mut self, defaults: LlmDefaults) -> Self {
        self.llm_defaults = Some(defaults);
        self
    }

    pub fn llm_defaults(&self) -> Option<&LlmDefaults> {
        self.llm_defaults.as_ref()
    }

    /// Maps nodes and edges in creation order. The same graph always yields
    /// the same submission.
    pub fn serialize(&self, graph: &Graph) -> PipelineSubmission {
        let nodes = graph
            .nodes()
            .iter()
            .map(|node| SubmissionNode {
                id: node.id().to_string(),
                kind: node.kind(),
                config: self.resolve(node.config()),
            })
            .collect::<Vec<_>>();
        let edges = graph.edges().iter().map(SubmissionEdge::from).collect::<Vec<_>>();

        tracing::debug!(
            target: TRACING_TARGET,
            nodes = nodes.len(),
            edges = edges.len(),
            resolved_llm = self.llm_defaults.is_some(),
            "Pipeline serialized"
        );
        PipelineSubmission { nodes, edges }
    }

    fn resolve(&self, config: &NodeConfig) -> NodeConfig {
        match (config, &self.llm_defaults) {
            (NodeConfig::ExtractLLM(extract), Some(defaults)) => {
                let resolved = extract.resolve(defaults);
                let mut extract = extract.clone();
                extract.server_url = Some(resolved.server_url);
                extract.model_name = Some(resolved.model_name);
                extract.temperature = Some(resolved.temperature);
                NodeConfig::ExtractLLM(extract)
            }
            (config, _) => config.clone(),
        }
    }
}

/// Serializes `graph` without resolving LLM defaults.
pub fn serialize(graph: &Graph) -> PipelineSubmission {
    PipelineSerializer::new().serialize(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigField, ConfigPatch};
    use crate::graph::Position;
    use serde_json::json;

    #[test]
    fn labels_and_positions_are_dropped() {
        let mut graph = Graph::new();
        let input = graph
            .add_node(NodeKind::Input, "My upload", Position::new(4.0, 2.0))
            .id()
            .to_string();
        let output = graph
            .add_node(NodeKind::Output, "Sink", Position::default())
            .id()
            .to_string();
        graph.connect(&input, &output).unwrap();

        let value = serde_json::to_value(serialize(&graph)).unwrap();
        assert_eq!(
            value,
            json!({
                "nodes": [
                    {"id": "node-0", "type": "inputNode", "config": {}},
                    {"id": "node-1", "type": "outputNode", "config": {}}
                ],
                "edges": [{"id": "edge-0", "source": "node-0", "target": "node-1"}]
            })
        );
    }

    #[test]
    fn defaults_resolve_only_when_configured() {
        let mut graph = Graph::new();
        let id = graph
            .add_node(NodeKind::ExtractLLM, "LLM", Position::default())
            .id()
            .to_string();
        graph
            .update_node_config(
                &id,
                &ConfigPatch::new()
                    .with(ConfigField::ExtractionPrompt("people".into()))
                    .with(ConfigField::ModelName(Some("mistral".into()))),
            )
            .unwrap();

        let bare = serde_json::to_value(serialize(&graph)).unwrap();
        assert_eq!(
            bare["nodes"][0]["config"],
            json!({"extraction_prompt": "people", "ollama_model_name": "mistral"})
        );

        let resolved = PipelineSerializer::new()
            .with_llm_defaults(LlmDefaults::default())
            .serialize(&graph);
        let value = serde_json::to_value(resolved).unwrap();
        assert_eq!(
            value["nodes"][0]["config"],
            json!({
                "extraction_prompt": "people",
                "ollama_server_url": "http://localhost:11434",
                "ollama_model_name": "mistral",
                "ollama_temperature": 0.7
            })
        );
    }
}
