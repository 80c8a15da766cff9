//! Selection and config-panel coordination.
//!
//! The [`Coordinator`] remembers which node is selected by id only. The graph
//! owns the node, and the [`ConfigPanel`] is rendered from it on every read, so
//! edits made straight on the [`Graph`] show up without a refresh. Field input is
//! parsed by the node's form and routed into the graph; a refused edit becomes
//! the panel notice and leaves the graph as it was.

use crate::catalog::NodeKind;
use crate::config::{ConfigPatch, LlmDefaults};
use crate::error::ValidationError;
use crate::forms::{FieldInput, FormView, form_for};
use crate::graph::{Graph, Node};

/// Tracing target for selection and panel events.
pub const TRACING_TARGET: &str = "docflow::coordinator";

/// The rendered configuration panel of the selected node.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigPanel {
    pub node_id: String,
    pub label: String,
    pub kind: NodeKind,
    pub view: FormView,
}

#[derive(Debug, Clone, Default)]
pub struct Coordinator {
    selected: Option<String>,
    notice: Option<ValidationError>,
    defaults: LlmDefaults,
}

impl Coordinator {
    pub fn new(defaults: LlmDefaults) -> Self {
        Self {
            defaults,
            ..Default::default()
        }
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Renders the panel of the selected node from its current state in `graph`.
    ///
    /// Returns `None` when nothing is selected or the selected node is gone.
    pub fn panel(&self, graph: &Graph) -> Option<ConfigPanel> {
        let node = graph.node(self.selected.as_deref()?)?;
        Some(self.render(node))
    }

    /// The last refused edit, if it has not been cleared since.
    pub fn notice(&self) -> Option<&ValidationError> {
        self.notice.as_ref()
    }

    pub fn clear_notice(&mut self) {
        self.notice = None;
    }

    pub fn llm_defaults(&self) -> &LlmDefaults {
        &self.defaults
    }

    /// Selects `node_id`, replacing any previous selection, and renders its panel.
    ///
    /// Selecting an id that is not in the graph clears the selection.
    pub fn select_node(&mut self, graph: &Graph, node_id: &str) -> Option<ConfigPanel> {
        self.notice = None;
        let Some(node) = graph.node(node_id) else {
            tracing::debug!(target: TRACING_TARGET, node_id, "Selected node does not exist");
            self.deselect();
            return None;
        };
        self.selected = Some(node_id.to_string());
        tracing::debug!(target: TRACING_TARGET, node_id, kind = %node.kind(), "Node selected");
        Some(self.render(node))
    }

    pub fn deselect(&mut self) {
        self.selected = None;
    }

    /// Forwards `patch` to the graph.
    ///
    /// Returns whether the patch was applied. A refused patch is kept as the notice.
    pub fn on_node_config_change(
        &mut self,
        graph: &mut Graph,
        node_id: &str,
        patch: &ConfigPatch,
    ) -> bool {
        match graph.update_node_config(node_id, patch) {
            Ok(Some(_)) => {
                self.notice = None;
                true
            }
            Ok(None) => false,
            Err(err) => {
                self.reject(node_id, err);
                false
            }
        }
    }

    /// Parses raw widget input with the node's form and applies it.
    pub fn on_field_input(
        &mut self,
        graph: &mut Graph,
        node_id: &str,
        field: &str,
        input: FieldInput,
    ) -> bool {
        let Some(kind) = graph.node(node_id).map(Node::kind) else {
            return false;
        };
        match form_for(kind).parse_input(field, input) {
            Ok(patch) => self.on_node_config_change(graph, node_id, &patch),
            Err(err) => {
                self.reject(node_id, err);
                false
            }
        }
    }

    /// Removes a node from the graph, dropping the selection if it was selected.
    pub fn remove_node(&mut self, graph: &mut Graph, node_id: &str) -> Option<Node> {
        let removed = graph.remove_node(node_id)?;
        if self.selected.as_deref() == Some(node_id) {
            self.deselect();
            self.notice = None;
        }
        Some(removed)
    }

    /// Replaces the LLM defaults the ExtractLLM panel falls back to.
    pub fn set_llm_defaults(&mut self, defaults: LlmDefaults) {
        self.defaults = defaults;
    }

    /// Drops the selection if its node is no longer in `graph`, e.g. after a load.
    pub fn refresh(&mut self, graph: &Graph) {
        if let Some(node_id) = self.selected.as_deref() {
            if graph.node(node_id).is_none() {
                tracing::debug!(target: TRACING_TARGET, node_id, "Selected node vanished");
                self.deselect();
            }
        }
    }

    fn render(&self, node: &Node) -> ConfigPanel {
        ConfigPanel {
            node_id: node.id().to_string(),
            label: node.label().to_string(),
            kind: node.kind(),
            view: form_for(node.kind()).render(node.config(), &self.defaults),
        }
    }

    fn reject(&mut self, node_id: &str, err: ValidationError) {
        tracing::warn!(
            target: TRACING_TARGET,
            node_id,
            error = %err,
            "Config edit refused"
        );
        self.notice = Some(err);
    }
}
