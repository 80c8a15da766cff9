//! Durable snapshots of the pipeline graph.
//!
//! The graph is written as one JSON document `{nodes, edges, viewport}` into a
//! named slot of a [`KeyValueStore`]. Saving and loading are explicit user
//! actions; a failure in either is reported and leaves the in-memory graph
//! untouched.

use crate::config::{ConfigField, LlmDefaults};
use crate::error::{PersistenceError, StoreError};
use crate::graph::{ConnectionPolicy, Graph, GraphSnapshot};
use serde_json::Value;

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Tracing target for persistence operations.
pub const TRACING_TARGET: &str = "docflow::persistence";

/// Slot holding the saved pipeline graph.
pub const PIPELINE_SLOT: &str = "docflow.pipeline";
/// Slot holding the process-wide LLM defaults.
pub const LLM_DEFAULTS_SLOT: &str = "docflow.llm-defaults";

/// A synchronous string key-value store.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

/// Saves and loads the pipeline graph and the LLM defaults.
#[derive(Debug)]
pub struct PipelineStore<S> {
    store: S,
    slot: String,
}

impl<S: KeyValueStore> PipelineStore<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            slot: PIPELINE_SLOT.to_string(),
        }
    }

    /// Uses a different slot for the graph, e.g. to keep several pipelines side by side.
    pub fn with_slot(mut self, slot: impl Into<String>) -> Self {
        self.slot = slot.into();
        self
    }

    pub fn slot(&self) -> &str {
        &self.slot
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    /// Writes `{nodes, edges, viewport}` to the slot, overwriting any previous save.
    pub fn save(&mut self, graph: &Graph) -> Result<(), PersistenceError> {
        let json = serde_json::to_string(&graph.snapshot())
            .map_err(|e| PersistenceError::SerializationError(e.to_string()))?;
        if let Err(err) = self.store.set(&self.slot, &json) {
            tracing::warn!(
                target: TRACING_TARGET,
                slot = %self.slot,
                error = %err,
                "Saving pipeline failed"
            );
            return Err(err.into());
        }
        tracing::info!(
            target: TRACING_TARGET,
            slot = %self.slot,
            nodes = graph.nodes().len(),
            edges = graph.edges().len(),
            bytes = json.len(),
            "Pipeline saved"
        );
        Ok(())
    }

    /// Reads and validates the saved graph.
    pub fn load(&self) -> Result<Graph, PersistenceError> {
        self.load_with_policy(ConnectionPolicy::default())
    }

    pub fn load_with_policy(&self, policy: ConnectionPolicy) -> Result<Graph, PersistenceError> {
        let raw = self
            .store
            .get(&self.slot)?
            .ok_or_else(|| PersistenceError::NotFound(self.slot.clone()))?;

        let snapshot = parse_snapshot(&raw).map_err(|reason| self.corrupt(reason))?;
        let graph =
            Graph::from_snapshot(snapshot, policy).map_err(|e| self.corrupt(e.to_string()))?;

        tracing::info!(
            target: TRACING_TARGET,
            slot = %self.slot,
            nodes = graph.nodes().len(),
            edges = graph.edges().len(),
            "Pipeline loaded"
        );
        Ok(graph)
    }

    /// Replaces `graph` with the saved one, keeping its connection policy.
    ///
    /// On any error `graph` is left exactly as it was.
    pub fn load_into(&self, graph: &mut Graph) -> Result<(), PersistenceError> {
        let loaded = self.load_with_policy(graph.policy().clone())?;
        *graph = loaded;
        Ok(())
    }

    /// Deletes the saved graph. Absent slots are not an error.
    pub fn clear(&mut self) -> Result<(), PersistenceError> {
        self.store.remove(&self.slot)?;
        Ok(())
    }

    pub fn save_llm_defaults(&mut self, defaults: &LlmDefaults) -> Result<(), PersistenceError> {
        let json = serde_json::to_string(defaults)
            .map_err(|e| PersistenceError::SerializationError(e.to_string()))?;
        self.store.set(LLM_DEFAULTS_SLOT, &json)?;
        tracing::debug!(
            target: TRACING_TARGET,
            server_url = %defaults.server_url,
            model = %defaults.model_name,
            "LLM defaults saved"
        );
        Ok(())
    }

    /// The saved LLM defaults, or the built-in ones when the slot is absent or unreadable.
    pub fn load_llm_defaults(&self) -> LlmDefaults {
        match self.try_llm_defaults() {
            Ok(Some(defaults)) => defaults,
            Ok(None) => LlmDefaults::default(),
            Err(err) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    error = %err,
                    "Ignoring unreadable LLM defaults"
                );
                LlmDefaults::default()
            }
        }
    }

    fn try_llm_defaults(&self) -> Result<Option<LlmDefaults>, PersistenceError> {
        let Some(raw) = self.store.get(LLM_DEFAULTS_SLOT)? else {
            return Ok(None);
        };
        let corrupt = |reason: String| PersistenceError::Corrupt {
            slot: LLM_DEFAULTS_SLOT.to_string(),
            reason,
        };
        let defaults: LlmDefaults = serde_json::from_str(&raw).map_err(|e| corrupt(e.to_string()))?;
        ConfigField::ServerUrl(Some(defaults.server_url.clone()))
            .validate()
            .and(ConfigField::Temperature(Some(defaults.temperature)).validate())
            .map_err(|e| corrupt(e.to_string()))?;
        Ok(Some(defaults))
    }

    fn corrupt(&self, reason: String) -> PersistenceError {
        tracing::warn!(
            target: TRACING_TARGET,
            slot = %self.slot,
            reason = %reason,
            "Saved pipeline is corrupt"
        );
        PersistenceError::Corrupt {
            slot: self.slot.clone(),
            reason,
        }
    }
}

/// Checks the top-level shape before handing the document to serde, so that
/// the error names the offending section.
fn parse_snapshot(raw: &str) -> Result<GraphSnapshot, String> {
    let value: Value = serde_json::from_str(raw).map_err(|e| format!("not valid JSON: {}", e))?;
    let object = value
        .as_object()
        .ok_or_else(|| "expected a JSON object".to_string())?;

    match object.get("nodes") {
        Some(Value::Array(_)) => {}
        Some(_) => return Err("'nodes' is not an array".to_string()),
        None => return Err("missing 'nodes'".to_string()),
    }
    match object.get("edges") {
        Some(Value::Array(_)) => {}
        Some(_) => return Err("'edges' is not an array".to_string()),
        None => return Err("missing 'edges'".to_string()),
    }
    match object.get("viewport") {
        Some(Value::Object(_)) => {}
        Some(_) => return Err("'viewport' is not an object".to_string()),
        None => return Err("missing 'viewport'".to_string()),
    }

    serde_json::from_value(value).map_err(|e| e.to_string())
}
