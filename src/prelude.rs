//! Everything needed to build, edit, save and submit a pipeline.
//!
//! `use docflow::prelude::*;` brings in the node catalog, the graph model, the
//! config panel, both stores, the submission path and every error type. The
//! [`Result`] alias defaults its error to a boxed, thread-safe error so `?` works
//! across all of them, while `Result<T, E>` still names a specific error.
//!
//! ```rust,no_run
//! use docflow::prelude::*;
//!
//! # fn check_saved_pipeline() -> Result<()> {
//! let store = PipelineStore::new(FileStore::open(".docflow")?);
//! let graph = store.load()?;
//! let stages = determine_path(&serialize(&graph))?;
//! println!("{} stages: {}", stages.len(), stages.join(" -> "));
//! # Ok(())
//! # }
//! ```

// Node catalog and configuration
pub use crate::catalog::{CATALOG, NodeDescriptor, NodeKind, SocketSide, descriptor};
pub use crate::config::{
    ChunkingStrategy, ConfigField, ConfigPatch, LlmDefaults, NodeConfig, PartitionStrategy,
};

// Graph model
pub use crate::graph::{ConnectionPolicy, Edge, Graph, GraphSnapshot, Node, Position, Viewport};

// Forms and the config panel
pub use crate::coordinator::{ConfigPanel, Coordinator};
pub use crate::forms::{ConfigForm, FieldInput, FieldValue, FormView, form_for};

// Persistence
pub use crate::persistence::{FileStore, KeyValueStore, MemoryStore, PipelineStore};

// Serialization and execution
pub use crate::execution::{
    DocumentClient, DocumentUpload, ExecutionController, ExecutionResponse, ExecutionState,
    HttpExecutor, PipelineExecutor, ProcessingOptions, SupportedFormats,
};
pub use crate::pipeline::{PipelineSerializer, PipelineSubmission, determine_path, serialize};
pub use crate::settings::ClientSettings;

// Error types
pub use crate::error::{
    ExecutionError, GraphError, PathError, PersistenceError, StoreError, ValidationError,
};

pub type Result<T, E = Box<dyn std::error::Error + Send + Sync>> = std::result::Result<T, E>;
