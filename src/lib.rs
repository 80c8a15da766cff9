//! # docflow - Visual Document-Processing Pipeline Builder
//!
//! **docflow** is the model behind a node-based editor for document-ingestion
//! pipelines. Users compose typed stages (input, partition, clean, chunk,
//! LLM-extract, output) into a directed graph, configure each stage through
//! per-kind forms, save the graph, and submit it to an external document
//! processor over HTTP.
//!
//! The crate draws nothing. It exposes view models (catalog metadata, form
//! descriptions, the config panel) that a UI layer renders, and it owns every
//! mutation of the graph.
//!
//! ## Core Workflow
//!
//! 1.  **Build the Graph**: Add nodes from the [`catalog`] and connect them with
//!     [`Graph::connect`](graph::Graph::connect). Connection rules are enforced on every edit.
//! 2.  **Configure**: Route widget input through the [`Coordinator`](coordinator::Coordinator),
//!     which parses it with the node's [`ConfigForm`](forms::ConfigForm) and applies the
//!     resulting patch. Refused input becomes a notice; the graph stays untouched.
//! 3.  **Persist**: Save and load the graph with a [`PipelineStore`](persistence::PipelineStore)
//!     over any [`KeyValueStore`](persistence::KeyValueStore).
//! 4.  **Submit**: The [`ExecutionController`](execution::ExecutionController) freezes the graph
//!     into a [`PipelineSubmission`](pipeline::PipelineSubmission) and sends it through a
//!     [`PipelineExecutor`](execution::PipelineExecutor).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docflow::prelude::*;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let mut graph = Graph::new();
//! let input = graph.add_node(NodeKind::Input, "Upload", Position::new(0.0, 0.0)).id().to_string();
//! let chunk = graph.add_node(NodeKind::Chunk, "Chunk", Position::new(200.0, 0.0)).id().to_string();
//! let output = graph.add_node(NodeKind::Output, "Result", Position::new(400.0, 0.0)).id().to_string();
//! graph.connect(&input, &chunk)?;
//! graph.connect(&chunk, &output)?;
//!
//! // Configure the chunk stage the way the panel would.
//! let mut coordinator = Coordinator::default();
//! coordinator.select_node(&graph, &chunk);
//! coordinator.on_field_input(&mut graph, &chunk, "chunkingStrategy", "by_title".into());
//! coordinator.on_field_input(&mut graph, &chunk, "chunkMaxCharacters", "500".into());
//!
//! // Save it.
//! let mut store = PipelineStore::new(FileStore::open(".docflow")?);
//! store.save(&graph)?;
//!
//! // Submit it.
//! let executor = HttpExecutor::new(&ClientSettings::from_env())?;
//! let mut controller = ExecutionController::new().with_preflight(true);
//! match controller.submit(&graph, &executor).await {
//!     ExecutionState::Succeeded => println!("{:?}", controller.result()),
//!     _ => eprintln!("{:?}", controller.error().map(|e| e.user_message())),
//! }
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod execution;
pub mod forms;
pub mod graph;
pub mod persistence;
pub mod pipeline;
pub mod prelude;
pub mod settings;
