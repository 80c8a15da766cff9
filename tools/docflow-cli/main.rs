use clap::{Parser, Subcommand};
use docflow::prelude::*;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use url::Url;

/// Build, save and submit document-processing pipelines from the terminal
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Directory holding the saved pipeline and LLM defaults
    #[arg(long, global = true, env = "DOCFLOW_STORE", default_value = ".docflow")]
    store: PathBuf,

    /// Base URL of the document processor
    #[arg(long, global = true, env = "DOCFLOW_API_URL")]
    api_url: Option<Url>,

    /// Request timeout in seconds
    #[arg(long, global = true, env = "DOCFLOW_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the stage kinds that can be added
    Catalog,
    /// Add a stage to the pipeline
    Add {
        /// Kind name or alias, e.g. `chunk` or `chunkNode`
        kind: String,
        #[arg(long)]
        label: Option<String>,
        #[arg(long, default_value_t = 0.0)]
        x: f64,
        #[arg(long, default_value_t = 0.0)]
        y: f64,
    },
    /// Connect the output of one stage to the input of another
    Connect { source: String, target: String },
    /// Remove a stage and its connections
    Remove { id: String },
    /// Set one configuration field of a stage
    Set { id: String, field: String, value: String },
    /// Print the pipeline, or the configuration panel of one stage
    Show {
        #[arg(long)]
        node: Option<String>,
    },
    /// Check that the pipeline forms a single path from its input
    Validate,
    /// Submit the pipeline to the processor
    Submit {
        /// Document to upload together with the pipeline
        #[arg(long)]
        document: Option<PathBuf>,
        /// Validate the execution path before sending
        #[arg(long)]
        preflight: bool,
    },
    /// Show or change the LLM defaults used by extraction stages
    Defaults {
        #[arg(long)]
        server_url: Option<String>,
        #[arg(long)]
        model: Option<String>,
        #[arg(long)]
        temperature: Option<f64>,
    },
    /// Process a single document with the pipeline's partition, clean and chunk settings
    Process { file: PathBuf },
    /// Ask the processor whether it is up
    Health,
    /// List the file formats the processor accepts
    Formats,
    /// Delete the saved pipeline
    Clear,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("docflow=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = client_settings(&cli);
    let file_store = FileStore::open(&cli.store).unwrap_or_else(|e| {
        exit_with_error(&format!(
            "Failed to open store '{}': {}",
            cli.store.display(),
            e
        ))
    });
    let mut store = PipelineStore::new(file_store);

    match cli.command {
        Command::Catalog => print_catalog(),
        Command::Add { kind, label, x, y } => {
            let kind = NodeKind::from_type_name(&kind).unwrap_or_else(|| {
                let known: Vec<_> = CATALOG.iter().map(|d| d.alias).collect();
                exit_with_error(&format!(
                    "Unknown node kind '{}'. Known kinds: {}",
                    kind,
                    known.join(", ")
                ))
            });
            let mut graph = load_graph(&store);
            let label = label.unwrap_or_else(|| descriptor(kind).default_label.to_string());
            let id = graph
                .add_node(kind, label, Position::new(x, y))
                .id()
                .to_string();
            save_graph(&mut store, &graph);
            println!("{}", id);
        }
        Command::Connect { source, target } => {
            let mut graph = load_graph(&store);
            let edge = graph
                .connect(&source, &target)
                .unwrap_or_else(|e| exit_with_error(&e.to_string()))
                .id
                .clone();
            save_graph(&mut store, &graph);
            println!("{}", edge);
        }
        Command::Remove { id } => {
            let mut graph = load_graph(&store);
            let mut coordinator = Coordinator::new(store.load_llm_defaults());
            if coordinator.remove_node(&mut graph, &id).is_none() {
                exit_with_error(&format!("Node '{}' not found", id));
            }
            save_graph(&mut store, &graph);
        }
        Command::Set { id, field, value } => {
            let mut graph = load_graph(&store);
            let mut coordinator = Coordinator::new(store.load_llm_defaults());
            if coordinator.select_node(&graph, &id).is_none() {
                exit_with_error(&format!("Node '{}' not found", id));
            }
            let input = match value.as_str() {
                "true" => FieldInput::Toggle(true),
                "false" => FieldInput::Toggle(false),
                _ => FieldInput::Text(value),
            };
            if !coordinator.on_field_input(&mut graph, &id, &field, input) {
                let reason = coordinator
                    .notice()
                    .map(ToString::to_string)
                    .unwrap_or_else(|| "edit was not applied".to_string());
                exit_with_error(&reason);
            }
            save_graph(&mut store, &graph);
            if let Some(panel) = coordinator.panel(&graph) {
                print_panel(&panel);
            }
        }
        Command::Show { node } => {
            let graph = load_graph(&store);
            match node {
                Some(id) => {
                    let mut coordinator = Coordinator::new(store.load_llm_defaults());
                    match coordinator.select_node(&graph, &id) {
                        Some(panel) => print_panel(&panel),
                        None => exit_with_error(&format!("Node '{}' not found", id)),
                    }
                }
                None => print_graph(&graph),
            }
        }
        Command::Validate => {
            let graph = load_graph(&store);
            let path = determine_path(&serialize(&graph))
                .unwrap_or_else(|e| exit_with_error(&e.to_string()));
            println!("Execution path: {}", path.join(" -> "));
        }
        Command::Submit {
            document,
            preflight,
        } => {
            let graph = load_graph(&store);
            let mut executor =
                HttpExecutor::new(&settings).unwrap_or_else(|e| exit_with_error(&e.to_string()));
            if let Some(path) = document {
                let upload = DocumentUpload::from_path(&path)
                    .unwrap_or_else(|e| exit_with_error(&e.user_message()));
                executor = executor.with_document(upload);
            }
            let serializer = PipelineSerializer::new().with_llm_defaults(store.load_llm_defaults());
            let mut controller = ExecutionController::new()
                .with_serializer(serializer)
                .with_preflight(preflight);

            match controller.submit(&graph, &executor).await {
                ExecutionState::Succeeded => {
                    let result = controller.result().cloned().unwrap_or_default();
                    println!("{}", to_pretty_json(&result));
                }
                _ => {
                    let message = controller
                        .error()
                        .map(ExecutionError::user_message)
                        .unwrap_or_else(|| "Submission did not complete".to_string());
                    exit_with_error(&message);
                }
            }
        }
        Command::Defaults {
            server_url,
            model,
            temperature,
        } => {
            let mut defaults = store.load_llm_defaults();
            let changed = server_url.is_some() || model.is_some() || temperature.is_some();
            if let Some(url) = server_url {
                ConfigField::ServerUrl(Some(url.clone()))
                    .validate()
                    .unwrap_or_else(|e| exit_with_error(&e.to_string()));
                defaults.server_url = url;
            }
            if let Some(model) = model {
                defaults.model_name = model;
            }
            if let Some(temperature) = temperature {
                ConfigField::Temperature(Some(temperature))
                    .validate()
                    .unwrap_or_else(|e| exit_with_error(&e.to_string()));
                defaults.temperature = temperature;
            }
            if changed {
                store
                    .save_llm_defaults(&defaults)
                    .unwrap_or_else(|e| exit_with_error(&e.to_string()));
            }
            println!("Server URL:  {}", defaults.server_url);
            println!("Model:       {}", defaults.model_name);
            println!("Temperature: {}", defaults.temperature);
        }
        Command::Process { file } => {
            let graph = load_graph(&store);
            let upload =
                DocumentUpload::from_path(&file).unwrap_or_else(|e| exit_with_error(&e.user_message()));
            let options = ProcessingOptions::from_graph(&graph);
            let client =
                DocumentClient::new(&settings).unwrap_or_else(|e| exit_with_error(&e.to_string()));
            let processed = client
                .process(&upload, &options)
                .await
                .unwrap_or_else(|e| exit_with_error(&e.user_message()));

            println!("{} elements", processed.elements.len());
            for element in &processed.elements {
                let preview: String = element.text.chars().take(72).collect();
                println!("  [{}] {}", element.element_type, preview.replace('\n', " "));
            }
        }
        Command::Health => {
            let client =
                DocumentClient::new(&settings).unwrap_or_else(|e| exit_with_error(&e.to_string()));
            let health = client
                .health()
                .await
                .unwrap_or_else(|e| exit_with_error(&e.user_message()));
            println!("{}", to_pretty_json(&health));
            if !health.is_ok() {
                std::process::exit(1);
            }
        }
        Command::Formats => {
            let client =
                DocumentClient::new(&settings).unwrap_or_else(|e| exit_with_error(&e.to_string()));
            let formats = client
                .supported_formats()
                .await
                .unwrap_or_else(|e| exit_with_error(&e.user_message()));
            println!("{}", to_pretty_json(&formats));
        }
        Command::Clear => {
            store
                .clear()
                .unwrap_or_else(|e| exit_with_error(&e.to_string()));
            println!("Saved pipeline cleared.");
        }
    }
}

fn client_settings(cli: &Cli) -> ClientSettings {
    let mut settings = ClientSettings::default();
    if let Some(url) = &cli.api_url {
        settings.base_url = url.clone();
    }
    if let Some(secs) = cli.timeout_secs {
        settings = settings.with_timeout(Duration::from_secs(secs));
    }
    settings
}

/// Loads the saved pipeline. A store without one starts an empty pipeline.
fn load_graph(store: &PipelineStore<FileStore>) -> Graph {
    match store.load() {
        Ok(graph) => graph,
        Err(PersistenceError::NotFound(_)) => Graph::new(),
        Err(e) => exit_with_error(&format!("Failed to load pipeline: {}", e)),
    }
}

fn save_graph(store: &mut PipelineStore<FileStore>, graph: &Graph) {
    store
        .save(graph)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to save pipeline: {}", e)));
}

fn print_catalog() {
    println!("{:<10} {:<16} {:<8} Description", "Alias", "Type", "Sockets");
    for entry in CATALOG.iter() {
        let sockets = match (entry.sockets.incoming, entry.sockets.outgoing) {
            (true, true) => "in/out",
            (false, true) => "out",
            (true, false) => "in",
            (false, false) => "-",
        };
        println!(
            "{:<10} {:<16} {:<8} {}",
            entry.alias, entry.type_name, sockets, entry.description
        );
    }
}

fn print_graph(graph: &Graph) {
    if graph.is_empty() {
        println!("The pipeline is empty.");
        return;
    }
    println!("Nodes:");
    for node in graph.nodes() {
        println!("  {:<10} {:<14} {}", node.id(), node.kind().to_string(), node.label());
    }
    println!("Edges:");
    for edge in graph.edges() {
        println!("  {:<10} {} -> {}", edge.id, edge.source, edge.target);
    }
}

fn print_panel(panel: &ConfigPanel) {
    println!("{} ({}, {})", panel.label, panel.node_id, panel.kind);
    for field in panel.view.visible_fields() {
        let value = match &field.value {
            FieldValue::Text(text) => format!("{:?}", text),
            FieldValue::Number(Some(n)) => n.to_string(),
            FieldValue::Number(None) => "-".to_string(),
            FieldValue::Bool(b) => b.to_string(),
            FieldValue::Choice(choice) => choice.to_string(),
        };
        println!("  {:<30} {}", field.key, value);
    }
}

fn to_pretty_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to format response: {}", e)))
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
