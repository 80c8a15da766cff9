//! Execution tests: serialization determinism, the submission state machine and
//! the HTTP transport against a local one-shot server.
mod common;
use async_trait::async_trait;
use common::*;
use docflow::prelude::*;
use serde_json::{Value, json};
use std::sync::Mutex;

/// Records every payload it is asked to execute.
#[derive(Default)]
struct Recorder {
    seen: Mutex<Vec<PipelineSubmission>>,
}

#[async_trait]
impl PipelineExecutor for Recorder {
    async fn execute(
        &self,
        submission: &PipelineSubmission,
    ) -> Result<ExecutionResponse, ExecutionError> {
        self.seen
            .lock()
            .expect("recorder lock")
            .push(submission.clone());
        Ok(ExecutionResponse {
            message: Some("Flow processed".to_string()),
            ..Default::default()
        })
    }
}

#[test]
fn test_serialize_is_deterministic() {
    let (graph, _) = linear_pipeline();
    let first = serialize(&graph).to_json().expect("encode");
    let second = serialize(&graph).to_json().expect("encode");
    assert_eq!(first, second);

    // A restored copy serializes identically.
    let restored = Graph::from_snapshot(graph.snapshot(), ConnectionPolicy::default())
        .expect("restore");
    assert_eq!(serialize(&restored).to_json().expect("encode"), first);
}

#[test]
fn test_submission_uses_processor_schema() {
    let (mut graph, ids) = linear_pipeline();
    graph
        .update_node_config(
            &ids.partition,
            &ConfigPatch::new()
                .with(ConfigField::Strategy(PartitionStrategy::HiRes))
                .with(ConfigField::PdfInferTableStructure(false)),
        )
        .expect("valid patch");

    let value = serde_json::to_value(serialize(&graph)).expect("encode");
    assert_eq!(value["nodes"][0], json!({"id": ids.input, "type": "inputNode", "config": {}}));
    assert_eq!(
        value["nodes"][1]["config"],
        json!({
            "strategy": "hi_res",
            "ocr_languages": "eng",
            "pdf_infer_table_structure": false,
            "extract_image_block_types": ""
        })
    );
    assert_eq!(value["nodes"][2]["config"], json!({"chunking_strategy": "none"}));
    assert_eq!(value["edges"].as_array().map(Vec::len), Some(3));
    assert!(value["nodes"][0].get("label").is_none());
}

#[test]
fn test_in_flight_edits_do_not_leak_into_payload() {
    let (mut graph, ids) = linear_pipeline();
    let recorder = Recorder::default();
    let mut controller = ExecutionController::new();

    let pending = controller.begin(&graph).expect("idle controller");
    assert_eq!(controller.state(), ExecutionState::Submitting);

    // The user keeps editing while the request is out.
    graph
        .update_node_config(
            &ids.chunk,
            &ConfigField::ChunkingStrategy(ChunkingStrategy::Basic).into(),
        )
        .expect("valid patch");
    add(&mut graph, NodeKind::Clean, 800.0);
    assert_eq!(
        controller.begin(&graph).unwrap_err(),
        ExecutionError::AlreadySubmitting
    );

    let state = tokio_test::block_on(controller.execute(pending, &recorder));
    assert_eq!(state, ExecutionState::Succeeded);

    let seen = recorder.seen.lock().expect("recorder lock");
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].nodes.len(), 4);
    assert_eq!(
        seen[0].node(&ids.chunk).map(|n| n.config.clone()),
        Some(NodeConfig::default_for(NodeKind::Chunk))
    );
}

#[test]
fn test_http_success_stores_result() {
    let server = OneShotServer::start(
        200,
        r#"{"message": "Flow processed", "determined_path": ["node-0", "node-1", "node-2", "node-3"]}"#,
    );
    let executor = HttpExecutor::new(&server.settings).expect("client");
    let (graph, _) = linear_pipeline();
    let mut controller = ExecutionController::new().with_preflight(true);

    let state = tokio_test::block_on(controller.submit(&graph, &executor));
    assert_eq!(state, ExecutionState::Succeeded);
    let result = controller.result().expect("result stored");
    assert_eq!(result.message.as_deref(), Some("Flow processed"));
    assert_eq!(result.determined_path.as_ref().map(Vec::len), Some(4));
    assert!(controller.error().is_none());

    let request = server.request();
    assert!(request.starts_with("POST /api/v1/process-flow/ HTTP/1.1"));
    assert!(request.to_ascii_lowercase().contains("content-type: application/json"));
    let body: Value = serde_json::from_str(request_body(&request)).expect("JSON body");
    assert_eq!(body["nodes"][0]["type"], "inputNode");
}

#[test]
fn test_http_rejection_surfaces_detail() {
    let server = OneShotServer::start(400, r#"{"detail": "Flow must contain exactly one Input node"}"#);
    let executor = HttpExecutor::new(&server.settings).expect("client");
    let mut controller = ExecutionController::new();

    let state = tokio_test::block_on(controller.submit(&Graph::new(), &executor));
    assert_eq!(state, ExecutionState::Failed);
    assert!(controller.result().is_none());
    assert_eq!(
        controller.error().map(ExecutionError::user_message).as_deref(),
        Some("Flow must contain exactly one Input node")
    );
    server.request();
}

#[test]
fn test_network_failure_is_reported() {
    let executor = HttpExecutor::new(&unreachable_settings()).expect("client");
    let (graph, _) = linear_pipeline();
    let mut controller = ExecutionController::new();

    let state = tokio_test::block_on(controller.submit(&graph, &executor));
    assert_eq!(state, ExecutionState::Failed);
    assert!(matches!(
        controller.error(),
        Some(ExecutionError::Network(_))
    ));
}

#[test]
fn test_document_attachment_switches_to_multipart() {
    let server = OneShotServer::start(200, r#"{"message": "ok", "received_filename": "notes.txt"}"#);
    let document = DocumentUpload::new("notes.txt", b"hello world".to_vec()).expect("supported");
    let executor = HttpExecutor::new(&server.settings)
        .expect("client")
        .with_document(document);
    let (graph, _) = linear_pipeline();
    let mut controller = ExecutionController::new();

    let state = tokio_test::block_on(controller.submit(&graph, &executor));
    assert_eq!(state, ExecutionState::Succeeded);
    assert_eq!(
        controller.result().and_then(|r| r.received_filename.as_deref()),
        Some("notes.txt")
    );

    let request = server.request();
    assert!(request.to_ascii_lowercase().contains("content-type: multipart/form-data"));
    assert!(request.contains("name=\"flow_data_json\""));
    assert!(request.contains("name=\"file\"; filename=\"notes.txt\""));
    assert!(request.contains("hello world"));
}

#[test]
fn test_document_client_process_and_health() {
    let server = OneShotServer::start(
        200,
        r#"{"elements": [{"type": "NarrativeText", "text": "hello", "metadata": {"filename": "a.txt"}}], "metadata": {"total_elements": 1}}"#,
    );
    let client = DocumentClient::new(&server.settings).expect("client");
    let document = DocumentUpload::new("a.txt", b"hello".to_vec()).expect("supported");
    let (graph, _) = linear_pipeline();
    let options = ProcessingOptions::from_graph(&graph);

    let processed =
        tokio_test::block_on(client.process(&document, &options)).expect("processed");
    assert_eq!(processed.elements.len(), 1);
    assert_eq!(processed.elements[0].text, "hello");
    let request = server.request();
    assert!(request.starts_with("POST /api/v1/process-document/ HTTP/1.1"));
    assert!(request.contains("name=\"strategy\""));
    assert!(request.contains("name=\"chunking_strategy\""));

    let server = OneShotServer::start(200, r#"{"status": "ok", "module": "processing", "features": {}}"#);
    let client = DocumentClient::new(&server.settings).expect("client");
    let health = tokio_test::block_on(client.health()).expect("healthy");
    assert!(health.is_ok());
    assert!(server.request().starts_with("GET /api/v1/health HTTP/1.1"));
}

#[test]
fn test_document_client_lists_supported_formats() {
    let server = OneShotServer::start(
        200,
        r#"{"fully_supported": [".txt"], "placeholder_support": [".pdf", ".docx", ".doc", ".html", ".md"], "note": "Full format support requires unstructured library installation"}"#,
    );
    let client = DocumentClient::new(&server.settings).expect("client");
    let formats = tokio_test::block_on(client.supported_formats()).expect("formats");

    assert!(formats.is_fully_supported("notes.TXT"));
    assert!(formats.accepts("report.pdf"));
    assert!(!formats.is_fully_supported("report.pdf"));
    assert!(!formats.accepts("slides.pptx"));
    assert!(formats.note.is_some());
    assert!(server.request().starts_with("GET /api/v1/supported-formats HTTP/1.1"));
}
