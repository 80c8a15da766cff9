//! Config-panel tests: form routing, conditional fields and refused input.
mod common;
use common::*;
use docflow::prelude::*;

fn chunk_config(graph: &Graph, id: &str) -> docflow::config::ChunkConfig {
    match graph.node(id).expect("node exists").config() {
        NodeConfig::Chunk(config) => config.clone(),
        other => panic!("expected a chunk config, got {:?}", other),
    }
}

#[test]
fn test_by_title_values_survive_strategy_switches() {
    let (mut graph, ids) = linear_pipeline();
    let mut coordinator = Coordinator::default();
    coordinator.select_node(&graph, &ids.chunk);

    assert!(coordinator.on_field_input(&mut graph, &ids.chunk, "chunkingStrategy", "by_title".into()));
    assert!(coordinator.on_field_input(
        &mut graph,
        &ids.chunk,
        "chunkCombineTextUnderNChars",
        "200".into()
    ));

    // Switching away hides the field but keeps the value.
    assert!(coordinator.on_field_input(&mut graph, &ids.chunk, "chunkingStrategy", "basic".into()));
    let panel = coordinator.panel(&graph).expect("panel open");
    let combine = panel
        .view
        .field("chunkCombineTextUnderNChars")
        .expect("field present");
    assert!(!combine.visible);
    assert_eq!(combine.value, FieldValue::Number(Some(200.0)));
    assert_eq!(
        chunk_config(&graph, &ids.chunk).chunk_combine_text_under_n_chars,
        Some(200)
    );

    // And switching back shows it again.
    assert!(coordinator.on_field_input(&mut graph, &ids.chunk, "chunkingStrategy", "by_title".into()));
    let panel = coordinator.panel(&graph).expect("panel open");
    let combine = panel
        .view
        .field("chunkCombineTextUnderNChars")
        .expect("field present");
    assert!(combine.visible);
    assert_eq!(combine.value, FieldValue::Number(Some(200.0)));
}

#[test]
fn test_out_of_range_input_becomes_notice() {
    let (mut graph, ids) = linear_pipeline();
    let before = graph.snapshot();
    let mut coordinator = Coordinator::default();
    coordinator.select_node(&graph, &ids.chunk);

    assert!(!coordinator.on_field_input(&mut graph, &ids.chunk, "chunkMaxCharacters", "0".into()));
    assert!(matches!(
        coordinator.notice(),
        Some(ValidationError::OutOfRange {
            field: "chunkMaxCharacters",
            ..
        })
    ));
    assert_eq!(graph.snapshot(), before);

    // The next accepted edit clears the notice.
    assert!(coordinator.on_field_input(&mut graph, &ids.chunk, "chunkMaxCharacters", "500".into()));
    assert!(coordinator.notice().is_none());
    assert_eq!(chunk_config(&graph, &ids.chunk).chunk_max_characters, Some(500));
}

#[test]
fn test_non_numeric_input_clears_the_value() {
    let (mut graph, ids) = linear_pipeline();
    let mut coordinator = Coordinator::default();
    coordinator.on_field_input(&mut graph, &ids.chunk, "chunkOverlap", "40".into());
    assert_eq!(chunk_config(&graph, &ids.chunk).chunk_overlap, Some(40));

    assert!(coordinator.on_field_input(&mut graph, &ids.chunk, "chunkOverlap", "".into()));
    assert_eq!(chunk_config(&graph, &ids.chunk).chunk_overlap, None);
}

#[test]
fn test_unknown_field_and_foreign_patch_are_refused() {
    let (mut graph, ids) = linear_pipeline();
    let mut coordinator = Coordinator::default();

    assert!(!coordinator.on_field_input(&mut graph, &ids.partition, "chunkOverlap", "5".into()));
    assert!(matches!(
        coordinator.notice(),
        Some(ValidationError::UnknownField { .. })
    ));

    assert!(!coordinator.on_node_config_change(
        &mut graph,
        &ids.partition,
        &ConfigField::Temperature(Some(0.3)).into()
    ));
    assert!(matches!(
        coordinator.notice(),
        Some(ValidationError::KindMismatch { .. })
    ));
}

#[test]
fn test_edits_to_unselected_nodes_leave_panel_alone() {
    let (mut graph, ids) = linear_pipeline();
    let mut coordinator = Coordinator::default();
    coordinator.select_node(&graph, &ids.partition);
    let panel_before = coordinator.panel(&graph);

    assert!(coordinator.on_field_input(&mut graph, &ids.chunk, "chunkingStrategy", "basic".into()));
    assert_eq!(coordinator.panel(&graph), panel_before);
}

#[test]
fn test_refresh_after_load_drops_vanished_selection() {
    let (mut graph, ids) = linear_pipeline();
    let mut coordinator = Coordinator::default();
    coordinator.select_node(&graph, &ids.output);

    graph.remove_node(&ids.output);
    coordinator.refresh(&graph);
    assert!(coordinator.selected().is_none());
    assert!(coordinator.panel(&graph).is_none());
}

#[test]
fn test_panel_reflects_edits_made_outside_the_coordinator() {
    let (mut graph, ids) = linear_pipeline();
    let mut coordinator = Coordinator::default();
    coordinator.select_node(&graph, &ids.chunk);

    assert!(graph.rename_node(&ids.chunk, "Renamed"));
    graph
        .update_node_config(
            &ids.chunk,
            &ConfigField::ChunkMaxCharacters(Some(750)).into(),
        )
        .expect("valid patch");

    let panel = coordinator.panel(&graph).expect("panel open");
    assert_eq!(panel.label, "Renamed");
    assert_eq!(
        panel.view.field("chunkMaxCharacters").map(|f| f.value.clone()),
        Some(FieldValue::Number(Some(750.0)))
    );
}

#[test]
fn test_panel_tracks_a_reloaded_graph() {
    let (mut graph, ids) = linear_pipeline();
    let mut store = PipelineStore::new(MemoryStore::new());
    graph.rename_node(&ids.partition, "Saved label");
    store.save(&graph).expect("save succeeds");

    let mut coordinator = Coordinator::default();
    graph.rename_node(&ids.partition, "Unsaved label");
    coordinator.select_node(&graph, &ids.partition);

    store.load_into(&mut graph).expect("load succeeds");
    assert_eq!(
        coordinator.panel(&graph).map(|p| p.label),
        Some("Saved label".to_string())
    );
}
