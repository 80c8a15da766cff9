use super::{ConfigForm, FieldInput, FieldValue, FormField, FormView, Widget};
use crate::catalog::NodeKind;
use crate::config::{
    ChunkConfig, ChunkingStrategy, ConfigField, ConfigPatch, LlmDefaults, NodeConfig,
};
use crate::error::ValidationError;

pub struct ChunkForm;

fn number(value: Option<u32>) -> FieldValue {
    FieldValue::Number(value.map(f64::from))
}

fn count_widget(min: f64) -> Widget {
    Widget::Number {
        min: Some(min),
        max: None,
        step: 1.0,
    }
}

impl ConfigForm for ChunkForm {
    fn kind(&self) -> NodeKind {
        NodeKind::Chunk
    }

    fn render(&self, config: &NodeConfig, _defaults: &LlmDefaults) -> FormView {
        let fallback;
        let config = match config {
            NodeConfig::Chunk(c) => c,
            _ => {
                fallback = ChunkConfig::default();
                &fallback
            }
        };
        let enabled = config.chunking_strategy.is_enabled();
        let by_title = config.chunking_strategy == ChunkingStrategy::ByTitle;

        FormView {
            kind: NodeKind::Chunk,
            fields: vec![
                FormField::new(
                    "chunkingStrategy",
                    "Chunking strategy",
                    Widget::Select {
                        options: ChunkingStrategy::ALL.iter().map(|s| s.as_str()).collect(),
                    },
                    FieldValue::Choice(config.chunking_strategy.as_str()),
                ),
                FormField::new(
                    "chunkMaxCharacters",
                    "Max characters",
                    count_widget(1.0),
                    number(config.chunk_max_characters),
                )
                .placeholder("500")
                .visible(enabled),
                FormField::new(
                    "chunkNewAfterNChars",
                    "Soft max (new chunk after N chars)",
                    count_widget(1.0),
                    number(config.chunk_new_after_n_chars),
                )
                .visible(enabled),
                FormField::new(
                    "chunkOverlap",
                    "Overlap",
                    count_widget(0.0),
                    number(config.chunk_overlap),
                )
                .placeholder("0")
                .visible(enabled),
                FormField::new(
                    "chunkCombineTextUnderNChars",
                    "Combine text under N chars",
                    count_widget(0.0),
                    number(config.chunk_combine_text_under_n_chars),
                )
                .visible(by_title),
                FormField::new(
                    "chunkMultipageSections",
                    "Allow multipage sections",
                    Widget::Toggle,
                    FieldValue::Bool(config.multipage_sections()),
                )
                .visible(by_title),
            ],
        }
    }

    fn parse_input(&self, field: &str, input: FieldInput) -> Result<ConfigPatch, ValidationError> {
        let assignment = match field {
            "chunkingStrategy" => {
                ConfigField::ChunkingStrategy(ChunkingStrategy::parse(&super::text_input(input))?)
            }
            "chunkMaxCharacters" => ConfigField::ChunkMaxCharacters(super::optional_int(
                "chunkMaxCharacters",
                input,
                1,
                "an integer greater than 0",
            )?),
            "chunkNewAfterNChars" => ConfigField::ChunkNewAfterNChars(super::optional_int(
                "chunkNewAfterNChars",
                input,
                1,
                "an integer greater than 0",
            )?),
            "chunkOverlap" => ConfigField::ChunkOverlap(super::optional_int(
                "chunkOverlap",
                input,
                0,
                "a non-negative integer",
            )?),
            "chunkCombineTextUnderNChars" => {
                ConfigField::ChunkCombineTextUnderNChars(super::optional_int(
                    "chunkCombineTextUnderNChars",
                    input,
                    0,
                    "a non-negative integer",
                )?)
            }
            "chunkMultipageSections" => ConfigField::ChunkMultipageSections(super::bool_input(
                "chunkMultipageSections",
                input,
            )?),
            other => return Err(super::unknown_field(NodeKind::Chunk, other)),
        };
        Ok(assignment.into())
    }
}
