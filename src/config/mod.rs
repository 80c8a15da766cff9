//! Per-stage configuration shapes.
//!
//! A [`NodeConfig`] is a sum type keyed by [`NodeKind`]. The persisted JSON of
//! each variant is the bare camelCase object (`{"strategy": "auto", ...}`);
//! the kind travels next to it in the node's `type` field.

use crate::catalog::NodeKind;
use crate::error::ValidationError;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

mod llm;
mod patch;

pub use llm::{LlmDefaults, ResolvedLlm};
pub use patch::{ConfigField, ConfigPatch};

/// How the processor splits a document into elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitionStrategy {
    #[default]
    Auto,
    HiRes,
    OcrOnly,
    Fast,
}

impl PartitionStrategy {
    pub const ALL: [PartitionStrategy; 4] = [
        PartitionStrategy::Auto,
        PartitionStrategy::HiRes,
        PartitionStrategy::OcrOnly,
        PartitionStrategy::Fast,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PartitionStrategy::Auto => "auto",
            PartitionStrategy::HiRes => "hi_res",
            PartitionStrategy::OcrOnly => "ocr_only",
            PartitionStrategy::Fast => "fast",
        }
    }

    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        Self::ALL
            .into_iter()
            .find(|s| s.as_str() == value.trim())
            .ok_or_else(|| ValidationError::UnknownOption {
                field: "strategy",
                value: value.to_string(),
                allowed: Self::ALL.iter().map(|s| s.as_str()).join(", "),
            })
    }
}

/// How elements are grouped into chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkingStrategy {
    #[default]
    None,
    Basic,
    ByTitle,
}

impl ChunkingStrategy {
    pub const ALL: [ChunkingStrategy; 3] = [
        ChunkingStrategy::None,
        ChunkingStrategy::Basic,
        ChunkingStrategy::ByTitle,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ChunkingStrategy::None => "none",
            ChunkingStrategy::Basic => "basic",
            ChunkingStrategy::ByTitle => "by_title",
        }
    }

    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        Self::ALL
            .into_iter()
            .find(|s| s.as_str() == value.trim())
            .ok_or_else(|| ValidationError::UnknownOption {
                field: "chunkingStrategy",
                value: value.to_string(),
                allowed: Self::ALL.iter().map(|s| s.as_str()).join(", "),
            })
    }

    pub fn is_enabled(self) -> bool {
        self != ChunkingStrategy::None
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PartitionConfig {
    pub strategy: PartitionStrategy,
    pub ocr_languages: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_infer_table_structure: Option<bool>,
    pub extract_image_block_types: String,
}

impl Default for PartitionConfig {
    fn default() -> Self {
        Self {
            strategy: PartitionStrategy::Auto,
            ocr_languages: "eng".to_string(),
            pdf_infer_table_structure: None,
            extract_image_block_types: String::new(),
        }
    }
}

impl PartitionConfig {
    /// Table inference is on unless explicitly disabled.
    pub fn infer_table_structure(&self) -> bool {
        self.pdf_infer_table_structure.unwrap_or(true)
    }

    /// The comma-separated block types, trimmed, without empty entries.
    pub fn image_block_types(&self) -> Vec<String> {
        self.extract_image_block_types
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CleanConfig {
    pub remove_extra_whitespace: bool,
}

impl Default for CleanConfig {
    fn default() -> Self {
        Self {
            remove_extra_whitespace: true,
        }
    }
}

/// Chunking settings. Numeric limits left unset defer to the processor's defaults.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChunkConfig {
    pub chunking_strategy: ChunkingStrategy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_max_characters: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_new_after_n_chars: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_overlap: Option<u32>,
    /// Only meaningful under `by_title`; kept while another strategy is selected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_combine_text_under_n_chars: Option<u32>,
    /// Only meaningful under `by_title`; kept while another strategy is selected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_multipage_sections: Option<bool>,
}

impl ChunkConfig {
    pub fn multipage_sections(&self) -> bool {
        self.chunk_multipage_sections.unwrap_or(true)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExtractConfig {
    pub extraction_prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

impl ExtractConfig {
    /// Fills unset LLM settings from the process-wide defaults.
    pub fn resolve(&self, defaults: &LlmDefaults) -> ResolvedLlm {
        ResolvedLlm {
            server_url: self
                .server_url
                .clone()
                .unwrap_or_else(|| defaults.server_url.clone()),
            model_name: self
                .model_name
                .clone()
                .unwrap_or_else(|| defaults.model_name.clone()),
            temperature: self.temperature.unwrap_or(defaults.temperature),
        }
    }
}

/// Configuration of the input and output endpoints. Carries nothing yet.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EndpointConfig {}

/// The configuration of a node, one variant per [`NodeKind`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NodeConfig {
    Input(EndpointConfig),
    Partition(PartitionConfig),
    Clean(CleanConfig),
    Chunk(ChunkConfig),
    ExtractLLM(ExtractConfig),
    Output(EndpointConfig),
}

impl NodeConfig {
    /// The catalog default configuration of a kind.
    pub fn default_for(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Input => NodeConfig::Input(EndpointConfig::default()),
            NodeKind::Partition => NodeConfig::Partition(PartitionConfig::default()),
            NodeKind::Clean => NodeConfig::Clean(CleanConfig::default()),
            NodeKind::Chunk => NodeConfig::Chunk(ChunkConfig::default()),
            NodeKind::ExtractLLM => NodeConfig::ExtractLLM(ExtractConfig::default()),
            NodeKind::Output => NodeConfig::Output(EndpointConfig::default()),
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            NodeConfig::Input(_) => NodeKind::Input,
            NodeConfig::Partition(_) => NodeKind::Partition,
            NodeConfig::Clean(_) => NodeKind::Clean,
            NodeConfig::Chunk(_) => NodeKind::Chunk,
            NodeConfig::ExtractLLM(_) => NodeKind::ExtractLLM,
            NodeConfig::Output(_) => NodeKind::Output,
        }
    }

    /// Parses the bare config object of a node whose kind is already known.
    ///
    /// A `null` value is read as an empty object, so unset configs take the defaults.
    pub fn from_value(kind: NodeKind, value: serde_json::Value) -> Result<Self, serde_json::Error> {
        let value = if value.is_null() {
            serde_json::Value::Object(Default::default())
        } else {
            value
        };
        Ok(match kind {
            NodeKind::Input => NodeConfig::Input(serde_json::from_value(value)?),
            NodeKind::Partition => NodeConfig::Partition(serde_json::from_value(value)?),
            NodeKind::Clean => NodeConfig::Clean(serde_json::from_value(value)?),
            NodeKind::Chunk => NodeConfig::Chunk(serde_json::from_value(value)?),
            NodeKind::ExtractLLM => NodeConfig::ExtractLLM(serde_json::from_value(value)?),
            NodeKind::Output => NodeConfig::Output(serde_json::from_value(value)?),
        })
    }

    /// Shallow-merges a patch; later fields win.
    ///
    /// The merge is all-or-nothing: if any field is rejected the config is left untouched.
    pub fn apply(&mut self, patch: &ConfigPatch) -> Result<(), ValidationError> {
        let mut merged = self.clone();
        for field in patch.iter() {
            merged.assign(field)?;
        }
        *self = merged;
        Ok(())
    }

    fn assign(&mut self, field: &ConfigField) -> Result<(), ValidationError> {
        field.validate()?;
        let found = self.kind();
        match (self, field.clone()) {
            (NodeConfig::Partition(c), ConfigField::Strategy(v)) => c.strategy = v,
            (NodeConfig::Partition(c), ConfigField::OcrLanguages(v)) => c.ocr_languages = v,
            (NodeConfig::Partition(c), ConfigField::PdfInferTableStructure(v)) => {
                c.pdf_infer_table_structure = Some(v)
            }
            (NodeConfig::Partition(c), ConfigField::ExtractImageBlockTypes(v)) => {
                c.extract_image_block_types = v
            }
            (NodeConfig::Clean(c), ConfigField::RemoveExtraWhitespace(v)) => {
                c.remove_extra_whitespace = v
            }
            (NodeConfig::Chunk(c), ConfigField::ChunkingStrategy(v)) => c.chunking_strategy = v,
            (NodeConfig::Chunk(c), ConfigField::ChunkMaxCharacters(v)) => {
                c.chunk_max_characters = v
            }
            (NodeConfig::Chunk(c), ConfigField::ChunkNewAfterNChars(v)) => {
                c.chunk_new_after_n_chars = v
            }
            (NodeConfig::Chunk(c), ConfigField::ChunkOverlap(v)) => c.chunk_overlap = v,
            (NodeConfig::Chunk(c), ConfigField::ChunkCombineTextUnderNChars(v)) => {
                c.chunk_combine_text_under_n_chars = v
            }
            (NodeConfig::Chunk(c), ConfigField::ChunkMultipageSections(v)) => {
                c.chunk_multipage_sections = Some(v)
            }
            (NodeConfig::ExtractLLM(c), ConfigField::ExtractionPrompt(v)) => {
                c.extraction_prompt = v
            }
            (NodeConfig::ExtractLLM(c), ConfigField::ServerUrl(v)) => c.server_url = v,
            (NodeConfig::ExtractLLM(c), ConfigField::ModelName(v)) => c.model_name = v,
            (NodeConfig::ExtractLLM(c), ConfigField::Temperature(v)) => c.temperature = v,
            (_, field) => {
                return Err(ValidationError::KindMismatch {
                    field: field.key(),
                    expected: field.kind(),
                    found,
                });
            }
        }
        Ok(())
    }

    /// Checks stored values against the same rules the forms enforce.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.as_fields().iter().try_for_each(ConfigField::validate)
    }

    /// Expresses the stored, explicitly set values as a patch.
    pub fn as_fields(&self) -> ConfigPatch {
        let mut patch = ConfigPatch::new();
        match self {
            NodeConfig::Input(_) | NodeConfig::Output(_) => {}
            NodeConfig::Partition(c) => {
                patch.push(ConfigField::Strategy(c.strategy));
                patch.push(ConfigField::OcrLanguages(c.ocr_languages.clone()));
                if let Some(v) = c.pdf_infer_table_structure {
                    patch.push(ConfigField::PdfInferTableStructure(v));
                }
                patch.push(ConfigField::ExtractImageBlockTypes(
                    c.extract_image_block_types.clone(),
                ));
            }
            NodeConfig::Clean(c) => {
                patch.push(ConfigField::RemoveExtraWhitespace(c.remove_extra_whitespace));
            }
            NodeConfig::Chunk(c) => {
                patch.push(ConfigField::ChunkingStrategy(c.chunking_strategy));
                patch.push(ConfigField::ChunkMaxCharacters(c.chunk_max_characters));
                patch.push(ConfigField::ChunkNewAfterNChars(c.chunk_new_after_n_chars));
                patch.push(ConfigField::ChunkOverlap(c.chunk_overlap));
                patch.push(ConfigField::ChunkCombineTextUnderNChars(
                    c.chunk_combine_text_under_n_chars,
                ));
                if let Some(v) = c.chunk_multipage_sections {
                    patch.push(ConfigField::ChunkMultipageSections(v));
                }
            }
            NodeConfig::ExtractLLM(c) => {
                patch.push(ConfigField::ExtractionPrompt(c.extraction_prompt.clone()));
                patch.push(ConfigField::ServerUrl(c.server_url.clone()));
                patch.push(ConfigField::ModelName(c.model_name.clone()));
                patch.push(ConfigField::Temperature(c.temperature));
            }
        }
        patch
    }
}
