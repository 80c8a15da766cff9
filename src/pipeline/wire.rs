use crate::config::NodeConfig;
use serde::{Serialize, Serializer};

/// A node config in the processor's flat snake_case schema.
///
/// The processor reads one loose object for every kind, so each field is
/// optional and unset fields are left out.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct WireConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ocr_languages: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_infer_table_structure: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extract_image_block_types: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remove_extra_whitespace: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunking_strategy: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_max_characters: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_new_after_n_chars: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_combine_text_under_n_chars: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_overlap: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_multipage_sections: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extraction_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ollama_server_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ollama_model_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ollama_temperature: Option<f64>,
}

impl From<&NodeConfig> for WireConfig {
    fn from(config: &NodeConfig) -> Self {
        match config {
            NodeConfig::Input(_) | NodeConfig::Output(_) => WireConfig::default(),
            NodeConfig::Partition(c) => WireConfig {
                strategy: Some(c.strategy.as_str()),
                ocr_languages: Some(c.ocr_languages.clone()),
                pdf_infer_table_structure: c.pdf_infer_table_structure,
                extract_image_block_types: Some(c.extract_image_block_types.clone()),
                ..Default::default()
            },
            NodeConfig::Clean(c) => WireConfig {
                remove_extra_whitespace: Some(c.remove_extra_whitespace),
                ..Default::default()
            },
            NodeConfig::Chunk(c) => WireConfig {
                chunking_strategy: Some(c.chunking_strategy.as_str()),
                chunk_max_characters: c.chunk_max_characters,
                chunk_new_after_n_chars: c.chunk_new_after_n_chars,
                chunk_combine_text_under_n_chars: c.chunk_combine_text_under_n_chars,
                chunk_overlap: c.chunk_overlap,
                chunk_multipage_sections: c.chunk_multipage_sections,
                ..Default::default()
            },
            NodeConfig::ExtractLLM(c) => WireConfig {
                extraction_prompt: Some(c.extraction_prompt.clone()),
                ollama_server_url: c.server_url.clone(),
                ollama_model_name: c.model_name.clone(),
                ollama_temperature: c.temperature,
                ..Default::default()
            },
        }
    }
}

pub(super) fn serialize_config<S: Serializer>(
    config: &NodeConfig,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    WireConfig::from(config).serialize(serializer)
}
