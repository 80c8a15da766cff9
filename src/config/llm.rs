use serde::{Deserialize, Serialize};

pub const DEFAULT_LLM_SERVER_URL: &str = "http://localhost:11434";
pub const DEFAULT_LLM_MODEL: &str = "llama3";
pub const DEFAULT_LLM_TEMPERATURE: f64 = 0.7;

/// Process-wide fallbacks for LLM extraction nodes that do not override them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmDefaults {
    pub server_url: String,
    pub model_name: String,
    pub temperature: f64,
}

impl Default for LlmDefaults {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_LLM_SERVER_URL.to_string(),
            model_name: DEFAULT_LLM_MODEL.to_string(),
            temperature: DEFAULT_LLM_TEMPERATURE,
        }
    }
}

/// The effective LLM settings of one extraction node.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLlm {
    pub server_url: String,
    pub model_name: String,
    pub temperature: f64,
}
