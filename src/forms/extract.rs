use super::{ConfigForm, FieldInput, FieldValue, FormField, FormView, Widget};
use crate::catalog::NodeKind;
use crate::config::{ConfigField, ConfigPatch, ExtractConfig, LlmDefaults, NodeConfig};
use crate::error::ValidationError;

/// Form for LLM extraction nodes.
///
/// Server, model and temperature display the effective value: the node's own
/// override when set, otherwise the process-wide default.
pub struct ExtractForm;

impl ConfigForm for ExtractForm {
    fn kind(&self) -> NodeKind {
        NodeKind::ExtractLLM
    }

    fn render(&self, config: &NodeConfig, defaults: &LlmDefaults) -> FormView {
        let fallback;
        let config = match config {
            NodeConfig::ExtractLLM(c) => c,
            _ => {
                fallback = ExtractConfig::default();
                &fallback
            }
        };
        let resolved = config.resolve(defaults);

        FormView {
            kind: NodeKind::ExtractLLM,
            fields: vec![
                FormField::new(
                    "extractionPrompt",
                    "Extraction prompt",
                    Widget::TextArea,
                    FieldValue::Text(config.extraction_prompt.clone()),
                )
                .placeholder("Extract all people and organizations mentioned"),
                FormField::new(
                    "serverUrl",
                    "Ollama server URL",
                    Widget::Text,
                    FieldValue::Text(resolved.server_url),
                )
                .placeholder(defaults.server_url.clone()),
                FormField::new(
                    "modelName",
                    "Model",
                    Widget::Text,
                    FieldValue::Text(resolved.model_name),
                )
                .placeholder(defaults.model_name.clone()),
                FormField::new(
                    "temperature",
                    "Temperature",
                    Widget::Number {
                        min: Some(0.0),
                        max: Some(2.0),
                        step: 0.1,
                    },
                    FieldValue::Number(Some(resolved.temperature)),
                ),
            ],
        }
    }

    fn parse_input(&self, field: &str, input: FieldInput) -> Result<ConfigPatch, ValidationError> {
        let assignment = match field {
            "extractionPrompt" => ConfigField::ExtractionPrompt(super::text_input(input)),
            "serverUrl" => ConfigField::ServerUrl(super::optional_text(input)),
            "modelName" => ConfigField::ModelName(super::optional_text(input)),
            "temperature" => ConfigField::Temperature(super::optional_float(
                "temperature",
                input,
                0.0,
                2.0,
                "a number between 0 and 2",
            )?),
            other => return Err(super::unknown_field(NodeKind::ExtractLLM, other)),
        };
        assignment.validate()?;
        Ok(assignment.into())
    }
}
