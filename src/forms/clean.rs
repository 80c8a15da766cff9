use super::{ConfigForm, FieldInput, FieldValue, FormField, FormView, Widget};
use crate::catalog::NodeKind;
use crate::config::{CleanConfig, ConfigField, ConfigPatch, LlmDefaults, NodeConfig};
use crate::error::ValidationError;

pub struct CleanForm;

impl ConfigForm for CleanForm {
    fn kind(&self) -> NodeKind {
        NodeKind::Clean
    }

    fn render(&self, config: &NodeConfig, _defaults: &LlmDefaults) -> FormView {
        let remove_extra_whitespace = match config {
            NodeConfig::Clean(c) => c.remove_extra_whitespace,
            _ => CleanConfig::default().remove_extra_whitespace,
        };
        FormView {
            kind: NodeKind::Clean,
            fields: vec![FormField::new(
                "removeExtraWhitespace",
                "Remove extra whitespace",
                Widget::Toggle,
                FieldValue::Bool(remove_extra_whitespace),
            )],
        }
    }

    fn parse_input(&self, field: &str, input: FieldInput) -> Result<ConfigPatch, ValidationError> {
        match field {
            "removeExtraWhitespace" => Ok(ConfigField::RemoveExtraWhitespace(super::bool_input(
                "removeExtraWhitespace",
                input,
            )?)
            .into()),
            other => Err(super::unknown_field(NodeKind::Clean, other)),
        }
    }
}
