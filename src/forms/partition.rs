use super::{ConfigForm, FieldInput, FieldValue, FormField, FormView, Widget};
use crate::catalog::NodeKind;
use crate::config::{
    ConfigField, ConfigPatch, LlmDefaults, NodeConfig, PartitionConfig, PartitionStrategy,
};
use crate::error::ValidationError;

pub struct PartitionForm;

impl ConfigForm for PartitionForm {
    fn kind(&self) -> NodeKind {
        NodeKind::Partition
    }

    fn render(&self, config: &NodeConfig, _defaults: &LlmDefaults) -> FormView {
        let fallback;
        let config = match config {
            NodeConfig::Partition(c) => c,
            _ => {
                fallback = PartitionConfig::default();
                &fallback
            }
        };

        FormView {
            kind: NodeKind::Partition,
            fields: vec![
                FormField::new(
                    "strategy",
                    "Strategy",
                    Widget::Select {
                        options: PartitionStrategy::ALL.iter().map(|s| s.as_str()).collect(),
                    },
                    FieldValue::Choice(config.strategy.as_str()),
                ),
                FormField::new(
                    "ocrLanguages",
                    "OCR languages",
                    Widget::Text,
                    FieldValue::Text(config.ocr_languages.clone()),
                )
                .placeholder("eng"),
                FormField::new(
                    "pdfInferTableStructure",
                    "Infer table structure (PDF)",
                    Widget::Toggle,
                    FieldValue::Bool(config.infer_table_structure()),
                ),
                FormField::new(
                    "extractImageBlockTypes",
                    "Extract image block types",
                    Widget::Text,
                    FieldValue::Text(config.extract_image_block_types.clone()),
                )
                .placeholder("Image, Table"),
            ],
        }
    }

    fn parse_input(&self, field: &str, input: FieldInput) -> Result<ConfigPatch, ValidationError> {
        let assignment = match field {
            "strategy" => ConfigField::Strategy(PartitionStrategy::parse(&super::text_input(input))?),
            "ocrLanguages" => ConfigField::OcrLanguages(super::text_input(input).trim().to_string()),
            "pdfInferTableStructure" => {
                ConfigField::PdfInferTableStructure(super::bool_input("pdfInferTableStructure", input)?)
            }
            "extractImageBlockTypes" => {
                ConfigField::ExtractImageBlockTypes(super::text_input(input))
            }
            other => return Err(super::unknown_field(NodeKind::Partition, other)),
        };
        Ok(assignment.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_inference_renders_as_enabled_when_unset() {
        let view = PartitionForm.render(
            &NodeConfig::default_for(NodeKind::Partition),
            &LlmDefaults::default(),
        );
        assert_eq!(
            view.field("pdfInferTableStructure").unwrap().value,
            FieldValue::Bool(true)
        );
        assert_eq!(view.visible_fields().count(), 4);
    }

    #[test]
    fn unknown_strategy_is_refused() {
        let err = PartitionForm
            .parse_input("strategy", "turbo".into())
            .unwrap_err();
        assert!(matches!(err, ValidationError::UnknownOption { field: "strategy", .. }));
        assert_eq!(
            PartitionForm.parse_input("strategy", "hi_res".into()),
            Ok(ConfigField::Strategy(PartitionStrategy::HiRes).into())
        );
    }
}
