use super::{ChunkingStrategy, PartitionStrategy};
use crate::catalog::NodeKind;
use crate::error::ValidationError;
use url::Url;

/// A single typed assignment to one configuration field.
///
/// Optional numeric and text fields carry an `Option`, so a patch can set them
/// back to "undefined".
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigField {
    Strategy(PartitionStrategy),
    OcrLanguages(String),
    PdfInferTableStructure(bool),
    ExtractImageBlockTypes(String),
    RemoveExtraWhitespace(bool),
    ChunkingStrategy(ChunkingStrategy),
    ChunkMaxCharacters(Option<u32>),
    ChunkNewAfterNChars(Option<u32>),
    ChunkOverlap(Option<u32>),
    ChunkCombineTextUnderNChars(Option<u32>),
    ChunkMultipageSections(bool),
    ExtractionPrompt(String),
    ServerUrl(Option<String>),
    ModelName(Option<String>),
    Temperature(Option<f64>),
}

impl ConfigField {
    /// The node kind owning this field.
    pub fn kind(&self) -> NodeKind {
        match self {
            ConfigField::Strategy(_)
            | ConfigField::OcrLanguages(_)
            | ConfigField::PdfInferTableStructure(_)
            | ConfigField::ExtractImageBlockTypes(_) => NodeKind::Partition,
            ConfigField::RemoveExtraWhitespace(_) => NodeKind::Clean,
            ConfigField::ChunkingStrategy(_)
            | ConfigField::ChunkMaxCharacters(_)
            | ConfigField::ChunkNewAfterNChars(_)
            | ConfigField::ChunkOverlap(_)
            | ConfigField::ChunkCombineTextUnderNChars(_)
            | ConfigField::ChunkMultipageSections(_) => NodeKind::Chunk,
            ConfigField::ExtractionPrompt(_)
            | ConfigField::ServerUrl(_)
            | ConfigField::ModelName(_)
            | ConfigField::Temperature(_) => NodeKind::ExtractLLM,
        }
    }

    /// The persisted (camelCase) key of this field.
    pub fn key(&self) -> &'static str {
        match self {
            ConfigField::Strategy(_) => "strategy",
            ConfigField::OcrLanguages(_) => "ocrLanguages",
            ConfigField::PdfInferTableStructure(_) => "pdfInferTableStructure",
            ConfigField::ExtractImageBlockTypes(_) => "extractImageBlockTypes",
            ConfigField::RemoveExtraWhitespace(_) => "removeExtraWhitespace",
            ConfigField::ChunkingStrategy(_) => "chunkingStrategy",
            ConfigField::ChunkMaxCharacters(_) => "chunkMaxCharacters",
            ConfigField::ChunkNewAfterNChars(_) => "chunkNewAfterNChars",
            ConfigField::ChunkOverlap(_) => "chunkOverlap",
            ConfigField::ChunkCombineTextUnderNChars(_) => "chunkCombineTextUnderNChars",
            ConfigField::ChunkMultipageSections(_) => "chunkMultipageSections",
            ConfigField::ExtractionPrompt(_) => "extractionPrompt",
            ConfigField::ServerUrl(_) => "serverUrl",
            ConfigField::ModelName(_) => "modelName",
            ConfigField::Temperature(_) => "temperature",
        }
    }

    /// Checks the value against the field's declared bounds.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            ConfigField::ChunkMaxCharacters(Some(0)) | ConfigField::ChunkNewAfterNChars(Some(0)) => {
                Err(ValidationError::OutOfRange {
                    field: self.key(),
                    value: "0".to_string(),
                    expected: "an integer greater than 0",
                })
            }
            ConfigField::Temperature(Some(t)) if !(0.0..=2.0).contains(t) => {
                Err(ValidationError::OutOfRange {
                    field: self.key(),
                    value: t.to_string(),
                    expected: "a number between 0 and 2",
                })
            }
            ConfigField::ServerUrl(Some(raw)) => validate_http_url(self.key(), raw),
            _ => Ok(()),
        }
    }
}

pub(crate) fn validate_http_url(field: &'static str, raw: &str) -> Result<(), ValidationError> {
    let invalid = |message: String| ValidationError::InvalidUrl {
        field,
        value: raw.to_string(),
        message,
    };
    let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(invalid(format!("unsupported scheme '{}'", other))),
    }
}

/// An ordered set of field assignments, applied as a shallow merge.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConfigPatch {
    fields: Vec<ConfigField>,
}

impl ConfigPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: ConfigField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn push(&mut self, field: ConfigField) {
        self.fields.push(field);
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConfigField> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl From<ConfigField> for ConfigPatch {
    fn from(field: ConfigField) -> Self {
        ConfigPatch {
            fields: vec![field],
        }
    }
}

impl FromIterator<ConfigField> for ConfigPatch {
    fn from_iter<I: IntoIterator<Item = ConfigField>>(iter: I) -> Self {
        ConfigPatch {
            fields: iter.into_iter().collect(),
        }
    }
}
