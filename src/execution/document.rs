use super::TRACING_TARGET;
use super::http::{build_client, decode_response, endpoint, file_part};
use crate::config::{ChunkingStrategy, NodeConfig, PartitionStrategy};
use crate::error::{ExecutionError, ValidationError};
use crate::graph::Graph;
use crate::pipeline::{determine_path, serialize};
use crate::settings::ClientSettings;
use itertools::Itertools;
use reqwest::Client;
use reqwest::multipart::Form;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use url::Url;

/// File extensions the processor accepts, lowercase with the leading dot.
pub const SUPPORTED_EXTENSIONS: [&str; 6] = [".txt", ".pdf", ".docx", ".doc", ".html", ".md"];

/// A document ready to be uploaded.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentUpload {
    file_name: String,
    bytes: Vec<u8>,
}

impl DocumentUpload {
    /// Wraps in-memory content, refusing unsupported extensions.
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, ValidationError> {
        let file_name = file_name.into();
        check_extension(&file_name)?;
        Ok(Self { file_name, bytes })
    }

    /// Reads a document from disk. The extension is checked before the file is read.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ExecutionError> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ExecutionError::Io(format!("'{}' has no file name", path.display())))?
            .to_string();
        check_extension(&file_name)?;
        let bytes = std::fs::read(path)
            .map_err(|e| ExecutionError::Io(format!("{}: {}", path.display(), e)))?;
        Ok(Self { file_name, bytes })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime_type(&self) -> &'static str {
        match extension(&self.file_name).as_str() {
            ".txt" => "text/plain",
            ".pdf" => "application/pdf",
            ".docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            ".doc" => "application/msword",
            ".html" => "text/html",
            ".md" => "text/markdown",
            _ => "application/octet-stream",
        }
    }
}

fn extension(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_ascii_lowercase()))
        .unwrap_or_default()
}

fn check_extension(file_name: &str) -> Result<(), ValidationError> {
    let extension = extension(file_name);
    if SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
        Ok(())
    } else {
        Err(ValidationError::UnsupportedFileType {
            extension,
            supported: SUPPORTED_EXTENSIONS.iter().join(", "),
        })
    }
}

/// Form options of a single-document processing request.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingOptions {
    pub strategy: PartitionStrategy,
    pub remove_extra_whitespace: bool,
    pub ocr_languages: Option<String>,
    pub pdf_infer_table_structure: bool,
    pub extract_image_block_types: Option<String>,
    pub chunking_strategy: ChunkingStrategy,
    pub chunk_max_characters: Option<u32>,
    pub chunk_new_after_n_chars: Option<u32>,
    pub chunk_combine_text_under_n_chars: Option<u32>,
    pub chunk_overlap: Option<u32>,
    pub chunk_multipage_sections: bool,
}

impl Default for ProcessingOptions {
    fn default() -> Self {
        Self {
            strategy: PartitionStrategy::Auto,
            remove_extra_whitespace: true,
            ocr_languages: None,
            pdf_infer_table_structure: true,
            extract_image_block_types: None,
            chunking_strategy: ChunkingStrategy::None,
            chunk_max_characters: None,
            chunk_new_after_n_chars: None,
            chunk_combine_text_under_n_chars: None,
            chunk_overlap: None,
            chunk_multipage_sections: true,
        }
    }
}

impl ProcessingOptions {
    /// Collects options from the first Partition, Clean and Chunk node of the graph.
    ///
    /// Nodes are visited along the execution path when one exists, otherwise
    /// in creation order.
    pub fn from_graph(graph: &Graph) -> Self {
        let order = determine_path(&serialize(graph)).unwrap_or_else(|_| {
            graph
                .nodes()
                .iter()
                .map(|n| n.id().to_string())
                .collect()
        });

        let mut options = Self::default();
        let mut seen = Vec::with_capacity(3);
        for node in order.iter().filter_map(|id| graph.node(id)) {
            if seen.contains(&node.kind()) {
                continue;
            }
            match node.config() {
                NodeConfig::Partition(c) => {
                    options.strategy = c.strategy;
                    options.ocr_languages = non_empty(&c.ocr_languages);
                    options.pdf_infer_table_structure = c.infer_table_structure();
                    options.extract_image_block_types = non_empty(&c.extract_image_block_types);
                }
                NodeConfig::Clean(c) => {
                    options.remove_extra_whitespace = c.remove_extra_whitespace;
                }
                NodeConfig::Chunk(c) => {
                    options.chunking_strategy = c.chunking_strategy;
                    options.chunk_max_characters = c.chunk_max_characters;
                    options.chunk_new_after_n_chars = c.chunk_new_after_n_chars;
                    options.chunk_combine_text_under_n_chars = c.chunk_combine_text_under_n_chars;
                    options.chunk_overlap = c.chunk_overlap;
                    options.chunk_multipage_sections = c.multipage_sections();
                }
                NodeConfig::Input(_) | NodeConfig::Output(_) | NodeConfig::ExtractLLM(_) => {
                    continue;
                }
            }
            seen.push(node.kind());
        }
        options
    }

    /// The options as stringified form fields.
    ///
    /// Chunk limits are sent only when chunking is on, and the `by_title`
    /// settings only under `by_title`.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("strategy", self.strategy.as_str().to_string()),
            (
                "remove_extra_whitespace",
                self.remove_extra_whitespace.to_string(),
            ),
            (
                "pdf_infer_table_structure",
                self.pdf_infer_table_structure.to_string(),
            ),
            ("chunking_strategy", self.chunking_strategy.as_str().to_string()),
        ];
        if let Some(languages) = &self.ocr_languages {
            fields.push(("ocr_languages", languages.clone()));
        }
        if let Some(types) = &self.extract_image_block_types {
            fields.push(("extract_image_block_types", types.clone()));
        }

        if self.chunking_strategy.is_enabled() {
            let limits = [
                ("chunk_max_characters", self.chunk_max_characters),
                ("chunk_new_after_n_chars", self.chunk_new_after_n_chars),
                ("chunk_overlap", self.chunk_overlap),
            ];
            fields.extend(
                limits
                    .into_iter()
                    .filter_map(|(key, value)| value.map(|v| (key, v.to_string()))),
            );
        }
        if self.chunking_strategy == ChunkingStrategy::ByTitle {
            if let Some(combine) = self.chunk_combine_text_under_n_chars {
                fields.push(("chunk_combine_text_under_n_chars", combine.to_string()));
            }
            fields.push((
                "chunk_multipage_sections",
                self.chunk_multipage_sections.to_string(),
            ));
        }
        fields
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// One element extracted from a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    #[serde(rename = "type")]
    pub element_type: String,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_id: Option<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedDocument {
    pub elements: Vec<Element>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

/// Body of the processor's health endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    #[serde(default)]
    pub features: Map<String, Value>,
}

impl HealthStatus {
    pub fn is_ok(&self) -> bool {
        self.status.eq_ignore_ascii_case("ok")
    }
}

/// Body of the processor's supported-formats endpoint.
///
/// Extensions are lowercase with the leading dot. Placeholder formats are
/// accepted but only partially parsed by the processor.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SupportedFormats {
    #[serde(default)]
    pub fully_supported: Vec<String>,
    #[serde(default)]
    pub placeholder_support: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl SupportedFormats {
    /// Whether the processor accepts `file_name` at all.
    pub fn accepts(&self, file_name: &str) -> bool {
        let ext = extension(file_name);
        self.fully_supported
            .iter()
            .chain(&self.placeholder_support)
            .any(|known| known.eq_ignore_ascii_case(&ext))
    }

    pub fn is_fully_supported(&self, file_name: &str) -> bool {
        let ext = extension(file_name);
        self.fully_supported
            .iter()
            .any(|known| known.eq_ignore_ascii_case(&ext))
    }
}

/// Client for the processor's single-document, health and format endpoints.
#[derive(Debug, Clone)]
pub struct DocumentClient {
    http: Client,
    document_url: Url,
    health_url: Url,
    formats_url: Url,
}

impl DocumentClient {
    pub fn new(settings: &ClientSettings) -> Result<Self, ExecutionError> {
        Ok(Self {
            http: build_client(settings)?,
            document_url: endpoint(settings.document_url(), "document")?,
            health_url: endpoint(settings.health_url(), "health")?,
            formats_url: endpoint(settings.formats_url(), "supported formats")?,
        })
    }

    /// Uploads `document` as multipart `file` with the options as text fields.
    pub async fn process(
        &self,
        document: &DocumentUpload,
        options: &ProcessingOptions,
    ) -> Result<ProcessedDocument, ExecutionError> {
        let form = options
            .form_fields()
            .into_iter()
            .fold(Form::new(), |form, (key, value)| form.text(key, value))
            .part("file", file_part(document)?);

        tracing::info!(
            target: TRACING_TARGET,
            url = %self.document_url,
            file_name = document.file_name(),
            bytes = document.bytes().len(),
            strategy = options.strategy.as_str(),
            chunking = options.chunking_strategy.as_str(),
            "Processing document"
        );

        let response = self
            .http
            .post(self.document_url.clone())
            .multipart(form)
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        let processed: ProcessedDocument = decode_response(status, &body)?;

        tracing::debug!(
            target: TRACING_TARGET,
            elements = processed.elements.len(),
            "Document processed"
        );
        Ok(processed)
    }

    pub async fn health(&self) -> Result<HealthStatus, ExecutionError> {
        self.get_json(&self.health_url).await
    }

    /// Asks the processor which extensions it parses fully and which only as placeholders.
    pub async fn supported_formats(&self) -> Result<SupportedFormats, ExecutionError> {
        let formats: SupportedFormats = self.get_json(&self.formats_url).await?;
        tracing::debug!(
            target: TRACING_TARGET,
            full = %formats.fully_supported.iter().join(" "),
            placeholder = %formats.placeholder_support.iter().join(" "),
            "Supported formats fetched"
        );
        Ok(formats)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &Url) -> Result<T, ExecutionError> {
        let response = self.http.get(url.clone()).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        decode_response(status, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::NodeKind;
    use crate::config::{ConfigField, ConfigPatch};
    use crate::graph::Position;

    #[test]
    fn unsupported_extensions_are_refused() {
        let err = DocumentUpload::new("scan.png", vec![]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unsupported file type: '.png'. Supported types: .txt, .pdf, .docx, .doc, .html, .md"
        );
        assert!(DocumentUpload::new("README", vec![]).is_err());
        let upload = DocumentUpload::new("Report.PDF", vec![1, 2]).unwrap();
        assert_eq!(upload.mime_type(), "application/pdf");
    }

    #[test]
    fn from_path_reads_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "hello").unwrap();
        let upload = DocumentUpload::from_path(&path).unwrap();
        assert_eq!(upload.file_name(), "notes.txt");
        assert_eq!(upload.bytes(), b"hello");
        assert!(matches!(
            DocumentUpload::from_path(dir.path().join("missing.md")),
            Err(ExecutionError::Io(_))
        ));
    }

    #[test]
    fn options_follow_the_path() {
        let mut graph = Graph::new();
        let input = graph.add_node(NodeKind::Input, "", Position::default()).id().to_string();
        let chunk = graph.add_node(NodeKind::Chunk, "", Position::default()).id().to_string();
        let output = graph.add_node(NodeKind::Output, "", Position::default()).id().to_string();
        graph.connect(&input, &chunk).unwrap();
        graph.connect(&chunk, &output).unwrap();
        graph
            .update_node_config(
                &chunk,
                &ConfigPatch::new()
                    .with(ConfigField::ChunkingStrategy(ChunkingStrategy::Basic))
                    .with(ConfigField::ChunkMaxCharacters(Some(300)))
                    .with(ConfigField::ChunkCombineTextUnderNChars(Some(50))),
            )
            .unwrap();

        let options = ProcessingOptions::from_graph(&graph);
        assert_eq!(options.chunking_strategy, ChunkingStrategy::Basic);
        let fields = options.form_fields();
        assert!(fields.contains(&("chunk_max_characters", "300".to_string())));
        assert!(!fields.iter().any(|(k, _)| *k == "chunk_combine_text_under_n_chars"));
        assert!(!fields.iter().any(|(k, _)| *k == "chunk_multipage_sections"));
        assert!(fields.contains(&("strategy", "auto".to_string())));
    }

    #[test]
    fn default_options_skip_chunk_limits() {
        let options = ProcessingOptions {
            chunk_max_characters: Some(100),
            ..Default::default()
        };
        let keys: Vec<_> = options.form_fields().into_iter().map(|(k, _)| k).collect();
        assert_eq!(
            keys,
            vec![
                "strategy",
                "remove_extra_whitespace",
                "pdf_infer_table_structure",
                "chunking_strategy"
            ]
        );
    }

    #[test]
    fn processed_document_decodes() {
        let body = r#"{
            "elements": [{"type": "Title", "text": "Document: a.pdf", "metadata": {"filename": "a.pdf"}}],
            "metadata": {"total_elements": 1}
        }"#;
        let doc: ProcessedDocument = decode_response(200, body).unwrap();
        assert_eq!(doc.elements[0].element_type, "Title");
        assert_eq!(
            doc.metadata.unwrap().get("total_elements"),
            Some(&Value::from(1))
        );
    }
}
