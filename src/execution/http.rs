use super::{DocumentUpload, PipelineExecutor, TRACING_TARGET};
use crate::error::ExecutionError;
use crate::pipeline::PipelineSubmission;
use crate::settings::ClientSettings;
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

/// Body of a successful flow submission.
///
/// Every field is optional; anything the processor adds beyond the known
/// fields is kept in `extra`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExecutionResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_elements: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received_filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub determined_path: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Turns a status code and raw body into the submission outcome.
///
/// 2xx bodies are decoded (an empty body is an empty response). Anything else
/// is a rejection carrying the body's `detail` when there is one.
pub fn interpret_response(status: u16, body: &str) -> Result<ExecutionResponse, ExecutionError> {
    if (200..300).contains(&status) && body.trim().is_empty() {
        return Ok(ExecutionResponse::default());
    }
    decode_response(status, body)
}

pub(super) fn decode_response<T: DeserializeOwned>(
    status: u16,
    body: &str,
) -> Result<T, ExecutionError> {
    if !(200..300).contains(&status) {
        return Err(ExecutionError::ServerRejected {
            status,
            detail: rejection_detail(body),
        });
    }
    serde_json::from_str(body).map_err(|e| ExecutionError::InvalidResponse(e.to_string()))
}

/// The `detail` of an error body. Structured details (e.g. a list of field
/// errors) are passed on as their JSON text.
fn rejection_detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        Value::Null => None,
        Value::String(detail) => Some(detail.clone()),
        other => Some(other.to_string()),
    }
}

pub(super) fn build_client(settings: &ClientSettings) -> Result<Client, ExecutionError> {
    let timeout = settings.effective_timeout();
    tracing::debug!(
        target: TRACING_TARGET,
        base_url = %settings.base_url,
        timeout_ms = timeout.as_millis(),
        "Creating processor client"
    );
    Client::builder()
        .timeout(timeout)
        .user_agent(settings.effective_user_agent())
        .build()
        .map_err(|e| ExecutionError::Network(format!("Could not create HTTP client: {}", e)))
}

pub(super) fn endpoint(
    url: Result<Url, url::ParseError>,
    name: &str,
) -> Result<Url, ExecutionError> {
    url.map_err(|e| ExecutionError::InvalidEndpoint(format!("{} URL: {}", name, e)))
}

pub(super) fn file_part(document: &DocumentUpload) -> Result<Part, ExecutionError> {
    Ok(Part::bytes(document.bytes().to_vec())
        .file_name(document.file_name().to_string())
        .mime_str(document.mime_type())?)
}

/// Submits pipelines to `POST {base}/api/v1/process-flow/`.
///
/// Without a document the submission is sent as a JSON body. With one, the
/// request becomes multipart with the submission in `flow_data_json` and the
/// document in `file`.
#[derive(Debug, Clone)]
pub struct HttpExecutor {
    http: Client,
    endpoint: Url,
    document: Option<DocumentUpload>,
}

impl HttpExecutor {
    pub fn new(settings: &ClientSettings) -> Result<Self, ExecutionError> {
        Ok(Self {
            http: build_client(settings)?,
            endpoint: endpoint(settings.flow_url(), "flow")?,
            document: None,
        })
    }

    /// Attaches a document to every submission made through this executor.
    pub fn with_document(mut self, document: DocumentUpload) -> Self {
        self.document = Some(document);
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn document(&self) -> Option<&DocumentUpload> {
        self.document.as_ref()
    }
}

#[async_trait]
impl PipelineExecutor for HttpExecutor {
    async fn execute(
        &self,
        submission: &PipelineSubmission,
    ) -> Result<ExecutionResponse, ExecutionError> {
        let payload = submission
            .to_json()
            .map_err(|e| ExecutionError::Encoding(e.to_string()))?;

        tracing::debug!(
            target: TRACING_TARGET,
            url = %self.endpoint,
            bytes = payload.len(),
            document = self.document.as_ref().map(DocumentUpload::file_name),
            "Posting pipeline"
        );

        let request = self.http.post(self.endpoint.clone());
        let request = match &self.document {
            Some(document) => request.multipart(
                Form::new()
                    .text("flow_data_json", payload)
                    .part("file", file_part(document)?),
            ),
            None => request
                .header(CONTENT_TYPE, "application/json")
                .body(payload),
        };

        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        tracing::debug!(
            target: TRACING_TARGET,
            status,
            bytes = body.len(),
            "Processor responded"
        );
        interpret_response(status, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_body_keeps_unknown_fields() {
        let response = interpret_response(
            200,
            r#"{"message": "ok", "determined_path": ["node-0", "node-1"], "took_ms": 12}"#,
        )
        .unwrap();
        assert_eq!(response.message.as_deref(), Some("ok"));
        assert_eq!(
            response.determined_path,
            Some(vec!["node-0".to_string(), "node-1".to_string()])
        );
        assert_eq!(response.extra.get("took_ms"), Some(&Value::from(12)));
    }

    #[test]
    fn empty_success_body_is_fine() {
        assert_eq!(interpret_response(204, ""), Ok(ExecutionResponse::default()));
    }

    #[test]
    fn rejection_uses_detail() {
        assert_eq!(
            interpret_response(400, r#"{"detail": "Flow must contain exactly one Input node"}"#),
            Err(ExecutionError::ServerRejected {
                status: 400,
                detail: Some("Flow must contain exactly one Input node".into()),
            })
        );
        assert_eq!(
            interpret_response(502, "<html>Bad Gateway</html>"),
            Err(ExecutionError::ServerRejected {
                status: 502,
                detail: None,
            })
        );
        let Err(ExecutionError::ServerRejected { detail, .. }) =
            interpret_response(422, r#"{"detail": [{"loc": ["body"], "msg": "field required"}]}"#)
        else {
            panic!("expected a rejection");
        };
        assert!(detail.unwrap().contains("field required"));
    }

    #[test]
    fn malformed_success_body_is_invalid() {
        assert!(matches!(
            interpret_response(200, "not json"),
            Err(ExecutionError::InvalidResponse(_))
        ));
    }
}
