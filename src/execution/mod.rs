//! Submitting pipelines to the external processor.
//!
//! [`ExecutionController`] owns the submission state machine:
//!
//! ```text
//! Idle ──begin──▶ Submitting ──finish──▶ Succeeded | Failed ──begin──▶ Submitting
//! ```
//!
//! [`begin`](ExecutionController::begin) serializes the graph into an owned
//! [`PendingSubmission`], so the graph is free for further edits while the
//! request runs. Those edits are never part of the payload in flight. The
//! transport sits behind [`PipelineExecutor`]; [`HttpExecutor`] is the reqwest
//! implementation.

use crate::error::ExecutionError;
use crate::graph::Graph;
use crate::pipeline::{PipelineSerializer, PipelineSubmission, determine_path};
use async_trait::async_trait;

mod document;
mod http;

pub use document::{
    DocumentClient, DocumentUpload, Element, HealthStatus, ProcessedDocument, ProcessingOptions,
    SUPPORTED_EXTENSIONS, SupportedFormats,
};
pub use http::{ExecutionResponse, HttpExecutor, interpret_response};

/// Tracing target for submissions and processor requests.
pub const TRACING_TARGET: &str = "docflow::execution";

/// Sends a serialized pipeline to whatever executes it.
#[async_trait]
pub trait PipelineExecutor: Send + Sync {
    async fn execute(
        &self,
        submission: &PipelineSubmission,
    ) -> Result<ExecutionResponse, ExecutionError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionState {
    #[default]
    Idle,
    Submitting,
    Succeeded,
    Failed,
}

/// Identifies one submission attempt. Outcomes carrying an older ticket are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

/// A payload that has been frozen for sending, with the ticket to finish it.
#[derive(Debug, Clone)]
pub struct PendingSubmission {
    ticket: Ticket,
    payload: PipelineSubmission,
}

impl PendingSubmission {
    pub fn ticket(&self) -> Ticket {
        self.ticket
    }

    pub fn payload(&self) -> &PipelineSubmission {
        &self.payload
    }
}

#[derive(Debug, Default)]
pub struct ExecutionController {
    state: ExecutionState,
    serializer: PipelineSerializer,
    preflight: bool,
    attempt: u64,
    result: Option<ExecutionResponse>,
    error: Option<ExecutionError>,
}

impl ExecutionController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `serializer`, e.g. one that resolves LLM defaults into the payload.
    pub fn with_serializer(mut self, serializer: PipelineSerializer) -> Self {
        self.serializer = serializer;
        self
    }

    /// Checks the execution path before anything is sent.
    pub fn with_preflight(mut self, enabled: bool) -> Self {
        self.preflight = enabled;
        self
    }

    pub fn state(&self) -> ExecutionState {
        self.state
    }

    pub fn is_submitting(&self) -> bool {
        self.state == ExecutionState::Submitting
    }

    /// The body of the last successful submission.
    pub fn result(&self) -> Option<&ExecutionResponse> {
        self.result.as_ref()
    }

    /// The error of the last failed submission.
    pub fn error(&self) -> Option<&ExecutionError> {
        self.error.as_ref()
    }

    /// Serializes `graph` and enters `Submitting`.
    ///
    /// While a request is in flight this returns `AlreadySubmitting` and
    /// nothing changes. A failed preflight moves straight to `Failed`.
    pub fn begin(&mut self, graph: &Graph) -> Result<PendingSubmission, ExecutionError> {
        if self.is_submitting() {
            tracing::warn!(
                target: TRACING_TARGET,
                attempt = self.attempt,
                "Submission refused, another one is in flight"
            );
            return Err(ExecutionError::AlreadySubmitting);
        }

        let payload = self.serializer.serialize(graph);
        self.attempt += 1;

        if self.preflight {
            if let Err(err) = determine_path(&payload) {
                tracing::warn!(
                    target: TRACING_TARGET,
                    attempt = self.attempt,
                    error = %err,
                    "Preflight failed"
                );
                self.state = ExecutionState::Failed;
                self.result = None;
                self.error = Some(ExecutionError::Preflight(err.clone()));
                return Err(ExecutionError::Preflight(err));
            }
        }

        self.state = ExecutionState::Submitting;
        self.result = None;
        self.error = None;
        tracing::info!(
            target: TRACING_TARGET,
            attempt = self.attempt,
            nodes = payload.nodes.len(),
            edges = payload.edges.len(),
            "Submitting pipeline"
        );
        Ok(PendingSubmission {
            ticket: Ticket(self.attempt),
            payload,
        })
    }

    /// Records the outcome of the attempt identified by `ticket`.
    ///
    /// Returns `false` when the ticket is stale and the outcome was ignored.
    pub fn finish(
        &mut self,
        ticket: Ticket,
        outcome: Result<ExecutionResponse, ExecutionError>,
    ) -> bool {
        if ticket.0 != self.attempt || !self.is_submitting() {
            tracing::debug!(
                target: TRACING_TARGET,
                ticket = ticket.0,
                attempt = self.attempt,
                "Ignoring outcome of a stale submission"
            );
            return false;
        }

        match outcome {
            Ok(response) => {
                tracing::info!(
                    target: TRACING_TARGET,
                    attempt = self.attempt,
                    message = response.message.as_deref().unwrap_or_default(),
                    "Pipeline processed"
                );
                self.state = ExecutionState::Succeeded;
                self.result = Some(response);
                self.error = None;
            }
            Err(err) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    attempt = self.attempt,
                    error = %err,
                    "Pipeline submission failed"
                );
                self.state = ExecutionState::Failed;
                self.result = None;
                self.error = Some(err);
            }
        }
        true
    }

    /// Sends `pending` through `executor` and records the outcome.
    pub async fn execute<E>(&mut self, pending: PendingSubmission, executor: &E) -> ExecutionState
    where
        E: PipelineExecutor + ?Sized,
    {
        let PendingSubmission { ticket, payload } = pending;
        let outcome = executor.execute(&payload).await;
        self.finish(ticket, outcome);
        self.state
    }

    /// [`begin`](Self::begin) followed by [`execute`](Self::execute).
    ///
    /// A refused or failed begin leaves the state as `begin` set it.
    pub async fn submit<E>(&mut self, graph: &Graph, executor: &E) -> ExecutionState
    where
        E: PipelineExecutor + ?Sized,
    {
        match self.begin(graph) {
            Ok(pending) => self.execute(pending, executor).await,
            Err(_) => self.state,
        }
    }
}
