use crate::catalog::{NodeKind, SocketSide};
use thiserror::Error;

/// Errors produced when a form or patch carries a value that cannot be stored.
///
/// These never escape the config panel: the edit is refused and the stored
/// configuration stays as it was.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Field '{field}' rejects value '{value}': expected {expected}")]
    OutOfRange {
        field: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("Field '{field}' has no option '{value}' (allowed: {allowed})")]
    UnknownOption {
        field: &'static str,
        value: String,
        allowed: String,
    },

    #[error("Node kind '{kind}' has no configurable field '{field}'")]
    UnknownField { kind: NodeKind, field: String },

    #[error("Field '{field}' belongs to '{expected}' nodes, but the node is '{found}'")]
    KindMismatch {
        field: &'static str,
        expected: NodeKind,
        found: NodeKind,
    },

    #[error("Field '{field}' expects an http(s) URL, got '{value}': {message}")]
    InvalidUrl {
        field: &'static str,
        value: String,
        message: String,
    },

    #[error("Unsupported file type: '{extension}'. Supported types: {supported}")]
    UnsupportedFileType { extension: String, supported: String },
}

/// Why a connection between two nodes was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionRejection {
    SelfLoop,
    MissingNode(String),
    NoSocket { kind: NodeKind, side: SocketSide },
    Duplicate,
    SocketOccupied { kind: NodeKind, side: SocketSide },
}

impl std::fmt::Display for ConnectionRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SelfLoop => write!(f, "a node cannot connect to itself"),
            Self::MissingNode(id) => write!(f, "node '{}' does not exist", id),
            Self::NoSocket { kind, side } => write!(f, "'{}' nodes have no {} socket", kind, side),
            Self::Duplicate => write!(f, "an identical edge already exists"),
            Self::SocketOccupied { kind, side } => write!(
                f,
                "the {} socket of this '{}' node accepts a single edge",
                side, kind
            ),
        }
    }
}

/// Errors raised by structural edits of the graph model.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("Cannot connect '{source_id}' to '{target_id}': {reason}")]
    InvalidConnection {
        source_id: String,
        target_id: String,
        reason: ConnectionRejection,
    },

    #[error("Node '{0}' not found")]
    NodeNotFound(String),

    #[error("Graph snapshot is inconsistent: {0}")]
    InvalidSnapshot(String),
}

/// Failures of the raw key-value backend underneath the persistence layer.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Storage quota exceeded: writing {requested} bytes would exceed the {limit} byte limit")]
    QuotaExceeded { requested: usize, limit: usize },

    #[error("Storage I/O failed: {0}")]
    Io(String),
}

/// Errors surfaced by saving or loading the pipeline graph.
///
/// None of these is fatal and none of them touches the in-memory graph.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PersistenceError {
    #[error("No saved pipeline in slot '{0}'")]
    NotFound(String),

    #[error("Saved pipeline in slot '{slot}' is corrupt: {reason}")]
    Corrupt { slot: String, reason: String },

    #[error("Storage quota exceeded while saving ({requested} bytes, limit {limit})")]
    QuotaExceeded { requested: usize, limit: usize },

    #[error("Failed to serialize pipeline: {0}")]
    SerializationError(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for PersistenceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::QuotaExceeded { requested, limit } => {
                PersistenceError::QuotaExceeded { requested, limit }
            }
            StoreError::Io(message) => PersistenceError::Unavailable(message),
        }
    }
}

/// Structural problems found while walking a submission from its input node.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PathError {
    #[error("Flow must contain exactly one Input node, found {0}")]
    InputCount(usize),

    #[error("Node '{0}' branches into more than one successor")]
    Branching(String),

    #[error("Flow contains a cycle through node '{0}'")]
    Cycle(String),

    #[error("Edge '{edge_id}' references unknown node '{node_id}'")]
    DanglingEdge { edge_id: String, node_id: String },
}

/// Errors from submitting a pipeline or a document to the external processor.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutionError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Processor rejected the request (HTTP {status}){}", .detail.as_deref().map(|d| format!(": {}", d)).unwrap_or_default())]
    ServerRejected { status: u16, detail: Option<String> },

    #[error("Processor returned an unreadable response: {0}")]
    InvalidResponse(String),

    #[error("A submission is already in flight")]
    AlreadySubmitting,

    #[error("Pipeline failed validation: {0}")]
    Preflight(#[from] PathError),

    #[error("Could not read document: {0}")]
    Io(String),

    #[error("Invalid processor endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Failed to encode request: {0}")]
    Encoding(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl ExecutionError {
    /// The text shown to the user for a failed submission.
    ///
    /// A server-provided `detail` wins; otherwise the transport-level message is used.
    pub fn user_message(&self) -> String {
        match self {
            Self::ServerRejected {
                detail: Some(detail),
                ..
            } => detail.clone(),
            Self::ServerRejected {
                status,
                detail: None,
            } => format!("Failed to process flow (HTTP {})", status),
            Self::Network(message) => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for ExecutionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ExecutionError::Network("Request timed out".to_string())
        } else if err.is_connect() {
            ExecutionError::Network("Connection failed".to_string())
        } else if err.is_decode() {
            ExecutionError::InvalidResponse(err.to_string())
        } else {
            ExecutionError::Network(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_message_prefers_server_detail() {
        let err = ExecutionError::ServerRejected {
            status: 400,
            detail: Some("Flow must contain exactly one Input node".to_string()),
        };
        assert_eq!(err.user_message(), "Flow must contain exactly one Input node");
    }

    #[test]
    fn user_message_falls_back_to_status() {
        let err = ExecutionError::ServerRejected {
            status: 502,
            detail: None,
        };
        assert_eq!(err.user_message(), "Failed to process flow (HTTP 502)");
        assert_eq!(
            ExecutionError::Network("Connection failed".into()).user_message(),
            "Connection failed"
        );
    }

    #[test]
    fn store_errors_map_onto_persistence_errors() {
        let quota: PersistenceError = StoreError::QuotaExceeded {
            requested: 10,
            limit: 5,
        }
        .into();
        assert_eq!(
            quota,
            PersistenceError::QuotaExceeded {
                requested: 10,
                limit: 5
            }
        );
        let io: PersistenceError = StoreError::Io("disk gone".into()).into();
        assert!(matches!(io, PersistenceError::Unavailable(_)));
    }
}
