//! Static registry of the pipeline stages a graph can contain.
//!
//! Every [`NodeKind`] has exactly one [`NodeDescriptor`] describing how the
//! editor shows it, which sockets it exposes and what it is called on the wire.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of processing stage a node represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    #[serde(rename = "inputNode")]
    Input,
    #[serde(rename = "partitionNode")]
    Partition,
    #[serde(rename = "cleanNode")]
    Clean,
    #[serde(rename = "chunkNode")]
    Chunk,
    #[serde(rename = "extractLLMNode")]
    ExtractLLM,
    #[serde(rename = "outputNode")]
    Output,
}

impl NodeKind {
    /// All kinds, in palette order.
    pub const ALL: [NodeKind; 6] = [
        NodeKind::Input,
        NodeKind::Partition,
        NodeKind::Clean,
        NodeKind::Chunk,
        NodeKind::ExtractLLM,
        NodeKind::Output,
    ];

    /// The type name used in persisted graphs and pipeline submissions.
    pub fn type_name(self) -> &'static str {
        descriptor(self).type_name
    }

    /// Resolves a wire type name (`"chunkNode"`) or a short alias (`"chunk"`).
    pub fn from_type_name(name: &str) -> Option<NodeKind> {
        CATALOG
            .iter()
            .find(|d| d.type_name == name || d.alias.eq_ignore_ascii_case(name))
            .map(|d| d.kind)
    }

    pub fn sockets(self) -> Sockets {
        descriptor(self).sockets
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(descriptor(*self).display_name)
    }
}

/// Which side of a node a socket sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SocketSide {
    Incoming,
    Outgoing,
}

impl fmt::Display for SocketSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SocketSide::Incoming => f.write_str("incoming"),
            SocketSide::Outgoing => f.write_str("outgoing"),
        }
    }
}

/// The sockets a node kind exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sockets {
    pub incoming: bool,
    pub outgoing: bool,
}

impl Sockets {
    pub fn has(&self, side: SocketSide) -> bool {
        match side {
            SocketSide::Incoming => self.incoming,
            SocketSide::Outgoing => self.outgoing,
        }
    }
}

/// Display and wiring metadata for one node kind.
#[derive(Debug, Clone, Copy)]
pub struct NodeDescriptor {
    pub kind: NodeKind,
    pub type_name: &'static str,
    pub alias: &'static str,
    pub display_name: &'static str,
    pub default_label: &'static str,
    pub description: &'static str,
    pub sockets: Sockets,
}

const SOURCE: Sockets = Sockets {
    incoming: false,
    outgoing: true,
};
const STAGE: Sockets = Sockets {
    incoming: true,
    outgoing: true,
};
const SINK: Sockets = Sockets {
    incoming: true,
    outgoing: false,
};

pub static CATALOG: [NodeDescriptor; 6] = [
    NodeDescriptor {
        kind: NodeKind::Input,
        type_name: "inputNode",
        alias: "input",
        display_name: "Input",
        default_label: "Document Input",
        description: "Entry point receiving the uploaded document",
        sockets: SOURCE,
    },
    NodeDescriptor {
        kind: NodeKind::Partition,
        type_name: "partitionNode",
        alias: "partition",
        display_name: "Partition",
        default_label: "Partition",
        description: "Split the document into typed elements",
        sockets: STAGE,
    },
    NodeDescriptor {
        kind: NodeKind::Clean,
        type_name: "cleanNode",
        alias: "clean",
        display_name: "Clean",
        default_label: "Clean Text",
        description: "Normalize element text",
        sockets: STAGE,
    },
    NodeDescriptor {
        kind: NodeKind::Chunk,
        type_name: "chunkNode",
        alias: "chunk",
        display_name: "Chunk",
        default_label: "Chunk",
        description: "Group elements into size-bounded chunks",
        sockets: STAGE,
    },
    NodeDescriptor {
        kind: NodeKind::ExtractLLM,
        type_name: "extractLLMNode",
        alias: "extract",
        display_name: "LLM Extract",
        default_label: "LLM Extract",
        description: "Run an extraction prompt against a local LLM server",
        sockets: STAGE,
    },
    NodeDescriptor {
        kind: NodeKind::Output,
        type_name: "outputNode",
        alias: "output",
        display_name: "Output",
        default_label: "Output",
        description: "Collects the processed elements",
        sockets: SINK,
    },
];

/// Looks up the descriptor of a kind.
pub fn descriptor(kind: NodeKind) -> &'static NodeDescriptor {
    match kind {
        NodeKind::Input => &CATALOG[0],
        NodeKind::Partition => &CATALOG[1],
        NodeKind::Clean => &CATALOG[2],
        NodeKind::Chunk => &CATALOG[3],
        NodeKind::ExtractLLM => &CATALOG[4],
        NodeKind::Output => &CATALOG[5],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptors_line_up_with_kinds() {
        for kind in NodeKind::ALL {
            assert_eq!(descriptor(kind).kind, kind);
        }
    }

    #[test]
    fn type_names_round_trip() {
        for kind in NodeKind::ALL {
            assert_eq!(NodeKind::from_type_name(kind.type_name()), Some(kind));
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.type_name()));
        }
        assert_eq!(NodeKind::from_type_name("Chunk"), Some(NodeKind::Chunk));
        assert_eq!(NodeKind::from_type_name("embedNode"), None);
    }

    #[test]
    fn endpoints_expose_one_side_only() {
        assert!(!NodeKind::Input.sockets().incoming);
        assert!(NodeKind::Input.sockets().outgoing);
        assert!(NodeKind::Output.sockets().incoming);
        assert!(!NodeKind::Output.sockets().outgoing);
        assert!(NodeKind::Chunk.sockets().has(SocketSide::Incoming));
        assert!(NodeKind::Chunk.sockets().has(SocketSide::Outgoing));
    }
}
