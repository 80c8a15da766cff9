use super::{PipelineSubmission, TRACING_TARGET};
use crate::catalog::NodeKind;
use crate::error::PathError;
use ahash::{AHashMap, AHashSet};

/// Walks the submission from its single Input node along outgoing edges.
///
/// The walk stops at the first node without an outgoing edge. Flows with zero
/// or several inputs, a node with more than one successor, a cycle, or an edge
/// pointing at an unknown node are refused.
pub fn determine_path(submission: &PipelineSubmission) -> Result<Vec<String>, PathError> {
    let inputs = submission
        .nodes
        .iter()
        .filter(|n| n.kind == NodeKind::Input)
        .collect::<Vec<_>>();
    let [input] = inputs.as_slice() else {
        return Err(PathError::InputCount(inputs.len()));
    };

    let known: AHashSet<&str> = submission.nodes.iter().map(|n| n.id.as_str()).collect();
    let mut successors: AHashMap<&str, Vec<&str>> = AHashMap::new();
    for edge in &submission.edges {
        for endpoint in [&edge.source, &edge.target] {
            if !known.contains(endpoint.as_str()) {
                return Err(PathError::DanglingEdge {
                    edge_id: edge.id.clone(),
                    node_id: endpoint.clone(),
                });
            }
        }
        successors
            .entry(edge.source.as_str())
            .or_default()
            .push(edge.target.as_str());
    }

    let mut path = Vec::new();
    let mut visited = AHashSet::new();
    let mut current = input.id.as_str();
    loop {
        if !visited.insert(current) {
            return Err(PathError::Cycle(current.to_string()));
        }
        path.push(current.to_string());
        match successors.get(current).map(Vec::as_slice) {
            None | Some([]) => break,
            Some([next]) => current = *next,
            Some(_) => return Err(PathError::Branching(current.to_string())),
        }
    }

    tracing::debug!(
        target: TRACING_TARGET,
        length = path.len(),
        "Execution path determined"
    );
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NodeConfig;
    use crate::pipeline::{SubmissionEdge, SubmissionNode};

    fn node(id: &str, kind: NodeKind) -> SubmissionNode {
        SubmissionNode {
            id: id.to_string(),
            kind,
            config: NodeConfig::default_for(kind),
        }
    }

    fn edge(id: &str, source: &str, target: &str) -> SubmissionEdge {
        SubmissionEdge {
            id: id.to_string(),
            source: source.to_string(),
            target: target.to_string(),
        }
    }

    #[test]
    fn linear_flow_yields_its_path() {
        let submission = PipelineSubmission {
            nodes: vec![
                node("out", NodeKind::Output),
                node("in", NodeKind::Input),
                node("part", NodeKind::Partition),
            ],
            edges: vec![edge("e1", "part", "out"), edge("e0", "in", "part")],
        };
        assert_eq!(determine_path(&submission).unwrap(), vec!["in", "part", "out"]);
    }

    #[test]
    fn input_count_must_be_one() {
        let none = PipelineSubmission {
            nodes: vec![node("out", NodeKind::Output)],
            edges: vec![],
        };
        assert_eq!(determine_path(&none), Err(PathError::InputCount(0)));

        let two = PipelineSubmission {
            nodes: vec![node("a", NodeKind::Input), node("b", NodeKind::Input)],
            edges: vec![],
        };
        assert_eq!(determine_path(&two), Err(PathError::InputCount(2)));
    }

    #[test]
    fn branching_cycles_and_dangling_edges_are_refused() {
        let branching = PipelineSubmission {
            nodes: vec![
                node("in", NodeKind::Input),
                node("a", NodeKind::Output),
                node("b", NodeKind::Output),
            ],
            edges: vec![edge("e0", "in", "a"), edge("e1", "in", "b")],
        };
        assert_eq!(
            determine_path(&branching),
            Err(PathError::Branching("in".into()))
        );

        let cycle = PipelineSubmission {
            nodes: vec![
                node("in", NodeKind::Input),
                node("a", NodeKind::Clean),
                node("b", NodeKind::Clean),
            ],
            edges: vec![
                edge("e0", "in", "a"),
                edge("e1", "a", "b"),
                edge("e2", "b", "a"),
            ],
        };
        assert_eq!(determine_path(&cycle), Err(PathError::Cycle("a".into())));

        let dangling = PipelineSubmission {
            nodes: vec![node("in", NodeKind::Input)],
            edges: vec![edge("e0", "in", "ghost")],
        };
        assert!(matches!(
            determine_path(&dangling),
            Err(PathError::DanglingEdge { .. })
        ));
    }
}
