use crate::catalog::{NodeKind, SocketSide};
use ahash::AHashSet;

/// Which sockets may carry more than one edge.
///
/// Every socket accepts any number of edges unless restricted here.
#[derive(Debug, Clone, Default)]
pub struct ConnectionPolicy {
    single_edge: AHashSet<(NodeKind, SocketSide)>,
}

impl ConnectionPolicy {
    /// Unbounded fan-in and fan-out on every socket.
    pub fn permissive() -> Self {
        Self::default()
    }

    /// Every socket takes at most one edge, which restricts graphs to linear chains.
    pub fn single_chain() -> Self {
        let mut policy = Self::default();
        for kind in NodeKind::ALL {
            for side in [SocketSide::Incoming, SocketSide::Outgoing] {
                if kind.sockets().has(side) {
                    policy.set_allow_multi_edge(kind, side, false);
                }
            }
        }
        policy
    }

    pub fn allow_multi_edge(&self, kind: NodeKind, side: SocketSide) -> bool {
        !self.single_edge.contains(&(kind, side))
    }

    pub fn set_allow_multi_edge(&mut self, kind: NodeKind, side: SocketSide, allow: bool) {
        if allow {
            self.single_edge.remove(&(kind, side));
        } else {
            self.single_edge.insert((kind, side));
        }
    }
}
