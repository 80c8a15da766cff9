const NODE_PREFIX: &str = "node-";
const EDGE_PREFIX: &str = "edge-";

/// Monotonic id source owned by a single graph instance.
#[derive(Debug, Clone, Default)]
pub(crate) struct IdAllocator {
    next_node: u64,
    next_edge: u64,
}

impl IdAllocator {
    pub(crate) fn next_node_id(&mut self) -> String {
        let id = format!("{}{}", NODE_PREFIX, self.next_node);
        self.next_node += 1;
        id
    }

    pub(crate) fn next_edge_id(&mut self) -> String {
        let id = format!("{}{}", EDGE_PREFIX, self.next_edge);
        self.next_edge += 1;
        id
    }

    /// Moves both counters past every numeric suffix found in restored ids.
    pub(crate) fn reseed<'a>(
        &mut self,
        node_ids: impl Iterator<Item = &'a str>,
        edge_ids: impl Iterator<Item = &'a str>,
    ) {
        self.next_node = next_after(node_ids, NODE_PREFIX);
        self.next_edge = next_after(edge_ids, EDGE_PREFIX);
    }
}

fn next_after<'a>(ids: impl Iterator<Item = &'a str>, prefix: &str) -> u64 {
    ids.filter_map(|id| id.strip_prefix(prefix)?.parse::<u64>().ok())
        .max()
        .map_or(0, |max| max.saturating_add(1))
}
