use std::collections::{HashMap, HashSet, VecDeque};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use bonded_core::{DomainError, WarehouseId};
use bonded_warehousing::LedgerState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Traversal {
    Bfs,
    Dfs,
}

impl FromStr for Traversal {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BFS" => Ok(Traversal::Bfs),
            "DFS" => Ok(Traversal::Dfs),
            _ => Err(DomainError::validation("algorithm must be BFS or DFS")),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    White,
    Grey,
    Black,
}

/// Directed graph of warehouses; an edge A→B means at least one live
/// transfer moved stock from A to B.
///
/// Node and neighbour order is insertion order, so traversals are
/// deterministic for a given ledger.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransferGraph {
    nodes: Vec<WarehouseId>,
    adjacency: HashMap<WarehouseId, Vec<WarehouseId>>,
}

impl TransferGraph {
    /// Nodes are all warehouses ordered by code; edges follow transfer commit order.
    pub fn from_ledger(state: &LedgerState) -> Self {
        let mut graph = Self::default();
        for warehouse in state.warehouses() {
            graph.add_node(warehouse.id);
        }
        for transfer in state.transfers() {
            graph.add_edge(transfer.from, transfer.to);
        }
        graph
    }

    pub fn add_node(&mut self, node: WarehouseId) {
        if !self.adjacency.contains_key(&node) {
            self.adjacency.insert(node, Vec::new());
            self.nodes.push(node);
        }
    }

    /// Parallel edges collapse into one.
    pub fn add_edge(&mut self, from: WarehouseId, to: WarehouseId) {
        self.add_node(from);
        self.add_node(to);
        if let Some(neighbours) = self.adjacency.get_mut(&from) {
            if !neighbours.contains(&to) {
                neighbours.push(to);
            }
        }
    }

    pub fn neighbours(&self, node: WarehouseId) -> &[WarehouseId] {
        self.adjacency
            .get(&node)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn contains(&self, node: WarehouseId) -> bool {
        self.adjacency.contains_key(&node)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(Vec::len).sum()
    }

    /// Visit order from `start` (included first). Empty for an unknown start.
    pub fn reachable_from(&self, start: WarehouseId, traversal: Traversal) -> Vec<WarehouseId> {
        match traversal {
            Traversal::Bfs => self.bfs(start),
            Traversal::Dfs => self.dfs(start),
        }
    }

    pub fn bfs(&self, start: WarehouseId) -> Vec<WarehouseId> {
        let mut order = Vec::new();
        if !self.contains(start) {
            return order;
        }
        let mut visited = HashSet::from([start]);
        let mut queue = VecDeque::from([start]);
        while let Some(current) = queue.pop_front() {
            order.push(current);
            for &next in self.neighbours(current) {
                if visited.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        order
    }

    /// Pre-order depth-first walk, equivalent to the recursive form but with
    /// an explicit stack of (node, next neighbour index).
    pub fn dfs(&self, start: WarehouseId) -> Vec<WarehouseId> {
        let mut order = Vec::new();
        if !self.contains(start) {
            return order;
        }
        let mut visited = HashSet::from([start]);
        let mut stack = vec![(start, 0usize)];
        order.push(start);
        while let Some((node, index)) = stack.last_mut() {
            let neighbours = self.neighbours(*node);
            match neighbours.get(*index) {
                Some(&next) => {
                    *index += 1;
                    if visited.insert(next) {
                        order.push(next);
                        stack.push((next, 0));
                    }
                }
                None => {
                    stack.pop();
                }
            }
        }
        order
    }

    /// Three-colour cycle detection: a grey node reached again closes a cycle.
    pub fn has_cycle(&self) -> bool {
        let mut marks: HashMap<WarehouseId, Mark> =
            self.nodes.iter().map(|n| (*n, Mark::White)).collect();

        for &root in &self.nodes {
            if marks.get(&root) != Some(&Mark::White) {
                continue;
            }
            marks.insert(root, Mark::Grey);
            let mut stack = vec![(root, 0usize)];
            while let Some((node, index)) = stack.last_mut() {
                let node = *node;
                match self.neighbours(node).get(*index) {
                    Some(&next) => {
                        *index += 1;
                        match marks.get(&next).copied().unwrap_or(Mark::White) {
                            Mark::Grey => return true,
                            Mark::White => {
                                marks.insert(next, Mark::Grey);
                                stack.push((next, 0));
                            }
                            Mark::Black => {}
                        }
                    }
                    None => {
                        marks.insert(node, Mark::Black);
                        stack.pop();
                    }
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nodes(n: usize) -> Vec<WarehouseId> {
        (0..n).map(|_| WarehouseId::new()).collect()
    }

    #[test]
    fn bfs_and_dfs_follow_insertion_order() {
        let w = nodes(5);
        let mut graph = TransferGraph::default();
        for id in &w {
            graph.add_node(*id);
        }
        graph.add_edge(w[0], w[1]);
        graph.add_edge(w[0], w[2]);
        graph.add_edge(w[1], w[3]);
        graph.add_edge(w[2], w[4]);

        assert_eq!(graph.bfs(w[0]), vec![w[0], w[1], w[2], w[3], w[4]]);
        assert_eq!(graph.dfs(w[0]), vec![w[0], w[1], w[3], w[2], w[4]]);
        assert_eq!(graph.reachable_from(w[3], Traversal::Bfs), vec![w[3]]);
        assert!(graph.reachable_from(WarehouseId::new(), Traversal::Dfs).is_empty());
        assert!(!graph.has_cycle());
    }

    #[test]
    fn duplicate_edges_collapse() {
        let w = nodes(2);
        let mut graph = TransferGraph::default();
        graph.add_edge(w[0], w[1]);
        graph.add_edge(w[0], w[1]);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.node_count(), 2);
    }

    #[test]
    fn detects_back_edges_only() {
        let w = nodes(3);
        let mut diamond = TransferGraph::default();
        diamond.add_edge(w[0], w[1]);
        diamond.add_edge(w[0], w[2]);
        diamond.add_edge(w[1], w[2]);
        assert!(!diamond.has_cycle());

        let mut cyclic = diamond.clone();
        cyclic.add_edge(w[2], w[0]);
        assert!(cyclic.has_cycle());

        let mut self_loop = TransferGraph::default();
        self_loop.add_edge(w[0], w[0]);
        assert!(self_loop.has_cycle());
    }

    #[test]
    fn traversal_parses_case_insensitively() {
        assert_eq!("bfs".parse::<Traversal>().unwrap(), Traversal::Bfs);
        assert_eq!(" DFS ".parse::<Traversal>().unwrap(), Traversal::Dfs);
        assert!("dijkstra".parse::<Traversal>().is_err());
    }
}
