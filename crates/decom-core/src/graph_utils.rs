use crate::{Network, Node};
use petgraph::visit::EdgeRef;
use std::collections::{HashSet, VecDeque};

/// One electrically connected group of buses.
#[derive(Debug, Clone)]
pub struct Island {
    pub island_id: usize,
    /// Bus names in discovery order
    pub buses: Vec<String>,
}

/// Labels bus islands with a breadth-first search over in-service branches.
///
/// Generator nodes are not part of the topology and are skipped. A case with more
/// than one island cannot be dispatched as a single copper plate, so validation
/// reports it.
pub fn find_islands(network: &Network) -> Vec<Island> {
    let mut visited = HashSet::new();
    let mut islands = Vec::new();

    for start in network.graph.node_indices() {
        if !matches!(network.graph[start], Node::Bus(_)) || visited.contains(&start) {
            continue;
        }
        let mut queue = VecDeque::from([start]);
        let mut members = Vec::new();
        while let Some(node) = queue.pop_front() {
            if !visited.insert(node) {
                continue;
            }
            members.push(network.graph[node].label().to_string());
            for edge in network.graph.edges(node) {
                if !edge.weight().in_service() {
                    continue;
                }
                let neighbor = if edge.source() == node {
                    edge.target()
                } else {
                    edge.source()
                };
                if !visited.contains(&neighbor) {
                    queue.push_back(neighbor);
                }
            }
        }
        islands.push(Island {
            island_id: islands.len(),
            buses: members,
        });
    }

    islands
}
