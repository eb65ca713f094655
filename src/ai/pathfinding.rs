//! A* pathfinding on the tile graph
//!
//! Stateless search over [`Graph`] using the indexed [`PriorityQueue`] as the
//! open set and Manhattan distance as the heuristic. Diagonal moves are never
//! offered and every edge carries the same cost, so the heuristic never
//! overestimates.

use glam::Vec2;

use super::queue::PriorityQueue;
use crate::world::{GameMap, Graph, NodeId, TileNode};

/// An ordered route from start to goal, both inclusive
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    nodes: Vec<NodeId>,
    cost: f32,
}

impl Path {
    /// Nodes from start to goal
    #[must_use]
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// Summed edge cost
    #[must_use]
    pub fn cost(&self) -> f32 {
        self.cost
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn start(&self) -> Option<NodeId> {
        self.nodes.first().copied()
    }

    #[must_use]
    pub fn goal(&self) -> Option<NodeId> {
        self.nodes.last().copied()
    }

    /// Tile centres in world space
    #[must_use]
    pub fn waypoints(&self, map: &GameMap) -> Vec<Vec2> {
        self.nodes
            .iter()
            .filter_map(|&id| map.localize_id(id))
            .collect()
    }
}

/// Manhattan distance in tiles, scaled to edge cost
fn manhattan(a: &TileNode, b: &TileNode, edge_cost: f32) -> f32 {
    ((a.x() - b.x()).abs() + (a.z() - b.z()).abs()) as f32 * edge_cost
}

/// Find the cheapest path from `start` to `goal`.
///
/// Returns `None` when either end is unknown or an obstacle, or when the goal
/// is unreachable.
#[must_use]
pub fn find_path(graph: &Graph, start: NodeId, goal: NodeId) -> Option<Path> {
    let start_node = graph.node(start).filter(|n| n.is_walkable())?;
    let goal_node = graph.node(goal).filter(|n| n.is_walkable())?;

    if start == goal {
        return Some(Path {
            nodes: vec![start],
            cost: 0.0,
        });
    }

    let edge_cost = graph.edge_cost();
    let mut g = vec![f32::INFINITY; graph.len()];
    let mut parent: Vec<Option<NodeId>> = vec![None; graph.len()];
    let mut closed = vec![false; graph.len()];
    let mut open = PriorityQueue::with_capacity(graph.len() / 4 + 1);

    g[start] = 0.0;
    open.enqueue(start, manhattan(start_node, goal_node, edge_cost));

    while let Some(current) = open.dequeue() {
        closed[current] = true;

        // Only a popped goal is final
        if current == goal {
            return Some(backtrack(start, goal, &parent, g[goal]));
        }

        for edge in graph.neighbors(current) {
            if closed[edge.to] {
                continue;
            }
            let path_cost = g[current] + edge.cost;
            if path_cost < g[edge.to] {
                parent[edge.to] = Some(current);
                g[edge.to] = path_cost;
                if let Some(neighbor) = graph.node(edge.to) {
                    open.enqueue(edge.to, path_cost + manhattan(neighbor, goal_node, edge_cost));
                }
            }
        }
    }

    log::debug!("No path from {start} to {goal}");
    None
}

fn backtrack(start: NodeId, goal: NodeId, parent: &[Option<NodeId>], cost: f32) -> Path {
    let mut nodes = vec![goal];
    let mut node = goal;
    while node != start {
        match parent[node] {
            Some(prev) => {
                nodes.push(prev);
                node = prev;
            }
            None => break,
        }
    }
    nodes.reverse();
    Path { nodes, cost }
}

/// Cursor over a path's waypoints.
///
/// Paths are consumed once: when the cursor runs off the end the follower is
/// exhausted and a new path has to be planned.
#[derive(Debug, Clone, Default)]
pub struct PathFollower {
    path: Option<Path>,
    cursor: usize,
}

impl PathFollower {
    /// Start following a new path from its first node
    pub fn follow(&mut self, path: Path) {
        self.path = Some(path);
        self.cursor = 0;
    }

    /// Drop the current path
    pub fn clear(&mut self) {
        self.path = None;
        self.cursor = 0;
    }

    /// Node currently being steered towards
    #[must_use]
    pub fn current(&self) -> Option<NodeId> {
        self.path
            .as_ref()
            .and_then(|path| path.nodes().get(self.cursor).copied())
    }

    /// Advance past the current waypoint once `position` is within `radius`
    /// of its centre. Returns the waypoint still to be reached, if any.
    pub fn advance_if_reached(&mut self, map: &GameMap, position: Vec2, radius: f32) -> Option<Vec2> {
        let target = map.localize_id(self.current()?)?;
        if position.distance(target) < radius {
            self.cursor += 1;
            return self.current().and_then(|id| map.localize_id(id));
        }
        Some(target)
    }

    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.current().is_none()
    }

    /// Final node of the path being followed
    #[must_use]
    pub fn goal(&self) -> Option<NodeId> {
        self.path.as_ref().and_then(Path::goal)
    }

    /// Waypoints not yet reached
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.path
            .as_ref()
            .map_or(0, |path| path.len().saturating_sub(self.cursor))
    }
}
