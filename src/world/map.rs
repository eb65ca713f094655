//! World-space view of the tile graph
//!
//! Maps planar positions to tiles and back, and exposes the neutral tile
//! queries and power-up mutators the AI consumes. Positions are `Vec2` with
//! `x` = world x and `y` = world z.

use glam::Vec2;
use rand::Rng;

use super::graph::{Graph, GraphError};
use super::tile::{NodeId, TileKind, TileNode};
use crate::ai::{Path, find_path};
use crate::core::MapConfig;

/// The tile graph placed in world space
#[derive(Debug, Clone)]
pub struct GameMap {
    graph: Graph,
    origin: Vec2,
    tile_size: f32,
}

impl GameMap {
    /// Place a graph in the world with its `(0, 0)` tile corner at `origin`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidTileSize`] for a non-positive tile size.
    pub fn new(graph: Graph, origin: Vec2, tile_size: f32) -> Result<Self, GraphError> {
        if !(tile_size > 0.0 && tile_size.is_finite()) {
            return Err(GraphError::InvalidTileSize(tile_size));
        }
        Ok(Self {
            graph,
            origin,
            tile_size,
        })
    }

    /// Generate a fresh map from configuration
    ///
    /// # Errors
    ///
    /// Propagates graph generation failures.
    pub fn generate<R: Rng + ?Sized>(config: &MapConfig, rng: &mut R) -> Result<Self, GraphError> {
        let graph = Graph::generate(
            config.cols,
            config.rows,
            config.obstacles,
            config.declump_obstacles,
            rng,
        )?;
        Self::new(graph, config.origin, config.tile_size)
    }

    #[must_use]
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    #[must_use]
    pub fn tile_size(&self) -> f32 {
        self.tile_size
    }

    #[must_use]
    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    /// Tile under a world position, `None` outside the grid
    #[must_use]
    pub fn quantize(&self, position: Vec2) -> Option<NodeId> {
        self.node_at(position).map(TileNode::id)
    }

    /// Tile node under a world position
    #[must_use]
    pub fn node_at(&self, position: Vec2) -> Option<&TileNode> {
        let local = (position - self.origin) / self.tile_size;
        if !local.is_finite() {
            return None;
        }
        self.graph
            .get(local.x.floor() as i32, local.y.floor() as i32)
    }

    /// World position of a tile's centre
    #[must_use]
    pub fn localize(&self, node: &TileNode) -> Vec2 {
        self.origin
            + Vec2::new(
                (node.x() as f32 + 0.5) * self.tile_size,
                (node.z() as f32 + 0.5) * self.tile_size,
            )
    }

    /// World position of a tile's centre by id
    #[must_use]
    pub fn localize_id(&self, id: NodeId) -> Option<Vec2> {
        self.graph.node(id).map(|node| self.localize(node))
    }

    /// Whether the tile exists and is not an obstacle
    #[must_use]
    pub fn is_tile_walkable(&self, id: NodeId) -> bool {
        self.graph.node(id).is_some_and(TileNode::is_walkable)
    }

    /// Centres of obstacle tiles within `radius` of `center`
    #[must_use]
    pub fn obstacle_positions(&self, center: Vec2, radius: f32) -> Vec<Vec2> {
        let radius_sq = radius * radius;
        self.graph
            .nodes()
            .filter(|node| node.is_obstacle())
            .map(|node| self.localize(node))
            .filter(|pos| pos.distance_squared(center) <= radius_sq)
            .collect()
    }

    /// Find a path between two tiles
    #[must_use]
    pub fn request_path(&self, start: NodeId, goal: NodeId) -> Option<Path> {
        find_path(&self.graph, start, goal)
    }

    /// Centre of a random empty tile
    pub fn random_empty_position<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Vec2> {
        self.graph
            .random_empty_tile(rng)
            .map(|node| self.localize(node))
    }

    // -------------------------------------------------------------------------
    // Power-up tile
    // -------------------------------------------------------------------------

    /// The power-up tile
    #[must_use]
    pub fn power_up_node(&self) -> Option<NodeId> {
        self.graph.power_up_node()
    }

    /// World position of the power-up tile
    #[must_use]
    pub fn power_up_location(&self) -> Option<Vec2> {
        self.power_up_node().and_then(|id| self.localize_id(id))
    }

    #[must_use]
    pub fn is_power_up_active(&self) -> bool {
        self.power_up_kind() == Some(TileKind::PowerUpActive)
    }

    /// Flip the power-up tile to active.
    ///
    /// Returns `true` only for the caller that performed the flip; a tile that
    /// is already active (or missing) returns `false`.
    pub fn activate_power_up(&mut self) -> bool {
        match (self.power_up_node(), self.power_up_kind()) {
            (Some(id), Some(TileKind::PowerUp)) => {
                self.graph.set_kind(id, TileKind::PowerUpActive)
            }
            _ => false,
        }
    }

    /// Flip the power-up tile back to inactive. Returns whether it was active.
    pub fn reset_power_up(&mut self) -> bool {
        match (self.power_up_node(), self.power_up_kind()) {
            (Some(id), Some(TileKind::PowerUpActive)) => self.graph.set_kind(id, TileKind::PowerUp),
            _ => false,
        }
    }

    fn power_up_kind(&self) -> Option<TileKind> {
        self.power_up_node()
            .and_then(|id| self.graph.node(id))
            .map(TileNode::kind)
    }

    /// Keep a body of the given radius inside its tile on every side that has
    /// no edge. Positions outside the grid are returned unchanged.
    #[must_use]
    pub fn constrain(&self, position: Vec2, radius: f32) -> Vec2 {
        let Some(node) = self.node_at(position) else {
            return position;
        };
        let cols = self.graph.cols();
        let center = self.localize(node);
        let half = self.tile_size * 0.5;
        let mut out = position;

        if !node.has_edge_to(node.x() - 1, node.z(), cols) {
            out.x = out.x.max(center.x - half + radius);
        }
        if !node.has_edge_to(node.x() + 1, node.z(), cols) {
            out.x = out.x.min(center.x + half - radius);
        }
        if !node.has_edge_to(node.x(), node.z() - 1, cols) {
            out.y = out.y.max(center.y - half + radius);
        }
        if !node.has_edge_to(node.x(), node.z() + 1, cols) {
            out.y = out.y.min(center.y + half - radius);
        }
        out
    }
}
