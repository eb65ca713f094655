//! Tile graph: a fixed-size lattice of nodes with orthogonal edges

use rand::Rng;

use super::halton::HaltonCells;
use super::tile::{Edge, NodeId, TileKind, TileNode};

/// East, west, south, north
pub(crate) const ORTHOGONAL: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// Navigation graph over a `cols × rows` grid
#[derive(Debug, Clone)]
pub struct Graph {
    cols: usize,
    rows: usize,
    edge_cost: f32,
    nodes: Vec<TileNode>,
    power_up: Option<NodeId>,
}

impl Graph {
    /// Generate a graph with Halton-scattered obstacles and one random
    /// power-up tile.
    ///
    /// When `declump` is set, obstacles touching another obstacle are turned
    /// back into ground before edges are built, so fewer than
    /// `obstacle_count` obstacles may remain.
    ///
    /// # Errors
    ///
    /// Fails if the dimensions are empty, the obstacle count leaves fewer than
    /// two walkable tiles, or the finished graph breaks an edge invariant.
    pub fn generate<R: Rng + ?Sized>(
        cols: usize,
        rows: usize,
        obstacle_count: usize,
        declump: bool,
        rng: &mut R,
    ) -> Result<Self, GraphError> {
        let mut graph = Self::blank(cols, rows, 1.0)?;

        let capacity = graph.len().saturating_sub(2);
        if obstacle_count > capacity {
            return Err(GraphError::TooManyObstacles {
                requested: obstacle_count,
                capacity,
            });
        }

        graph.place_obstacles(obstacle_count)?;
        if declump {
            let cleared = graph.declump_obstacles();
            log::debug!("Declumping cleared {cleared} of {obstacle_count} obstacles");
        }
        graph.place_power_up(rng)?;
        graph.ensure_empty_tile()?;
        graph.establish_connections();
        graph.validate()?;

        log::info!(
            "Generated {}x{} graph with {} obstacles",
            cols,
            rows,
            graph.nodes.iter().filter(|n| n.is_obstacle()).count()
        );
        Ok(graph)
    }

    /// Build a graph from ASCII rows: `#` obstacle, `.` ground, `P` power-up,
    /// `A` active power-up. Row index is `z`, column index is `x`.
    ///
    /// # Errors
    ///
    /// Fails on ragged rows, unknown glyphs, more than one power-up tile, or a
    /// layout without any plain ground tile.
    pub fn from_layout(layout: &[&str], edge_cost: f32) -> Result<Self, GraphError> {
        let rows = layout.len();
        let cols = layout.first().map_or(0, |row| row.chars().count());
        let mut graph = Self::blank(cols, rows, edge_cost)?;

        for (z, row) in layout.iter().enumerate() {
            if row.chars().count() != cols {
                return Err(GraphError::RaggedLayout { row: z });
            }
            for (x, glyph) in row.chars().enumerate() {
                let kind = match glyph {
                    '.' => TileKind::Ground,
                    '#' => TileKind::Obstacle,
                    'P' => TileKind::PowerUp,
                    'A' => TileKind::PowerUpActive,
                    other => {
                        return Err(GraphError::UnknownGlyph {
                            glyph: other,
                            x,
                            z,
                        });
                    }
                };
                let id = z * cols + x;
                if kind.is_power_up() {
                    if graph.power_up.is_some() {
                        return Err(GraphError::MultiplePowerUps);
                    }
                    graph.power_up = Some(id);
                }
                graph.nodes[id].set_kind(kind);
            }
        }

        graph.ensure_empty_tile()?;
        graph.establish_connections();
        graph.validate()?;
        Ok(graph)
    }

    fn blank(cols: usize, rows: usize, edge_cost: f32) -> Result<Self, GraphError> {
        if cols == 0 || rows == 0 || cols > i32::MAX as usize || rows > i32::MAX as usize {
            return Err(GraphError::InvalidDimensions { cols, rows });
        }
        if !(edge_cost > 0.0 && edge_cost.is_finite()) {
            return Err(GraphError::InvalidEdgeCost(edge_cost));
        }

        let mut nodes = Vec::with_capacity(cols * rows);
        for z in 0..rows {
            for x in 0..cols {
                nodes.push(TileNode::new(
                    z * cols + x,
                    x as i32,
                    z as i32,
                    TileKind::Ground,
                ));
            }
        }

        Ok(Self {
            cols,
            rows,
            edge_cost,
            nodes,
            power_up: None,
        })
    }

    fn place_obstacles(&mut self, count: usize) -> Result<(), GraphError> {
        let max_samples = self.len().saturating_mul(64);
        let mut placed = 0;

        for (x, z) in HaltonCells::new(self.cols, self.rows).take(max_samples) {
            if placed == count {
                break;
            }
            let node = &mut self.nodes[z * self.cols + x];
            if !node.is_obstacle() {
                node.set_kind(TileKind::Obstacle);
                placed += 1;
            }
        }

        if placed < count {
            return Err(GraphError::TooManyObstacles {
                requested: count,
                capacity: placed,
            });
        }
        Ok(())
    }

    /// Turn every obstacle that touches another obstacle back into ground.
    ///
    /// Scanning in id order leaves no two orthogonally adjacent obstacles.
    fn declump_obstacles(&mut self) -> usize {
        let mut cleared = 0;
        for id in 0..self.nodes.len() {
            if !self.nodes[id].is_obstacle() {
                continue;
            }
            let (x, z) = (self.nodes[id].x(), self.nodes[id].z());
            let clumped = ORTHOGONAL
                .iter()
                .any(|&(dx, dz)| self.get(x + dx, z + dz).is_some_and(TileNode::is_obstacle));
            if clumped {
                self.nodes[id].set_kind(TileKind::Ground);
                cleared += 1;
            }
        }
        cleared
    }

    fn place_power_up<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<(), GraphError> {
        let candidates: Vec<NodeId> = self
            .nodes
            .iter()
            .filter(|node| node.is_walkable())
            .map(TileNode::id)
            .collect();
        if candidates.is_empty() {
            return Err(GraphError::NoEmptyTile);
        }

        let id = candidates[rng.random_range(0..candidates.len())];
        self.nodes[id].set_kind(TileKind::PowerUp);
        self.power_up = Some(id);
        Ok(())
    }

    fn ensure_empty_tile(&self) -> Result<(), GraphError> {
        if self.nodes.iter().any(|node| node.kind() == TileKind::Ground) {
            Ok(())
        } else {
            Err(GraphError::NoEmptyTile)
        }
    }

    fn establish_connections(&mut self) {
        for id in 0..self.nodes.len() {
            self.nodes[id].clear_edges();
            if !self.nodes[id].is_walkable() {
                continue;
            }
            let (x, z) = (self.nodes[id].x(), self.nodes[id].z());
            for (dx, dz) in ORTHOGONAL {
                let neighbor = self
                    .get(x + dx, z + dz)
                    .filter(|n| n.is_walkable())
                    .map(TileNode::id);
                if let Some(neighbor) = neighbor {
                    self.nodes[id].add_edge(neighbor, self.edge_cost);
                }
            }
        }
    }

    /// Check the edge invariants: symmetric, equal cost both ways, never
    /// touching an obstacle, and at most one power-up tile.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvariantViolation`] describing the first breach.
    pub fn validate(&self) -> Result<(), GraphError> {
        let mut power_ups = 0;
        for node in &self.nodes {
            if node.kind().is_power_up() {
                power_ups += 1;
            }
            if node.is_obstacle() && !node.edges().is_empty() {
                return Err(GraphError::InvariantViolation(format!(
                    "obstacle {} has {} edges",
                    node.id(),
                    node.edges().len()
                )));
            }
            for edge in node.edges() {
                let Some(target) = self.nodes.get(edge.to) else {
                    return Err(GraphError::InvariantViolation(format!(
                        "node {} has an edge to missing node {}",
                        node.id(),
                        edge.to
                    )));
                };
                if !target.is_walkable() {
                    return Err(GraphError::InvariantViolation(format!(
                        "node {} has an edge into obstacle {}",
                        node.id(),
                        target.id()
                    )));
                }
                let mirrored = target
                    .edges()
                    .iter()
                    .any(|back| back.to == node.id() && back.cost == edge.cost);
                if !mirrored {
                    return Err(GraphError::InvariantViolation(format!(
                        "edge {} -> {} is not symmetric",
                        node.id(),
                        target.id()
                    )));
                }
            }
        }
        if power_ups > 1 {
            return Err(GraphError::MultiplePowerUps);
        }
        Ok(())
    }

    /// Node at grid coordinates, `None` when out of bounds
    #[must_use]
    pub fn get(&self, x: i32, z: i32) -> Option<&TileNode> {
        if x < 0 || z < 0 || x as usize >= self.cols || z as usize >= self.rows {
            return None;
        }
        self.nodes.get(z as usize * self.cols + x as usize)
    }

    /// Node by id
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&TileNode> {
        self.nodes.get(id)
    }

    /// Outgoing edges of a node (empty for unknown ids)
    #[must_use]
    pub fn neighbors(&self, id: NodeId) -> &[Edge] {
        self.nodes.get(id).map_or(&[] as &[Edge], TileNode::edges)
    }

    /// Whether the tile exists and is not an obstacle
    #[must_use]
    pub fn is_walkable(&self, x: i32, z: i32) -> bool {
        self.get(x, z).is_some_and(TileNode::is_walkable)
    }

    /// Uniformly random tile that is neither an obstacle nor the power-up.
    ///
    /// Always `Some` for graphs built by this module, which refuse layouts
    /// without such a tile.
    pub fn random_empty_tile<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&TileNode> {
        let is_empty = |node: &&TileNode| node.kind() == TileKind::Ground;
        let count = self.nodes.iter().filter(is_empty).count();
        if count == 0 {
            return None;
        }
        let pick = rng.random_range(0..count);
        self.nodes.iter().filter(is_empty).nth(pick)
    }

    /// The power-up tile, if the graph has one
    #[must_use]
    pub fn power_up_node(&self) -> Option<NodeId> {
        self.power_up
    }

    /// Change a tile's kind without touching its edges.
    ///
    /// Only walkable-to-walkable changes are allowed after construction, so
    /// the edge set stays valid. Power-up kinds stay on the power-up tile, so
    /// there is never a second one.
    pub(crate) fn set_kind(&mut self, id: NodeId, kind: TileKind) -> bool {
        let is_power_up_node = self.power_up == Some(id);
        match self.nodes.get_mut(id) {
            Some(node)
                if node.is_walkable()
                    && kind.is_walkable()
                    && kind.is_power_up() == is_power_up_node =>
            {
                node.set_kind(kind);
                true
            }
            _ => false,
        }
    }

    /// All nodes in id order
    pub fn nodes(&self) -> impl Iterator<Item = &TileNode> {
        self.nodes.iter()
    }

    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Uniform cost carried by every edge
    #[must_use]
    pub fn edge_cost(&self) -> f32 {
        self.edge_cost
    }

    /// Number of tiles
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Render the grid back to ASCII rows (see [`Graph::from_layout`])
    #[must_use]
    pub fn to_ascii(&self) -> Vec<String> {
        self.nodes
            .chunks(self.cols)
            .map(|row| row.iter().map(|n| n.kind().glyph()).collect())
            .collect()
    }
}

/// Errors raised while building or checking a graph
#[derive(Debug, Clone, PartialEq)]
pub enum GraphError {
    /// Zero or oversized grid
    InvalidDimensions { cols: usize, rows: usize },
    /// Edge cost must be positive and finite
    InvalidEdgeCost(f32),
    /// Tile size must be positive and finite
    InvalidTileSize(f32),
    /// Not enough free tiles for the requested obstacles
    TooManyObstacles { requested: usize, capacity: usize },
    /// Layout rows differ in length
    RaggedLayout { row: usize },
    /// Layout contains a character with no tile meaning
    UnknownGlyph { glyph: char, x: usize, z: usize },
    /// More than one power-up tile
    MultiplePowerUps,
    /// No plain ground tile to spawn on
    NoEmptyTile,
    /// Edge structure is inconsistent
    InvariantViolation(String),
}

impl std::fmt::Display for GraphError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidDimensions { cols, rows } => {
                write!(f, "Invalid grid dimensions {cols}x{rows}")
            }
            Self::InvalidEdgeCost(cost) => write!(f, "Invalid edge cost: {cost}"),
            Self::InvalidTileSize(size) => write!(f, "Invalid tile size: {size}"),
            Self::TooManyObstacles {
                requested,
                capacity,
            } => write!(
                f,
                "Cannot place {requested} obstacles, only {capacity} fit"
            ),
            Self::RaggedLayout { row } => write!(f, "Layout row {row} has the wrong length"),
            Self::UnknownGlyph { glyph, x, z } => {
                write!(f, "Unknown layout glyph '{glyph}' at ({x}, {z})")
            }
            Self::MultiplePowerUps => write!(f, "More than one power-up tile"),
            Self::NoEmptyTile => write!(f, "Graph has no empty ground tile"),
            Self::InvariantViolation(e) => write!(f, "Graph invariant violated: {e}"),
        }
    }
}

impl std::error::Error for GraphError {}
