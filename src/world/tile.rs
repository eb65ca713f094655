//! Tile nodes of the navigation grid

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Row-major index of a tile in its graph
pub type NodeId = usize;

/// What occupies a tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileKind {
    /// Open floor
    Ground,
    /// Blocks movement; never has edges
    Obstacle,
    /// The power-up tile, waiting to be claimed
    PowerUp,
    /// The power-up tile while someone holds it
    PowerUpActive,
}

impl TileKind {
    /// Whether actors may stand on this tile
    #[must_use]
    pub fn is_walkable(self) -> bool {
        !matches!(self, Self::Obstacle)
    }

    /// Whether this is the power-up tile, in either phase
    #[must_use]
    pub fn is_power_up(self) -> bool {
        matches!(self, Self::PowerUp | Self::PowerUpActive)
    }

    /// Single-character form used by ASCII layouts
    #[must_use]
    pub fn glyph(self) -> char {
        match self {
            Self::Ground => '.',
            Self::Obstacle => '#',
            Self::PowerUp => 'P',
            Self::PowerUpActive => 'A',
        }
    }
}

/// A directed edge to an orthogonal neighbour
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    /// Neighbour node
    pub to: NodeId,
    /// Traversal cost
    pub cost: f32,
}

/// A cell in the navigation grid
#[derive(Debug, Clone)]
pub struct TileNode {
    id: NodeId,
    x: i32,
    z: i32,
    kind: TileKind,
    edges: SmallVec<[Edge; 4]>,
}

impl TileNode {
    pub(crate) fn new(id: NodeId, x: i32, z: i32, kind: TileKind) -> Self {
        Self {
            id,
            x,
            z,
            kind,
            edges: SmallVec::new(),
        }
    }

    /// Row-major id
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Column
    #[must_use]
    pub fn x(&self) -> i32 {
        self.x
    }

    /// Row
    #[must_use]
    pub fn z(&self) -> i32 {
        self.z
    }

    #[must_use]
    pub fn kind(&self) -> TileKind {
        self.kind
    }

    /// Outgoing edges (at most four)
    #[must_use]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    #[must_use]
    pub fn is_obstacle(&self) -> bool {
        self.kind == TileKind::Obstacle
    }

    #[must_use]
    pub fn is_walkable(&self) -> bool {
        self.kind.is_walkable()
    }

    /// Edge to the node at grid coordinates `(x, z)`, if any.
    ///
    /// Only orthogonal neighbours can match, so the id is recomputed from the
    /// offset instead of storing coordinates on the edge.
    #[must_use]
    pub fn edge_to(&self, x: i32, z: i32, cols: usize) -> Option<&Edge> {
        if x < 0 || z < 0 || x as usize >= cols {
            return None;
        }
        let target = z as usize * cols + x as usize;
        self.edges.iter().find(|edge| edge.to == target)
    }

    #[must_use]
    pub fn has_edge_to(&self, x: i32, z: i32, cols: usize) -> bool {
        self.edge_to(x, z, cols).is_some()
    }

    pub(crate) fn set_kind(&mut self, kind: TileKind) {
        self.kind = kind;
    }

    pub(crate) fn add_edge(&mut self, to: NodeId, cost: f32) {
        self.edges.push(Edge { to, cost });
    }

    pub(crate) fn clear_edges(&mut self) {
        self.edges.clear();
    }
}
