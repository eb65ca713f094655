//! Tile world: grid graph, obstacle placement and world-space mapping

mod graph;
mod halton;
mod map;
mod tile;

pub use graph::{Graph, GraphError};
pub use halton::{HaltonCells, halton};
pub use map::GameMap;
pub use tile::{Edge, NodeId, TileKind, TileNode};
