//! Layout, spatial indexing and interaction engine for the constellation.

pub mod animation;
mod edges;
mod field;
mod grid;
mod layout;
mod shooting;
mod tilt;
mod viewport;

use chrono::{DateTime, Utc};
use eframe::egui::{Pos2, Rect};
use log::debug;

use crate::config::ConstellationConfig;
use crate::journal::Entry;

pub use edges::{Edge, build_edges};
pub use field::{DecorativeField, PLANET_FACTOR, parallax_offset};
pub use grid::SpatialGrid;
pub use layout::{NodePosition, color_for_age, compute_layout};
pub use shooting::ShootingStarSpawner;
pub use tilt::{PlatformCapabilities, TiltReading, TiltState, create_tilt_source};
pub use viewport::{NavigationIntent, ViewportController, ViewportSize};

/// Positions, spatial index and connection graph for one entry list and
/// viewport. Rebuilt wholesale whenever either changes.
pub struct Scene {
    positions: Vec<NodePosition>,
    grid: SpatialGrid,
    edges: Vec<Edge>,
}

impl Scene {
    pub fn build(
        entries: &[Entry],
        viewport: ViewportSize,
        now: DateTime<Utc>,
        config: &ConstellationConfig,
    ) -> Self {
        let positions = compute_layout(entries, viewport, now);
        let grid = SpatialGrid::build(&positions, config.grid_cell_size);
        let edges = build_edges(&positions, config.edge_max_distance, config.edge_neighbors);
        debug!(
            "event=relayout nodes={} edges={} cells={} viewport={}x{}",
            positions.len(),
            edges.len(),
            grid.occupied_cells(),
            viewport.width,
            viewport.height
        );

        Self {
            positions,
            grid,
            edges,
        }
    }

    pub fn positions(&self) -> &[NodePosition] {
        &self.positions
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn hit_test(&self, scene_point: Pos2, max_distance: f32) -> Option<&str> {
        self.grid
            .nearest(&self.positions, scene_point, max_distance)
            .and_then(|index| self.positions.get(index))
            .map(|node| node.id.as_str())
    }

    pub fn bounding_box(&self) -> Option<Rect> {
        let first = self.positions.first()?;
        let mut bounds = Rect::from_min_max(first.pos, first.pos);
        for node in &self.positions[1..] {
            bounds.extend_with(node.pos);
        }
        Some(bounds)
    }
}
