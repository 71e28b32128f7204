use std::collections::HashMap;

use eframe::egui::Pos2;

use super::layout::NodePosition;

pub const DEFAULT_CELL_SIZE: f32 = 80.0;

type CellKey = (i32, i32);

/// Uniform bucket grid over node positions. Buckets hold indices into the
/// position slice the grid was built from, so the grid must be rebuilt
/// whenever that slice changes.
#[derive(Clone, Debug)]
pub struct SpatialGrid {
    cell_size: f32,
    cells: HashMap<CellKey, Vec<usize>>,
}

impl SpatialGrid {
    pub fn build(positions: &[NodePosition], cell_size: f32) -> Self {
        let cell_size = if cell_size.is_finite() && cell_size > 0.0 {
            cell_size
        } else {
            DEFAULT_CELL_SIZE
        };

        let mut cells: HashMap<CellKey, Vec<usize>> = HashMap::new();
        for (index, node) in positions.iter().enumerate() {
            if !node.pos.x.is_finite() || !node.pos.y.is_finite() {
                continue;
            }
            cells
                .entry(cell_key(node.pos, cell_size))
                .or_default()
                .push(index);
        }

        Self { cell_size, cells }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn occupied_cells(&self) -> usize {
        self.cells.len()
    }

    /// Index of the closest node strictly closer than `max_distance` to
    /// `point`.
    ///
    /// Scans the 3x3 block of cells around the query cell, widened when
    /// `max_distance` exceeds one cell. Once the block would hold more cells
    /// than are occupied, the occupied cells are walked instead.
    pub fn nearest(
        &self,
        positions: &[NodePosition],
        point: Pos2,
        max_distance: f32,
    ) -> Option<usize> {
        if !point.x.is_finite()
            || !point.y.is_finite()
            || max_distance.is_nan()
            || max_distance <= 0.0
        {
            return None;
        }

        let (gx, gy) = cell_key(point, self.cell_size);
        let reach = (max_distance / self.cell_size).ceil().max(1.0) as i32;
        let side = 2 * i64::from(reach) + 1;

        let mut best = None;
        let mut best_distance = max_distance;
        let mut visit = |bucket: &[usize]| {
            for &index in bucket {
                let Some(node) = positions.get(index) else {
                    continue;
                };
                let distance = node.pos.distance(point);
                if distance < best_distance {
                    best_distance = distance;
                    best = Some(index);
                }
            }
        };

        if side.saturating_mul(side) > self.cells.len() as i64 {
            for (&(ix, iy), bucket) in &self.cells {
                let dx = (i64::from(ix) - i64::from(gx)).abs();
                let dy = (i64::from(iy) - i64::from(gy)).abs();
                if dx <= i64::from(reach) && dy <= i64::from(reach) {
                    visit(bucket.as_slice());
                }
            }
        } else {
            for ix in gx.saturating_sub(reach)..=gx.saturating_add(reach) {
                for iy in gy.saturating_sub(reach)..=gy.saturating_add(reach) {
                    if let Some(bucket) = self.cells.get(&(ix, iy)) {
                        visit(bucket.as_slice());
                    }
                }
            }
        }
        best
    }
}

fn cell_key(point: Pos2, cell_size: f32) -> CellKey {
    (
        (point.x / cell_size).floor() as i32,
        (point.y / cell_size).floor() as i32,
    )
}
