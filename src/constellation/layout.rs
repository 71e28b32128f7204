use chrono::{DateTime, Utc};
use eframe::egui::{Pos2, pos2};

use crate::journal::Entry;

use super::viewport::ViewportSize;

pub const GOLDEN_ANGLE_DEG: f64 = 137.508;
const RADIUS_STEP: f64 = 32.0;
const VERTICAL_ANCHOR: f64 = 0.7;

const AGE_RECENT: &str = "#8AB6FF";
const AGE_MATURE: &str = "#B24BF3";
const AGE_AGED: &str = "#FFD700";

#[derive(Clone, Debug, PartialEq)]
pub struct NodePosition {
    pub id: String,
    pub pos: Pos2,
    pub age_days: u32,
    pub color: String,
}

/// Places entries on a golden-angle spiral centered at
/// `(width, height * 0.7)` of a canvas twice the viewport size.
///
/// Index order is the only positional seed, so reordering `entries` moves
/// every node. An unmeasured viewport falls back to [`ViewportSize::DEFAULT`].
pub fn compute_layout(
    entries: &[Entry],
    viewport: ViewportSize,
    now: DateTime<Utc>,
) -> Vec<NodePosition> {
    let viewport = viewport.known_or(ViewportSize::DEFAULT);
    let center_x = viewport.width as f64;
    let center_y = viewport.height as f64 * VERTICAL_ANCHOR;

    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let (x, y) = spiral_point(index, center_x, center_y);
            NodePosition {
                id: entry.id.clone(),
                pos: pos2(x as f32, y as f32),
                age_days: entry.age_days(now),
                color: entry.color.clone(),
            }
        })
        .collect()
}

fn spiral_point(index: usize, center_x: f64, center_y: f64) -> (f64, f64) {
    let angle = index as f64 * GOLDEN_ANGLE_DEG.to_radians();
    let radius = ((index + 1) as f64).sqrt() * RADIUS_STEP;
    (
        angle.cos() * radius + center_x,
        angle.sin() * radius + center_y,
    )
}

/// Fresh entries keep their own colour; older ones shift through fixed tints.
pub fn color_for_age(age_days: u32, base: &str) -> &str {
    match age_days {
        0..=1 => base,
        2..=7 => AGE_RECENT,
        8..=30 => AGE_MATURE,
        _ => AGE_AGED,
    }
}
