use super::layout::NodePosition;

pub const DEFAULT_MAX_DISTANCE: f32 = 180.0;
pub const DEFAULT_NEIGHBORS: usize = 3;

/// Directed link from node `from` to one of its nearest neighbours `to`.
/// Indices refer to the position slice the edges were built from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Edge {
    pub from: usize,
    pub to: usize,
    pub distance: f32,
}

impl Edge {
    pub fn opacity(&self) -> f32 {
        (0.25 - self.distance / 600.0).max(0.05)
    }
}

/// Directed k-nearest-neighbour graph limited to `max_distance`.
///
/// Mutual neighbours produce two edges with swapped endpoints. Both are
/// kept and drawn, so mutual links render slightly brighter.
pub fn build_edges(positions: &[NodePosition], max_distance: f32, k: usize) -> Vec<Edge> {
    let mut edges = Vec::new();
    if k == 0 || positions.len() < 2 {
        return edges;
    }

    let mut candidates: Vec<(usize, f32)> = Vec::with_capacity(positions.len());
    for (from, node) in positions.iter().enumerate() {
        candidates.clear();
        for (to, other) in positions.iter().enumerate() {
            if from == to {
                continue;
            }
            let distance = node.pos.distance(other.pos);
            if distance <= max_distance {
                candidates.push((to, distance));
            }
        }

        candidates.sort_by(|a, b| a.1.total_cmp(&b.1));
        edges.extend(
            candidates
                .iter()
                .take(k)
                .map(|&(to, distance)| Edge { from, to, distance }),
        );
    }
    edges
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use eframe::egui::pos2;

    use super::*;
    use crate::constellation::layout::compute_layout;
    use crate::constellation::viewport::ViewportSize;
    use crate::journal::Entry;

    fn node(x: f32, y: f32) -> NodePosition {
        NodePosition {
            id: format!("{x},{y}"),
            pos: pos2(x, y),
            age_days: 0,
            color: "#B24BF3".to_owned(),
        }
    }

    #[test]
    fn spiral_edges_respect_cardinality_and_distance() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let entries = (0..120)
            .map(|index| Entry {
                id: index.to_string(),
                text: String::new(),
                timestamp: now,
                color: "#FFD700".to_owned(),
            })
            .collect::<Vec<_>>();
        let positions = compute_layout(&entries, ViewportSize::new(390.0, 844.0), now);

        let edges = build_edges(&positions, DEFAULT_MAX_DISTANCE, DEFAULT_NEIGHBORS);
        assert!(edges.len() <= 3 * positions.len());
        assert!(!edges.is_empty());
        assert!(edges.iter().all(|edge| edge.distance <= DEFAULT_MAX_DISTANCE));
        assert!(edges.iter().all(|edge| edge.from != edge.to));
    }

    #[test]
    fn keeps_closest_k_in_ascending_order() {
        let positions = vec![
            node(0.0, 0.0),
            node(50.0, 0.0),
            node(10.0, 0.0),
            node(30.0, 0.0),
            node(20.0, 0.0),
        ];
        let edges = build_edges(&positions, 180.0, 3);
        let from_origin = edges
            .iter()
            .filter(|edge| edge.from == 0)
            .map(|edge| edge.to)
            .collect::<Vec<_>>();
        assert_eq!(from_origin, [2, 4, 3]);
    }

    #[test]
    fn mutual_neighbours_produce_two_edges() {
        let positions = vec![node(0.0, 0.0), node(40.0, 0.0)];
        let edges = build_edges(&positions, 180.0, 3);
        assert_eq!(edges.len(), 2);
        assert_eq!((edges[0].from, edges[0].to), (0, 1));
        assert_eq!((edges[1].from, edges[1].to), (1, 0));
    }

    #[test]
    fn distant_pairs_are_dropped() {
        let positions = vec![node(0.0, 0.0), node(180.0, 0.0), node(400.0, 0.0)];
        let edges = build_edges(&positions, 180.0, 3);
        assert_eq!(edges.len(), 2);
        assert!(edges.iter().all(|edge| edge.from != 2 && edge.to != 2));
    }

    #[test]
    fn opacity_fades_with_distance_and_floors() {
        let near = Edge { from: 0, to: 1, distance: 0.0 };
        let mid = Edge { from: 0, to: 1, distance: 60.0 };
        let far = Edge { from: 0, to: 1, distance: 180.0 };
        assert!((near.opacity() - 0.25).abs() < 1e-6);
        assert!((mid.opacity() - 0.15).abs() < 1e-6);
        assert!((far.opacity() - 0.05).abs() < 1e-6);
    }
}
