use eframe::egui::{Pos2, Vec2, pos2};
use rand::Rng;

use super::animation::{AnimatedValue, Segment};
use super::viewport::ViewportSize;

/// Depth factor applied to shooting stars.
pub const SHOOTING_STAR_FACTOR: f32 = 0.3;
/// Depth factor shared by the ambient planets.
pub const PLANET_FACTOR: f32 = 0.04;

const STAR_DENSITY: f32 = 0.00012;
const STAR_BASE_MIN: usize = 60;
const STAR_BASE_MAX: usize = 150;
const STAR_MULTIPLIER: usize = 5;

struct LayerSpec {
    factor: f32,
    share: f32,
    size: (f32, f32),
}

const LAYERS: [LayerSpec; 4] = [
    LayerSpec {
        factor: 0.12,
        share: 0.25,
        size: (0.6, 1.4),
    },
    LayerSpec {
        factor: 0.25,
        share: 0.3,
        size: (0.8, 1.8),
    },
    LayerSpec {
        factor: 0.45,
        share: 0.25,
        size: (1.0, 2.2),
    },
    LayerSpec {
        factor: 0.7,
        share: 0.2,
        size: (1.2, 2.6),
    },
];

/// Translation of a layer at `factor`: pan parallax plus boosted tilt parallax.
pub fn parallax_offset(pan: Vec2, tilt: Vec2, factor: f32, tilt_boost: f32) -> Vec2 {
    pan * factor + tilt * factor * tilt_boost
}

pub struct Star {
    pub pos: Pos2,
    pub size: f32,
    pub twinkle: AnimatedValue,
}

impl Star {
    pub fn opacity(&self) -> f32 {
        self.twinkle.value()
    }
}

pub struct StarLayer {
    pub factor: f32,
    pub stars: Vec<Star>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SpaceObject {
    /// Position as a fraction of the canvas.
    pub anchor: Pos2,
    pub radius: f32,
    pub core: &'static str,
    pub glow: &'static str,
    pub ring: bool,
}

impl SpaceObject {
    pub fn center(&self, viewport: ViewportSize) -> Pos2 {
        let canvas = viewport.canvas();
        pos2(self.anchor.x * canvas.x, self.anchor.y * canvas.y)
    }
}

fn planets() -> Vec<SpaceObject> {
    vec![
        SpaceObject {
            anchor: pos2(0.18, 0.22),
            radius: 160.0,
            core: "#2B1B5A",
            glow: "#6D4AFF",
            ring: false,
        },
        SpaceObject {
            anchor: pos2(0.78, 0.35),
            radius: 90.0,
            core: "#3A2A12",
            glow: "#F5B942",
            ring: true,
        },
        SpaceObject {
            anchor: pos2(0.3, 0.78),
            radius: 60.0,
            core: "#0F3B44",
            glow: "#22D3EE",
            ring: false,
        },
        SpaceObject {
            anchor: pos2(0.85, 0.85),
            radius: 48.0,
            core: "#44121F",
            glow: "#FB7185",
            ring: false,
        },
    ]
}

/// Total star count across all layers for a viewport.
pub fn star_budget(viewport: ViewportSize) -> usize {
    let base = (viewport.area() * STAR_DENSITY).round().max(0.0) as usize;
    base.clamp(STAR_BASE_MIN, STAR_BASE_MAX) * STAR_MULTIPLIER
}

/// Stars and planets behind the constellation. Unrelated to entries and
/// regenerated only when the viewport changes.
pub struct DecorativeField {
    viewport: ViewportSize,
    pub layers: Vec<StarLayer>,
    pub planets: Vec<SpaceObject>,
}

impl DecorativeField {
    pub fn generate(rng: &mut impl Rng, viewport: ViewportSize, now: f64) -> Self {
        let viewport = viewport.known_or(ViewportSize::DEFAULT);
        let canvas = viewport.canvas();
        let total = star_budget(viewport);

        let layers = LAYERS
            .iter()
            .map(|spec| {
                let count = (total as f32 * spec.share).round() as usize;
                let stars = (0..count)
                    .map(|_| {
                        let pos = pos2(
                            rng.random_range(0.0..canvas.x),
                            rng.random_range(0.0..canvas.y),
                        );
                        let size = rng.random_range(spec.size.0..spec.size.1);
                        let mut twinkle = AnimatedValue::new(rng.random_range(0.2..0.8));
                        let delay = rng.random_range(0.0..4.0);
                        twinkle.loop_sequence(
                            vec![
                                Segment::new(1.0, 1.2).with_delay(delay),
                                Segment::new(0.2, 1.5),
                            ],
                            now,
                        );
                        Star { pos, size, twinkle }
                    })
                    .collect();
                StarLayer {
                    factor: spec.factor,
                    stars,
                }
            })
            .collect();

        Self {
            viewport,
            layers,
            planets: planets(),
        }
    }

    pub fn viewport(&self) -> ViewportSize {
        self.viewport
    }

    pub fn star_count(&self) -> usize {
        self.layers.iter().map(|layer| layer.stars.len()).sum()
    }

    pub fn tick(&mut self, now: f64) {
        for star in self.layers.iter_mut().flat_map(|layer| &mut layer.stars) {
            star.twinkle.tick(now);
        }
    }
}
