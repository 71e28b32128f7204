use eframe::egui::{Pos2, Vec2, pos2, vec2};
use log::debug;
use rand::Rng;

use super::animation::{AnimatedValue, Easing};
use super::field::SHOOTING_STAR_FACTOR;
use super::viewport::ViewportSize;
use crate::config::ConstellationConfig;

const ENTRY_MARGIN: f32 = 40.0;
const EXIT_MARGIN: f32 = 80.0;
const FADE_OUT_FROM: f32 = 0.8;

pub struct ShootingStar {
    pub id: u64,
    pub start: Pos2,
    pub delta: Vec2,
    pub size: f32,
    pub factor: f32,
    /// Heading in radians, used to orient the trail.
    pub angle: f32,
    pub duration: f64,
    progress: AnimatedValue,
}

impl ShootingStar {
    pub fn progress(&self) -> f32 {
        self.progress.value()
    }

    pub fn position(&self) -> Pos2 {
        self.start + self.delta * self.progress()
    }

    /// Fades in until 80% of the flight, then out to zero at the end.
    pub fn opacity(&self) -> f32 {
        let progress = self.progress().clamp(0.0, 1.0);
        if progress < FADE_OUT_FROM {
            progress / FADE_OUT_FROM
        } else {
            (1.0 - progress) / (1.0 - FADE_OUT_FROM)
        }
    }

    fn is_finished(&self) -> bool {
        !self.progress.is_animating()
    }
}

/// Self-rescheduling emitter: after each random interval one star is
/// launched, and stars leave the live set once their flight completes.
pub struct ShootingStarSpawner<R> {
    rng: R,
    viewport: ViewportSize,
    interval: (f64, f64),
    duration: (f64, f64),
    next_spawn: Option<f64>,
    next_id: u64,
    live: Vec<ShootingStar>,
}

impl<R: Rng> ShootingStarSpawner<R> {
    pub fn new(rng: R, config: &ConstellationConfig, viewport: ViewportSize, now: f64) -> Self {
        let mut spawner = Self {
            rng,
            viewport: viewport.known_or(ViewportSize::DEFAULT),
            interval: ordered(config.shooting_interval_secs),
            duration: ordered(config.shooting_duration_secs),
            next_spawn: None,
            next_id: 0,
            live: Vec::new(),
        };
        spawner.schedule(now);
        spawner
    }

    pub fn live(&self) -> &[ShootingStar] {
        &self.live
    }

    pub fn next_spawn(&self) -> Option<f64> {
        self.next_spawn
    }

    pub fn is_cancelled(&self) -> bool {
        self.next_spawn.is_none()
    }

    pub fn set_viewport(&mut self, viewport: ViewportSize) {
        if viewport.is_known() {
            self.viewport = viewport;
        }
    }

    /// Stops the timer and drops every live star. Later ticks do nothing.
    pub fn cancel(&mut self) {
        self.next_spawn = None;
        self.live.clear();
    }

    /// Advances live stars to `now`, prunes finished ones and launches a new
    /// star when the timer has elapsed. Returns whether anything is on screen
    /// or pending.
    pub fn tick(&mut self, now: f64) -> bool {
        for star in &mut self.live {
            star.progress.tick(now);
        }
        self.live.retain(|star| !star.is_finished());

        if let Some(due) = self.next_spawn
            && now >= due
        {
            let star = self.launch(now);
            debug!(
                "event=shooting_star id={} duration={:.2}s angle={:.2}",
                star.id, star.duration, star.angle
            );
            self.live.push(star);
            self.schedule(now);
        }

        !self.live.is_empty() || self.next_spawn.is_some()
    }

    fn schedule(&mut self, now: f64) {
        let wait = sample(&mut self.rng, self.interval);
        self.next_spawn = Some(now + wait);
    }

    fn launch(&mut self, now: f64) -> ShootingStar {
        let canvas = self.viewport.canvas();
        let from_left = self.rng.random_bool(0.5);
        let start_x = if from_left {
            -ENTRY_MARGIN
        } else {
            canvas.x + ENTRY_MARGIN
        };
        let end_x = if from_left {
            canvas.x + EXIT_MARGIN
        } else {
            -EXIT_MARGIN
        };
        let start = pos2(start_x, self.rng.random_range(0.0..self.viewport.height * 1.6));

        let dx = end_x - start_x;
        let slope = self.rng.random_range(0.15..0.55_f32);
        let sign = if self.rng.random_bool(0.5) { 1.0 } else { -1.0 };
        let delta = vec2(dx, dx.abs() * slope * sign);

        let duration = sample(&mut self.rng, self.duration);
        let size = self.rng.random_range(2.0..4.5_f32);

        let mut progress = AnimatedValue::new(0.0);
        progress.animate_to(1.0, duration, Easing::OutQuad, now);

        let id = self.next_id;
        self.next_id += 1;

        ShootingStar {
            id,
            start,
            delta,
            size,
            factor: SHOOTING_STAR_FACTOR,
            angle: delta.y.atan2(delta.x),
            duration,
            progress,
        }
    }
}

fn ordered((low, high): (f64, f64)) -> (f64, f64) {
    if low <= high { (low, high) } else { (high, low) }
}

fn sample(rng: &mut impl Rng, (low, high): (f64, f64)) -> f64 {
    if high > low {
        rng.random_range(low..=high)
    } else {
        low
    }
}
