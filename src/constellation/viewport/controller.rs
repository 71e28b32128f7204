use std::cell::Cell;
use std::rc::Rc;

use eframe::egui::{Pos2, Vec2};
use log::{debug, info};

use crate::config::ConstellationConfig;
use crate::constellation::Scene;
use crate::constellation::animation::{AnimatedValue, Easing, ListenerId};

use super::{ViewportSize, ViewportTransform};

/// Outbound navigation requests. The host drains them after each batch of
/// input and routes them; nothing is returned to the controller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NavigationIntent {
    OpenEntry(String),
    Paywall,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum GesturePhase {
    Idle,
    Panning {
        origin: Pos2,
        start_pan: Vec2,
    },
    /// `baseline` is `None` while fewer than two fingers are down; the next
    /// two-finger move records a fresh one.
    Pinching {
        baseline: Option<(f32, f32)>,
    },
    /// A double tap already handled this gesture; remaining events are
    /// swallowed until release.
    Consumed,
}

/// Owns the pan/zoom transform and turns pointer input into transform
/// updates, tap hit-tests and navigation intents.
pub struct ViewportController {
    config: ConstellationConfig,
    is_premium: bool,
    viewport: ViewportSize,
    pan_x: AnimatedValue,
    pan_y: AnimatedValue,
    scale: AnimatedValue,
    /// Mirrors the three animated values through their listeners; hit-tests
    /// and rendering read this instead of sampling each value.
    live: Rc<Cell<ViewportTransform>>,
    listeners: Option<[ListenerId; 3]>,
    phase: GesturePhase,
    last_press: Option<(f64, Pos2)>,
    upsell_shown: bool,
    intents: Vec<NavigationIntent>,
}

impl ViewportController {
    pub fn new(config: ConstellationConfig, is_premium: bool, viewport: ViewportSize) -> Self {
        let (fallback_width, fallback_height) = config.fallback_viewport;
        let viewport = viewport.known_or(ViewportSize::new(fallback_width, fallback_height));

        let start = ViewportTransform::IDENTITY;
        let live = Rc::new(Cell::new(start));
        let mut pan_x = AnimatedValue::new(start.pan.x);
        let mut pan_y = AnimatedValue::new(start.pan.y);
        let mut scale = AnimatedValue::new(start.scale);
        let listeners = [
            pan_x.add_listener(mirror(&live, |transform, x| transform.pan.x = x)),
            pan_y.add_listener(mirror(&live, |transform, y| transform.pan.y = y)),
            scale.add_listener(mirror(&live, |transform, s| transform.scale = s)),
        ];

        Self {
            config,
            is_premium,
            viewport,
            pan_x,
            pan_y,
            scale,
            live,
            listeners: Some(listeners),
            phase: GesturePhase::Idle,
            last_press: None,
            upsell_shown: false,
            intents: Vec::new(),
        }
    }

    pub fn transform(&self) -> ViewportTransform {
        self.live.get()
    }

    pub fn viewport(&self) -> ViewportSize {
        self.viewport
    }

    pub fn min_scale(&self) -> f32 {
        self.config.min_scale(self.is_premium)
    }

    pub fn is_gesture_active(&self) -> bool {
        self.phase != GesturePhase::Idle
    }

    pub fn is_animating(&self) -> bool {
        self.pan_x.is_animating() || self.pan_y.is_animating() || self.scale.is_animating()
    }

    /// Switches tier; the current scale is pulled back inside the new bounds.
    pub fn set_premium(&mut self, is_premium: bool) {
        self.is_premium = is_premium;
        let scale = self.scale.value();
        let bounded = scale.clamp(self.min_scale(), self.config.max_scale);
        if bounded != scale {
            self.scale.set_value(bounded);
        }
    }

    /// Records a new measured size. Unmeasured sizes are ignored so the last
    /// known size stays in effect. Returns whether the size changed.
    pub fn set_viewport(&mut self, viewport: ViewportSize) -> bool {
        if !viewport.is_known() || viewport == self.viewport {
            return false;
        }
        self.viewport = viewport;
        true
    }

    /// Advances running transform animations.
    pub fn tick(&mut self, now: f64) -> bool {
        let x = self.pan_x.tick(now);
        let y = self.pan_y.tick(now);
        let s = self.scale.tick(now);
        x || y || s
    }

    pub fn take_intents(&mut self) -> Vec<NavigationIntent> {
        std::mem::take(&mut self.intents)
    }

    pub fn pointer_down(&mut self, pointers: &[Pos2], scene: &Scene, now: f64) {
        let Some(&primary) = pointers.first() else {
            return;
        };

        let is_double_tap = self.last_press.is_some_and(|(time, position)| {
            now - time < self.config.double_tap_window_secs
                && position.distance(primary) < self.config.double_tap_distance
        });
        self.last_press = Some((now, primary));

        if is_double_tap {
            info!("event=double_tap action=recenter_first");
            self.phase = GesturePhase::Consumed;
            self.recenter_on_first(scene, now);
            return;
        }

        self.phase = match pinch_distance(pointers) {
            Some(distance) => self.pinch_baseline(distance),
            None => self.pan_baseline(primary),
        };
    }

    pub fn pointer_move(&mut self, pointers: &[Pos2]) {
        let Some(&primary) = pointers.first() else {
            return;
        };

        match self.phase {
            GesturePhase::Idle | GesturePhase::Consumed => {}
            GesturePhase::Panning { origin, start_pan } => {
                if let Some(distance) = pinch_distance(pointers) {
                    self.phase = self.pinch_baseline(distance);
                    return;
                }
                let pan = start_pan + (primary - origin) * self.config.pan_speed;
                self.set_pan(pan);
            }
            GesturePhase::Pinching { baseline } => {
                // A finger lifted mid-pinch: hold the scale and forget the
                // baseline until two fingers are down again.
                let Some(distance) = pinch_distance(pointers) else {
                    self.phase = GesturePhase::Pinching { baseline: None };
                    return;
                };
                let Some((start_distance, start_scale)) = baseline else {
                    self.phase = self.pinch_baseline(distance);
                    return;
                };
                let desired = (distance / start_distance) * start_scale;
                let scale = self.bounded_scale(desired);
                self.scale.set_value(scale);
            }
        }
    }

    pub fn pointer_up(&mut self, position: Pos2, scene: &Scene) {
        let phase = std::mem::replace(&mut self.phase, GesturePhase::Idle);
        let GesturePhase::Panning { origin, start_pan } = phase else {
            return;
        };

        let moved = position - origin;
        self.set_pan(start_pan + moved * self.config.pan_speed);

        if moved.length() >= self.config.tap_slop {
            return;
        }

        let scene_point = self.transform().screen_to_scene(origin);
        if let Some(id) = scene.hit_test(scene_point, self.config.hit_radius) {
            info!("event=tap_hit id={id}");
            self.intents.push(NavigationIntent::OpenEntry(id.to_owned()));
        }
    }

    /// Drops any half-finished gesture, e.g. when the platform cancels touches.
    pub fn cancel_gesture(&mut self) {
        self.phase = GesturePhase::Idle;
    }

    /// Unhooks the transform mirror on teardown. The transform stays frozen
    /// at its last value afterwards.
    pub fn release_listeners(&mut self) {
        let Some([x, y, s]) = self.listeners.take() else {
            return;
        };
        self.pan_x.remove_listener(x);
        self.pan_y.remove_listener(y);
        self.scale.remove_listener(s);
    }

    /// Scroll-wheel zoom anchored at `cursor` (viewport coordinates).
    pub fn wheel(&mut self, delta_y: f32, cursor: Pos2) {
        if !delta_y.is_finite() || delta_y == 0.0 {
            return;
        }

        let current = self.transform();
        let factor = (-delta_y * self.config.wheel_sensitivity).exp();
        let scale = self.bounded_scale(current.scale * factor);
        let next = current.zoomed_at(cursor, scale);

        self.scale.set_value(next.scale);
        self.set_pan(next.pan);
    }

    /// Frames the bounding box of the scene at unit scale; an empty scene
    /// resets to the origin.
    pub fn recenter_on_bounds(&mut self, scene: &Scene) {
        let target = ViewportTransform::framing(scene.bounding_box(), self.viewport);
        debug!(
            "event=recenter nodes={} pan=({:.1},{:.1})",
            scene.positions().len(),
            target.pan.x,
            target.pan.y
        );
        self.phase = GesturePhase::Idle;
        self.set_pan(target.pan);
        self.scale.set_value(target.scale);
    }

    /// Animates the first entry to the viewport center at unit scale.
    pub fn recenter_on_first(&mut self, scene: &Scene, now: f64) {
        let (target, duration) = match scene.positions().first() {
            Some(first) => (
                ViewportTransform::centered_on(first.pos, self.viewport),
                self.config.recenter_duration_secs,
            ),
            None => (ViewportTransform::IDENTITY, self.config.reset_duration_secs),
        };

        self.pan_x
            .animate_to(target.pan.x, duration, Easing::OutQuad, now);
        self.pan_y
            .animate_to(target.pan.y, duration, Easing::OutQuad, now);
        self.scale
            .animate_to(target.scale, duration, Easing::OutQuad, now);
    }

    fn pan_baseline(&self, origin: Pos2) -> GesturePhase {
        GesturePhase::Panning {
            origin,
            start_pan: self.transform().pan,
        }
    }

    fn pinch_baseline(&self, distance: f32) -> GesturePhase {
        GesturePhase::Pinching {
            baseline: Some((distance, self.scale.value())),
        }
    }

    fn set_pan(&mut self, pan: Vec2) {
        self.pan_x.set_value(pan.x);
        self.pan_y.set_value(pan.y);
    }

    /// Clamps a requested scale to the tier's bounds. The first time a free
    /// user asks for less than the free floor, a paywall intent is queued.
    fn bounded_scale(&mut self, desired: f32) -> f32 {
        if !desired.is_finite() {
            return self.scale.value();
        }

        if !self.is_premium && desired < self.config.min_scale_free && !self.upsell_shown {
            info!("event=upsell trigger=zoom_floor desired={desired:.3}");
            self.upsell_shown = true;
            self.intents.push(NavigationIntent::Paywall);
        }
        desired.clamp(self.min_scale(), self.config.max_scale)
    }
}

fn mirror(
    live: &Rc<Cell<ViewportTransform>>,
    apply: fn(&mut ViewportTransform, f32),
) -> impl FnMut(f32) + 'static {
    let live = Rc::clone(live);
    move |value| {
        let mut transform = live.get();
        apply(&mut transform, value);
        live.set(transform);
    }
}

fn pinch_distance(pointers: &[Pos2]) -> Option<f32> {
    match pointers {
        [first, second, ..] => {
            let distance = first.distance(*second);
            (distance > f32::EPSILON).then_some(distance)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use eframe::egui::pos2;

    use super::*;
    use crate::journal::Entry;

    fn scene_with(count: usize, viewport: ViewportSize) -> Scene {
        let now = Utc.with_ymd_and_hms(2025, 2, 14, 10, 0, 0).unwrap();
        let entries = (0..count)
            .map(|index| Entry {
                id: format!("entry-{index}"),
                text: format!("note {index}"),
                timestamp: now,
                color: "#00D9FF".to_owned(),
            })
            .collect::<Vec<_>>();
        Scene::build(&entries, viewport, now, &ConstellationConfig::default())
    }

    fn controller(is_premium: bool) -> ViewportController {
        ViewportController::new(
            ConstellationConfig::default(),
            is_premium,
            ViewportSize::new(300.0, 600.0),
        )
    }

    fn pinch(controller: &mut ViewportController, scene: &Scene, from: f32, to: f32, now: f64) {
        controller.pointer_down(&[pos2(100.0, 300.0), pos2(100.0 + from, 300.0)], scene, now);
        controller.pointer_move(&[pos2(100.0, 300.0), pos2(100.0 + to, 300.0)]);
        controller.pointer_up(pos2(100.0, 300.0), scene);
    }

    #[test]
    fn drag_pans_at_damped_speed() {
        let scene = scene_with(0, ViewportSize::new(300.0, 600.0));
        let mut controller = controller(false);

        controller.pointer_down(&[pos2(10.0, 10.0)], &scene, 0.0);
        controller.pointer_move(&[pos2(110.0, 60.0)]);
        let live = controller.transform().pan;
        assert!((live.x - 2.56).abs() < 1e-4);
        assert!((live.y - 1.28).abs() < 1e-4);

        controller.pointer_up(pos2(210.0, 10.0), &scene);
        let committed = controller.transform().pan;
        assert!((committed.x - 5.12).abs() < 1e-4);
        assert!(committed.y.abs() < 1e-4);
        assert!(!controller.is_gesture_active());
    }

    #[test]
    fn free_tier_pinch_is_clamped_and_upsells_once() {
        let scene = scene_with(0, ViewportSize::new(300.0, 600.0));
        let mut controller = controller(false);

        pinch(&mut controller, &scene, 200.0, 20.0, 0.0);
        assert_eq!(controller.transform().scale, 0.9);
        assert_eq!(controller.take_intents(), vec![NavigationIntent::Paywall]);

        pinch(&mut controller, &scene, 200.0, 20.0, 5.0);
        assert_eq!(controller.transform().scale, 0.9);
        assert!(controller.take_intents().is_empty());

        pinch(&mut controller, &scene, 20.0, 400.0, 10.0);
        assert_eq!(controller.transform().scale, 2.5);
    }

    #[test]
    fn premium_floor_is_lower_and_never_upsells() {
        let scene = scene_with(0, ViewportSize::new(300.0, 600.0));
        let mut controller = controller(true);

        pinch(&mut controller, &scene, 200.0, 20.0, 0.0);
        assert_eq!(controller.transform().scale, 0.6);
        assert!(controller.take_intents().is_empty());
    }

    #[test]
    fn scale_stays_in_bounds_under_mixed_gestures() {
        let scene = scene_with(0, ViewportSize::new(300.0, 600.0));
        let mut controller = controller(false);
        let deltas = [-900.0, 400.0, 2500.0, -30.0, -4000.0, 77.0, 1200.0];

        for (step, delta) in deltas.iter().enumerate() {
            controller.wheel(*delta, pos2(150.0, 300.0));
            let scale = controller.transform().scale;
            assert!((0.9..=2.5).contains(&scale), "step {step}: {scale}");

            pinch(&mut controller, &scene, 100.0, 100.0 + delta * 0.05, step as f64);
            let scale = controller.transform().scale;
            assert!((0.9..=2.5).contains(&scale), "step {step}: {scale}");
        }
    }

    #[test]
    fn wheel_zoom_keeps_cursor_point_fixed() {
        let scene = scene_with(0, ViewportSize::new(300.0, 600.0));
        let mut controller = controller(true);
        controller.pointer_down(&[pos2(0.0, 0.0)], &scene, 0.0);
        controller.pointer_up(pos2(400.0, -250.0), &scene);

        let cursor = pos2(180.0, 240.0);
        let before = controller.transform();
        let scene_point = before.screen_to_scene(cursor);

        controller.wheel(-200.0, cursor);
        let after = controller.transform();
        assert!(after.scale > before.scale);

        let mapped = after.scene_to_screen(scene_point);
        assert!((mapped.x - cursor.x).abs() < 1e-3);
        assert!((mapped.y - cursor.y).abs() < 1e-3);
    }

    #[test]
    fn tap_opens_entry_only_inside_hit_radius() {
        let viewport = ViewportSize::new(300.0, 600.0);
        let scene = scene_with(1, viewport);
        let mut controller = controller(false);
        let node = scene.positions()[0].pos;

        let miss = pos2(node.x + 24.0, node.y);
        controller.pointer_down(&[miss], &scene, 0.0);
        controller.pointer_up(miss, &scene);
        assert!(controller.take_intents().is_empty());

        let hit = pos2(node.x + 23.999, node.y);
        controller.pointer_down(&[hit], &scene, 10.0);
        controller.pointer_up(hit, &scene);
        assert_eq!(
            controller.take_intents(),
            vec![NavigationIntent::OpenEntry("entry-0".to_owned())]
        );
    }

    #[test]
    fn tap_is_inverted_through_pan_and_scale() {
        let viewport = ViewportSize::new(300.0, 600.0);
        let scene = scene_with(1, viewport);
        let mut controller = controller(false);
        controller.recenter_on_bounds(&scene);
        controller.wheel(-300.0, pos2(150.0, 300.0));

        let screen = controller.transform().scene_to_screen(scene.positions()[0].pos);
        controller.pointer_down(&[screen], &scene, 0.0);
        controller.pointer_up(screen, &scene);
        assert_eq!(controller.take_intents().len(), 1);
    }

    #[test]
    fn drag_beyond_slop_is_not_a_tap() {
        let scene = scene_with(1, ViewportSize::new(300.0, 600.0));
        let mut controller = controller(false);
        let node = scene.positions()[0].pos;

        controller.pointer_down(&[node], &scene, 0.0);
        controller.pointer_up(pos2(node.x + 6.0, node.y), &scene);
        assert!(controller.take_intents().is_empty());
    }

    #[test]
    fn double_tap_recenters_first_entry_and_swallows_gesture() {
        let viewport = ViewportSize::new(300.0, 600.0);
        let scene = scene_with(5, viewport);
        let mut controller = controller(false);
        let first = scene.positions()[0].pos;
        let tap = controller.transform().scene_to_screen(first);

        controller.pointer_down(&[tap], &scene, 1.0);
        controller.pointer_up(tap, &scene);
        controller.take_intents();

        controller.pointer_down(&[pos2(tap.x + 5.0, tap.y)], &scene, 1.2);
        controller.pointer_move(&[pos2(tap.x + 200.0, tap.y)]);
        controller.pointer_up(pos2(tap.x + 5.0, tap.y), &scene);
        assert!(controller.take_intents().is_empty());
        assert!(controller.is_animating());

        controller.tick(2.0);
        let transform = controller.transform();
        assert_eq!(transform.scale, 1.0);
        let centered = transform.scene_to_screen(first);
        assert!((centered.x - 150.0).abs() < 1e-3);
        assert!((centered.y - 300.0).abs() < 1e-3);
    }

    #[test]
    fn slow_second_press_is_not_a_double_tap() {
        let scene = scene_with(2, ViewportSize::new(300.0, 600.0));
        let mut controller = controller(false);

        controller.pointer_down(&[pos2(50.0, 50.0)], &scene, 0.0);
        controller.pointer_up(pos2(50.0, 50.0), &scene);
        controller.pointer_down(&[pos2(50.0, 50.0)], &scene, 0.3);
        assert!(!controller.is_animating());
        assert!(controller.is_gesture_active());
    }

    #[test]
    fn recenter_frames_bounds_and_is_idempotent() {
        let viewport = ViewportSize::new(300.0, 600.0);
        let scene = scene_with(12, viewport);
        let mut controller = controller(false);

        controller.recenter_on_bounds(&scene);
        let first = controller.transform();
        controller.recenter_on_bounds(&scene);
        assert_eq!(controller.transform(), first);

        let bounds = scene.bounding_box().expect("non-empty scene");
        let center = first.scene_to_screen(bounds.center());
        assert_eq!(first.scale, 1.0);
        assert!((center.x - 150.0).abs() < 1e-3);
        assert!((center.y - 300.0).abs() < 1e-3);
    }

    #[test]
    fn empty_scene_resets_to_origin_and_never_hits() {
        let scene = scene_with(0, ViewportSize::new(300.0, 600.0));
        let mut controller = controller(true);
        controller.wheel(-500.0, pos2(10.0, 10.0));
        controller.recenter_on_bounds(&scene);
        assert_eq!(controller.transform(), ViewportTransform::IDENTITY);

        controller.pointer_down(&[pos2(300.0, 420.0)], &scene, 0.0);
        controller.pointer_up(pos2(300.0, 420.0), &scene);
        assert!(controller.take_intents().is_empty());
    }

    #[test]
    fn second_finger_mid_drag_starts_fresh_pinch() {
        let scene = scene_with(0, ViewportSize::new(300.0, 600.0));
        let mut controller = controller(true);

        controller.pointer_down(&[pos2(100.0, 100.0)], &scene, 0.0);
        controller.pointer_move(&[pos2(140.0, 100.0)]);
        let pan_before = controller.transform().pan;
        controller.pointer_move(&[pos2(140.0, 100.0), pos2(240.0, 100.0)]);
        controller.pointer_move(&[pos2(140.0, 100.0), pos2(290.0, 100.0)]);

        assert!((controller.transform().scale - 1.5).abs() < 1e-5);
        assert_eq!(controller.transform().pan, pan_before);

        controller.pointer_move(&[pos2(150.0, 100.0)]);
        assert!((controller.transform().scale - 1.5).abs() < 1e-5);
    }

    #[test]
    fn relanded_finger_rebaselines_pinch() {
        let scene = scene_with(0, ViewportSize::new(300.0, 600.0));
        let mut controller = controller(false);

        controller.pointer_down(&[pos2(100.0, 300.0), pos2(200.0, 300.0)], &scene, 0.0);
        controller.pointer_move(&[pos2(100.0, 300.0), pos2(300.0, 300.0)]);
        assert!((controller.transform().scale - 2.0).abs() < 1e-5);

        controller.pointer_move(&[pos2(100.0, 300.0)]);
        controller.pointer_move(&[pos2(100.0, 300.0), pos2(160.0, 300.0)]);
        assert!((controller.transform().scale - 2.0).abs() < 1e-5);
        assert!(controller.take_intents().is_empty());

        controller.pointer_move(&[pos2(100.0, 300.0), pos2(190.0, 300.0)]);
        assert!((controller.transform().scale - 2.5).abs() < 1e-5);
        assert!(controller.take_intents().is_empty());
    }

    #[test]
    fn transform_tracks_animation_until_listeners_released() {
        let scene = scene_with(3, ViewportSize::new(300.0, 600.0));
        let mut controller = controller(true);
        controller.wheel(-200.0, pos2(150.0, 300.0));
        let zoomed = controller.transform().scale;
        assert!(zoomed > 1.0);

        controller.recenter_on_first(&scene, 0.0);
        controller.tick(0.25);
        let midway = controller.transform().scale;
        assert!(midway < zoomed && midway > 1.0);

        controller.release_listeners();
        controller.release_listeners();
        controller.tick(5.0);
        assert_eq!(controller.transform().scale, midway);
    }

    #[test]
    fn unmeasured_viewport_is_ignored() {
        let mut controller = controller(false);
        assert!(!controller.set_viewport(ViewportSize::new(0.0, 0.0)));
        assert_eq!(controller.viewport(), ViewportSize::new(300.0, 600.0));
        assert!(controller.set_viewport(ViewportSize::new(320.0, 640.0)));
    }

    #[test]
    fn downgrading_tier_pulls_scale_back_inside_bounds() {
        let scene = scene_with(0, ViewportSize::new(300.0, 600.0));
        let mut controller = controller(true);
        pinch(&mut controller, &scene, 100.0, 65.0, 0.0);
        assert!((controller.transform().scale - 0.65).abs() < 1e-5);

        controller.set_premium(false);
        assert_eq!(controller.transform().scale, 0.9);
    }
}
