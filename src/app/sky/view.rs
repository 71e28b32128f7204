use chrono::Utc;
use eframe::egui::{Align2, Color32, FontId, Painter, Rect, Sense, Stroke, Ui, Vec2, vec2};

use crate::constellation::{PLANET_FACTOR, ViewportSize, color_for_age, parallax_offset};
use crate::util::hex_color_or_fallback;

use super::super::ViewModel;
use super::super::render_utils::{
    EDGE_COLOR, circle_visible, draw_background, draw_glow, draw_ring, hex_with_alpha,
    segment_visible, with_alpha,
};

const ORB_CORE_RADIUS: f32 = 6.0;
const ORB_GLOW_RADIUS: f32 = 46.0;
const MILESTONE_EVERY: usize = 10;
const MILESTONE_RADIUS: f32 = 24.0;
const TRAIL_LENGTH: f32 = 60.0;

impl ViewModel {
    pub(in crate::app) fn draw_sky(&mut self, ui: &mut Ui) {
        let now = ui.input(|input| input.time);
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());

        self.sync_scene(ViewportSize::new(rect.width(), rect.height()), now);
        self.handle_sky_input(ui, rect, &response, now);

        self.controller.tick(now);
        self.field.tick(now);
        self.spawner.tick(now);

        let painter = ui.painter_at(rect);
        draw_background(&painter, rect);

        let pan = self.controller.transform().pan;
        let tilt = self.tilt.offset();
        let boost = self.config.tilt_parallax_boost;

        let planet_shift = rect.min.to_vec2() + parallax_offset(pan, tilt, PLANET_FACTOR, boost);
        self.draw_planets(&painter, rect, planet_shift);

        for layer in &self.field.layers {
            let shift = rect.min.to_vec2() + parallax_offset(pan, tilt, layer.factor, boost);
            for star in &layer.stars {
                let center = star.pos + shift;
                if !circle_visible(rect, center, star.size) {
                    continue;
                }
                painter.circle_filled(center, star.size, with_alpha(Color32::WHITE, star.opacity()));
            }
        }

        for star in self.spawner.live() {
            let shift = rect.min.to_vec2() + parallax_offset(pan, tilt, star.factor, boost);
            let head = star.position() + shift;
            let heading = vec2(star.angle.cos(), star.angle.sin());
            let tail = head - heading * TRAIL_LENGTH;
            let alpha = star.opacity();
            painter.line_segment(
                [tail, head],
                Stroke::new(star.size * 0.5, with_alpha(Color32::WHITE, alpha * 0.6)),
            );
            painter.circle_filled(head, star.size, with_alpha(Color32::WHITE, alpha));
        }

        self.draw_constellation(&painter, rect);

        // Twinkles and shooting stars animate continuously.
        ui.ctx().request_repaint();
    }

    fn draw_planets(&self, painter: &Painter, rect: Rect, shift: Vec2) {
        for planet in &self.field.planets {
            let center = planet.center(self.field.viewport()) + shift;
            if !circle_visible(rect, center, planet.radius * 2.6) {
                continue;
            }
            let core = hex_color_or_fallback(planet.core);
            let glow = hex_color_or_fallback(planet.glow);
            draw_glow(painter, center, planet.radius, core, glow);
            if planet.ring {
                draw_ring(painter, center, planet.radius, glow);
            }
        }
    }

    fn draw_constellation(&self, painter: &Painter, rect: Rect) {
        let transform = self.controller.transform();
        let offset = rect.min.to_vec2();
        let positions = self.scene.positions();

        if positions.is_empty() {
            let center = rect.center();
            draw_glow(
                painter,
                center,
                ORB_CORE_RADIUS * 2.0,
                with_alpha(Color32::WHITE, 0.4),
                hex_color_or_fallback("#00D9FF"),
            );
            painter.text(
                center + vec2(0.0, 48.0),
                Align2::CENTER_TOP,
                "Add your first gratitude to light a star",
                FontId::proportional(15.0),
                Color32::from_gray(200),
            );
            return;
        }

        let screen = positions
            .iter()
            .map(|node| transform.scene_to_screen(node.pos) + offset)
            .collect::<Vec<_>>();

        for edge in self.scene.edges() {
            let (start, end) = (screen[edge.from], screen[edge.to]);
            if !segment_visible(rect, start, end, 1.0) {
                continue;
            }
            painter.line_segment([start, end], Stroke::new(1.0, with_alpha(EDGE_COLOR, edge.opacity())));
        }

        let now = Utc::now();
        let glow_radius = ORB_GLOW_RADIUS * transform.scale;
        let core_radius = ORB_CORE_RADIUS * transform.scale;
        for (index, node) in positions.iter().enumerate() {
            let center = screen[index];
            if !circle_visible(rect, center, glow_radius) {
                continue;
            }
            let hex = color_for_age(node.age_days, &node.color);
            for (fraction, alpha) in [(1.0, 0.10), (0.75, 0.12), (0.45, 0.22), (0.25, 0.55)] {
                painter.circle_filled(center, glow_radius * fraction, hex_with_alpha(hex, alpha));
            }
            painter.circle_filled(center, core_radius, hex_color_or_fallback(hex));

            if (index + 1) % MILESTONE_EVERY == 0 {
                painter.circle_stroke(
                    center,
                    MILESTONE_RADIUS * transform.scale,
                    Stroke::new(1.5, with_alpha(Color32::WHITE, 0.2)),
                );
            }
        }

        if let Some(latest) = self.journal.entries().last() {
            let age = latest.age_days(now);
            let caption = match age {
                0 => "newest star: today".to_owned(),
                1 => "newest star: yesterday".to_owned(),
                days => format!("newest star: {days} days ago"),
            };
            painter.text(
                rect.left_bottom() + vec2(12.0, -12.0),
                Align2::LEFT_BOTTOM,
                caption,
                FontId::proportional(12.0),
                Color32::from_gray(150),
            );
        }
    }
}
