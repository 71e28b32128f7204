use eframe::egui::{Color32, Mesh, Painter, Pos2, Rect, Shape, Stroke};

use crate::util::hex_color_or_fallback;

const SKY_TOP: Color32 = Color32::from_rgb(0x0A, 0x0E, 0x27);
const SKY_BOTTOM: Color32 = Color32::from_rgb(0x00, 0x08, 0x14);
pub(super) const EDGE_COLOR: Color32 = Color32::from_rgb(0xB2, 0x4B, 0xF3);

pub(super) fn with_alpha(color: Color32, alpha: f32) -> Color32 {
    let alpha = (alpha.clamp(0.0, 1.0) * color.a() as f32) as u8;
    Color32::from_rgba_unmultiplied(color.r(), color.g(), color.b(), alpha)
}

pub(super) fn hex_with_alpha(hex: &str, alpha: f32) -> Color32 {
    with_alpha(hex_color_or_fallback(hex), alpha)
}

/// Vertical night gradient behind every layer.
pub(super) fn draw_background(painter: &Painter, rect: Rect) {
    let mut mesh = Mesh::default();
    mesh.colored_vertex(rect.left_top(), SKY_TOP);
    mesh.colored_vertex(rect.right_top(), SKY_TOP);
    mesh.colored_vertex(rect.right_bottom(), SKY_BOTTOM);
    mesh.colored_vertex(rect.left_bottom(), SKY_BOTTOM);
    mesh.add_triangle(0, 1, 2);
    mesh.add_triangle(0, 2, 3);
    painter.add(Shape::mesh(mesh));
}

/// Filled core with a few translucent halo rings.
pub(super) fn draw_glow(painter: &Painter, center: Pos2, radius: f32, core: Color32, glow: Color32) {
    for (scale, alpha) in [(2.6, 0.06), (1.9, 0.12), (1.4, 0.22)] {
        painter.circle_filled(center, radius * scale, with_alpha(glow, alpha));
    }
    painter.circle_filled(center, radius, core);
}

pub(super) fn draw_ring(painter: &Painter, center: Pos2, radius: f32, color: Color32) {
    let stroke = Stroke::new((radius * 0.08).max(1.0), with_alpha(color, 0.55));
    let points = (0..=48)
        .map(|step| {
            let angle = step as f32 / 48.0 * std::f32::consts::TAU;
            Pos2::new(
                center.x + angle.cos() * radius * 1.7,
                center.y + angle.sin() * radius * 0.45,
            )
        })
        .collect();
    painter.add(Shape::line(points, stroke));
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    rect.expand(radius).contains(position)
}

/// Cheap bounding-box cull for straight segments.
pub(super) fn segment_visible(rect: Rect, start: Pos2, end: Pos2, padding: f32) -> bool {
    let bounds = Rect::from_two_pos(start, end).expand(padding);
    rect.intersects(bounds)
}
