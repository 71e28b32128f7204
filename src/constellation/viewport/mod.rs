mod controller;

use eframe::egui::{Pos2, Rect, Vec2, pos2, vec2};

pub use controller::{NavigationIntent, ViewportController};

/// Size of the visible canvas in screen units. A zero or non-finite
/// dimension means the host has not measured it yet.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportSize {
    pub width: f32,
    pub height: f32,
}

impl ViewportSize {
    pub const DEFAULT: Self = Self {
        width: 390.0,
        height: 844.0,
    };

    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn is_known(self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    pub fn known_or(self, fallback: Self) -> Self {
        if self.is_known() { self } else { fallback }
    }

    pub fn center(self) -> Pos2 {
        pos2(self.width * 0.5, self.height * 0.5)
    }

    /// The scene canvas is twice the viewport in each direction.
    pub fn canvas(self) -> Vec2 {
        vec2(self.width * 2.0, self.height * 2.0)
    }

    pub fn area(self) -> f32 {
        self.width * self.height
    }
}

/// Maps scene coordinates to screen coordinates as `screen = scene * scale + pan`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportTransform {
    pub pan: Vec2,
    pub scale: f32,
}

impl Default for ViewportTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ViewportTransform {
    pub const IDENTITY: Self = Self {
        pan: Vec2::ZERO,
        scale: 1.0,
    };

    pub fn scene_to_screen(self, scene: Pos2) -> Pos2 {
        pos2(
            scene.x * self.scale + self.pan.x,
            scene.y * self.scale + self.pan.y,
        )
    }

    pub fn screen_to_scene(self, screen: Pos2) -> Pos2 {
        pos2(
            (screen.x - self.pan.x) / self.scale,
            (screen.y - self.pan.y) / self.scale,
        )
    }

    /// Rescales while keeping the scene point under `anchor` fixed on screen.
    pub fn zoomed_at(self, anchor: Pos2, new_scale: f32) -> Self {
        let ratio = new_scale / self.scale;
        let anchor = anchor.to_vec2();
        Self {
            pan: anchor - (anchor - self.pan) * ratio,
            scale: new_scale,
        }
    }

    /// Unit-scale transform that puts `scene_point` at the viewport center.
    pub fn centered_on(scene_point: Pos2, viewport: ViewportSize) -> Self {
        Self {
            pan: viewport.center() - scene_point,
            scale: 1.0,
        }
    }

    /// Unit-scale transform centering the bounding box of `bounds`, or the
    /// identity when there is nothing to frame.
    pub fn framing(bounds: Option<Rect>, viewport: ViewportSize) -> Self {
        match bounds {
            Some(rect) => Self::centered_on(rect.center(), viewport),
            None => Self::IDENTITY,
        }
    }
}
