use eframe::egui::{self, Event, PointerButton, Pos2, Rect, TouchPhase, Ui, Vec2};

use crate::constellation::{TiltReading, ViewportSize};

use super::super::{PointerTracker, ViewModel};

impl PointerTracker {
    fn touch_points(&self) -> Vec<Pos2> {
        self.touches.values().copied().collect()
    }

    fn is_idle(&self) -> bool {
        self.touches.is_empty() && self.mouse.is_none()
    }

    fn clear(&mut self) {
        self.touches.clear();
        self.mouse = None;
        self.last_primary = None;
    }
}

impl ViewModel {
    /// Feeds this frame's raw input into the viewport controller and the
    /// pointer tilt source. Coordinates are made relative to the canvas.
    pub(in crate::app) fn handle_sky_input(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
        now: f64,
    ) {
        let origin = rect.min.to_vec2();
        let events = ui.input(|input| input.events.clone());

        let has_touch = events.iter().any(|event| matches!(event, Event::Touch { .. }));
        for event in &events {
            if let Event::Touch { id, phase, pos, .. } = event {
                self.handle_touch(id.0, *phase, *pos, rect, origin, now);
            }
        }

        // Touch input also arrives as synthesized mouse events; ignore those.
        if !has_touch && self.input.touches.is_empty() {
            for event in &events {
                self.handle_mouse(event, rect, origin, now);
            }
        }

        if response.hovered() {
            let scroll = ui.input(|input| input.raw_scroll_delta.y);
            if scroll.abs() > f32::EPSILON {
                let cursor = ui
                    .input(|input| input.pointer.hover_pos())
                    .unwrap_or_else(|| rect.center());
                // Positive egui scroll means "up"; the controller expects
                // positive delta to zoom out.
                self.controller.wheel(-scroll, cursor - origin);
            }
        }

        if let Some(hover) = ui.input(|input| input.pointer.hover_pos())
            && rect.contains(hover)
        {
            self.tilt.feed(TiltReading::Pointer {
                position: hover - origin,
                viewport: ViewportSize::new(rect.width(), rect.height()),
            });
        }
    }

    fn handle_touch(
        &mut self,
        id: u64,
        phase: TouchPhase,
        pos: Pos2,
        rect: Rect,
        origin: Vec2,
        now: f64,
    ) {
        let local = pos - origin;
        match phase {
            TouchPhase::Start => {
                if !rect.contains(pos) {
                    return;
                }
                let was_idle = self.input.is_idle();
                self.input.touches.insert(id, local);
                let points = self.input.touch_points();
                self.input.last_primary = points.first().copied();
                if was_idle {
                    self.controller.pointer_down(&points, &self.scene, now);
                } else {
                    self.controller.pointer_move(&points);
                }
            }
            TouchPhase::Move => {
                let Some(slot) = self.input.touches.get_mut(&id) else {
                    return;
                };
                *slot = local;
                let points = self.input.touch_points();
                self.input.last_primary = points.first().copied();
                self.controller.pointer_move(&points);
            }
            TouchPhase::End => {
                if self.input.touches.remove(&id).is_none() {
                    return;
                }
                if self.input.touches.is_empty() {
                    let release = self.input.last_primary.unwrap_or(local);
                    self.input.clear();
                    self.controller.pointer_up(release, &self.scene);
                } else {
                    self.controller.pointer_move(&self.input.touch_points());
                }
            }
            TouchPhase::Cancel => {
                if self.input.touches.remove(&id).is_some() && self.input.touches.is_empty() {
                    self.input.clear();
                    self.controller.cancel_gesture();
                }
            }
        }
    }

    fn handle_mouse(&mut self, event: &Event, rect: Rect, origin: Vec2, now: f64) {
        match event {
            Event::PointerButton {
                pos,
                button: PointerButton::Primary,
                pressed: true,
                ..
            } if rect.contains(*pos) && self.input.mouse.is_none() => {
                let local = *pos - origin;
                self.input.mouse = Some(local);
                self.controller.pointer_down(&[local], &self.scene, now);
            }
            Event::PointerMoved(pos) => {
                if self.input.mouse.is_some() {
                    let local = *pos - origin;
                    self.input.mouse = Some(local);
                    self.controller.pointer_move(&[local]);
                }
            }
            Event::PointerButton {
                pos,
                button: PointerButton::Primary,
                pressed: false,
                ..
            } => {
                if self.input.mouse.take().is_some() {
                    self.controller.pointer_up(*pos - origin, &self.scene);
                }
            }
            Event::PointerGone => {
                if self.input.mouse.take().is_some() {
                    self.controller.cancel_gesture();
                }
            }
            _ => {}
        }
    }
}
