mod interaction;
mod view;

use chrono::Utc;

use crate::constellation::{DecorativeField, Scene, ViewportSize};

use super::ViewModel;

impl ViewModel {
    /// Rebuilds derived sky state after the canvas was resized, the journal
    /// changed or the UTC date rolled over. Returns whether the scene was
    /// rebuilt.
    pub(in crate::app) fn sync_scene(&mut self, measured: ViewportSize, now: f64) -> bool {
        let resized = self.controller.set_viewport(measured);
        if resized {
            let viewport = self.viewport();
            self.field = DecorativeField::generate(&mut self.rng, viewport, now);
            self.spawner.set_viewport(viewport);
        }

        let wall_clock = Utc::now();
        let today = wall_clock.date_naive();
        let entries_changed = self.scene_revision != self.journal.revision();
        let day_changed = self.scene_day != today;
        if !(resized || entries_changed || day_changed) {
            return false;
        }

        self.scene = Scene::build(
            self.journal.entries(),
            self.viewport(),
            wall_clock,
            &self.config,
        );
        self.scene_revision = self.journal.revision();
        self.scene_day = today;

        // A date rollover only refreshes age colours; positions are unchanged.
        if resized || entries_changed {
            self.controller.recenter_on_bounds(&self.scene);
        }
        true
    }
}
