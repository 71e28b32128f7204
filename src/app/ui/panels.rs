use chrono::Utc;
use eframe::egui::{self, Align, Color32, Context, Frame, Layout, RichText, TextEdit, Ui};
use log::info;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::config::ConstellationConfig;
use crate::constellation::{
    DecorativeField, PlatformCapabilities, Scene, ShootingStarSpawner, TiltState,
    ViewportController, ViewportSize, create_tilt_source,
};
use crate::journal::{
    FREE_ENTRY_LIMIT, JournalStore, MAX_ENTRY_CHARS, TimelineFilter, compute_stats, monthly_counts,
};

use super::super::{PointerTracker, ViewModel};

impl ViewModel {
    pub(in crate::app) fn new(journal: JournalStore, config: ConstellationConfig, now: f64) -> Self {
        let (width, height) = config.fallback_viewport;
        let viewport = ViewportSize::new(width, height);
        let wall_clock = Utc::now();

        let scene = Scene::build(journal.entries(), viewport, wall_clock, &config);
        let mut controller = ViewportController::new(config.clone(), journal.is_premium(), viewport);
        controller.recenter_on_bounds(&scene);

        let mut rng = StdRng::from_os_rng();
        let field = DecorativeField::generate(&mut rng, viewport, now);
        let spawner = ShootingStarSpawner::new(StdRng::from_rng(&mut rng), &config, viewport, now);

        // Desktop hosts only offer pointer-driven tilt.
        let capabilities = PlatformCapabilities {
            pointer: true,
            ..PlatformCapabilities::default()
        };
        let tilt = TiltState::attach(create_tilt_source(
            capabilities,
            config.tilt_strength,
            config.sensor_interval_secs,
        ));

        Self {
            scene_revision: journal.revision(),
            scene_day: wall_clock.date_naive(),
            journal,
            config,
            scene,
            controller,
            field,
            spawner,
            tilt,
            rng,
            input: PointerTracker::default(),
            draft: String::new(),
            search: String::new(),
            filter: TimelineFilter::All,
            editor: None,
            paywall_open: false,
            backup_text: String::new(),
            confirm_clear: false,
            status: None,
        }
    }

    pub(in crate::app) fn show(&mut self, ctx: &Context) {
        self.controller.set_premium(self.journal.is_premium());

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("Gratitude Glow");
                    ui.separator();
                    ui.label("Your constellation of gratitude");
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        if ui.button("Recenter").clicked() {
                            let now = ui.input(|input| input.time);
                            self.controller.recenter_on_first(&self.scene, now);
                        }
                        let transform = self.controller.transform();
                        ui.label(format!(
                            "zoom {:.0}% (min {:.0}%)",
                            transform.scale * 100.0,
                            self.controller.min_scale() * 100.0
                        ));
                        ui.label(format!(
                            "stars: {}  links: {}",
                            self.scene.positions().len(),
                            self.scene.edges().len()
                        ));
                    });
                });
            });

        egui::SidePanel::left("journal")
            .resizable(true)
            .default_width(340.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical()
                    .id_salt("journal_scroll")
                    .auto_shrink([false, false])
                    .show(ui, |ui| self.draw_journal_panel(ui));
            });

        egui::CentralPanel::default()
            .frame(Frame::NONE)
            .show(ctx, |ui| self.draw_sky(ui));

        self.route_intents();
        self.draw_entry_window(ctx);
        self.draw_paywall_window(ctx);
    }

    fn draw_journal_panel(&mut self, ui: &mut Ui) {
        self.draw_composer(ui);
        ui.separator();
        self.draw_stats(ui);
        ui.separator();
        self.draw_timeline(ui);
        ui.separator();
        self.draw_premium_status(ui);
        ui.separator();
        self.draw_backup(ui);

        if let Some(status) = &self.status {
            ui.separator();
            let color = if status.is_error {
                Color32::from_rgb(0xEF, 0x44, 0x44)
            } else {
                Color32::from_rgb(0x10, 0xB9, 0x81)
            };
            ui.colored_label(color, status.text.as_str());
        }
    }

    fn draw_composer(&mut self, ui: &mut Ui) {
        ui.label(RichText::new("What are you grateful for today?").strong());
        ui.add(
            TextEdit::multiline(&mut self.draft)
                .char_limit(MAX_ENTRY_CHARS)
                .desired_rows(3)
                .desired_width(f32::INFINITY)
                .hint_text("A person, a moment, a small win..."),
        );

        ui.horizontal(|ui| {
            let length = self.draft.chars().count();
            ui.small(format!("{length}/{MAX_ENTRY_CHARS}"));
            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                if !self.journal.can_add_entry() {
                    if ui
                        .button("🔒 Add star")
                        .on_hover_text(format!(
                            "Free journals hold {FREE_ENTRY_LIMIT} stars. Unlock Premium for more."
                        ))
                        .clicked()
                    {
                        info!("event=navigate target=paywall reason=entry_limit");
                        self.paywall_open = true;
                    }
                    return;
                }
                let can_add = !self.draft.trim().is_empty();
                if ui.add_enabled(can_add, egui::Button::new("Add star")).clicked() {
                    match self.journal.add_entry(&self.draft, Utc::now()).map(|_| ()) {
                        Ok(()) => {
                            self.draft.clear();
                            self.set_status("A new star joined your constellation.");
                        }
                        Err(error) => self.set_error("Adding entry", &error),
                    }
                }
            });
        });
    }

    fn draw_stats(&self, ui: &mut Ui) {
        let stats = compute_stats(self.journal.entries(), Utc::now());
        ui.label(RichText::new("Today's Reflection").strong());
        egui::Grid::new("stats_grid")
            .num_columns(2)
            .spacing([24.0, 4.0])
            .show(ui, |ui| {
                ui.label("Total gratitudes");
                ui.label(stats.total_entries.to_string());
                ui.end_row();
                ui.label("Current streak");
                ui.label(format!("{} days", stats.current_streak));
                ui.end_row();
                ui.label("Longest streak");
                ui.label(format!("{} days", stats.longest_streak));
                ui.end_row();
                ui.label("This week");
                ui.label(stats.weekly_count.to_string());
                ui.end_row();
            });

        let months = monthly_counts(self.journal.entries());
        if months.is_empty() {
            return;
        }
        ui.add_space(4.0);
        ui.label(RichText::new("By month").small().strong());
        egui::Grid::new("monthly_grid")
            .num_columns(2)
            .spacing([24.0, 2.0])
            .show(ui, |ui| {
                for month in &months {
                    ui.small(month.label());
                    ui.small(month.count.to_string());
                    ui.end_row();
                }
            });
    }

    fn draw_premium_status(&mut self, ui: &mut Ui) {
        if self.journal.is_premium() {
            ui.label(RichText::new("Premium active").color(Color32::from_rgb(0xFF, 0xD7, 0x00)));
            return;
        }

        ui.label("Free plan");
        ui.horizontal(|ui| {
            if ui.button("Unlock Premium").clicked() {
                self.paywall_open = true;
            }
            if ui.button("Restore purchases").clicked() {
                self.restore_purchases();
            }
        });
    }

    fn draw_backup(&mut self, ui: &mut Ui) {
        egui::CollapsingHeader::new("Backup")
            .id_salt("backup_section")
            .default_open(false)
            .show(ui, |ui| {
                let can_backup = self.journal.can_backup();
                if !can_backup {
                    ui.small("Exports and backup are part of Premium.");
                }
                ui.horizontal(|ui| {
                    if ui.button("Export").clicked() {
                        if !can_backup {
                            info!("event=navigate target=paywall reason=backup");
                            self.paywall_open = true;
                            return;
                        }
                        match self.journal.export_backup_json(Utc::now()) {
                            Ok(json) => {
                                self.backup_text = json;
                                self.set_status("Backup exported below; copy it somewhere safe.");
                            }
                            Err(error) => self.set_error("Export", &error),
                        }
                    }
                    let can_import = !can_backup || !self.backup_text.trim().is_empty();
                    if ui.add_enabled(can_import, egui::Button::new("Import")).clicked() {
                        if !can_backup {
                            info!("event=navigate target=paywall reason=backup");
                            self.paywall_open = true;
                            return;
                        }
                        match self.journal.import_backup_json(&self.backup_text) {
                            Ok(count) => {
                                self.editor = None;
                                self.set_status(format!("Imported {count} entries."));
                            }
                            Err(error) => self.set_error("Import", &error),
                        }
                    }
                });

                ui.add(
                    TextEdit::multiline(&mut self.backup_text)
                        .code_editor()
                        .desired_rows(6)
                        .desired_width(f32::INFINITY)
                        .hint_text("Paste a backup JSON here to import it"),
                );

                ui.add_space(6.0);
                if self.confirm_clear {
                    ui.label("Erase every entry and the premium flag?");
                    ui.horizontal(|ui| {
                        if ui.button("Erase everything").clicked() {
                            self.confirm_clear = false;
                            match self.journal.clear_all() {
                                Ok(()) => {
                                    self.editor = None;
                                    self.set_status("Journal cleared.");
                                }
                                Err(error) => self.set_error("Clearing journal", &error),
                            }
                        }
                        if ui.button("Keep my journal").clicked() {
                            self.confirm_clear = false;
                        }
                    });
                } else if ui.button("Clear journal...").clicked() {
                    self.confirm_clear = true;
                }
            });
    }
}
