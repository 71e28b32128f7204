use chrono::Utc;
use eframe::egui::{self, RichText, TextEdit, Ui};

use crate::journal::timeline_sections;
use crate::util::{hex_color_or_fallback, preview};

use super::super::ViewModel;

const PREVIEW_CHARS: usize = 48;

impl ViewModel {
    pub(in crate::app) fn draw_timeline(&mut self, ui: &mut Ui) {
        ui.label(RichText::new("Timeline").strong());
        ui.horizontal(|ui| {
            ui.add(
                TextEdit::singleline(&mut self.search)
                    .hint_text("Search gratitudes")
                    .desired_width(200.0),
            );
            if ui.button(self.filter.label()).on_hover_text("Cycle filter").clicked() {
                self.filter = self.filter.next();
            }
        });

        let now = Utc::now();
        let sections = timeline_sections(self.journal.entries(), &self.search, self.filter, now);
        let mut opened = None;

        if sections.is_empty() {
            ui.label("No gratitudes match this view yet.");
        }

        egui::ScrollArea::vertical()
            .id_salt("timeline_scroll")
            .max_height(280.0)
            .auto_shrink([false, true])
            .show(ui, |ui| {
                for section in &sections {
                    ui.add_space(4.0);
                    ui.label(RichText::new(section.title.as_str()).small().strong());
                    for entry in &section.entries {
                        ui.horizontal(|ui| {
                            ui.colored_label(hex_color_or_fallback(&entry.color), "●");
                            ui.small(entry.timestamp.format("%H:%M").to_string());
                            if ui
                                .link(preview(&entry.text, PREVIEW_CHARS))
                                .on_hover_text(entry.text.as_str())
                                .clicked()
                            {
                                opened = Some(entry.id.clone());
                            }
                        });
                    }
                }
            });

        if let Some(id) = opened {
            self.open_entry(&id);
        }
    }
}
