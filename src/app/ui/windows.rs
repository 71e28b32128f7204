use eframe::egui::{self, Align2, Color32, Context, RichText, TextEdit};
use log::info;

use crate::constellation::NavigationIntent;
use crate::journal::MAX_ENTRY_CHARS;
use crate::util::hex_color_or_fallback;

use super::super::{EntryEditor, ViewModel};

enum EditorAction {
    Save(String),
    Delete,
}

impl ViewModel {
    pub(in crate::app) fn route_intents(&mut self) {
        for intent in self.controller.take_intents() {
            match intent {
                NavigationIntent::OpenEntry(id) => self.open_entry(&id),
                NavigationIntent::Paywall => {
                    info!("event=navigate target=paywall reason=zoom_floor");
                    self.paywall_open = true;
                }
            }
        }
    }

    pub(in crate::app) fn open_entry(&mut self, id: &str) {
        let Some(entry) = self.journal.entry(id) else {
            return;
        };
        info!("event=navigate target=entry id={id}");
        self.editor = Some(EntryEditor {
            id: entry.id.clone(),
            text: entry.text.clone(),
            editing: false,
            confirm_delete: false,
        });
    }

    pub(in crate::app) fn draw_entry_window(&mut self, ctx: &Context) {
        let Some(editor) = self.editor.as_mut() else {
            return;
        };
        let Some(entry) = self.journal.entry(&editor.id) else {
            self.editor = None;
            return;
        };

        let mut open = true;
        let mut action = None;
        let accent = hex_color_or_fallback(&entry.color);
        let date = entry.timestamp.format("%A, %B %-d, %Y").to_string();
        let time = entry.timestamp.format("%H:%M").to_string();

        egui::Window::new("Gratitude")
            .id(egui::Id::new("entry_detail"))
            .open(&mut open)
            .collapsible(false)
            .resizable(false)
            .default_width(360.0)
            .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.colored_label(accent, "●");
                    ui.label(RichText::new(date.as_str()).strong());
                    ui.small(time.as_str());
                });
                ui.add_space(8.0);

                if editor.editing {
                    ui.add(
                        TextEdit::multiline(&mut editor.text)
                            .char_limit(MAX_ENTRY_CHARS)
                            .desired_rows(4)
                            .desired_width(f32::INFINITY),
                    );
                    ui.small(format!("{}/{MAX_ENTRY_CHARS}", editor.text.chars().count()));
                    ui.horizontal(|ui| {
                        let can_save = !editor.text.trim().is_empty();
                        if ui.add_enabled(can_save, egui::Button::new("Save")).clicked() {
                            action = Some(EditorAction::Save(editor.text.clone()));
                        }
                        if ui.button("Cancel").clicked() {
                            editor.text = entry.text.clone();
                            editor.editing = false;
                        }
                    });
                    return;
                }

                ui.label(RichText::new(entry.text.as_str()).size(16.0));
                ui.add_space(10.0);

                if editor.confirm_delete {
                    ui.label("Delete this gratitude? This cannot be undone.");
                    ui.horizontal(|ui| {
                        if ui
                            .button(RichText::new("Delete").color(Color32::from_rgb(0xEF, 0x44, 0x44)))
                            .clicked()
                        {
                            action = Some(EditorAction::Delete);
                        }
                        if ui.button("Keep").clicked() {
                            editor.confirm_delete = false;
                        }
                    });
                } else {
                    ui.horizontal(|ui| {
                        if ui.button("Edit").clicked() {
                            editor.editing = true;
                        }
                        if ui.button("Delete").clicked() {
                            editor.confirm_delete = true;
                        }
                    });
                }
            });

        if !open {
            self.editor = None;
            return;
        }

        let Some(action) = action else {
            return;
        };
        let id = editor.id.clone();
        match action {
            EditorAction::Save(text) => match self.journal.update_entry(&id, &text) {
                Ok(_) => {
                    if let Some(editor) = self.editor.as_mut() {
                        editor.editing = false;
                    }
                    self.set_status("Gratitude updated.");
                }
                Err(error) => self.set_error("Saving entry", &error),
            },
            EditorAction::Delete => match self.journal.delete_entry(&id) {
                Ok(_) => {
                    self.editor = None;
                    self.set_status("Gratitude deleted.");
                }
                Err(error) => self.set_error("Deleting entry", &error),
            },
        }
    }

    pub(in crate::app) fn draw_paywall_window(&mut self, ctx: &Context) {
        if !self.paywall_open {
            return;
        }

        let mut open = true;
        let mut purchase = false;
        let mut restore = false;

        egui::Window::new("Unlock Premium")
            .id(egui::Id::new("paywall"))
            .open(&mut open)
            .collapsible(false)
            .resizable(false)
            .default_width(340.0)
            .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label("See your whole constellation at once.");
                ui.label(format!(
                    "Premium lets you zoom out to {:.0}% instead of {:.0}%.",
                    self.config.min_scale_premium * 100.0,
                    self.config.min_scale_free * 100.0
                ));
                ui.add_space(8.0);
                ui.label(RichText::new("Choose your plan").strong());
                ui.label("$3.99/month or $24.99/year (40%+ discount)");
                ui.small("7 days free, then $3.99/mo or $24.99/yr");
                ui.add_space(10.0);
                ui.horizontal(|ui| {
                    if ui.button("Start Free Trial").clicked() {
                        purchase = true;
                    }
                    if ui.button("Restore purchases").clicked() {
                        restore = true;
                    }
                });
            });

        if purchase {
            match self.journal.purchase_premium() {
                Ok(true) => {
                    self.set_status("Premium unlocked. Enjoy the wider sky.");
                    open = false;
                }
                Ok(false) => self.set_status("Purchase was not completed."),
                Err(error) => self.set_error("Purchase", &error),
            }
        }
        if restore && self.restore_purchases() {
            open = false;
        }

        self.paywall_open = open;
    }

    /// Returns whether premium is active afterwards.
    pub(in crate::app) fn restore_purchases(&mut self) -> bool {
        match self.journal.restore_purchases() {
            Ok(true) => {
                self.set_status("Purchases restored.");
                true
            }
            Ok(false) => {
                self.set_status("No previous purchase found.");
                false
            }
            Err(error) => {
                self.set_error("Restore", &error);
                false
            }
        }
    }
}
