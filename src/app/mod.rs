use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::thread;

use anyhow::{Context as _, Result};
use chrono::NaiveDate;
use eframe::egui::{self, Context, Pos2};
use log::info;
use rand::rngs::StdRng;

use crate::config::ConstellationConfig;
use crate::constellation::{
    DecorativeField, Scene, ShootingStarSpawner, TiltState, ViewportController, ViewportSize,
};
use crate::journal::{FileStore, JournalStore, LocalEntitlement, TimelineFilter};

mod render_utils;
mod sky;
mod ui;

pub struct GratitudeApp {
    data_dir: PathBuf,
    config: ConstellationConfig,
    premium_override: bool,
    state: AppState,
}

enum AppState {
    Loading {
        rx: Receiver<Result<JournalStore, String>>,
    },
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    journal: JournalStore,
    config: ConstellationConfig,
    scene: Scene,
    scene_revision: u64,
    scene_day: NaiveDate,
    controller: ViewportController,
    field: DecorativeField,
    spawner: ShootingStarSpawner<StdRng>,
    tilt: TiltState,
    rng: StdRng,
    input: PointerTracker,
    draft: String,
    search: String,
    filter: TimelineFilter,
    editor: Option<EntryEditor>,
    paywall_open: bool,
    backup_text: String,
    confirm_clear: bool,
    status: Option<StatusLine>,
}

/// Pointers currently pressed on the sky canvas, in canvas coordinates.
#[derive(Default)]
struct PointerTracker {
    touches: BTreeMap<u64, Pos2>,
    mouse: Option<Pos2>,
    last_primary: Option<Pos2>,
}

struct EntryEditor {
    id: String,
    text: String,
    editing: bool,
    confirm_delete: bool,
}

struct StatusLine {
    text: String,
    is_error: bool,
}

impl GratitudeApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        data_dir: PathBuf,
        config: ConstellationConfig,
        premium_override: bool,
    ) -> Self {
        let state = Self::start_load(data_dir.clone(), premium_override);
        Self {
            data_dir,
            config,
            premium_override,
            state,
        }
    }

    fn spawn_load(data_dir: PathBuf, premium_override: bool) -> Receiver<Result<JournalStore, String>> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result =
                open_journal(&data_dir, premium_override).map_err(|error| format!("{error:#}"));
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(data_dir: PathBuf, premium_override: bool) -> AppState {
        AppState::Loading {
            rx: Self::spawn_load(data_dir, premium_override),
        }
    }
}

fn open_journal(data_dir: &Path, premium_override: bool) -> Result<JournalStore> {
    let storage = FileStore::open(data_dir)
        .with_context(|| format!("failed to open journal storage at {}", data_dir.display()))?;
    JournalStore::load(
        Box::new(storage),
        Box::new(LocalEntitlement::new(premium_override)),
    )
    .context("failed to load journal")
}

impl eframe::App for GratitudeApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(Ok(journal)) => {
                        let now = ctx.input(|input| input.time);
                        transition = Some(AppState::Ready(Box::new(ViewModel::new(
                            journal,
                            self.config.clone(),
                            now,
                        ))));
                    }
                    Ok(Err(error)) => transition = Some(AppState::Error(error)),
                    Err(mpsc::TryRecvError::Empty) => ctx.request_repaint(),
                    Err(mpsc::TryRecvError::Disconnected) => {
                        transition = Some(AppState::Error(
                            "Background load worker disconnected".to_owned(),
                        ));
                    }
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading your constellation...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load the journal");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        transition = Some(Self::start_load(
                            self.data_dir.clone(),
                            self.premium_override,
                        ));
                    }
                });
            }
            AppState::Ready(model) => model.show(ctx),
        }

        if let Some(next_state) = transition {
            self.state = next_state;
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        if let AppState::Ready(model) = &mut self.state {
            model.teardown();
        }
        info!("event=app_exit status=ok");
    }
}

impl ViewModel {
    /// Releases the spawner timer and the tilt subscription.
    fn teardown(&mut self) {
        self.spawner.cancel();
        self.tilt.detach();
        self.controller.cancel_gesture();
        self.controller.release_listeners();
    }

    fn viewport(&self) -> ViewportSize {
        self.controller.viewport()
    }

    fn set_status(&mut self, text: impl Into<String>) {
        self.status = Some(StatusLine {
            text: text.into(),
            is_error: false,
        });
    }

    fn set_error(&mut self, context: &str, error: &anyhow::Error) {
        log::error!("event=journal_write status=failed action={context} error={error:#}");
        self.status = Some(StatusLine {
            text: format!("{context} failed: {error:#}"),
            is_error: true,
        });
    }
}
