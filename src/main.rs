mod app;
mod config;
mod constellation;
mod journal;
mod logging;
mod util;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info};

use crate::config::ConstellationConfig;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Directory holding the journal's key-value files.
    #[arg(long, default_value = "./gratitude-data")]
    data_dir: PathBuf,

    /// Optional JSON file overriding engine tunables.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Grant the premium entitlement locally.
    #[arg(long)]
    premium: bool,

    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let _logger = match logging::init_logging(&args.log_level) {
        Ok(handle) => handle,
        Err(error) => {
            eprintln!("gratitude-constellation: {error:#}");
            return ExitCode::FAILURE;
        }
    };

    let config = match &args.config {
        Some(path) => match ConstellationConfig::load(path) {
            Ok(config) => config,
            Err(error) => {
                error!("event=config_load status=failed error={error:#}");
                return ExitCode::FAILURE;
            }
        },
        None => ConstellationConfig::default(),
    };

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 880.0])
            .with_min_inner_size([720.0, 520.0]),
        ..Default::default()
    };

    info!(
        "event=app_launch data_dir={} premium_override={}",
        args.data_dir.display(),
        args.premium
    );

    let result = eframe::run_native(
        "Gratitude Glow",
        options,
        Box::new(move |cc| {
            Ok(Box::new(app::GratitudeApp::new(
                cc,
                args.data_dir.clone(),
                config.clone(),
                args.premium,
            )))
        }),
    );

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            error!("event=app_exit status=failed error={error}");
            ExitCode::FAILURE
        }
    }
}
