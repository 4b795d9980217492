#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod fx;
mod gui;

use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use ultimate_rgb::color::hsv_to_rgb;
use ultimate_rgb::state::{default_app_data_dir, AppState};
use ultimate_rgb::{log_info, log_warn, KeyValueStore, MemoryStore, Picker, PickerOptions, StateManager};

fn main() -> Result<()> {
    let result = run_app();
    let _ = ultimate_rgb::logger::finalize_logs();
    result
}

fn run_app() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let stream_logs = args.iter().any(|arg| arg == "--stream-logs");

    let (state, state_error) = match StateManager::new() {
        Ok(state) => (Some(Arc::new(state)), None),
        Err(e) => (None, Some(e)),
    };
    let settings = state
        .as_ref()
        .map(|s| s.read(AppState::clone))
        .unwrap_or_default();

    let log_dir = match &state {
        Some(state) => state.log_dir(),
        None => fallback_log_dir(),
    };
    let log_dirs = [log_dir, temp_log_dir()];
    // Without a log file the picker still runs; messages go to tracing only.
    if let Err(e) =
        ultimate_rgb::logger::init_logger(&log_dirs, "ultimatergb", settings.log_retention_count, stream_logs)
    {
        tracing::warn!("Session log unavailable: {:#}", e);
    }

    log_info!("Ultimate RGB main() started");
    if let Some(log_path) = ultimate_rgb::logger::get_log_path() {
        log_info!("Log file: {}", log_path.display());
    }
    if stream_logs {
        log_info!("Streaming mode enabled via --stream-logs");
    } else {
        log_info!("Buffered mode - logs will be written to file on exit");
    }

    let store: Arc<dyn KeyValueStore> = match &state {
        Some(state) => {
            log_info!("State store: {}", state.app_data_dir().display());
            Arc::clone(state) as Arc<dyn KeyValueStore>
        }
        None => {
            if let Some(e) = &state_error {
                log_warn!("State store unavailable ({:#}); palette and settings will not be saved", e);
            }
            Arc::new(MemoryStore::new())
        }
    };

    let picker = Picker::new(
        store,
        PickerOptions {
            initial: settings.last_color.unwrap_or_default(),
            palette_capacity: settings.palette_capacity,
            copy_feedback: Duration::from_millis(settings.copy_feedback_ms),
        },
    );
    log_info!("Starting with {} ({} palette entries)", picker.display_hex(), picker.palette().len());

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Ultimate RGB")
            .with_inner_size(settings.window_size)
            .with_min_inner_size([720.0, 600.0])
            .with_icon(window_icon()),
        ..Default::default()
    };

    let state_for_gui = state.clone();
    let result = eframe::run_native(
        "Ultimate RGB",
        native_options,
        Box::new(move |cc| Ok(Box::new(gui::PickerGui::new(cc, picker, state_for_gui, settings)))),
    );

    if let Err(e) = result {
        log_warn!("GUI window error: {:?}", e);
    }
    log_info!("GUI window closed");

    if let Some(state) = state {
        if let Err(e) = state.flush() {
            log_warn!("Final state flush failed: {:#}", e);
        }
    }
    Ok(())
}

fn fallback_log_dir() -> PathBuf {
    default_app_data_dir()
        .map(|dir| dir.join("logs"))
        .unwrap_or_else(|_| temp_log_dir())
}

fn temp_log_dir() -> PathBuf {
    std::env::temp_dir().join("UltimateRGB").join("logs")
}

// A hue ring drawn at startup, so no icon file has to ship with the binary.
fn window_icon() -> egui::IconData {
    const SIZE: u32 = 32;
    let center = (SIZE as f32 - 1.0) / 2.0;
    let mut rgba = Vec::with_capacity((SIZE * SIZE * 4) as usize);

    for y in 0..SIZE {
        for x in 0..SIZE {
            let dx = x as f32 - center;
            let dy = y as f32 - center;
            let distance = (dx * dx + dy * dy).sqrt();
            if !(7.0..=15.5).contains(&distance) {
                rgba.extend_from_slice(&[0, 0, 0, 0]);
                continue;
            }
            let hue = dy.atan2(dx).to_degrees();
            let rgb = hsv_to_rgb(hue, 0.85, 1.0);
            rgba.extend_from_slice(&[rgb.r, rgb.g, rgb.b, 255]);
        }
    }

    egui::IconData {
        rgba,
        width: SIZE,
        height: SIZE,
    }
}
