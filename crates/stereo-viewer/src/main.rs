use std::path::PathBuf;

use anyhow::{Context, Result};

use stereo_engine::device::{GpuInit, StereoOutput};
use stereo_engine::logging::{init_logging, LoggingConfig};
use stereo_engine::settings::{restore_on_launch, ActivationKind, JsonFileSettings};
use stereo_engine::window::{Runtime, RuntimeConfig};

const DEFAULT_SETTINGS_FILE: &str = "stereo-viewer-settings.json";

/// Viewer options read from the environment.
#[derive(Debug, Clone)]
struct ViewerConfig {
    stereo_output: StereoOutput,
    stereo_monitor: Option<String>,
    settings_path: PathBuf,
    font_path: Option<PathBuf>,
    asset_dir: Option<PathBuf>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            stereo_output: StereoOutput::Mono,
            stereo_monitor: None,
            settings_path: PathBuf::from(DEFAULT_SETTINGS_FILE),
            font_path: None,
            asset_dir: None,
        }
    }
}

impl ViewerConfig {
    fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(value) = std::env::var("STEREO_OUTPUT") {
            match StereoOutput::parse(&value) {
                Some(output) => config.stereo_output = output,
                None => log::warn!("ignoring unknown STEREO_OUTPUT value {value:?}"),
            }
        }
        config.stereo_monitor = std::env::var("STEREO_MONITOR").ok().filter(|m| !m.trim().is_empty());
        if let Some(path) = std::env::var_os("STEREO_SETTINGS") {
            config.settings_path = PathBuf::from(path);
        }
        config.font_path = std::env::var_os("STEREO_FONT").map(PathBuf::from);
        config.asset_dir = std::env::var_os("STEREO_ASSETS").map(PathBuf::from);
        config
    }
}

fn run() -> Result<()> {
    let viewer = ViewerConfig::from_env();
    log::info!("stereo output: {:?}", viewer.stereo_output);

    let activation = ActivationKind::from_args(std::env::args().skip(1));

    let mut settings = JsonFileSettings::open(viewer.settings_path.clone())
        .with_context(|| format!("failed to open settings {}", viewer.settings_path.display()))?;
    let initial_exaggeration =
        restore_on_launch(&mut settings, activation).context("failed to start session")?;

    let config = RuntimeConfig {
        gpu_init: GpuInit {
            stereo_output: viewer.stereo_output,
            stereo_monitor: viewer.stereo_monitor,
            ..GpuInit::default()
        },
        font_path: viewer.font_path,
        asset_dir: viewer.asset_dir,
        initial_exaggeration,
        ..RuntimeConfig::default()
    };

    Runtime::run(config, Box::new(settings))
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    run().inspect_err(|e| log::error!("{e:#}"))
}
