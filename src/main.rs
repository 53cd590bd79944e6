//! gridwidget - Headless host bridge for power-grid diagram widgets
//!
//! This is the binary entry point. All logic lives in the library.

use std::path::{Path, PathBuf};

use clap::Parser;
use color_eyre::eyre::{eyre, WrapErr};
use serde_json::{Map, Value};

use gridwidget::WidgetMode;
use gridwidget_app::config::{load_settings, load_settings_file};
use gridwidget_app::Settings;
use tracing::warn;

/// gridwidget - Headless host bridge for power-grid diagram widgets
#[derive(Parser, Debug)]
#[command(name = "gridwidget")]
#[command(about = "Run a diagram widget over NDJSON on stdin/stdout", long_about = None)]
struct Args {
    /// Widget to host: nad, sld or map
    #[arg(long, default_value = "nad")]
    kind: String,

    /// Settings file (defaults to <dir>/.gridwidget/config.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Directory searched for .gridwidget/config.toml
    #[arg(long, value_name = "DIR")]
    dir: Option<PathBuf>,

    /// JSON object with the initial widget state
    #[arg(long, value_name = "PATH")]
    state: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    if let Err(e) = gridwidget_core::logging::init() {
        if e.is_fatal() {
            return Err(e.into());
        }
        eprintln!("gridwidget: running without a log file: {}", e);
    }

    let mode: WidgetMode = args.kind.parse()?;

    let settings = match &args.config {
        Some(path) => match load_settings_file(path) {
            Ok(settings) => settings,
            Err(e) if e.is_fatal() => return Err(e.into()),
            Err(e) => {
                warn!("{}, using default settings", e);
                Settings::default()
            }
        },
        None => {
            let dir = args
                .dir
                .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
            load_settings(&dir)
        }
    };

    let initial = match &args.state {
        Some(path) => read_initial_state(path)?,
        None => Map::new(),
    };

    gridwidget::run_headless(mode, settings, initial).await?;
    Ok(())
}

fn read_initial_state(path: &Path) -> color_eyre::Result<Map<String, Value>> {
    let raw = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("reading initial state {}", path.display()))?;
    match serde_json::from_str(&raw)? {
        Value::Object(values) => Ok(values),
        other => Err(eyre!(
            "initial state must be a JSON object, got {}",
            other
        )),
    }
}
