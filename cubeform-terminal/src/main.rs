//! cubeform - transform a cube from the keyboard, drawn in the terminal.
//!
//! Controls:
//!   - Left/Right: rotate about the world Y axis
//!   - Up/Down: rotate about world X (Shift: world Z)
//!   - W/S: move along local Y (Shift: local Z)
//!   - A/D: move along local X
//!   - +/-: scale uniformly; hold X, Y or Z to scale one axis
//!   - R: reset, F: toggle solid faces, Q/Esc: quit

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use cubeform_terminal::{load_config, Config, ProjectionMode, TerminalApp};
use env_logger::{Builder, Env, Target};

#[derive(Parser)]
#[command(name = "cubeform")]
#[command(about = "Scale, rotate and move a cube in the terminal")]
#[command(version)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Target frames per second (overrides the config file).
    #[arg(long)]
    fps: Option<u32>,
    /// Start with filled faces.
    #[arg(long)]
    solid: bool,
    /// Use an orthographic camera.
    #[arg(long)]
    ortho: bool,
    /// Write logs to this file instead of stderr.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn init_logging(log_file: Option<&Path>) -> anyhow::Result<()> {
    let mut builder = match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create log file {}", path.display()))?;
            let mut builder = Builder::from_env(Env::default().default_filter_or("info"));
            builder.target(Target::Pipe(Box::new(file)));
            builder
        }
        // The picture owns the terminal, keep stderr quiet by default
        None => Builder::from_env(Env::default().default_filter_or("warn")),
    };
    builder.init();
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(fps) = cli.fps {
        config.display.fps = fps;
    }
    if cli.solid {
        config.display.solid = true;
    }
    if cli.ortho {
        config.display.projection = ProjectionMode::Orthographic;
    }
    if cli.log_file.is_some() {
        config.log_file = cli.log_file.clone();
    }
    config.validate().context("invalid settings")?;

    init_logging(config.log_file.as_deref())?;
    log::info!("starting with {:?}", config);

    let mut app = TerminalApp::new(&config).context("failed to query terminal size")?;
    app.run().context("terminal renderer failed")?;

    log::info!("exited cleanly");
    Ok(())
}
