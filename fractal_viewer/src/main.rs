//! Fractal viewer
//!
//! Opens a window and raymarches the selected distance field every frame.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use vk_fractal::config::{Config, ViewerConfig};
use vk_fractal::foundation::logging;
use vk_fractal::ViewerApp;

/// Live Vulkan raymarched fractal viewer
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Configuration file (.toml or .ron)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Frames in flight (1-8)
    #[arg(short, long)]
    frames_in_flight: Option<usize>,

    /// Disable Vulkan validation layers
    #[arg(long)]
    no_validation: bool,

    /// Directory holding the compiled SPIR-V shaders
    #[arg(long)]
    shader_dir: Option<String>,
}

fn load_config(args: &Args) -> anyhow::Result<ViewerConfig> {
    let mut config = match &args.config {
        Some(path) => ViewerConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => ViewerConfig::default(),
    };

    if let Some(frames) = args.frames_in_flight {
        config = config.with_frames_in_flight(frames);
    }
    if args.no_validation {
        config = config.with_validation(false);
    }
    if let Some(dir) = &args.shader_dir {
        config = config.with_shader_dir(dir.clone());
    }
    Ok(config)
}

fn run(args: &Args) -> anyhow::Result<()> {
    let config = load_config(args)?;
    logging::init(&config.log_level);

    let mut app = ViewerApp::new(&config)?;
    let stats = app.run()?;
    log::info!(
        "Exited after {} presented frames ({} skipped, {} deferred, {} surface rebuilds)",
        stats.presented,
        stats.skipped,
        stats.deferred,
        stats.recreations
    );
    Ok(())
}

fn main() {
    let args = Args::parse();
    if let Err(e) = run(&args) {
        eprintln!("Fatal: {e:#}");
        std::process::exit(1);
    }
}
