//! Kinetic
//!
//! Headless landing page host: mounts the page's effects, plays a scripted
//! visit against them, and prints textual frames.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;
mod opaque;
mod page;
mod script;

use config::PageConfig;
use page::LandingPage;
use script::{RunOptions, Script};

#[derive(Parser)]
#[command(name = "kinetic")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Kinetic landing page host", long_about = None)]
struct Cli {
    /// Page configuration (TOML); the stock page when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Frames per second
    #[arg(long, default_value = "60")]
    fps: u32,

    /// Length of the visit in seconds
    #[arg(short, long, default_value = "12")]
    seconds: f32,

    /// Print a frame every N frames (0 prints only the last frame)
    #[arg(short, long, default_value = "30")]
    print_every: u64,

    /// Visit as a touch screen: the hero grid toggles on tap
    #[arg(long)]
    touch: bool,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    dump_config: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let mut config = PageConfig::load_or_default(cli.config.as_deref())?;
    config.hero_grid.touch |= cli.touch;
    if cli.dump_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    match &cli.config {
        Some(path) => info!("Loaded page from {}", path.display()),
        None => info!("Using the stock page"),
    }

    let mut page = LandingPage::new(&config);
    let script = Script::from_config(&config.script, config.hero_grid.touch);
    info!("Playing {} scripted actions", script.len());

    let options = RunOptions {
        fps: cli.fps,
        seconds: cli.seconds,
    };
    let print_every = cli.print_every;
    let mut last = String::new();

    let frames = script::drive(&mut page, script, options, |frame, page| {
        if print_every > 0 && frame % print_every == 0 {
            println!("{}", page.render());
        } else if print_every == 0 {
            last = page.render();
        }
    })?;

    if print_every == 0 {
        println!("{last}");
    }
    info!(
        "Played {} frames ({:.1}s), onboarding completed {} time(s)",
        frames,
        page.now_ms() / 1000.0,
        page.onboarding_completions()
    );

    Ok(())
}
