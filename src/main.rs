use clap::Parser;
use tracing::{info, warn};

mod app;
mod cli;
mod config;
mod engine;
mod library;
mod logging;
mod mpris;
mod notification;
mod runtime;
mod session;
mod ui;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = cli::Args::parse();
    let (settings, config_warning) = runtime::load_settings();

    if args.dump_config {
        if let Some(w) = &config_warning {
            eprintln!("rondo: {w}");
        }
        print!("{}", settings.to_toml()?);
        return Ok(());
    }

    match logging::init(&settings.logging) {
        Ok(path) => info!(log = %path.display(), "logging initialized"),
        // Keep going without a log; the player itself is unaffected.
        Err(e) => eprintln!("rondo: logging disabled: {e}"),
    }
    if let Some(w) = config_warning {
        warn!("{w}");
    }

    runtime::run(args, settings)
}
