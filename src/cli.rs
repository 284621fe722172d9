use std::path::PathBuf;

use clap::Parser;

/// Command-line arguments for rondo
#[derive(Parser, Debug)]
#[command(name = "rondo")]
#[command(about = "Terminal music player for a local folder")]
#[command(version)]
pub struct Args {
    /// Music folder to scan (defaults to the current directory)
    #[arg(env = "RONDO_DIR")]
    pub dir: Option<PathBuf>,

    /// Start playing this file once the library is loaded
    #[arg(short, long, value_name = "FILE")]
    pub open: Option<PathBuf>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    pub dump_config: bool,
}
