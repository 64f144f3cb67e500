// CLI module for imgdesc
// Author: kelexine (https://github.com/kelexine)

use crate::config::RuntimeMode;
use clap::Parser;
use std::path::PathBuf;

/// imgdesc - Image description gateway backed by Vertex AI Gemini
#[derive(Parser, Debug)]
#[command(name = "imgdesc", version, about, long_about = None)]
pub struct Args {
    /// Path to a TOML config file (default: ~/.imgdesc/config.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Wiring to start with (overrides APP_ENV)
    #[arg(long, value_enum)]
    pub mode: Option<RuntimeMode>,

    /// Port to listen on (overrides PORT)
    #[arg(short, long)]
    pub port: Option<u16>,
}
