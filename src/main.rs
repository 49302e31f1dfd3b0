// SPDX-License-Identifier: GPL-3.0-only

use camera_capture::config::Config;
use clap::{Parser, Subcommand};
use std::fs::{File, OpenOptions};

mod cli;

/// Log file used while the terminal page owns the screen
const TERMINAL_LOG_FILE: &str = "terminal.log";

#[derive(Parser)]
#[command(name = "camera-capture")]
#[command(about = "Capture a photo or a short video and upload it to a media server")]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    /// Media server base URL, e.g. http://127.0.0.1:8000
    #[arg(long, global = true)]
    server: Option<String>,

    /// Use synthetic camera and microphone sources
    #[arg(long, global = true)]
    test_source: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the capture page in the terminal (default)
    Terminal,

    /// Take a photo and upload it
    Photo,

    /// Record a video and upload it
    Video {
        /// Recording duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },

    /// Show the effective configuration
    Config,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Terminal);

    init_logging(matches!(command, Commands::Terminal));

    let mut config = Config::load();
    if let Some(server) = cli.server {
        config.server_url = server;
    }
    if cli.test_source {
        config.use_test_sources();
    }

    match command {
        Commands::Terminal => camera_capture::terminal::run(config),
        Commands::Photo => cli::take_photo(config),
        Commands::Video { duration } => cli::record_video(config, duration),
        Commands::Config => cli::show_config(&config),
    }
}

// Set RUST_LOG to control the log level, e.g. RUST_LOG=camera_capture=debug
fn init_logging(terminal_mode: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true);

    if !terminal_mode {
        builder.init();
        return;
    }

    // Writing to stderr would tear the terminal page apart
    if let Some(file) = open_log_file() {
        builder
            .with_ansi(false)
            .with_writer(std::sync::Mutex::new(file))
            .init();
    }
}

fn open_log_file() -> Option<File> {
    let dir = dirs::cache_dir()?.join("camera-capture");
    std::fs::create_dir_all(&dir).ok()?;
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join(TERMINAL_LOG_FILE))
        .ok()
}
