// CLI binary entry point for mp4pcm
//
// This is the main entry point for the mp4pcm command-line tool.

mod cli;

use clap::Parser;
use std::process;
use tracing_subscriber::{filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use cli::commands::{command_boxes, command_decode, command_detect, command_info};
use cli::{Commands, Config, OutputFormatter};

fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.default_log_filter()));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    // A second init (tests, embedding) is harmless
    let _ = tracing_subscriber::registry().with(filter).with(fmt_layer).try_init();
}

fn run(config: &Config) -> anyhow::Result<()> {
    let session = config.session_config()?;
    let formatter = OutputFormatter::new(config.format, config.quiet);

    match &config.command {
        Commands::Info { files, decode } => command_info(files, *decode, &session, &formatter),
        Commands::Decode { file, output } => command_decode(file, output, &session, &formatter),
        Commands::Boxes { file } => command_boxes(file, &session, &formatter, config.format),
        Commands::Detect { files } => command_detect(files, &formatter),
    }
}

fn main() {
    let config = Config::parse();
    init_logging(&config);

    if let Err(e) = run(&config) {
        eprintln!("✗ {:#}", e);
        process::exit(1);
    }
}
