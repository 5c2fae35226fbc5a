// CLI configuration
use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use mp4pcm::SessionConfig;

/// mp4pcm - MP4 audio to PCM CLI tool
#[derive(Parser, Debug)]
#[command(name = "mp4pcm")]
#[command(about = "Inspect MP4/M4A audio files and decode their ADTS stream to 16-bit PCM", long_about = None)]
#[command(version)]
#[command(author = "xwsjjctz <xwsjjctz@icloud.com>")]
pub struct Config {
    /// Output format
    #[arg(short, long, value_enum, default_value = "pretty", global = true)]
    pub format: OutputFormat,

    /// Quiet mode (suppress progress messages)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Session limits from a JSON file
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<String>,

    /// Override the ingest buffer capacity (bytes)
    #[arg(long, global = true)]
    pub max_buffer_bytes: Option<usize>,

    /// Override the resync byte budget
    #[arg(long, global = true)]
    pub resync_budget: Option<usize>,

    /// Override the frame budget
    #[arg(long, global = true)]
    pub max_frames: Option<usize>,

    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON
    #[default]
    Pretty,
    /// Compact JSON
    Json,
    /// Key-value pairs
    KeyValue,
    /// Table format
    Table,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show container metadata, plus decode statistics with --decode
    Info {
        /// File paths or glob patterns
        #[arg(value_name = "FILE", required = true)]
        files: Vec<String>,

        /// Also decode every frame and report decode statistics
        #[arg(short, long)]
        decode: bool,
    },

    /// Decode to raw signed 16-bit little-endian interleaved PCM
    Decode {
        /// Input MP4/M4A file
        #[arg(value_name = "FILE")]
        file: String,

        /// Output PCM file
        #[arg(short, long)]
        output: String,
    },

    /// List the box tree
    Boxes {
        /// Input MP4/M4A file
        #[arg(value_name = "FILE")]
        file: String,
    },

    /// Detect whether files are MP4 containers
    Detect {
        /// File paths or glob patterns
        #[arg(value_name = "FILE", required = true)]
        files: Vec<String>,
    },
}

impl Config {
    /// Session limits: defaults, then the JSON file, then flag overrides
    pub fn session_config(&self) -> Result<SessionConfig> {
        let mut session = match &self.config {
            Some(path) => SessionConfig::from_file(path)
                .with_context(|| format!("Failed to load config {}", path))?,
            None => SessionConfig::default(),
        };

        if let Some(bytes) = self.max_buffer_bytes {
            session.max_buffer_bytes = bytes;
        }
        if let Some(budget) = self.resync_budget {
            session.resync_budget = budget;
        }
        if let Some(frames) = self.max_frames {
            session.max_frames = frames;
        }

        session.validate().context("Invalid session limits")?;
        Ok(session)
    }

    /// Log filter used when RUST_LOG is not set
    pub fn default_log_filter(&self) -> &'static str {
        if self.verbose {
            "mp4pcm=debug"
        } else {
            "warn"
        }
    }
}
