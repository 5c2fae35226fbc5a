// CLI module for mp4pcm
//
// Argument parsing, subcommands and report formatting for the binary. The
// library itself never depends on anything in here.

pub mod commands;
pub mod config;
pub mod output;

pub use config::{Commands, Config, OutputFormat};
pub use output::OutputFormatter;
