// Session configuration
//
// Every bound here exists to cap worst-case work or memory on adversarial
// input. All fields default, so a partial JSON document is a valid config.

use crate::adts::ADTS_HEADER_SIZE;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Limits for one decode session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Capacity of the ingest buffer in bytes.
    ///
    /// Default: 64 MiB.
    #[serde(default = "default_max_buffer_bytes")]
    pub max_buffer_bytes: usize,

    /// Deepest container nesting the walker will descend into.
    ///
    /// Default: 16.
    #[serde(default = "default_max_box_depth")]
    pub max_box_depth: usize,

    /// Total single-byte resync skips allowed per decode pass.
    ///
    /// Default: 1 MiB.
    #[serde(default = "default_resync_budget")]
    pub resync_budget: usize,

    /// Maximum number of frames synchronized per file.
    ///
    /// Default: 1,000,000.
    #[serde(default = "default_max_frames")]
    pub max_frames: usize,

    /// Largest frame length (header included) accepted as a real frame.
    ///
    /// Default: 6144 bytes.
    #[serde(default = "default_max_frame_length")]
    pub max_frame_length: usize,
}

fn default_max_buffer_bytes() -> usize {
    64 * 1024 * 1024
}

fn default_max_box_depth() -> usize {
    16
}

fn default_resync_budget() -> usize {
    1024 * 1024
}

fn default_max_frames() -> usize {
    1_000_000
}

fn default_max_frame_length() -> usize {
    6144
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_buffer_bytes: default_max_buffer_bytes(),
            max_box_depth: default_max_box_depth(),
            resync_budget: default_resync_budget(),
            max_frames: default_max_frames(),
            max_frame_length: default_max_frame_length(),
        }
    }
}

impl SessionConfig {
    /// Parse a configuration from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: SessionConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.max_buffer_bytes == 0 {
            return Err(Error::Config("max_buffer_bytes must be > 0".to_string()));
        }

        if self.max_box_depth == 0 {
            return Err(Error::Config("max_box_depth must be > 0".to_string()));
        }

        if self.resync_budget == 0 {
            return Err(Error::Config("resync_budget must be > 0".to_string()));
        }

        if self.max_frames == 0 {
            return Err(Error::Config("max_frames must be > 0".to_string()));
        }

        if self.max_frame_length < ADTS_HEADER_SIZE {
            return Err(Error::Config(format!(
                "max_frame_length must be at least {} bytes",
                ADTS_HEADER_SIZE
            )));
        }

        Ok(())
    }
}
