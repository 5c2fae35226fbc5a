// CLI command implementations
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use mp4pcm::{
    box_tree, decode_bytes, inspect_bytes, is_mp4, mp4::DETECT_PREFIX_LEN, MetadataSummary, PcmBlock, PcmSink, Session,
    SessionConfig, SessionSink,
};
use serde_json::json;
use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;

use crate::cli::{OutputFormat, OutputFormatter};

/// Expand glob patterns; a pattern matching nothing is kept as a literal path
pub fn expand_files(patterns: &[String]) -> Result<Vec<String>> {
    let mut files = Vec::new();

    for pattern in patterns {
        if !(pattern.contains('*') || pattern.contains('?') || pattern.contains('[')) {
            files.push(pattern.clone());
            continue;
        }

        let before = files.len();
        for entry in glob::glob(pattern).with_context(|| format!("Invalid glob pattern: {}", pattern))? {
            match entry {
                Ok(path) if path.is_file() => files.push(path.to_string_lossy().into_owned()),
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "unreadable glob entry"),
            }
        }
        if files.len() == before {
            files.push(pattern.clone());
        }
    }

    Ok(files)
}

fn read_file(path: &str, session: &SessionConfig) -> Result<Vec<u8>> {
    let size = std::fs::metadata(path)
        .with_context(|| format!("File not found: {}", path))?
        .len();
    if size > session.max_buffer_bytes as u64 {
        bail!(
            "{} is {} bytes, larger than the {} byte ingest capacity",
            path,
            size,
            session.max_buffer_bytes
        );
    }
    std::fs::read(path).with_context(|| format!("Failed to read {}", path))
}

/// Read only the leading bytes `is_mp4` looks at
fn read_prefix(path: &str) -> Result<Vec<u8>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path))?;
    let mut prefix = Vec::with_capacity(DETECT_PREFIX_LEN);
    file.take(DETECT_PREFIX_LEN as u64)
        .read_to_end(&mut prefix)
        .with_context(|| format!("Failed to read {}", path))?;
    Ok(prefix)
}

fn modified_time(path: &str) -> Option<String> {
    let modified = std::fs::metadata(path).ok()?.modified().ok()?;
    let date: DateTime<Utc> = modified.into();
    Some(date.format("%Y-%m-%d %H:%M:%S UTC").to_string())
}

/// Show metadata for each file, with decode statistics when `decode` is set
pub fn command_info(files: &[String], decode: bool, session: &SessionConfig, formatter: &OutputFormatter) -> Result<()> {
    let files = expand_files(files)?;
    let stdout = io::stdout();
    let mut writer = stdout.lock();
    let mut failures = 0;

    for file_path in &files {
        let bytes = match read_file(file_path, session) {
            Ok(bytes) => bytes,
            Err(e) => {
                formatter.print_error(&format!("{:#}", e));
                failures += 1;
                continue;
            }
        };

        let result = if decode {
            decode_bytes(&bytes, session.clone())
        } else {
            inspect_bytes(&bytes, session.clone())
        };

        match result {
            Ok((sink, report)) => {
                let value = json!({
                    "file": file_path,
                    "size": bytes.len(),
                    "modified": modified_time(file_path),
                    "is_mp4": is_mp4(&bytes),
                    "metadata": sink.metadata,
                    "report": report,
                    "diagnostics": sink.diagnostics,
                });
                formatter.output_value(&value, &mut writer)?;
            }
            Err(e) => {
                formatter.print_error(&format!("{}: {}", file_path, e));
                failures += 1;
            }
        }
    }

    if failures > 0 {
        bail!("{} of {} files failed", failures, files.len());
    }
    Ok(())
}

/// Writes PCM blocks as raw s16le to a writer
struct PcmFileSink<W: Write> {
    writer: W,
    frames: u64,
    samples: u64,
    channel_count: Option<u16>,
    metadata: Option<MetadataSummary>,
    error: Option<io::Error>,
}

impl<W: Write> PcmFileSink<W> {
    fn new(writer: W) -> Self {
        PcmFileSink {
            writer,
            frames: 0,
            samples: 0,
            channel_count: None,
            metadata: None,
            error: None,
        }
    }
}

impl<W: Write> PcmSink for PcmFileSink<W> {
    fn on_pcm(&mut self, _sequence: u64, block: PcmBlock) {
        if self.error.is_some() {
            return;
        }
        if let Err(e) = self.writer.write_all(&block.to_le_bytes()) {
            self.error = Some(e);
            return;
        }
        self.frames += 1;
        self.samples += block.sample_count as u64;
        self.channel_count = Some(block.channel_count);
    }
}

impl<W: Write> SessionSink for PcmFileSink<W> {
    fn on_metadata(&mut self, metadata: &MetadataSummary) {
        self.metadata = Some(metadata.clone());
    }
}

/// Decode one file to raw PCM
pub fn command_decode(file: &str, output: &str, session: &SessionConfig, formatter: &OutputFormatter) -> Result<()> {
    let bytes = read_file(file, session)?;

    let mut decoder = Session::new(session.clone())?;
    decoder.append(&bytes)?;

    let out = File::create(output).with_context(|| format!("Failed to create {}", output))?;
    let mut sink = PcmFileSink::new(BufWriter::new(out));
    let report = decoder
        .parse(&mut sink)
        .with_context(|| format!("Decoding {} failed", file))?;

    if let Some(e) = sink.error.take() {
        return Err(e).with_context(|| format!("Failed to write {}", output));
    }
    sink.writer.flush().with_context(|| format!("Failed to write {}", output))?;

    formatter.print_success(&format!(
        "Decoded {} frames ({} samples per channel) from {} to {}",
        sink.frames, sink.samples, file, output
    ));
    if let Some(channels) = sink.channel_count {
        let rate = sink.metadata.as_ref().and_then(|m| m.sample_rate);
        formatter.print_info(&format!(
            "Format: s16le, {} channel(s), {} Hz",
            channels,
            rate.map_or_else(|| "unknown".to_string(), |r| r.to_string())
        ));
    }
    if report.frames_failed > 0 || report.resync_skips > 0 {
        formatter.print_info(&format!(
            "Skipped {} undecodable frames, {} resync bytes",
            report.frames_failed, report.resync_skips
        ));
    }

    Ok(())
}

/// Print the box tree of one file
pub fn command_boxes(file: &str, session: &SessionConfig, formatter: &OutputFormatter, format: OutputFormat) -> Result<()> {
    let bytes = read_file(file, session)?;
    let (nodes, error) = box_tree(&bytes, session.max_box_depth);

    match format {
        OutputFormat::Pretty | OutputFormat::Json => {
            let boxes: Vec<_> = nodes
                .iter()
                .map(|node| {
                    json!({
                        "type": node.header.type_name(),
                        "offset": node.offset,
                        "size": node.header.size(),
                        "header_length": node.header.header_length,
                        "depth": node.depth,
                    })
                })
                .collect();
            let value = json!({
                "file": file,
                "boxes": boxes,
                "error": error.as_ref().map(|e| e.to_string()),
            });
            formatter.output_value(&value, &mut io::stdout().lock())?;
        }
        OutputFormat::KeyValue | OutputFormat::Table => {
            let stdout = io::stdout();
            let mut writer = stdout.lock();
            for node in &nodes {
                writeln!(
                    writer,
                    "{}{} @{} ({} bytes)",
                    "  ".repeat(node.depth),
                    node.header.type_name(),
                    node.offset,
                    node.header.size()
                )?;
            }
            if let Some(e) = &error {
                formatter.print_error(&e.to_string());
            }
        }
    }

    Ok(())
}

/// Report which files are MP4 containers
pub fn command_detect(files: &[String], formatter: &OutputFormatter) -> Result<()> {
    for file_path in expand_files(files)? {
        if !Path::new(&file_path).exists() {
            formatter.print_error(&format!("File not found: {}", file_path));
            continue;
        }

        match read_prefix(&file_path) {
            Ok(bytes) if is_mp4(&bytes) => formatter.print_info(&format!("{}: mp4", file_path)),
            Ok(_) => formatter.print_info(&format!("{}: unknown", file_path)),
            Err(e) => formatter.print_error(&format!("{:#}", e)),
        }
    }

    Ok(())
}
