// Decode session
//
// A session owns the ingest buffer, the metadata record and the decoder
// state for one file at a time. `parse()` runs two passes over the buffered
// bytes:
//
// 1. walk the box tree, filling the metadata record and remembering where
//    the first mdat box starts
// 2. restart a walker at that offset, synchronize ADTS frames inside the
//    mdat payload and decode each one to PCM
//
// Sessions are single-writer by contract; call `reset()` between files.

use serde::Serialize;
use tracing::{info, warn};

use crate::adts::FrameSynchronizer;
use crate::config::SessionConfig;
use crate::decoder::FrameDecoder;
use crate::error::Result;
use crate::ingest::IngestBuffer;
use crate::mp4::{walk_tree, BoxRecord, BoxWalker, MetadataExtractor, MetadataRecord, MetadataSummary};
use crate::pcm::{PcmBlock, PcmEmitter, PcmSink};

/// Callbacks a collaborator provides to a parse
pub trait SessionSink: PcmSink {
    /// Called exactly once per `parse()`, before any PCM
    fn on_metadata(&mut self, metadata: &MetadataSummary);

    /// Free-text progress and error notes
    fn on_diagnostic(&mut self, _message: &str) {}
}

/// Outcome of one `parse()`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParseReport {
    pub frames_emitted: u64,
    /// Frames found but not decodable (skipped, not emitted)
    pub frames_failed: u64,
    pub resync_skips: usize,
    pub false_syncs: usize,
    pub budget_exhausted: bool,
    pub mdat_found: bool,
    /// Description of the box that stopped the metadata walk, if any
    pub malformed: Option<String>,
}

/// One file's worth of decode state
#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    buffer: IngestBuffer,
    metadata: MetadataRecord,
    decoder: FrameDecoder,
}

impl Session {
    pub fn new(config: SessionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Session {
            buffer: IngestBuffer::new(config.max_buffer_bytes),
            config,
            metadata: MetadataRecord::default(),
            decoder: FrameDecoder::new(),
        })
    }

    /// Buffer another chunk of the file
    pub fn append(&mut self, bytes: &[u8]) -> Result<()> {
        self.buffer.append(bytes).map_err(|e| {
            warn!(error = %e, "append rejected");
            e
        })
    }

    /// Empty the buffer and forget all per-file state
    pub fn reset(&mut self) {
        self.buffer.reset();
        self.metadata = MetadataRecord::default();
        self.decoder.reset();
    }

    pub fn bytes_used(&self) -> usize {
        self.buffer.len()
    }

    /// Metadata from the most recent `parse()`
    pub fn metadata(&self) -> &MetadataRecord {
        &self.metadata
    }

    /// Run the metadata pass only: walk the box tree and deliver metadata.
    ///
    /// No frame is synchronized or decoded, so the report's frame counters
    /// stay zero.
    pub fn inspect<S: SessionSink + ?Sized>(&mut self, sink: &mut S) -> ParseReport {
        let mut report = ParseReport::default();
        report.mdat_found = self.metadata_pass(sink, &mut report).is_some();
        report
    }

    /// Pass 1. Returns the first mdat box, if the walk reached one.
    fn metadata_pass<S: SessionSink + ?Sized>(&mut self, sink: &mut S, report: &mut ParseReport) -> Option<BoxRecord> {
        let data = self.buffer.as_slice();
        let mut extractor = MetadataExtractor::new();
        if let Err(e) = walk_tree(data, 0..data.len(), self.config.max_box_depth, &mut extractor) {
            diagnostic(sink, &format!("box walk stopped: {}", e));
            report.malformed = Some(e.to_string());
        }
        extractor.finish(data.len());
        for note in extractor.diagnostics.drain(..) {
            diagnostic(sink, &note);
        }

        self.metadata = extractor.record;
        sink.on_metadata(&self.metadata.summary());
        extractor.mdat
    }

    /// Run both passes over the buffered bytes.
    ///
    /// Malformed boxes, false syncs and undecodable frames are reported
    /// through the sink and the report; only `NoProgress` ends the parse
    /// with an error.
    pub fn parse<S: SessionSink + ?Sized>(&mut self, sink: &mut S) -> Result<ParseReport> {
        let mut report = ParseReport::default();
        let mdat = self.metadata_pass(sink, &mut report);

        // Pass 2: frames
        self.decoder.reset();
        let Some(mdat) = mdat else {
            diagnostic(sink, "no media data box found");
            return Ok(report);
        };
        report.mdat_found = true;

        let data = self.buffer.as_slice();
        let payload = match BoxWalker::with_range(data, mdat.offset..data.len()).next() {
            Some(Ok(record)) if record == mdat => record.payload_range(),
            _ => {
                let note = format!("media data box at offset {} could not be re-read", mdat.offset);
                diagnostic(sink, &note);
                return Ok(report);
            }
        };

        let fallback_channels = self.metadata.channel_count;
        let mut emitter = PcmEmitter::new(sink);
        let mut synchronizer = FrameSynchronizer::new(data, payload, &self.config);
        let mut fatal = None;

        for frame in synchronizer.by_ref() {
            let frame = match frame {
                Ok(frame) => frame,
                Err(e) => {
                    fatal = Some(e);
                    break;
                }
            };

            match self.decoder.decode(&frame.header, &data[frame.payload_range()], fallback_channels) {
                Ok(block) => emitter.emit(block),
                Err(e) => {
                    report.frames_failed += 1;
                    warn!(offset = frame.offset, error = %e, "skipping frame");
                    emitter
                        .sink_mut()
                        .on_diagnostic(&format!("frame at offset {} skipped: {}", frame.offset, e));
                }
            }
        }

        report.frames_emitted = emitter.emitted();
        let stats = synchronizer.stats();
        report.resync_skips = stats.resync_skips;
        report.false_syncs = stats.false_syncs;
        report.budget_exhausted = stats.budget_exhausted;

        if let Some(e) = fatal {
            diagnostic(emitter.into_sink(), &format!("decode aborted: {}", e));
            return Err(e);
        }

        if report.budget_exhausted {
            diagnostic(emitter.into_sink(), "scan budget exhausted before the end of media data");
        }

        info!(
            frames = report.frames_emitted,
            failed = report.frames_failed,
            resync_skips = report.resync_skips,
            "parse complete"
        );
        Ok(report)
    }
}

/// Log a diagnostic and forward it to the sink
fn diagnostic<S: SessionSink + ?Sized>(sink: &mut S, message: &str) {
    warn!("{}", message);
    sink.on_diagnostic(message);
}

/// Sink that keeps everything it is given
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub metadata: Option<MetadataSummary>,
    pub blocks: Vec<(u64, PcmBlock)>,
    pub diagnostics: Vec<String>,
}

impl PcmSink for CollectingSink {
    fn on_pcm(&mut self, sequence: u64, block: PcmBlock) {
        self.blocks.push((sequence, block));
    }
}

impl SessionSink for CollectingSink {
    fn on_metadata(&mut self, metadata: &MetadataSummary) {
        self.metadata = Some(metadata.clone());
    }

    fn on_diagnostic(&mut self, message: &str) {
        self.diagnostics.push(message.to_string());
    }
}

/// Read the metadata of a whole in-memory file without decoding it
pub fn inspect_bytes(bytes: &[u8], config: SessionConfig) -> Result<(CollectingSink, ParseReport)> {
    let mut session = Session::new(config)?;
    session.append(bytes)?;
    let mut sink = CollectingSink::default();
    let report = session.inspect(&mut sink);
    Ok((sink, report))
}

/// Decode a whole in-memory file in one call
pub fn decode_bytes(bytes: &[u8], config: SessionConfig) -> Result<(CollectingSink, ParseReport)> {
    let mut session = Session::new(config)?;
    session.append(bytes)?;
    let mut sink = CollectingSink::default();
    let report = session.parse(&mut sink)?;
    Ok((sink, report))
}
