// ADTS frame synchronization
//
// Walks a byte range (the mdat payload) frame by frame. A candidate offset
// either holds a plausible header, in which case the scan jumps by the
// declared frame length, or it doesn't and the scan slides forward one byte.
// Both kinds of movement are budgeted so corrupt input always terminates.

use std::ops::Range;

use tracing::{debug, warn};

use super::{FrameHeader, ADTS_HEADER_SIZE};
use crate::config::SessionConfig;
use crate::error::{Error, Result};

/// A frame located in the input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncedFrame {
    pub offset: usize,
    pub header: FrameHeader,
    /// End of the bytes actually present; short of the declared end when the
    /// final frame is cut off by the end of the range
    pub available_end: usize,
}

impl SyncedFrame {
    /// Declared frame range, header included
    pub fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.header.frame_length_bytes
    }

    /// Payload bytes present in the input (header stripped)
    pub fn payload_range(&self) -> Range<usize> {
        let start = (self.offset + self.header.header_length_bytes).min(self.available_end);
        start..self.available_end
    }

    pub fn is_truncated(&self) -> bool {
        self.available_end < self.offset + self.header.frame_length_bytes
    }
}

/// Counters describing one scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    pub frames: usize,
    /// Single-byte advances, for any reason
    pub resync_skips: usize,
    /// Sync patterns rejected because of an implausible frame length
    pub false_syncs: usize,
    /// Set when the resync or frame budget stopped the scan early
    pub budget_exhausted: bool,
}

/// Lazy sequence of ADTS frames in a byte range
///
/// Yields `Ok` frames in input order. The only error it yields is
/// `NoProgress`, after which it is finished.
#[derive(Debug)]
pub struct FrameSynchronizer<'a> {
    data: &'a [u8],
    pos: usize,
    end: usize,
    max_frame_length: usize,
    resync_budget: usize,
    max_frames: usize,
    stats: SyncStats,
    done: bool,
}

impl<'a> FrameSynchronizer<'a> {
    pub fn new(data: &'a [u8], range: Range<usize>, config: &SessionConfig) -> Self {
        FrameSynchronizer {
            data,
            pos: range.start,
            end: range.end.min(data.len()),
            max_frame_length: config.max_frame_length,
            resync_budget: config.resync_budget,
            max_frames: config.max_frames,
            stats: SyncStats::default(),
            done: false,
        }
    }

    pub fn stats(&self) -> SyncStats {
        self.stats
    }

    /// Offset of the next candidate
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Check the candidate at `pos`
    fn candidate_at(&self, pos: usize) -> Result<FrameHeader> {
        let header = FrameHeader::parse(&self.data[..self.end], pos)?;
        let length = header.frame_length_bytes;
        if length < header.header_length_bytes || length > self.max_frame_length {
            return Err(Error::FrameLengthOutOfRange { offset: pos, length });
        }
        Ok(header)
    }

    /// Advance one byte, or stop if the resync budget is spent
    fn skip_byte(&mut self) -> bool {
        if self.stats.resync_skips >= self.resync_budget {
            warn!(
                offset = self.pos,
                budget = self.resync_budget,
                "resync budget exhausted, stopping frame scan"
            );
            self.stats.budget_exhausted = true;
            self.done = true;
            return false;
        }
        self.stats.resync_skips += 1;
        self.pos += 1;
        true
    }
}

impl<'a> Iterator for FrameSynchronizer<'a> {
    type Item = Result<SyncedFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            if self.stats.frames >= self.max_frames {
                warn!(max_frames = self.max_frames, "frame budget reached, stopping frame scan");
                self.stats.budget_exhausted = true;
                self.done = true;
                break;
            }

            if self.end.saturating_sub(self.pos) < ADTS_HEADER_SIZE {
                self.done = true;
                break;
            }

            let header = match self.candidate_at(self.pos) {
                Ok(header) => header,
                Err(err @ Error::FrameLengthOutOfRange { .. }) => {
                    debug!(%err, "rejecting false sync");
                    self.stats.false_syncs += 1;
                    if !self.skip_byte() {
                        break;
                    }
                    continue;
                }
                Err(Error::NoSyncFound { .. }) => {
                    if !self.skip_byte() {
                        break;
                    }
                    continue;
                }
                Err(err) => {
                    self.done = true;
                    return Some(Err(err));
                }
            };

            let offset = self.pos;
            let next = match offset.checked_add(header.frame_length_bytes) {
                Some(next) if next > offset => next,
                _ => {
                    self.done = true;
                    return Some(Err(Error::NoProgress { offset }));
                }
            };

            let frame = SyncedFrame {
                offset,
                header,
                available_end: next.min(self.end),
            };
            debug!(
                offset,
                length = header.frame_length_bytes,
                truncated = frame.is_truncated(),
                "frame"
            );

            self.stats.frames += 1;
            self.pos = next;
            return Some(Ok(frame));
        }
        None
    }
}
