// Track metadata extraction
//
// The extractor is a box visitor: the walker hands it every box and it
// interprets the handful it knows. Handlers read through the bounds-checked
// helpers in utils::io, so a truncated payload just leaves fields unset.
//
// Precedence rules:
// - mvhd fills sample_rate / total_sample_count only when still unset
// - stsd overwrites sample_rate, stsz overwrites total_sample_count
//
// Track-level boxes (mdhd, stsd, stsz) only count for the audio track: the
// first trak whose handler is "soun", or failing a handler, whose sample
// entry is mp4a. Every other track is skipped.

use serde::Serialize;
use tracing::{debug, warn};

use super::atoms;
use super::esds::parse_esds;
use super::walker::{BoxRecord, BoxVisitor, BoxWalker};
use crate::adts::{channel_count, sampling_frequency};
use crate::utils::io::{fourcc_to_string, read_be_u16, read_be_u32, read_be_u64, read_fourcc, read_u8};

/// Metadata accumulated across one walk of the container
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataRecord {
    /// Sample entry format of the first sample description ("mp4a")
    pub codec_tag: Option<[u8; 4]>,
    /// Movie timescale (units per second)
    pub timescale: Option<u32>,
    /// Movie duration in timescale units
    pub duration: Option<u64>,
    pub media_timescale: Option<u32>,
    pub media_duration: Option<u64>,
    pub sample_rate: Option<u32>,
    pub bits_per_sample: Option<u16>,
    pub channel_count: Option<u16>,
    pub total_sample_count: Option<u64>,
    pub default_sample_size: Option<u32>,
    /// MPEG-4 audio object type from esds (2 = AAC LC)
    pub object_type: Option<u8>,
    pub estimated_bitrate: Option<u64>,
    pub container_size: u64,
    pub track_count: usize,
    /// Handler types of every track seen, in order
    pub handlers: Vec<[u8; 4]>,
}

impl MetadataRecord {
    /// Duration in seconds from the best source available, if non-zero
    pub fn duration_seconds(&self) -> Option<f64> {
        let from = |units: Option<u64>, scale: Option<u32>| match (units, scale) {
            (Some(units), Some(scale)) if units > 0 && scale > 0 => Some(units as f64 / scale as f64),
            _ => None,
        };

        from(self.duration, self.timescale)
            .or_else(|| from(self.media_duration, self.media_timescale))
            .or_else(|| from(self.total_sample_count, self.sample_rate))
    }

    /// Collaborator-facing view delivered once per parse
    pub fn summary(&self) -> MetadataSummary {
        MetadataSummary {
            codec_tag: self.codec_tag.as_ref().map(fourcc_to_string),
            bitrate: self.estimated_bitrate,
            container_size: self.container_size,
            sample_rate: self.sample_rate,
            bits_per_sample: self.bits_per_sample,
            channel_count: self.channel_count,
            total_sample_count: self.total_sample_count,
            duration_seconds: self.duration_seconds(),
            object_type: self.object_type,
            default_sample_size: self.default_sample_size,
            track_count: self.track_count,
            handlers: self.handlers.iter().map(fourcc_to_string).collect(),
        }
    }
}

/// Metadata as delivered to the collaborator
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetadataSummary {
    pub codec_tag: Option<String>,
    pub bitrate: Option<u64>,
    pub container_size: u64,
    pub sample_rate: Option<u32>,
    pub bits_per_sample: Option<u16>,
    pub channel_count: Option<u16>,
    pub total_sample_count: Option<u64>,
    pub duration_seconds: Option<f64>,
    /// MPEG-4 audio object type (profile) from the AudioSpecificConfig
    pub object_type: Option<u8>,
    pub default_sample_size: Option<u32>,
    pub track_count: usize,
    pub handlers: Vec<String>,
}

/// Box visitor that fills a `MetadataRecord`
#[derive(Debug, Default)]
pub struct MetadataExtractor {
    pub record: MetadataRecord,
    /// First media-data box seen; the decode pass restarts here
    pub mdat: Option<BoxRecord>,
    /// Human-readable notes for the diagnostic sink
    pub diagnostics: Vec<String>,
    /// State of the trak currently being walked
    track: TrackState,
    /// Index (1-based) of the trak chosen as the audio track
    audio_track: Option<usize>,
}

#[derive(Debug, Default)]
struct TrackState {
    handler: Option<[u8; 4]>,
    /// mdhd values held until the handler says whether this is audio
    media_times: Option<(Option<u32>, Option<u64>)>,
}

impl MetadataExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the container size and derive the bitrate estimate.
    ///
    /// Bitrate is left unset when there is no mdat or no usable duration.
    pub fn finish(&mut self, container_size: usize) {
        self.record.container_size = container_size as u64;

        let payload_bytes = match self.mdat {
            Some(mdat) => mdat.header.payload_length(),
            None => return,
        };

        if let Some(seconds) = self.record.duration_seconds() {
            let bitrate = (payload_bytes as f64 * 8.0 / seconds).round();
            self.record.estimated_bitrate = Some(bitrate as u64);
        }
    }

    fn handle_mvhd(&mut self, payload: &[u8]) {
        let (timescale, duration) = read_header_times(payload);
        if timescale.is_some() {
            self.record.timescale = timescale;
        }
        if duration.is_some() {
            self.record.duration = duration;
        }

        if self.record.sample_rate.is_none() {
            self.record.sample_rate = timescale;
        }
        if self.record.total_sample_count.is_none() {
            self.record.total_sample_count = duration;
        }
    }

    fn handle_mdhd(&mut self, payload: &[u8]) {
        self.apply_media_times(read_header_times(payload));
    }

    fn apply_media_times(&mut self, (timescale, duration): (Option<u32>, Option<u64>)) {
        if timescale.is_some() {
            self.record.media_timescale = timescale;
        }
        if duration.is_some() {
            self.record.media_duration = duration;
        }
    }

    fn handle_hdlr(&mut self, payload: &[u8]) {
        // version/flags (4), pre_defined (4), handler_type (4)
        let Some(handler) = read_fourcc(payload, 8) else {
            return;
        };
        self.record.handlers.push(handler);
        if &handler == atoms::VIDE {
            self.diagnostics
                .push("video track present; video decoding is not supported, skipping".to_string());
        }
    }

    fn handle_stsd(&mut self, payload: &[u8]) {
        // version/flags (4), entry_count (4), then sample entries
        let entry_count = read_be_u32(payload, 4).unwrap_or(0);
        if entry_count == 0 {
            return;
        }

        const ENTRY: usize = 8;
        let Some(codec_tag) = read_fourcc(payload, ENTRY + 4) else {
            return;
        };
        self.record.codec_tag = Some(codec_tag);

        if &codec_tag != atoms::MP4A {
            self.diagnostics.push(format!(
                "sample entry '{}' is not MPEG-4 audio",
                fourcc_to_string(&codec_tag)
            ));
            return;
        }

        // Audio sample entry, relative to the entry start:
        // size (4), format (4), reserved (6), data_reference_index (2),
        // version (2), revision (2), vendor (4), channelcount (2),
        // samplesize (2), compression_id (2), packet_size (2), samplerate (4, 16.16)
        let channels = read_be_u16(payload, ENTRY + 24).unwrap_or(0);
        if channels > 0 {
            self.record.channel_count = Some(channels);
        }
        if let Some(bits) = read_be_u16(payload, ENTRY + 26) {
            self.record.bits_per_sample = Some(bits);
        }
        let rate = read_be_u32(payload, ENTRY + 32).unwrap_or(0) >> 16;
        if rate > 0 {
            self.record.sample_rate = Some(rate);
        }

        // Child boxes (esds) follow the fixed fields; QuickTime sound
        // description versions 1 and 2 insert extra fields first.
        let children_start = match read_be_u16(payload, ENTRY + 16) {
            Some(1) => ENTRY + 52,
            Some(2) => ENTRY + 72,
            _ => ENTRY + 36,
        };
        let entry_size = read_be_u32(payload, ENTRY).unwrap_or(0) as usize;
        let entry_end = ENTRY.saturating_add(entry_size).min(payload.len());
        if children_start >= entry_end {
            return;
        }

        for child in BoxWalker::with_range(payload, children_start..entry_end) {
            let Ok(child) = child else { break };
            if child.is(atoms::ESDS) {
                self.handle_esds(&payload[child.payload_range()], channels == 0, rate == 0);
                break;
            }
        }
    }

    /// The AudioSpecificConfig fills channels and rate only where the sample
    /// entry left them zero
    fn handle_esds(&mut self, payload: &[u8], need_channels: bool, need_rate: bool) {
        let Some(config) = parse_esds(payload) else {
            warn!("esds present but its AudioSpecificConfig could not be read");
            return;
        };
        debug!(?config, "audio specific config");

        self.record.object_type = Some(config.object_type);
        if need_channels {
            if let Some(channels) = channel_count(config.channel_configuration) {
                self.record.channel_count = Some(channels);
            }
        }
        if need_rate {
            if let Some(rate) = sampling_frequency(config.sampling_frequency_index) {
                self.record.sample_rate = Some(rate);
            }
        }
    }

    fn handle_stsz(&mut self, payload: &[u8]) {
        // version/flags (4), sample_size (4), sample_count (4)
        if let Some(size) = read_be_u32(payload, 4) {
            self.record.default_sample_size = Some(size);
        }
        if let Some(count) = read_be_u32(payload, 8) {
            self.record.total_sample_count = Some(count as u64);
        }
    }
}

impl MetadataExtractor {
    fn in_audio_track(&self) -> bool {
        self.record.track_count > 0 && self.audio_track == Some(self.record.track_count)
    }

    /// Make the current trak the audio track if none has been chosen yet
    fn claim_audio_track(&mut self) -> bool {
        if self.audio_track.is_none() && self.record.track_count > 0 {
            self.audio_track = Some(self.record.track_count);
            if let Some(times) = self.track.media_times.take() {
                self.apply_media_times(times);
            }
        }
        self.in_audio_track()
    }

    fn visit_track_box(&mut self, record: &BoxRecord, payload: &[u8]) {
        match &record.header.box_type {
            atoms::MDHD => {
                if self.in_audio_track() {
                    self.handle_mdhd(payload);
                } else {
                    self.track.media_times = Some(read_header_times(payload));
                }
            }
            atoms::HDLR => {
                self.handle_hdlr(payload);
                self.track.handler = read_fourcc(payload, 8);
                if self.track.handler.as_ref() == Some(atoms::SOUN) {
                    self.claim_audio_track();
                }
            }
            atoms::STSD | atoms::STSZ => {
                let claimable = self.track.handler.is_none()
                    && record.is(atoms::STSD)
                    && read_fourcc(payload, 12).as_ref() == Some(atoms::MP4A);
                let audio = self.in_audio_track() || (claimable && self.claim_audio_track());
                if !audio {
                    debug!(
                        offset = record.offset,
                        track = self.record.track_count,
                        "skipping {} of non-audio track",
                        record.header.type_name()
                    );
                } else if record.is(atoms::STSD) {
                    self.handle_stsd(payload);
                } else {
                    self.handle_stsz(payload);
                }
            }
            _ => {}
        }
    }
}

impl BoxVisitor for MetadataExtractor {
    fn visit(&mut self, record: &BoxRecord, _depth: usize, data: &[u8]) {
        let payload = &data[record.payload_range()];
        match &record.header.box_type {
            atoms::MVHD => self.handle_mvhd(payload),
            atoms::TRAK => {
                self.record.track_count += 1;
                self.track = TrackState::default();
            }
            atoms::MDHD | atoms::HDLR | atoms::STSD | atoms::STSZ => self.visit_track_box(record, payload),
            atoms::MDAT => {
                if self.mdat.is_none() {
                    self.mdat = Some(*record);
                } else {
                    self.diagnostics.push(format!(
                        "additional mdat at offset {} ignored",
                        record.offset
                    ));
                }
            }
            _ => {}
        }
    }
}

/// Read (timescale, duration) from an mvhd/mdhd payload.
///
/// Version 0: creation (4), modification (4), timescale (4), duration (4)
/// Version 1: creation (8), modification (8), timescale (4), duration (8)
fn read_header_times(payload: &[u8]) -> (Option<u32>, Option<u64>) {
    match read_u8(payload, 0) {
        Some(1) => (read_be_u32(payload, 20), read_be_u64(payload, 24)),
        Some(_) => (
            read_be_u32(payload, 12),
            read_be_u32(payload, 16).map(u64::from),
        ),
        None => (None, None),
    }
}
