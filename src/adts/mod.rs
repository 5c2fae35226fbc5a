// ADTS (Audio Data Transport Stream) frame support
//
// Each AAC frame in the media data is prefixed with a 7-byte header, or 9
// bytes when a CRC follows it:
//
//   syncword                 12  0xFFF
//   id                        1  0 = MPEG-4, 1 = MPEG-2
//   layer                     2  always 0
//   protection_absent         1  0 = CRC follows the header
//   profile                   2  audio object type - 1
//   sampling_frequency_index  4
//   private_bit               1
//   channel_configuration     3
//   original_copy             1
//   home                      1
//   copyright_id_bit          1
//   copyright_id_start        1
//   frame_length             13  header included
//   buffer_fullness          11
//   number_of_raw_data_blocks 2
//
// Reference:
// - ISO/IEC 13818-7 / 14496-3

pub mod sync;

pub use sync::{FrameSynchronizer, SyncStats, SyncedFrame};

use crate::error::{Error, Result};

/// Header length without CRC
pub const ADTS_HEADER_SIZE: usize = 7;
/// Header length with CRC
pub const ADTS_HEADER_SIZE_CRC: usize = 9;
/// 12-bit syncword
pub const ADTS_SYNC_WORD: u16 = 0xFFF;

/// PCM samples per channel produced by one frame
pub const SAMPLES_PER_FRAME: usize = 1024;

const SAMPLING_FREQUENCIES: [u32; 13] = [
    96000, 88200, 64000, 48000, 44100, 32000, 24000, 22050, 16000, 12000, 11025, 8000, 7350,
];

/// Sample rate for a sampling frequency index (None for reserved indices)
pub fn sampling_frequency(index: u8) -> Option<u32> {
    SAMPLING_FREQUENCIES.get(index as usize).copied()
}

/// Channel count for a channel configuration (None when 0, i.e. defined in-band)
pub fn channel_count(configuration: u8) -> Option<u16> {
    match configuration {
        1..=6 => Some(configuration as u16),
        7 => Some(8),
        _ => None,
    }
}

/// Parsed ADTS frame header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub sync_pattern: u16,
    /// 0 = MPEG-4, 1 = MPEG-2
    pub mpeg_id: u8,
    pub protection_absent: bool,
    /// Audio object type minus one (1 = AAC LC)
    pub profile: u8,
    pub sampling_frequency_index: u8,
    pub channel_configuration: u8,
    /// Whole frame length in bytes, header included
    pub frame_length_bytes: usize,
    /// 7, or 9 with CRC
    pub header_length_bytes: usize,
    pub raw_data_blocks: u8,
}

impl FrameHeader {
    /// Parse the header at `offset`.
    ///
    /// Fails with `NoSyncFound` when the bytes there are not an ADTS header:
    /// wrong syncword, non-zero layer, reserved sampling index, or too few bytes.
    /// The frame length is returned as declared; range checks are up to the caller.
    pub fn parse(data: &[u8], offset: usize) -> Result<Self> {
        let no_sync = Error::NoSyncFound { offset };
        let bytes = offset
            .checked_add(ADTS_HEADER_SIZE)
            .and_then(|end| data.get(offset..end))
            .ok_or(no_sync)?;

        let sync_pattern = ((bytes[0] as u16) << 4) | ((bytes[1] as u16) >> 4);
        if sync_pattern != ADTS_SYNC_WORD {
            return Err(Error::NoSyncFound { offset });
        }

        let layer = (bytes[1] >> 1) & 0x03;
        if layer != 0 {
            return Err(Error::NoSyncFound { offset });
        }

        let sampling_frequency_index = (bytes[2] >> 2) & 0x0F;
        if sampling_frequency(sampling_frequency_index).is_none() {
            return Err(Error::NoSyncFound { offset });
        }

        let protection_absent = bytes[1] & 0x01 == 1;
        let frame_length_bytes = (((bytes[3] & 0x03) as usize) << 11)
            | ((bytes[4] as usize) << 3)
            | ((bytes[5] as usize) >> 5);

        Ok(FrameHeader {
            sync_pattern,
            mpeg_id: (bytes[1] >> 3) & 0x01,
            protection_absent,
            profile: bytes[2] >> 6,
            sampling_frequency_index,
            channel_configuration: ((bytes[2] & 0x01) << 2) | (bytes[3] >> 6),
            frame_length_bytes,
            header_length_bytes: if protection_absent {
                ADTS_HEADER_SIZE
            } else {
                ADTS_HEADER_SIZE_CRC
            },
            raw_data_blocks: bytes[6] & 0x03,
        })
    }

    /// Header for an MPEG-4, CRC-less frame
    pub fn new(profile: u8, sampling_frequency_index: u8, channel_configuration: u8, frame_length_bytes: usize) -> Self {
        FrameHeader {
            sync_pattern: ADTS_SYNC_WORD,
            mpeg_id: 0,
            protection_absent: true,
            profile: profile & 0x03,
            sampling_frequency_index: sampling_frequency_index & 0x0F,
            channel_configuration: channel_configuration & 0x07,
            frame_length_bytes,
            header_length_bytes: ADTS_HEADER_SIZE,
            raw_data_blocks: 0,
        }
    }

    /// Serialize the 7 fixed header bytes (buffer fullness 0x7FF = VBR)
    pub fn to_bytes(&self) -> [u8; ADTS_HEADER_SIZE] {
        let length = self.frame_length_bytes & 0x1FFF;
        [
            0xFF,
            0xF0 | (self.mpeg_id << 3) | (self.protection_absent as u8),
            (self.profile << 6) | (self.sampling_frequency_index << 2) | (self.channel_configuration >> 2),
            ((self.channel_configuration & 0x03) << 6) | ((length >> 11) as u8 & 0x03),
            ((length >> 3) & 0xFF) as u8,
            (((length & 0x07) << 5) as u8) | 0x1F,
            0xFC | (self.raw_data_blocks & 0x03),
        ]
    }

    pub fn channel_count(&self) -> Option<u16> {
        channel_count(self.channel_configuration)
    }

    /// Bytes after the header
    pub fn payload_length(&self) -> usize {
        self.frame_length_bytes.saturating_sub(self.header_length_bytes)
    }
}
