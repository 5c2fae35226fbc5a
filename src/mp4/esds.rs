// Elementary stream descriptor (esds) parsing
//
// The esds payload is a full box (version + flags) followed by nested
// MPEG-4 descriptors, each a tag byte plus a variable-length size:
// - 0x03 ES_Descriptor
//   - 0x04 DecoderConfigDescriptor
//     - 0x05 DecoderSpecificInfo (AudioSpecificConfig)
//
// Only the AudioSpecificConfig prefix is read: object type, sampling
// frequency index and channel configuration.

use crate::utils::bits::BitReader;
use crate::utils::io::{read_be_u16, read_u8};

const ES_DESCRIPTOR_TAG: u8 = 0x03;
const DECODER_CONFIG_TAG: u8 = 0x04;
const DECODER_SPECIFIC_TAG: u8 = 0x05;

/// Fields recovered from an AudioSpecificConfig
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioSpecificConfig {
    /// Audio object type (2 = AAC LC)
    pub object_type: u8,
    pub sampling_frequency_index: u8,
    pub channel_configuration: u8,
}

/// Read a descriptor header at `offset`: returns (tag, body offset, body length)
fn read_descriptor(data: &[u8], offset: usize) -> Option<(u8, usize, usize)> {
    let tag = read_u8(data, offset)?;
    let mut length = 0usize;
    let mut pos = offset + 1;
    // Size uses up to four bytes, 7 bits each, high bit = more follows
    for _ in 0..4 {
        let byte = read_u8(data, pos)?;
        pos += 1;
        length = (length << 7) | (byte & 0x7F) as usize;
        if byte & 0x80 == 0 {
            break;
        }
    }
    Some((tag, pos, length))
}

/// Parse the payload of an esds box (starting at its version byte)
pub fn parse_esds(payload: &[u8]) -> Option<AudioSpecificConfig> {
    // Skip version + flags
    let (tag, body, _) = read_descriptor(payload, 4)?;
    if tag != ES_DESCRIPTOR_TAG {
        return None;
    }

    // ES_ID (2) then flags byte
    let flags = read_u8(payload, body + 2)?;
    let mut pos = body + 3;
    if flags & 0x80 != 0 {
        // streamDependenceFlag: dependsOn_ES_ID
        pos += 2;
    }
    if flags & 0x40 != 0 {
        // URL_Flag: length-prefixed URL
        pos += 1 + read_u8(payload, pos)? as usize;
    }
    if flags & 0x20 != 0 {
        // OCRstreamFlag: OCR_ES_Id
        read_be_u16(payload, pos)?;
        pos += 2;
    }

    let (tag, body, _) = read_descriptor(payload, pos)?;
    if tag != DECODER_CONFIG_TAG {
        return None;
    }

    // objectTypeIndication (1), streamType (1), bufferSizeDB (3),
    // maxBitrate (4), avgBitrate (4)
    let (tag, body, length) = read_descriptor(payload, body + 13)?;
    if tag != DECODER_SPECIFIC_TAG || length < 2 {
        return None;
    }

    let asc = payload.get(body..body + length)?;
    let mut reader = BitReader::new(asc);
    let object_type = reader.read_bits(5) as u8;
    let sampling_frequency_index = reader.read_bits(4) as u8;
    let channel_configuration = reader.read_bits(4) as u8;

    Some(AudioSpecificConfig {
        object_type,
        sampling_frequency_index,
        channel_configuration,
    })
}
