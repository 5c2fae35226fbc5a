// MP4 box header parsing
//
// Box layout on the wire:
// - size: big-endian u32 (1 = 64-bit size follows the type, 0 = to end of range)
// - type: 4 bytes
// - largesize: big-endian u64 (only when size == 1)

use crate::error::{Error, Result};
use crate::utils::io::{fourcc_to_string, read_be_u32, read_be_u64, read_fourcc};

/// Parsed box header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxHeader {
    /// Total box size including the header, after resolving 1 and 0 sizes
    pub declared_size: u64,
    pub box_type: [u8; 4],
    /// 8, or 16 when a 64-bit size is present
    pub header_length: usize,
}

impl BoxHeader {
    pub const HEADER_SIZE: usize = 8;
    pub const LARGE_HEADER_SIZE: usize = 16;

    /// Parse the header of the box starting at `offset`, bounded by `end`.
    ///
    /// Returns `Ok(None)` when fewer than 8 bytes remain (clean end of data),
    /// and `MalformedBox` when the declared size cannot fit in `offset..end`.
    pub fn parse(data: &[u8], offset: usize, end: usize) -> Result<Option<Self>> {
        let end = end.min(data.len());
        let remaining = end.saturating_sub(offset);
        if remaining < Self::HEADER_SIZE {
            return Ok(None);
        }

        let (size32, box_type) = match (read_be_u32(data, offset), read_fourcc(data, offset + 4)) {
            (Some(size), Some(box_type)) => (size, box_type),
            _ => return Ok(None),
        };

        let malformed = |reason: String| Error::MalformedBox {
            offset,
            box_type: fourcc_to_string(&box_type),
            reason,
        };

        let (declared_size, header_length) = match size32 {
            1 => {
                if remaining < Self::LARGE_HEADER_SIZE {
                    return Err(malformed("truncated 64-bit size field".to_string()));
                }
                let large = read_be_u64(data, offset + 8)
                    .ok_or_else(|| malformed("truncated 64-bit size field".to_string()))?;
                (large, Self::LARGE_HEADER_SIZE)
            }
            0 => (remaining as u64, Self::HEADER_SIZE),
            size => (size as u64, Self::HEADER_SIZE),
        };

        if declared_size < header_length as u64 {
            return Err(malformed(format!(
                "declared size {} is smaller than its {}-byte header",
                declared_size, header_length
            )));
        }

        if declared_size > remaining as u64 {
            return Err(malformed(format!(
                "declared size {} exceeds the {} bytes remaining",
                declared_size, remaining
            )));
        }

        Ok(Some(BoxHeader {
            declared_size,
            box_type,
            header_length,
        }))
    }

    /// Size as usize. Always fits, since parse checked it against a slice length.
    pub fn size(&self) -> usize {
        self.declared_size as usize
    }

    pub fn payload_length(&self) -> usize {
        self.size() - self.header_length
    }

    pub fn type_name(&self) -> String {
        fourcc_to_string(&self.box_type)
    }
}
