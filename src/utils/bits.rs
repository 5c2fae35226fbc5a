// MSB-first bit reader

/// Reads bit fields from a byte slice, most significant bit first.
///
/// Reads past the end yield zero bits rather than failing; callers that care
/// check `is_exhausted()`.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    bit_pos: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        BitReader { data, bit_pos: 0 }
    }

    /// Read `count` bits (at most 32) as an unsigned value
    pub fn read_bits(&mut self, count: u32) -> u32 {
        debug_assert!(count <= 32);
        let mut value = 0u32;
        for _ in 0..count {
            value = (value << 1) | self.read_bit() as u32;
        }
        value
    }

    /// Read a single bit
    pub fn read_bit(&mut self) -> u8 {
        let byte = self.data.get(self.bit_pos / 8).copied().unwrap_or(0);
        let bit = (byte >> (7 - (self.bit_pos % 8))) & 1;
        self.bit_pos += 1;
        bit
    }

    /// Read `count` bits as a two's-complement signed value
    pub fn read_signed(&mut self, count: u32) -> i32 {
        let raw = self.read_bits(count);
        if count == 0 {
            return 0;
        }
        let shift = 32 - count;
        ((raw << shift) as i32) >> shift
    }

    pub fn is_exhausted(&self) -> bool {
        self.bit_pos >= self.data.len() * 8
    }
}
