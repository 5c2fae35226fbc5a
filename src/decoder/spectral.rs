// Spectral stage: quantized coefficients -> dequantized spectrum
//
// The bitstream layout read here is a reduced one, not the AAC syntax with
// its Huffman codebooks:
//
//   ms_flag       1  (channel pairs only) mid/side coded
//   per channel:
//     global_gain 8
//     1024 x q    4  two's complement quantized value
//
// Bits past the end of the payload read as zero, so short payloads decode to
// a spectrum that is silent above the last coded line. The dequantization
// and stereo reconstruction that follow are the AAC ones.

use crate::adts::SAMPLES_PER_FRAME;
use crate::utils::bits::BitReader;

/// Bits per quantized spectral line
const QUANT_BITS: u32 = 4;
/// Offset subtracted from global_gain to get the scalefactor exponent
const SCALEFACTOR_OFFSET: i32 = 100;

/// Quantized spectrum of one channel
#[derive(Debug, Clone)]
pub struct QuantizedChannel {
    pub global_gain: u8,
    pub lines: Vec<i32>,
}

/// Read `channels` quantized spectra and the mid/side flag
pub fn read_spectra(payload: &[u8], channels: usize) -> (Vec<QuantizedChannel>, bool) {
    let mut reader = BitReader::new(payload);
    let mid_side = channels == 2 && reader.read_bit() == 1;

    let spectra = (0..channels)
        .map(|_| {
            let global_gain = reader.read_bits(8) as u8;
            let mut lines = vec![0i32; SAMPLES_PER_FRAME];
            for line in lines.iter_mut() {
                if reader.is_exhausted() {
                    break;
                }
                *line = reader.read_signed(QUANT_BITS);
            }
            QuantizedChannel { global_gain, lines }
        })
        .collect();

    (spectra, mid_side)
}

/// AAC inverse quantization: sign(q) * |q|^(4/3) * 2^((gain - 100) / 4)
pub fn inverse_quantize(channel: &QuantizedChannel) -> Vec<f32> {
    let scale = 2f32.powf(0.25 * (channel.global_gain as i32 - SCALEFACTOR_OFFSET) as f32);
    channel
        .lines
        .iter()
        .map(|&q| {
            if q == 0 {
                0.0
            } else {
                let magnitude = (q.unsigned_abs() as f32).powf(4.0 / 3.0) * scale;
                if q < 0 {
                    -magnitude
                } else {
                    magnitude
                }
            }
        })
        .collect()
}

/// Mid/side to left/right, in place: L = M + S, R = M - S
pub fn apply_mid_side(mid: &mut [f32], side: &mut [f32]) {
    for (m, s) in mid.iter_mut().zip(side.iter_mut()) {
        let (l, r) = (*m + *s, *m - *s);
        *m = l;
        *s = r;
    }
}
