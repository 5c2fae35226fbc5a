// Audio frame decoder
//
// One ADTS frame payload in, one 1024-sample-per-channel PCM block out:
//
//   read_spectra -> inverse_quantize -> mid/side -> IMDCT + window
//   -> overlap-add -> clamp to i16 -> interleave
//
// The only state carried between frames is the overlap-add tail of each
// channel; `reset()` clears it so a rerun of the same input is bit-identical.

pub mod imdct;
pub mod spectral;

use crate::adts::{FrameHeader, SAMPLES_PER_FRAME};
use crate::error::{Error, Result};
use crate::pcm::PcmBlock;

use imdct::Imdct;
use spectral::{apply_mid_side, inverse_quantize, read_spectra};

/// Channel count used when neither the frame nor the container says
pub const DEFAULT_CHANNELS: u16 = 2;
/// Largest channel layout ADTS can signal (configuration 7)
pub const MAX_CHANNELS: u16 = 8;

/// Stateful decoder for a single stream
#[derive(Debug, Clone)]
pub struct FrameDecoder {
    imdct: Imdct,
    overlap: Vec<Vec<f32>>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        FrameDecoder {
            imdct: Imdct::new(),
            overlap: Vec::new(),
        }
    }

    /// Forget the overlap tails of previous frames
    pub fn reset(&mut self) {
        self.overlap.clear();
    }

    /// Decode one frame.
    ///
    /// `payload` is the frame with its header stripped. `fallback_channels` is
    /// used when the header's channel configuration is 0 (layout in-band).
    /// Fails with `DecodeFailure` if the payload is shorter than the header
    /// declares.
    pub fn decode(
        &mut self,
        header: &FrameHeader,
        payload: &[u8],
        fallback_channels: Option<u16>,
    ) -> Result<PcmBlock> {
        let expected = header.payload_length();
        if payload.len() < expected {
            return Err(Error::DecodeFailure(format!(
                "payload is {} bytes, header declares {}",
                payload.len(),
                expected
            )));
        }
        let payload = &payload[..expected];

        let channel_count = header
            .channel_count()
            .or(fallback_channels.filter(|&c| c > 0))
            .unwrap_or(DEFAULT_CHANNELS)
            .min(MAX_CHANNELS);
        let channels = channel_count as usize;

        if self.overlap.len() != channels {
            self.overlap = vec![vec![0.0; SAMPLES_PER_FRAME]; channels];
        }

        let (quantized, mid_side) = read_spectra(payload, channels);
        let mut spectra: Vec<Vec<f32>> = quantized.iter().map(inverse_quantize).collect();
        if mid_side {
            if let [mid, side] = spectra.as_mut_slice() {
                apply_mid_side(mid, side);
            }
        }

        let mut samples = vec![0i16; SAMPLES_PER_FRAME * channels];
        for (ch, (spectrum, overlap)) in spectra.iter().zip(self.overlap.iter_mut()).enumerate() {
            let time = self.imdct.synthesize(spectrum, overlap);
            for (i, value) in time.iter().enumerate() {
                if !value.is_finite() {
                    return Err(Error::DecodeFailure(format!(
                        "non-finite sample in channel {}",
                        ch
                    )));
                }
                samples[i * channels + ch] = clamp_to_i16(*value);
            }
        }

        Ok(PcmBlock {
            samples,
            sample_count: SAMPLES_PER_FRAME,
            channel_count,
        })
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

fn clamp_to_i16(value: f32) -> i16 {
    value.round().clamp(i16::MIN as f32, i16::MAX as f32) as i16
}
