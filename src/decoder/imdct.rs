// Inverse MDCT filterbank with sine window and overlap-add
//
//   x[n] = 2/N * sum_k X[k] * cos(2*pi/N * (n + n0) * (k + 1/2)),  n0 = (N/2 + 1) / 2
//
// for a long block of N = 2048 outputs from N/2 = 1024 coefficients. The
// cosine argument is (2n + 2*n0)(2k + 1) / 4N turns, so a single table of 4N
// entries indexed modulo 4N covers every term.

use crate::adts::SAMPLES_PER_FRAME;

const HALF: usize = SAMPLES_PER_FRAME;
const WINDOW_LENGTH: usize = 2 * HALF;
const TABLE_LENGTH: usize = 4 * WINDOW_LENGTH;
/// 2 * n0
const PHASE: usize = HALF + 1;

/// Long-block synthesis filterbank
#[derive(Debug, Clone)]
pub struct Imdct {
    cosines: Vec<f32>,
    window: Vec<f32>,
}

impl Imdct {
    pub fn new() -> Self {
        let cosines = (0..TABLE_LENGTH)
            .map(|m| (2.0 * std::f64::consts::PI * m as f64 / TABLE_LENGTH as f64).cos() as f32)
            .collect();
        let window = (0..WINDOW_LENGTH)
            .map(|n| (std::f64::consts::PI / WINDOW_LENGTH as f64 * (n as f64 + 0.5)).sin() as f32)
            .collect();
        Imdct { cosines, window }
    }

    /// Windowed inverse transform of `spectrum` (1024 lines) into 2048 samples
    pub fn transform(&self, spectrum: &[f32]) -> Vec<f32> {
        let mut output = vec![0.0f32; WINDOW_LENGTH];

        // Most lines are zero in practice; skip them
        for (k, &coefficient) in spectrum.iter().enumerate().take(HALF) {
            if coefficient == 0.0 {
                continue;
            }
            let odd_k = 2 * k + 1;
            for (n, sample) in output.iter_mut().enumerate() {
                let index = ((2 * n + PHASE) * odd_k) % TABLE_LENGTH;
                *sample += coefficient * self.cosines[index];
            }
        }

        let scale = 2.0 / WINDOW_LENGTH as f32;
        for (sample, w) in output.iter_mut().zip(&self.window) {
            *sample *= scale * w;
        }
        output
    }

    /// Transform and overlap-add with the previous block.
    ///
    /// `overlap` holds the second half of the previous windowed block and is
    /// replaced with this block's second half. Returns 1024 samples.
    pub fn synthesize(&self, spectrum: &[f32], overlap: &mut [f32]) -> Vec<f32> {
        let block = self.transform(spectrum);
        let (first, second) = block.split_at(HALF);
        let out = first.iter().zip(overlap.iter()).map(|(a, b)| a + b).collect();
        overlap.copy_from_slice(second);
        out
    }
}

impl Default for Imdct {
    fn default() -> Self {
        Self::new()
    }
}
