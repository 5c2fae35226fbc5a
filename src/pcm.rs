// PCM blocks and their in-order emission

use serde::Serialize;

/// One decoded frame of interleaved signed 16-bit samples
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PcmBlock {
    /// Interleaved samples, `sample_count * channel_count` long
    pub samples: Vec<i16>,
    /// Samples per channel
    pub sample_count: usize,
    pub channel_count: u16,
}

impl PcmBlock {
    /// Little-endian bytes of the interleaved samples
    pub fn to_le_bytes(&self) -> Vec<u8> {
        self.samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }
}

/// Receives PCM blocks in emission order
pub trait PcmSink {
    /// `sequence` starts at 0 and increases by one per block
    fn on_pcm(&mut self, sequence: u64, block: PcmBlock);
}

/// Hands each decoded block straight to the sink, numbering them.
///
/// No buffering: one `emit` is one sink call.
pub struct PcmEmitter<'s, S: PcmSink + ?Sized> {
    sink: &'s mut S,
    next_sequence: u64,
}

impl<'s, S: PcmSink + ?Sized> PcmEmitter<'s, S> {
    pub fn new(sink: &'s mut S) -> Self {
        PcmEmitter {
            sink,
            next_sequence: 0,
        }
    }

    pub fn emit(&mut self, block: PcmBlock) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.sink.on_pcm(sequence, block);
    }

    /// Number of blocks emitted so far
    pub fn emitted(&self) -> u64 {
        self.next_sequence
    }

    pub fn sink_mut(&mut self) -> &mut S {
        self.sink
    }

    /// Give the sink back once emission is over
    pub fn into_sink(self) -> &'s mut S {
        self.sink
    }
}
