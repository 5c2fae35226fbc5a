// Bounded ingest buffer
//
// Owns the raw bytes of the file being decoded. Everything downstream holds
// offsets into this store, never copies.

use crate::error::{Error, Result};

/// Growable byte store with a fixed upper bound.
#[derive(Debug)]
pub struct IngestBuffer {
    data: Vec<u8>,
    capacity: usize,
    overflowed: bool,
}

impl IngestBuffer {
    /// Create an empty buffer that will never hold more than `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        IngestBuffer {
            data: Vec::new(),
            capacity,
            overflowed: false,
        }
    }

    /// Append a chunk.
    ///
    /// A chunk that would exceed capacity is rejected whole and the buffer is
    /// sealed: later appends fail too until `reset()`, since the stream now has
    /// a hole in it. Bytes already held are preserved.
    pub fn append(&mut self, bytes: &[u8]) -> Result<()> {
        let attempted = self.data.len().saturating_add(bytes.len());
        if self.overflowed || attempted > self.capacity {
            self.overflowed = true;
            return Err(Error::CapacityExceeded {
                capacity: self.capacity,
                attempted,
            });
        }

        self.data.extend_from_slice(bytes);
        Ok(())
    }

    /// Logically empty the store, keeping its allocation.
    pub fn reset(&mut self) {
        self.data.clear();
        self.overflowed = false;
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }
}
