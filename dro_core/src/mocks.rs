//! Test and helper collaborators for dro_core.

use std::collections::HashMap;

use dro_traits::{AttributeSink, BoxError, CalibrationStore, Counter};

use crate::attribute::AttributeId;

/// In-memory calibration store with failure injection.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    slots: HashMap<u16, i32>,
    zero_fill: bool,
    writes: usize,
    fail_reads: bool,
    fail_writes: bool,
}

impl MemoryStore {
    /// Behaves like erased NVM: unset slots read back as `Some(0)`.
    pub fn zeroed() -> Self {
        Self {
            zero_fill: true,
            ..Self::default()
        }
    }

    /// Unset slots read back as `None`.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn put(&mut self, offset: u16, value: i32) {
        self.slots.insert(offset, value);
    }

    pub fn get(&self, offset: u16) -> Option<i32> {
        self.slots.get(&offset).copied()
    }

    /// Number of successful writes so far.
    pub fn writes(&self) -> usize {
        self.writes
    }

    pub fn fail_reads(&mut self, on: bool) {
        self.fail_reads = on;
    }

    pub fn fail_writes(&mut self, on: bool) {
        self.fail_writes = on;
    }
}

impl CalibrationStore for MemoryStore {
    fn read(&mut self, offset: u16) -> Result<Option<i32>, BoxError> {
        if self.fail_reads {
            return Err("nvm read failed".into());
        }
        Ok(self
            .slots
            .get(&offset)
            .copied()
            .or(self.zero_fill.then_some(0)))
    }

    fn write(&mut self, offset: u16, value: i32) -> Result<(), BoxError> {
        if self.fail_writes {
            return Err("nvm write rejected".into());
        }
        self.slots.insert(offset, value);
        self.writes += 1;
        Ok(())
    }
}

/// Sink that records every published value in order.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    published: Vec<(u8, Vec<u8>)>,
    fail: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(&mut self, on: bool) {
        self.fail = on;
    }

    pub fn published(&self) -> &[(u8, Vec<u8>)] {
        &self.published
    }

    pub fn clear(&mut self) {
        self.published.clear();
    }

    /// Most recent bytes published for `id`.
    pub fn last(&self, id: AttributeId) -> Option<&[u8]> {
        self.published
            .iter()
            .rev()
            .find(|(h, _)| *h == id.handle())
            .map(|(_, b)| b.as_slice())
    }

    pub fn last_position(&self) -> Option<i32> {
        self.last(AttributeId::Position)
            .and_then(|b| <[u8; 4]>::try_from(b).ok())
            .map(i32::from_le_bytes)
    }

    pub fn count(&self, id: AttributeId) -> usize {
        self.published
            .iter()
            .filter(|(h, _)| *h == id.handle())
            .count()
    }
}

impl AttributeSink for RecordingSink {
    fn set_value(&mut self, handle: u8, bytes: &[u8]) -> Result<(), BoxError> {
        if self.fail {
            return Err("transport not ready".into());
        }
        self.published.push((handle, bytes.to_vec()));
        Ok(())
    }
}

/// Sink that drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl AttributeSink for NullSink {
    fn set_value(&mut self, _handle: u8, _bytes: &[u8]) -> Result<(), BoxError> {
        Ok(())
    }
}

/// Counter that replays a fixed sequence, then repeats the last value.
#[derive(Debug, Default, Clone)]
pub struct SeqCounter {
    seq: Vec<i32>,
    idx: usize,
}

impl SeqCounter {
    pub fn new(seq: impl Into<Vec<i32>>) -> Self {
        Self {
            seq: seq.into(),
            idx: 0,
        }
    }
}

impl Counter for SeqCounter {
    fn read(&mut self) -> Result<i32, BoxError> {
        let v = match self.seq.get(self.idx) {
            Some(v) => {
                self.idx += 1;
                *v
            }
            None => self.seq.last().copied().unwrap_or(0),
        };
        Ok(v)
    }

    fn clear(&mut self) -> Result<(), BoxError> {
        self.seq.clear();
        self.idx = 0;
        Ok(())
    }
}
