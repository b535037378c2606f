use std::collections::VecDeque;

use crate::level::Level;

#[derive(Clone, Debug)]
pub struct CapturedLog {
    pub ts_ms: u64,
    pub level: Level,
    pub target: &'static str,
    pub file: &'static str,
    pub line: u32,
    pub msg: String,
}

/// Ring buffer that keeps the newest `capacity` entries.
#[derive(Debug)]
pub(crate) struct CaptureBuffer {
    entries: VecDeque<CapturedLog>,
    capacity: usize,
}

impl CaptureBuffer {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(4096)),
            capacity,
        }
    }

    pub(crate) fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
        self.trim();
    }

    pub(crate) fn push(&mut self, entry: CapturedLog) {
        if self.capacity == 0 {
            return;
        }
        self.entries.push_back(entry);
        self.trim();
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    /// The newest `limit` entries, oldest first.
    pub(crate) fn tail(&self, limit: usize) -> Vec<CapturedLog> {
        let start = self.entries.len().saturating_sub(limit);
        self.entries.iter().skip(start).cloned().collect()
    }

    fn trim(&mut self) {
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }
}
