// Bounded time series buffer
use super::telemetry::Sample;
use std::collections::VecDeque;

/// Capacity-bounded, time-ordered samples for one metric.
///
/// Callers append in timestamp order; the buffer never re-sorts. Once full,
/// every append evicts the single oldest sample first.
#[derive(Debug, Clone, Default)]
pub struct Series {
    samples: VecDeque<Sample>,
    capacity: usize,
}

impl Series {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity.min(4096)),
            capacity,
        }
    }

    pub fn append(&mut self, sample: Sample) {
        if self.capacity == 0 {
            return;
        }
        if self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    /// Oldest first, most recent last.
    pub fn all(&self) -> impl ExactSizeIterator<Item = &Sample> + '_ {
        self.samples.iter()
    }

    pub fn to_vec(&self) -> Vec<Sample> {
        self.samples.iter().copied().collect()
    }

    pub fn latest(&self) -> Option<&Sample> {
        self.samples.back()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Shrinking drops the oldest samples until the series fits.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
        while self.samples.len() > capacity {
            self.samples.pop_front();
        }
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Replace the contents wholesale, keeping only the newest `capacity`.
    pub fn replace(&mut self, samples: Vec<Sample>) {
        self.samples = samples.into();
        self.set_capacity(self.capacity);
    }
}
