//! Bounded experience replay buffer.

use rand::Rng;
use std::collections::VecDeque;

use crate::domain::Experience;

pub const DEFAULT_REPLAY_CAPACITY: usize = 10_000;

/// FIFO buffer of experiences; the oldest entry is evicted once full.
#[derive(Debug, Clone)]
pub struct ReplayBuffer {
    buffer: VecDeque<Experience>,
    capacity: usize,
}

impl ReplayBuffer {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity >= 1, "replay capacity must be >= 1");
        Self {
            buffer: VecDeque::with_capacity(capacity.min(DEFAULT_REPLAY_CAPACITY)),
            capacity,
        }
    }

    pub fn push(&mut self, experience: Experience) {
        if self.buffer.len() >= self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(experience);
    }

    pub fn extend<I: IntoIterator<Item = Experience>>(&mut self, experiences: I) {
        for exp in experiences {
            self.push(exp);
        }
    }

    /// Uniform sample of `batch_size` entries, with replacement.
    ///
    /// Returns an empty batch when the buffer is empty.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, batch_size: usize) -> Vec<&Experience> {
        if self.buffer.is_empty() {
            return Vec::new();
        }
        (0..batch_size)
            .map(|_| &self.buffer[rng.gen_range(0..self.buffer.len())])
            .collect()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn can_sample(&self, batch_size: usize) -> bool {
        self.buffer.len() >= batch_size
    }

    /// Oldest retained experience.
    pub fn oldest(&self) -> Option<&Experience> {
        self.buffer.front()
    }
}

impl Default for ReplayBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_REPLAY_CAPACITY)
    }
}
