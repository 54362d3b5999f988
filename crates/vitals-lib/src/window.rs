use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

pub const DEFAULT_WINDOW_CAPACITY: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Number of sample pairs an estimation runs over.
    pub capacity: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_WINDOW_CAPACITY,
        }
    }
}

/// Fill level of a window that is still priming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub filled: usize,
    pub capacity: usize,
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.filled, self.capacity)
    }
}

/// Sliding window of paired IR/Red readings for one sensor stream.
///
/// Both channels always hold the same number of samples. The window may sit
/// one pair above capacity between a `push` and the following `evict_oldest`.
#[derive(Debug, Clone)]
pub struct SampleWindow {
    ir: VecDeque<f64>,
    red: VecDeque<f64>,
    capacity: usize,
}

impl SampleWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            ir: VecDeque::with_capacity(capacity + 1),
            red: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    pub fn with_config(cfg: &WindowConfig) -> Self {
        Self::new(cfg.capacity)
    }

    pub fn push(&mut self, ir: f64, red: f64) {
        self.ir.push_back(ir);
        self.red.push_back(red);
    }

    pub fn is_ready(&self) -> bool {
        self.ir.len() >= self.capacity && self.red.len() >= self.capacity
    }

    /// Drop the oldest pair. Does nothing on an empty window.
    pub fn evict_oldest(&mut self) {
        self.ir.pop_front();
        self.red.pop_front();
    }

    pub fn reset(&mut self) {
        self.ir.clear();
        self.red.clear();
    }

    pub fn len(&self) -> usize {
        self.ir.len()
    }

    pub fn red_len(&self) -> usize {
        self.red.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ir.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn progress(&self) -> Progress {
        Progress {
            filled: self.len().min(self.capacity),
            capacity: self.capacity,
        }
    }

    /// Contiguous views of both channels, oldest sample first.
    pub fn channels(&mut self) -> (&[f64], &[f64]) {
        let ir = self.ir.make_contiguous();
        let red = self.red.make_contiguous();
        (&*ir, &*red)
    }
}

impl Default for SampleWindow {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_CAPACITY)
    }
}
