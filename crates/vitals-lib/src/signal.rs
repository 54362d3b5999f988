use serde::{Deserialize, Serialize};

/// One PPG reading pair taken at a single sampling instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Infrared LED intensity
    pub ir: f64,
    /// Red LED intensity
    pub red: f64,
}

impl Sample {
    pub fn new(ir: f64, red: f64) -> Self {
        Self { ir, red }
    }

    /// Readings must be finite, non-negative intensities.
    pub fn is_valid(&self) -> bool {
        self.ir.is_finite() && self.red.is_finite() && self.ir >= 0.0 && self.red >= 0.0
    }
}

/// Point events on a timeline (e.g., pulse peak indices)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Events {
    pub indices: Vec<usize>,
}

impl Events {
    pub fn from_indices(indices: Vec<usize>) -> Self {
        Self { indices }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Gaps between consecutive events, in samples.
    pub fn gaps(&self) -> Vec<usize> {
        self.indices.windows(2).map(|w| w[1] - w[0]).collect()
    }
}

/// Beat-to-beat intervals (seconds)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RRSeries {
    pub rr: Vec<f64>,
}

impl RRSeries {
    pub fn from_events(events: &Events, fs: f64) -> Self {
        let mut rr = Vec::new();
        for w in events.indices.windows(2) {
            let dt = (w[1] as f64 - w[0] as f64) / fs;
            rr.push(dt);
        }
        Self { rr }
    }

    pub fn mean(&self) -> Option<f64> {
        if self.rr.is_empty() {
            return None;
        }
        Some(self.rr.iter().sum::<f64>() / self.rr.len() as f64)
    }
}
