use crate::{
    config::VitalsConfig,
    error::VitalsError,
    metrics::vitals::{VitalsEstimator, VitalsResult},
    signal::Sample,
    window::{Progress, SampleWindow},
};
use log::{trace, warn};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Number of finished estimations kept for upstream consumers.
pub const RECENT_RESULTS_DEPTH: usize = 4;

/// Outcome of feeding one sample into a [`VitalsMonitor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// The window is still filling.
    Pending(Progress),
    Estimation(VitalsResult),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferStatus {
    pub ir_len: usize,
    pub red_len: usize,
    pub processed_count: usize,
    pub capacity: usize,
}

/// Drives one sensor stream: push, estimate when primed, evict, and keep the
/// latest results around.
///
/// Not synchronized; a host serving several producers must serialize access
/// to each monitor.
#[derive(Debug, Clone)]
pub struct VitalsMonitor {
    window: SampleWindow,
    estimator: VitalsEstimator,
    recent: VecDeque<VitalsResult>,
}

impl VitalsMonitor {
    pub fn new(cfg: &VitalsConfig) -> Result<Self, VitalsError> {
        Ok(Self {
            window: SampleWindow::with_config(&cfg.window),
            estimator: VitalsEstimator::new(cfg)?,
            recent: VecDeque::with_capacity(RECENT_RESULTS_DEPTH),
        })
    }

    pub fn submit_sample(&mut self, ir: f64, red: f64) -> Result<Submission, VitalsError> {
        let sample = Sample::new(ir, red);
        if !sample.is_valid() {
            return Err(VitalsError::InvalidSample { ir, red });
        }
        self.window.push(sample.ir, sample.red);
        if !self.window.is_ready() {
            let progress = self.window.progress();
            trace!("collecting samples {}", progress);
            return Ok(Submission::Pending(progress));
        }

        let (ir, red) = self.window.channels();
        match self.estimator.estimate(ir, red) {
            Ok(vitals) => {
                self.window.evict_oldest();
                if self.recent.len() == RECENT_RESULTS_DEPTH {
                    self.recent.pop_front();
                }
                self.recent.push_back(vitals);
                Ok(Submission::Estimation(vitals))
            }
            Err(err) => {
                warn!("estimation failed, clearing window: {}", err);
                self.window.reset();
                Err(err)
            }
        }
    }

    /// Drop buffered samples and unconsumed results.
    pub fn reset(&mut self) {
        self.window.reset();
        self.recent.clear();
    }

    /// Hand the oldest unconsumed estimation upstream.
    pub fn take_oldest(&mut self) -> Option<VitalsResult> {
        self.recent.pop_front()
    }

    pub fn recent(&self) -> impl Iterator<Item = &VitalsResult> {
        self.recent.iter()
    }

    pub fn status(&self) -> BufferStatus {
        BufferStatus {
            ir_len: self.window.len(),
            red_len: self.window.red_len(),
            processed_count: self.recent.len(),
            capacity: self.window.capacity(),
        }
    }

    pub fn window(&self) -> &SampleWindow {
        &self.window
    }
}

impl Default for VitalsMonitor {
    fn default() -> Self {
        Self {
            window: SampleWindow::default(),
            estimator: VitalsEstimator::default(),
            recent: VecDeque::with_capacity(RECENT_RESULTS_DEPTH),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn beat(i: usize) -> (f64, f64) {
        let phase = (2.0 * PI * i as f64 / 25.0).sin();
        (50_000.0 - 2_000.0 * phase, 30_000.0 - 600.0 * phase)
    }

    #[test]
    fn pending_until_window_is_primed() {
        let mut monitor = VitalsMonitor::default();
        let mut last = None;
        for i in 0..99 {
            let (ir, red) = beat(i);
            last = Some(monitor.submit_sample(ir, red).expect("submit"));
        }
        match last {
            Some(Submission::Pending(progress)) => assert_eq!(progress.to_string(), "99/100"),
            other => panic!("expected pending, got {:?}", other),
        }
        assert_eq!(monitor.status().processed_count, 0);
    }

    #[test]
    fn ready_cycle_keeps_window_length() {
        let mut monitor = VitalsMonitor::default();
        for i in 0..99 {
            let (ir, red) = beat(i);
            monitor.submit_sample(ir, red).expect("submit");
        }
        assert_eq!(monitor.window().len(), 99);

        let (ir, red) = beat(99);
        let vitals = match monitor.submit_sample(ir, red).expect("submit") {
            Submission::Estimation(vitals) => vitals,
            other => panic!("expected estimation, got {:?}", other),
        };
        assert_eq!(vitals.heart_rate, 60);
        assert!(vitals.heart_rate_valid);
        assert_eq!(monitor.window().len(), 99);

        for i in 100..110 {
            let (ir, red) = beat(i);
            let submission = monitor.submit_sample(ir, red).expect("submit");
            assert!(matches!(submission, Submission::Estimation(_)));
            assert_eq!(monitor.window().len(), 99);
        }
    }

    #[test]
    fn keeps_the_four_latest_results() {
        let mut monitor = VitalsMonitor::default();
        for i in 0..106 {
            let (ir, red) = beat(i);
            monitor.submit_sample(ir, red).expect("submit");
        }
        let status = monitor.status();
        assert_eq!(status.processed_count, RECENT_RESULTS_DEPTH);
        assert_eq!(status.ir_len, 99);
        assert_eq!(status.red_len, 99);
        assert_eq!(status.capacity, 100);
        assert_eq!(monitor.recent().count(), 4);
        assert!(monitor.take_oldest().is_some());
        assert_eq!(monitor.status().processed_count, 3);
    }

    #[test]
    fn invalid_reading_is_not_buffered() {
        let mut monitor = VitalsMonitor::default();
        monitor.submit_sample(1.0, 1.0).expect("submit");
        let err = monitor.submit_sample(f64::NAN, 1.0).unwrap_err();
        assert!(matches!(err, VitalsError::InvalidSample { .. }));
        assert_eq!(monitor.window().len(), 1);
    }

    #[test]
    fn reset_flushes_everything() {
        let mut monitor = VitalsMonitor::default();
        for i in 0..120 {
            let (ir, red) = beat(i);
            monitor.submit_sample(ir, red).expect("submit");
        }
        monitor.reset();
        assert!(monitor.window().is_empty());
        assert!(monitor.take_oldest().is_none());
        match monitor.submit_sample(1.0, 1.0).expect("submit") {
            Submission::Pending(progress) => assert_eq!(progress.to_string(), "1/100"),
            other => panic!("expected pending, got {:?}", other),
        }
    }

    #[test]
    fn failed_estimation_clears_the_window() {
        // A window smaller than the estimator's requirement fails on every estimation.
        let mut monitor = VitalsMonitor {
            window: SampleWindow::new(50),
            ..VitalsMonitor::default()
        };
        for i in 0..49 {
            let (ir, red) = beat(i);
            monitor.submit_sample(ir, red).expect("submit");
        }
        assert_eq!(monitor.window().len(), 49);
        let (ir, red) = beat(49);
        let err = monitor.submit_sample(ir, red).unwrap_err();
        assert_eq!(
            err,
            VitalsError::InvalidInput {
                ir_len: 50,
                red_len: 50,
                required: 100
            }
        );
        assert!(monitor.window().is_empty());
        assert_eq!(monitor.status().processed_count, 0);
        match monitor.submit_sample(ir, red).expect("submit") {
            Submission::Pending(progress) => assert_eq!(progress.to_string(), "1/50"),
            other => panic!("expected pending, got {:?}", other),
        }
    }

    #[test]
    fn nan_threshold_config_is_refused_up_front() {
        let mut cfg = VitalsConfig::default();
        cfg.pipeline.threshold_floor = f64::NAN;
        assert!(matches!(
            VitalsMonitor::new(&cfg),
            Err(VitalsError::InvalidConfig(_))
        ));
    }

    #[test]
    fn honours_configured_capacity() {
        let mut cfg = VitalsConfig::default();
        cfg.window.capacity = 50;
        let mut monitor = VitalsMonitor::new(&cfg).expect("monitor");
        let mut last = None;
        for i in 0..49 {
            let (ir, red) = beat(i);
            last = Some(monitor.submit_sample(ir, red).expect("submit"));
        }
        assert_eq!(
            last,
            Some(Submission::Pending(Progress {
                filled: 49,
                capacity: 50
            }))
        );
        let (ir, red) = beat(49);
        assert!(matches!(
            monitor.submit_sample(ir, red).expect("submit"),
            Submission::Estimation(_)
        ));
    }
}
