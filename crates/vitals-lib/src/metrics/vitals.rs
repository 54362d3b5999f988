use crate::{
    calibration::CalibrationTable,
    config::VitalsConfig,
    detectors::ppg::{detect_pulse_peaks, PpgPipelineConfig},
    error::VitalsError,
    signal::{Events, RRSeries},
    window::DEFAULT_WINDOW_CAPACITY,
};
use log::debug;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Heart rate and SpO2 for one window. Only the `*_valid` flags say whether
/// a value can be trusted; fallbacks are plausible resting values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VitalsResult {
    pub heart_rate: i32,
    pub heart_rate_valid: bool,
    #[serde(rename = "spO2")]
    pub spo2: i32,
    #[serde(rename = "spO2Valid")]
    pub spo2_valid: bool,
}

/// Everything computed while estimating one window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VitalsAnalysis {
    pub fs: f64,
    pub sample_count: usize,
    pub threshold: f64,
    pub peaks: Events,
    pub rr: RRSeries,
    /// Ratio-of-ratios values (percent) that passed filtering, sorted.
    pub ratios: Vec<f64>,
    pub vitals: VitalsResult,
}

/// Stateless heart rate / SpO2 estimator over complete window snapshots.
#[derive(Debug, Clone)]
pub struct VitalsEstimator {
    cfg: PpgPipelineConfig,
    table: CalibrationTable,
    required_samples: usize,
}

impl VitalsEstimator {
    pub fn new(cfg: &VitalsConfig) -> Result<Self, VitalsError> {
        cfg.validate()?;
        Ok(Self {
            cfg: cfg.pipeline,
            table: CalibrationTable::from_config(&cfg.calibration)?,
            required_samples: cfg.window.capacity,
        })
    }

    pub fn config(&self) -> &PpgPipelineConfig {
        &self.cfg
    }

    pub fn table(&self) -> &CalibrationTable {
        &self.table
    }

    pub fn required_samples(&self) -> usize {
        self.required_samples
    }

    pub fn estimate(&self, ir: &[f64], red: &[f64]) -> Result<VitalsResult, VitalsError> {
        self.analyze(ir, red).map(|analysis| analysis.vitals)
    }

    pub fn analyze(&self, ir: &[f64], red: &[f64]) -> Result<VitalsAnalysis, VitalsError> {
        if ir.len() != red.len() || ir.len() < self.required_samples {
            return Err(VitalsError::InvalidInput {
                ir_len: ir.len(),
                red_len: red.len(),
                required: self.required_samples,
            });
        }

        let (threshold, peaks) = detect_pulse_peaks(ir, &self.cfg);
        let rr = RRSeries::from_events(&peaks, self.cfg.sampling_rate_hz);
        let (heart_rate, heart_rate_valid) = self.heart_rate(&peaks);
        let ratios = if peaks.len() >= 2 {
            beat_ratios(ir, red, &peaks, &self.cfg)
        } else {
            Vec::new()
        };
        let (spo2, spo2_valid) = self.spo2(&ratios);

        let vitals = VitalsResult {
            heart_rate,
            heart_rate_valid,
            spo2,
            spo2_valid,
        };
        debug!(
            "estimated {:?} from {} samples ({} peaks, {} ratios, threshold {:.1})",
            vitals,
            ir.len(),
            peaks.len(),
            ratios.len(),
            threshold
        );
        Ok(VitalsAnalysis {
            fs: self.cfg.sampling_rate_hz,
            sample_count: ir.len(),
            threshold,
            peaks,
            rr,
            ratios,
            vitals,
        })
    }

    fn heart_rate(&self, peaks: &Events) -> (i32, bool) {
        let fallback = (self.cfg.fallback_heart_rate, false);
        let gaps = peaks.gaps();
        if gaps.is_empty() {
            return fallback;
        }
        let mean_gap = gaps.iter().sum::<usize>() as f64 / gaps.len() as f64;
        let bpm = (60.0 * self.cfg.sampling_rate_hz / mean_gap).round() as i32;
        if (self.cfg.min_heart_rate_bpm..=self.cfg.max_heart_rate_bpm).contains(&bpm) {
            (bpm, true)
        } else {
            debug!("heart rate {} BPM outside physiological range", bpm);
            fallback
        }
    }

    /// `ratios` must be sorted ascending.
    fn spo2(&self, ratios: &[f64]) -> (i32, bool) {
        let fallback = (self.cfg.fallback_spo2, false);
        if ratios.is_empty() {
            return fallback;
        }
        let median = ratios[(ratios.len() - 1) / 2];
        match self.table.lookup(median.round() as i64) {
            Some(spo2) => (spo2, true),
            None => fallback,
        }
    }
}

impl Default for VitalsEstimator {
    fn default() -> Self {
        Self {
            cfg: PpgPipelineConfig::default(),
            table: CalibrationTable::standard().clone(),
            required_samples: DEFAULT_WINDOW_CAPACITY,
        }
    }
}

/// Estimate vitals with the default calibration constants.
pub fn estimate_vitals(ir: &[f64], red: &[f64]) -> Result<VitalsResult, VitalsError> {
    static ESTIMATOR: OnceLock<VitalsEstimator> = OnceLock::new();
    ESTIMATOR.get_or_init(VitalsEstimator::default).estimate(ir, red)
}

/// Ratio-of-ratios for every beat span between consecutive peaks, filtered
/// to the configured range and sorted ascending.
fn beat_ratios(ir: &[f64], red: &[f64], peaks: &Events, cfg: &PpgPipelineConfig) -> Vec<f64> {
    let mut ratios: Vec<f64> = peaks
        .indices
        .windows(2)
        .filter(|w| w[1] - w[0] > cfg.min_beat_span)
        .filter_map(|w| {
            let (ir_ac, ir_dc) = ac_dc(&ir[w[0]..w[1]]);
            let (red_ac, red_dc) = ac_dc(&red[w[0]..w[1]]);
            let denominator = ir_ac * red_dc;
            if denominator == 0.0 {
                return None;
            }
            let ratio = red_ac * ir_dc / denominator * 100.0;
            (ratio.is_finite() && ratio > cfg.ratio_floor && ratio < cfg.ratio_ceiling)
                .then_some(ratio)
        })
        .collect();
    ratios.sort_by(|a, b| a.total_cmp(b));
    ratios
}

/// Peak-to-trough amplitude and baseline (maximum) of one span.
fn ac_dc(span: &[f64]) -> (f64, f64) {
    let max = span.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = span.iter().copied().fold(f64::INFINITY, f64::min);
    (max - min, max)
}
