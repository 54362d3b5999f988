use crate::signal::Events;
use serde::{Deserialize, Serialize};

/// Calibration constants for the PPG pulse detection + vitals pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PpgPipelineConfig {
    /// Sensor sampling frequency (Hz).
    pub sampling_rate_hz: f64,
    /// Moving average length applied to the inverted IR channel.
    pub smoothing_taps: usize,
    /// Lower clamp for the adaptive peak threshold.
    pub threshold_floor: f64,
    /// Upper clamp for the adaptive peak threshold.
    pub threshold_ceiling: f64,
    /// Minimum spacing between retained peaks (samples).
    pub min_peak_distance: usize,
    pub max_peaks: usize,
    /// Beat spans must be strictly longer than this (samples) to feed SpO2.
    pub min_beat_span: usize,
    /// Accepted ratio-of-ratios range (percent), both bounds exclusive.
    pub ratio_floor: f64,
    pub ratio_ceiling: f64,
    /// Physiological heart rate range (BPM) a valid estimate must fall in.
    pub min_heart_rate_bpm: i32,
    pub max_heart_rate_bpm: i32,
    /// Values reported when confidence is insufficient.
    pub fallback_heart_rate: i32,
    pub fallback_spo2: i32,
}

impl Default for PpgPipelineConfig {
    fn default() -> Self {
        Self {
            sampling_rate_hz: 25.0,
            smoothing_taps: 4,
            threshold_floor: 30.0,
            threshold_ceiling: 60.0,
            min_peak_distance: 4,
            max_peaks: 15,
            min_beat_span: 3,
            ratio_floor: 2.0,
            ratio_ceiling: 184.0,
            min_heart_rate_bpm: 40,
            max_heart_rate_bpm: 220,
            fallback_heart_rate: 86,
            fallback_spo2: 99,
        }
    }
}

/// Remove the DC level from the IR channel, invert it so pulse valleys point
/// upwards, then smooth with a moving average of `cfg.smoothing_taps`.
///
/// The output is `taps - 1` samples shorter than the input.
pub fn pulse_envelope(ir: &[f64], cfg: &PpgPipelineConfig) -> Vec<f64> {
    if ir.is_empty() {
        return Vec::new();
    }
    let mean = ir.iter().sum::<f64>() / ir.len() as f64;
    let inverted: Vec<f64> = ir.iter().map(|x| -(x - mean)).collect();
    moving_average(&inverted, cfg.smoothing_taps)
}

/// Mean of the envelope clamped into `[threshold_floor, threshold_ceiling]`.
pub fn adaptive_threshold(envelope: &[f64], cfg: &PpgPipelineConfig) -> f64 {
    let mean = if envelope.is_empty() {
        0.0
    } else {
        envelope.iter().sum::<f64>() / envelope.len() as f64
    };
    mean.clamp(cfg.threshold_floor, cfg.threshold_ceiling)
}

/// Detect pulse peaks (valleys of the raw IR channel) in one window.
///
/// Returns the threshold that was applied together with the retained peaks,
/// indexed into the smoothed envelope.
pub fn detect_pulse_peaks(ir: &[f64], cfg: &PpgPipelineConfig) -> (f64, Events) {
    let envelope = pulse_envelope(ir, cfg);
    let threshold = adaptive_threshold(&envelope, cfg);
    let peaks = find_peaks(&envelope, threshold, cfg.min_peak_distance, cfg.max_peaks);
    (threshold, Events::from_indices(peaks))
}

/// Local maxima strictly above `min_height`, at most `max_peaks` of them,
/// mutually separated by at least `min_distance` samples.
///
/// A flat run of equal samples counts as a single candidate located at its
/// first sample, and only when the signal descends right after the run.
pub fn find_peaks(
    data: &[f64],
    min_height: f64,
    min_distance: usize,
    max_peaks: usize,
) -> Vec<usize> {
    let n = data.len();
    let mut peaks = Vec::new();
    let mut i = 1;
    while i + 1 < n && peaks.len() < max_peaks {
        if data[i] > min_height && data[i] > data[i - 1] {
            let mut width = 1;
            while i + width < n && data[i] == data[i + width] {
                width += 1;
            }
            if i + width < n && data[i] > data[i + width] {
                peaks.push(i);
                i += width;
            } else {
                i += width - 1;
            }
        }
        i += 1;
    }

    let mut retained: Vec<usize> = Vec::with_capacity(peaks.len());
    for peak in peaks {
        match retained.last() {
            Some(&last) if peak - last < min_distance => {}
            _ => retained.push(peak),
        }
    }
    retained
}

/// Trailing moving average over complete windows only: `data.len() - win + 1` outputs.
fn moving_average(data: &[f64], win: usize) -> Vec<f64> {
    if win <= 1 {
        return data.to_vec();
    }
    data.windows(win)
        .map(|w| w.iter().sum::<f64>() / win as f64)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn envelope_is_three_samples_shorter() {
        let cfg = PpgPipelineConfig::default();
        let ir: Vec<f64> = (0..100).map(|i| 500.0 + i as f64).collect();
        assert_eq!(pulse_envelope(&ir, &cfg).len(), 97);
    }

    #[test]
    fn envelope_inverts_around_the_mean() {
        let cfg = PpgPipelineConfig {
            smoothing_taps: 1,
            ..PpgPipelineConfig::default()
        };
        let envelope = pulse_envelope(&[10.0, 20.0, 30.0], &cfg);
        assert_eq!(envelope, vec![10.0, 0.0, -10.0]);
    }

    #[test]
    fn moving_average_uses_full_windows() {
        let out = moving_average(&[4.0, 8.0, 0.0, 4.0, 8.0], 4);
        assert_eq!(out, vec![4.0, 5.0]);
    }

    #[test]
    fn threshold_is_clamped() {
        let cfg = PpgPipelineConfig::default();
        assert_eq!(adaptive_threshold(&[0.0; 10], &cfg), 30.0);
        assert_eq!(adaptive_threshold(&[45.0; 10], &cfg), 45.0);
        assert_eq!(adaptive_threshold(&[500.0; 10], &cfg), 60.0);
        assert_eq!(adaptive_threshold(&[], &cfg), 30.0);
    }

    #[test]
    fn plateau_counts_once_when_followed_by_descent() {
        let data = [0.0, 40.0, 40.0, 40.0, 10.0, 0.0, 35.0, 0.0];
        assert_eq!(find_peaks(&data, 30.0, 4, 15), vec![1, 6]);
    }

    #[test]
    fn plateau_followed_by_rise_is_skipped() {
        let data = [0.0, 40.0, 40.0, 40.0, 50.0, 0.0];
        assert_eq!(find_peaks(&data, 30.0, 4, 15), vec![4]);
    }

    #[test]
    fn plateau_running_into_the_end_is_not_a_peak() {
        let data = [0.0, 40.0, 40.0, 40.0];
        assert!(find_peaks(&data, 30.0, 1, 15).is_empty());
    }

    #[test]
    fn peaks_at_or_below_min_height_are_ignored() {
        let data = [0.0, 30.0, 0.0, 31.0, 0.0];
        assert_eq!(find_peaks(&data, 30.0, 1, 15), vec![3]);
    }

    #[test]
    fn distance_is_measured_from_last_retained_peak() {
        let data = [0.0, 40.0, 0.0, 40.0, 0.0, 40.0, 0.0, 0.0, 0.0, 40.0, 0.0];
        assert_eq!(find_peaks(&data, 30.0, 4, 15), vec![1, 5, 9]);
    }

    #[test]
    fn stops_at_max_peaks() {
        let data: Vec<f64> = [0.0, 40.0, 0.0].repeat(20);
        let peaks = find_peaks(&data, 30.0, 1, 15);
        assert_eq!(peaks.len(), 15);
        assert_eq!(peaks[0], 1);
        assert_eq!(peaks[14], 43);

        let sparse: Vec<f64> = [0.0, 40.0, 0.0, 0.0, 0.0, 0.0, 0.0].repeat(20);
        assert_eq!(find_peaks(&sparse, 30.0, 4, 3), vec![1, 8, 15]);
    }

    #[test]
    fn flat_window_has_no_peaks() {
        let cfg = PpgPipelineConfig::default();
        let (threshold, peaks) = detect_pulse_peaks(&[500.0; 100], &cfg);
        assert_eq!(threshold, 30.0);
        assert!(peaks.is_empty());
    }

    #[test]
    fn one_beat_per_second_at_25_hz() {
        let cfg = PpgPipelineConfig::default();
        let ir: Vec<f64> = (0..100)
            .map(|i| 50_000.0 - 2_000.0 * (2.0 * PI * i as f64 / 25.0).sin())
            .collect();
        let (_, peaks) = detect_pulse_peaks(&ir, &cfg);
        assert_eq!(peaks.indices, vec![5, 30, 55, 80]);
        assert!(peaks.gaps().iter().all(|&g| g >= cfg.min_peak_distance));
    }
}
