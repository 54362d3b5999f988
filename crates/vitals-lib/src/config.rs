use crate::{
    calibration::CalibrationConfig, detectors::ppg::PpgPipelineConfig, error::VitalsError,
    window::WindowConfig,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// All tunables of the vitals core. Every section and field is optional in
/// TOML; missing values keep their calibrated defaults.
///
/// ```toml
/// [window]
/// capacity = 100
///
/// [pipeline]
/// sampling_rate_hz = 25.0
/// threshold_floor = 30.0
///
/// [calibration]
/// quadratic = -45.060
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VitalsConfig {
    pub window: WindowConfig,
    pub pipeline: PpgPipelineConfig,
    pub calibration: CalibrationConfig,
}

impl VitalsConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let cfg: VitalsConfig = toml::from_str(text).context("parsing vitals config")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), VitalsError> {
        let p = &self.pipeline;
        let invalid = |msg: &str| Err(VitalsError::InvalidConfig(msg.into()));
        if p.smoothing_taps == 0 {
            return invalid("smoothing_taps must be at least 1");
        }
        if self.window.capacity < p.smoothing_taps + 2 {
            return invalid("window capacity must exceed smoothing_taps + 1");
        }
        if !(p.sampling_rate_hz.is_finite() && p.sampling_rate_hz > 0.0) {
            return invalid("sampling_rate_hz must be positive");
        }
        if !(p.threshold_floor.is_finite()
            && p.threshold_ceiling.is_finite()
            && p.threshold_floor <= p.threshold_ceiling)
        {
            return invalid("threshold clamp must be finite with floor <= ceiling");
        }
        if !(p.ratio_floor.is_finite()
            && p.ratio_ceiling.is_finite()
            && p.ratio_floor < p.ratio_ceiling)
        {
            return invalid("ratio range must be finite with floor < ceiling");
        }
        if p.min_heart_rate_bpm > p.max_heart_rate_bpm {
            return invalid("min_heart_rate_bpm exceeds max_heart_rate_bpm");
        }
        let c = &self.calibration;
        if c.entries == 0 {
            return invalid("calibration entries must be at least 1");
        }
        if !(c.quadratic.is_finite() && c.linear.is_finite() && c.intercept.is_finite()) {
            return invalid("calibration coefficients must be finite");
        }
        Ok(())
    }
}

/// Read and validate a TOML config file.
pub fn read_config(path: &Path) -> Result<VitalsConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    VitalsConfig::from_toml_str(&contents)
        .with_context(|| format!("parsing config {}", path.display()))
}
