use crate::error::VitalsError;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Coefficients of the empirical SpO2 curve `a*r^2/10000 + b*r/100 + c`,
/// where `r` is the ratio-of-ratios expressed as a percentage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    pub quadratic: f64,
    pub linear: f64,
    pub intercept: f64,
    /// Number of table entries; valid lookup indices are `0..entries`.
    pub entries: usize,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            quadratic: -45.060,
            linear: 30.354,
            intercept: 94.845,
            entries: 184,
        }
    }
}

/// Precomputed ratio -> SpO2 lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalibrationTable {
    values: Vec<i32>,
}

impl CalibrationTable {
    pub fn from_config(cfg: &CalibrationConfig) -> Result<Self, VitalsError> {
        if cfg.entries == 0 {
            return Err(VitalsError::InvalidConfig(
                "calibration table needs at least one entry".into(),
            ));
        }
        if !(cfg.quadratic.is_finite() && cfg.linear.is_finite() && cfg.intercept.is_finite()) {
            return Err(VitalsError::InvalidConfig(
                "calibration coefficients must be finite".into(),
            ));
        }
        Ok(Self {
            values: curve_values(cfg),
        })
    }

    /// The table built from the default coefficients, shared process-wide.
    pub fn standard() -> &'static CalibrationTable {
        static TABLE: OnceLock<CalibrationTable> = OnceLock::new();
        TABLE.get_or_init(|| CalibrationTable {
            values: curve_values(&CalibrationConfig::default()),
        })
    }

    /// Look up a rounded percentage ratio. Indices outside the table yield `None`.
    pub fn lookup(&self, ratio_pct: i64) -> Option<i32> {
        usize::try_from(ratio_pct)
            .ok()
            .and_then(|idx| self.values.get(idx))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[i32] {
        &self.values
    }
}

/// Rounded curve values clamped to `[0, 100]`. With the default coefficients
/// this moves only the last entry (183), from -1 to 0.
fn curve_values(cfg: &CalibrationConfig) -> Vec<i32> {
    (0..cfg.entries)
        .map(|i| {
            let r = i as f64;
            let spo2 =
                cfg.quadratic * (r * r) / 10_000.0 + cfg.linear * r / 100.0 + cfg.intercept;
            (spo2.round() as i32).clamp(0, 100)
        })
        .collect()
}
