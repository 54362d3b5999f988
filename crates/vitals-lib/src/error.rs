use thiserror::Error;

/// Errors raised by the vitals core.
///
/// Low-confidence estimations are not errors: they come back as a
/// [`crate::VitalsResult`] with the validity flags cleared.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VitalsError {
    /// Channel lengths differ or the window holds fewer samples than required.
    #[error("buffer size mismatch or insufficient data: ir={ir_len}, red={red_len}, required={required}")]
    InvalidInput {
        ir_len: usize,
        red_len: usize,
        required: usize,
    },
    /// A reading that is not a finite, non-negative intensity.
    #[error("invalid sample reading: ir={ir}, red={red}")]
    InvalidSample { ir: f64, red: f64 },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
