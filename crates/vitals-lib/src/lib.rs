pub mod calibration;
pub mod config;
pub mod detectors;
pub mod error;
pub mod io;
pub mod metrics;
pub mod monitor;
pub mod signal;
pub mod window;

pub use calibration::*;
pub use config::*;
pub use detectors::*;
pub use error::*;
pub use metrics::*;
pub use monitor::*;
pub use signal::*;
pub use window::*;
