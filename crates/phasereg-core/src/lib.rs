//! Subpixel translation estimation between two images by iterative phase
//! correlation.
//!
//! ```no_run
//! use ndarray::Array2;
//! use phasereg_core::RegistrationConfig;
//!
//! let reference = Array2::<f64>::zeros((128, 128));
//! let target = Array2::<f64>::zeros((128, 128));
//! let config = RegistrationConfig::<f64>::new(128, 128)?;
//! let shift = config.calculate(reference.view(), target.view())?;
//! println!("{shift}");
//! # Ok::<(), phasereg_core::RegistrationError>(())
//! ```

pub mod config;
pub mod consts;
pub mod correlation;
pub mod cross_power;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod masks;
pub mod neighborhood;
pub mod objective;
pub mod observer;
pub mod precision;
pub mod refine;
pub mod resize;
pub mod shift;
pub mod spectral;

pub use config::{
    BandpassKind, CentroidWindowKind, InterpolationKind, RegistrationConfig, RegistrationParams,
    WindowKind,
};
pub use cross_power::CorrelationMode;
pub use diagnostics::Diagnostics;
pub use engine::{Accuracy, CalculateOptions, Estimate, EstimateStage};
pub use error::{RegistrationError, Result};
pub use observer::{DebugContext, DebugInfo, RegistrationObserver};
pub use precision::Precision;
pub use shift::Shift;
