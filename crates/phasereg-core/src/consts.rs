/// Minimum pixel count (h*w) to use row-level Rayon parallelism.
pub const PARALLEL_PIXEL_THRESHOLD: usize = 65_536;

/// Minimum image pair count to evaluate an objective in parallel.
pub const PARALLEL_PAIR_THRESHOLD: usize = 4;

/// Default lower bandpass cutoff (normalized frequency radius).
pub const DEFAULT_BANDPASS_LOW: f64 = 0.01;

/// Default upper bandpass cutoff (normalized frequency radius).
pub const DEFAULT_BANDPASS_HIGH: f64 = 1.0;

/// Default L2 neighborhood size around the correlation peak.
pub const DEFAULT_NEIGHBORHOOD_SIZE: usize = 7;

/// Default L2U size. 357 / 7 = 51x upsampling, ~0.02 px resolution.
pub const DEFAULT_UPSAMPLED_SIZE: usize = 357;

/// Default fraction of L2U used for the L1 centroid window.
pub const DEFAULT_CENTROID_RATIO: f64 = 0.45;

/// Amount the centroid ratio drops after each failed refinement attempt.
pub const CENTROID_RATIO_STEP: f64 = 0.025;

/// Default cap on centroid steps per ratio attempt.
pub const DEFAULT_MAX_ITERATIONS: usize = 10;

/// Smallest neighborhood that still has a defined centroid.
pub const MIN_NEIGHBORHOOD_SIZE: usize = 3;

/// Smallest L1 window that can report a sub-window offset.
pub const MIN_CENTROID_WINDOW: usize = 3;

/// L2 size used by the one-shot subpixel estimate.
pub const SUBPIXEL_NEIGHBORHOOD_SIZE: usize = 5;

/// Centroid offset (in L2U pixels) below which refinement has converged.
pub const CONVERGENCE_THRESHOLD: f64 = 0.5;
