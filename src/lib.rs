//! Probabilistic forecast verification over dimension-labeled arrays.
//!
//! Scores observations against Gaussian, CDF-based, ensemble and probability
//! forecasts (CRPS and Brier variants). Inputs are [`LabeledArray`]s whose axes
//! are matched by name, never by position; every score broadcasts its inputs,
//! runs a pointwise kernel over each cell in parallel and averages the result
//! according to a [`Reduction`].
//!
//! ```
//! use skillscore::{crps_gaussian, LabeledArray, Reduction};
//!
//! let obs = LabeledArray::from_vec("time", vec![0.0, 1.0, -0.5]);
//! let crps = crps_gaussian(&obs, 0.0, 1.0, &Reduction::all()).unwrap();
//! assert_eq!(crps.ndim(), 0);
//! ```

pub mod broadcast;
pub mod core_dims;
mod dispatch;
pub mod dist;
pub mod error;
pub mod kernels;
pub mod labeled;
pub mod reduce;
pub mod scores;

// Re-export commonly used types at crate root
pub use broadcast::Input;
pub use dist::{Cdf, Normal, Parametric};
pub use error::{Result, ScoreError};
pub use labeled::{AttrValue, Attrs, Coord, Dataset, LabeledArray};
pub use scores::{
    brier_score, crps_ensemble, crps_gaussian, crps_quadrature, threshold_brier_score,
    EnsembleOptions, QuadratureOptions, Reduction, Threshold,
};
