//! Pointwise scoring kernels over flat numeric inputs.
//!
//! Every function here scores a single broadcast cell: one observation against
//! one forecast representation (a Gaussian, a CDF, an ensemble vector or a
//! probability). None of them know about dimension names; lifting them onto
//! labeled arrays is the job of [`crate::dispatch`].
//!
//! NaN observations score as NaN rather than failing, so missing data flows
//! through to the reduction stage, which skips it.

mod brier;
mod crps;
mod quadrature;

pub use brier::{brier_score, threshold_brier_score};
pub use crps::{crps_ensemble, crps_gaussian};
pub use quadrature::{crps_quadrature, discover_bounds, resolve_bounds};
pub(crate) use quadrature::crps_within;

/// Failures raised by the scoring kernels themselves.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum KernelError {
    #[error("standard deviation must be positive, got {0}")]
    NonPositiveScale(f64),

    #[error("forecast probability {0} lies outside the unit interval [0, 1]")]
    ProbabilityOutOfRange(f64),

    #[error("observations can only contain 0, 1 or NaN, got {0}")]
    NonBinaryObservation(f64),

    #[error("ensemble has no members")]
    EmptyEnsemble,

    #[error("expected {expected} member weights, got {found}")]
    MemberWeightsLength { expected: usize, found: usize },

    #[error("thresholds must be sorted in ascending order and free of NaN")]
    UnsortedThresholds,

    #[error("could not locate the {probability} quantile of the forecast CDF")]
    BoundsNotFound { probability: f64 },

    /// The integration bounds clip more probability mass than `tol` allows.
    #[error("CDF does not meet tolerance requirements at the {side} bound ({value})")]
    CdfTolerance { side: &'static str, value: f64 },

    #[error("{side} integral did not converge within tolerance (estimated error {achieved:.3e})")]
    IntegrationTolerance { side: &'static str, achieved: f64 },
}
