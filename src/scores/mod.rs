//! Probabilistic verification scores over labeled arrays.
//!
//! Each score runs the same pipeline: promote scalar arguments, route the
//! operation's core dims, apply the pointwise kernel over every broadcast cell,
//! then average the scores according to a [`Reduction`].
//!
//! ```
//! use skillscore::{crps_ensemble, EnsembleOptions, LabeledArray, Reduction};
//!
//! let obs = LabeledArray::from_vec("time", vec![0.5, 1.5]);
//! let fc = LabeledArray::from_shape_vec(
//!     ["time", "member"],
//!     &[2, 3],
//!     vec![0.0, 0.4, 1.0, 1.0, 2.0, 3.0],
//! )
//! .unwrap();
//!
//! let per_time = crps_ensemble(&obs, &fc, None, &EnsembleOptions::default(), &Reduction::skip())
//!     .unwrap();
//! assert_eq!(per_time.dims(), ["time"]);
//! ```

mod brier;
mod crps;

pub use brier::{brier_score, threshold_brier_score, Threshold};
pub use crps::{crps_ensemble, crps_gaussian, crps_quadrature};

use crate::core_dims::DEFAULT_MEMBER_DIM;
use crate::error::Result;
use crate::labeled::LabeledArray;
use crate::reduce::weighted_mean;

/// How raw per-cell scores are averaged after scoring.
///
/// The default averages over every dimension, unweighted, and drops metadata.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Reduction {
    /// Dims to average over. `None` averages over all of them; an empty list
    /// leaves the scores unreduced.
    pub dim: Option<Vec<String>>,
    /// Weights for the mean. Their dims must be a subset of the reduced dims.
    pub weights: Option<LabeledArray>,
    /// Copy the first input's attrs onto the result.
    pub keep_attrs: bool,
}

impl Reduction {
    /// Averages over every dimension.
    pub fn all() -> Self {
        Self::default()
    }

    /// Averages over the named dimensions only.
    pub fn over<I, S>(dims: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Reduction {
            dim: Some(dims.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    /// Leaves the per-cell scores unreduced.
    pub fn skip() -> Self {
        Reduction {
            dim: Some(Vec::new()),
            ..Self::default()
        }
    }

    pub fn weighted(mut self, weights: LabeledArray) -> Self {
        self.weights = Some(weights);
        self
    }

    pub fn keep_attrs(mut self, keep: bool) -> Self {
        self.keep_attrs = keep;
        self
    }

    /// Reduces `scores` as configured.
    pub fn apply(&self, scores: &LabeledArray) -> Result<LabeledArray> {
        weighted_mean(
            scores,
            self.dim.as_deref(),
            self.weights.as_ref(),
            self.keep_attrs,
        )
    }

    fn finish(&self, scores: LabeledArray) -> Result<LabeledArray> {
        match &self.dim {
            Some(dims) if dims.is_empty() && self.weights.is_none() => Ok(scores),
            _ => self.apply(&scores),
        }
    }
}

/// Settings shared by the ensemble-based scores.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EnsembleOptions {
    /// Name of the ensemble member dimension on the forecasts.
    pub member_dim: String,
    /// Members are already sorted ascending along `member_dim`.
    pub issorted: bool,
}

impl Default for EnsembleOptions {
    fn default() -> Self {
        EnsembleOptions {
            member_dim: DEFAULT_MEMBER_DIM.to_string(),
            issorted: false,
        }
    }
}

impl EnsembleOptions {
    pub fn member_dim(mut self, dim: impl Into<String>) -> Self {
        self.member_dim = dim.into();
        self
    }

    pub fn issorted(mut self, issorted: bool) -> Self {
        self.issorted = issorted;
        self
    }
}

/// Integration settings for quadrature CRPS.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QuadratureOptions {
    /// Lower integration bound; discovered from the CDF when `None`.
    pub xmin: Option<f64>,
    /// Upper integration bound; discovered from the CDF when `None`.
    pub xmax: Option<f64>,
    /// Allowed clipped mass at the bounds and twice the allowed integration
    /// error. `None` disables both checks.
    pub tol: Option<f64>,
}

impl Default for QuadratureOptions {
    fn default() -> Self {
        QuadratureOptions {
            xmin: None,
            xmax: None,
            tol: Some(1e-6),
        }
    }
}

impl QuadratureOptions {
    pub fn bounds(mut self, xmin: f64, xmax: f64) -> Self {
        self.xmin = Some(xmin);
        self.xmax = Some(xmax);
        self
    }

    pub fn tol(mut self, tol: Option<f64>) -> Self {
        self.tol = tol;
        self
    }
}
