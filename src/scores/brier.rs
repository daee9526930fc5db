use super::{EnsembleOptions, Reduction};
use crate::broadcast::{broadcast_pair, Input};
use crate::core_dims::{Operation, THRESHOLD_DIM};
use crate::dispatch::{apply_kernel, OutputAxis};
use crate::error::{Result, ScoreError};
use crate::kernels;
use crate::labeled::LabeledArray;

/// Brier score of probability forecasts against binary observations.
///
/// Observations must be 0, 1 or NaN and forecasts must lie in [0, 1].
pub fn brier_score<'a>(
    observations: impl Into<Input<'a>>,
    forecasts: impl Into<Input<'a>>,
    reduction: &Reduction,
) -> Result<LabeledArray> {
    let observations = observations.into().promote();
    let forecasts = forecasts.into().promote();
    let (observations, forecasts) = broadcast_pair(&observations, &forecasts)?;

    let scores = apply_kernel(
        Operation::BrierScore,
        "",
        &[&*observations, &*forecasts],
        None,
        reduction.keep_attrs,
        |args, slot| {
            slot[0] = kernels::brier_score(args[0][0], args[1][0])?;
            Ok(())
        },
    )?;
    reduction.finish(scores)
}

/// Threshold levels for [`threshold_brier_score`].
#[derive(Debug, Clone, PartialEq)]
pub enum Threshold {
    /// One level; the result gains no new dimension.
    Scalar(f64),
    /// Several levels, sorted before use. The result gains a `threshold`
    /// dimension labeled `1..=n`.
    Levels(Vec<f64>),
    /// A one-dimensional array along `threshold`, ascending. Its coordinate
    /// labels, if any, carry over to the result.
    Array(LabeledArray),
}

impl From<f64> for Threshold {
    fn from(t: f64) -> Self {
        Threshold::Scalar(t)
    }
}

impl From<Vec<f64>> for Threshold {
    fn from(levels: Vec<f64>) -> Self {
        Threshold::Levels(levels)
    }
}

impl From<&[f64]> for Threshold {
    fn from(levels: &[f64]) -> Self {
        Threshold::Levels(levels.to_vec())
    }
}

impl From<LabeledArray> for Threshold {
    fn from(arr: LabeledArray) -> Self {
        Threshold::Array(arr)
    }
}

impl From<&LabeledArray> for Threshold {
    fn from(arr: &LabeledArray) -> Self {
        Threshold::Array(arr.clone())
    }
}

impl Threshold {
    /// Validates the levels and lays them out as the kernel expects. The flag
    /// tells whether a `threshold` dimension is produced.
    fn into_labeled(self) -> Result<(LabeledArray, bool)> {
        match self {
            Threshold::Scalar(t) => {
                if t.is_nan() {
                    return Err(ScoreError::InvalidThreshold(
                        "threshold must not be NaN".into(),
                    ));
                }
                Ok((LabeledArray::scalar(t), false))
            }
            Threshold::Levels(mut levels) => {
                check_levels(&levels)?;
                levels.sort_by(|a, b| a.total_cmp(b));
                let labels: Vec<i64> = (1..=levels.len() as i64).collect();
                let arr =
                    LabeledArray::from_vec(THRESHOLD_DIM, levels).with_coord(THRESHOLD_DIM, labels)?;
                Ok((arr, true))
            }
            Threshold::Array(arr) => {
                if arr.ndim() != 1 || !arr.has_dim(THRESHOLD_DIM) {
                    return Err(ScoreError::InvalidThreshold(format!(
                        "threshold array must span exactly `{THRESHOLD_DIM}`, found {:?}",
                        arr.dims()
                    )));
                }
                let levels: Vec<f64> = arr.values().iter().copied().collect();
                check_levels(&levels)?;
                if levels.windows(2).any(|w| w[0] > w[1]) {
                    return Err(ScoreError::InvalidThreshold(
                        "threshold levels must be sorted in ascending order".into(),
                    ));
                }
                Ok((arr, true))
            }
        }
    }
}

fn check_levels(levels: &[f64]) -> Result<()> {
    if levels.is_empty() {
        return Err(ScoreError::InvalidThreshold("no threshold levels given".into()));
    }
    if levels.iter().any(|t| t.is_nan()) {
        return Err(ScoreError::InvalidThreshold(
            "threshold levels must not be NaN".into(),
        ));
    }
    Ok(())
}

/// Brier scores of an ensemble's exceedance probabilities.
///
/// For each level t, the forecast probability is the fraction of members above
/// t and the outcome is whether the observation is above t. The member axis of
/// `forecasts` is consumed. Several levels add a trailing `threshold` dimension
/// to the result, which the default [`Reduction`] averages away like any other;
/// use [`Reduction::over`] to keep per-threshold scores.
pub fn threshold_brier_score<'a>(
    observations: impl Into<Input<'a>>,
    forecasts: &LabeledArray,
    threshold: impl Into<Threshold>,
    options: &EnsembleOptions,
    reduction: &Reduction,
) -> Result<LabeledArray> {
    let observations = observations.into().promote();
    let (threshold, vector) = threshold.into().into_labeled()?;

    let output_axis = vector.then(|| OutputAxis {
        dim: THRESHOLD_DIM.to_string(),
        size: threshold.len(),
        coord: threshold.coord(THRESHOLD_DIM).cloned(),
    });

    let issorted = options.issorted;
    let scores = apply_kernel(
        Operation::ThresholdBrierScore { vector },
        &options.member_dim,
        &[&*observations, forecasts, &threshold],
        output_axis,
        reduction.keep_attrs,
        |args, slot| kernels::threshold_brier_score(args[0][0], args[1], args[2], issorted, slot),
    )?;
    reduction.finish(scores)
}
