//! Weighted mean over named dimensions.

use crate::broadcast::Frame;
use crate::error::{Result, ScoreError};
use crate::labeled::{Attrs, LabeledArray};
use ndarray::{ArrayD, IxDyn};
use rayon::prelude::*;
use tracing::debug;

/// Averages `arr` over `dims`, or over every dim when `dims` is `None`.
///
/// With `weights` this is `sum(v * w) / sum(w)`. The weights may only span
/// reduced dims and are broadcast over the rest. NaN values are skipped, and
/// their weights with them; a window with no valid value or zero total weight
/// averages to NaN.
pub fn weighted_mean(
    arr: &LabeledArray,
    dims: Option<&[String]>,
    weights: Option<&LabeledArray>,
    keep_attrs: bool,
) -> Result<LabeledArray> {
    let reduce_dims = resolve_dims(arr, dims)?;
    debug!(
        dims = ?reduce_dims,
        weighted = weights.is_some(),
        "reducing scores"
    );

    let full = Frame::of(arr);
    let weights = match weights {
        Some(w) => Some(check_weights(&full, w, &reduce_dims)?),
        None => None,
    };

    let mut kept = Frame::new();
    kept.join(arr, &reduce_dims)?;
    let width: usize = reduce_dims
        .iter()
        .map(|d| arr.len_of(d).unwrap_or(1))
        .product();
    let values = kept.layout(arr, &reduce_dims)?;
    let weights = match weights {
        Some(w) => Some(kept.layout(&w, &reduce_dims)?),
        None => None,
    };

    let means: Vec<f64> = (0..kept.n_cells())
        .into_par_iter()
        .map(|row| {
            let window = row * width..(row + 1) * width;
            let v = &values[window.clone()];
            match &weights {
                Some(w) => mean_of(v, Some(&w[window])),
                None => mean_of(v, None),
            }
        })
        .collect();

    let data = ArrayD::from_shape_vec(IxDyn(kept.sizes()), means)
        .map_err(|e| ScoreError::InvalidArray(e.to_string()))?;
    let attrs = if keep_attrs {
        arr.attrs().clone()
    } else {
        Attrs::new()
    };
    Ok(LabeledArray::from_parts(
        data,
        kept.dims().to_vec(),
        kept.coords().clone(),
        attrs,
    ))
}

fn resolve_dims(arr: &LabeledArray, dims: Option<&[String]>) -> Result<Vec<String>> {
    let Some(dims) = dims else {
        return Ok(arr.dims().to_vec());
    };
    let mut resolved: Vec<String> = Vec::with_capacity(dims.len());
    for dim in dims {
        if !arr.has_dim(dim) {
            return Err(ScoreError::missing_dimension("score", dim, arr.dims()));
        }
        if !resolved.contains(dim) {
            resolved.push(dim.clone());
        }
    }
    Ok(resolved)
}

/// Validates `weights` and broadcasts them onto the full frame of the scores.
fn check_weights(
    full: &Frame,
    weights: &LabeledArray,
    reduce_dims: &[String],
) -> Result<LabeledArray> {
    if let Some(dim) = weights.dims().iter().find(|d| !reduce_dims.contains(*d)) {
        return Err(ScoreError::InvalidWeights(format!(
            "weights dimension `{dim}` is not among the reduced dimensions {reduce_dims:?}"
        )));
    }
    if let Some(bad) = weights
        .values()
        .iter()
        .find(|w| w.is_nan() || w.is_infinite() || **w < 0.0)
    {
        return Err(ScoreError::InvalidWeights(format!(
            "weights must be finite and non-negative, found {bad}"
        )));
    }

    let mut joined = full.clone();
    joined.join(weights, &[])?;
    if let Some(i) = joined
        .sizes()
        .iter()
        .zip(full.sizes())
        .position(|(a, b)| a != b)
    {
        return Err(ScoreError::Shape {
            dim: full.dims()[i].clone(),
            left: full.sizes()[i],
            right: joined.sizes()[i],
        });
    }
    full.expand(weights)
}

fn mean_of(values: &[f64], weights: Option<&[f64]>) -> f64 {
    let mut total = 0.0;
    let mut mass = 0.0;
    match weights {
        Some(weights) => {
            for (&v, &w) in values.iter().zip(weights) {
                if !v.is_nan() {
                    total += v * w;
                    mass += w;
                }
            }
        }
        None => {
            for &v in values.iter().filter(|v| !v.is_nan()) {
                total += v;
                mass += 1.0;
            }
        }
    }
    if mass == 0.0 {
        f64::NAN
    } else {
        total / mass
    }
}
