use super::KernelError;
use statrs::function::erf::erfc;
use std::cmp::Ordering;
use std::f64::consts::{PI, SQRT_2};

/// Closed-form CRPS of a Normal(`mu`, `sig`) forecast at observation `x`.
///
/// CRPS = sig * (z * (2 * Phi(z) - 1) + 2 * phi(z) - 1 / sqrt(pi)), z = (x - mu) / sig
pub fn crps_gaussian(x: f64, mu: f64, sig: f64) -> Result<f64, KernelError> {
    if x.is_nan() || mu.is_nan() || sig.is_nan() {
        return Ok(f64::NAN);
    }
    if sig <= 0.0 {
        return Err(KernelError::NonPositiveScale(sig));
    }

    let z = (x - mu) / sig;
    let cdf_z = 0.5 * erfc(-z / SQRT_2);
    let pdf_z = (-0.5 * z * z).exp() / (2.0 * PI).sqrt();
    Ok(sig * (z * (2.0 * cdf_z - 1.0) + 2.0 * pdf_z - 1.0 / PI.sqrt()))
}

/// Orders NaN after every number, matching how sorted ensembles are laid out.
pub(crate) fn nan_last(a: &f64, b: &f64) -> Ordering {
    a.partial_cmp(b).unwrap_or_else(|| a.is_nan().cmp(&b.is_nan()))
}

/// Exact CRPS of the empirical distribution formed by `members`.
///
/// `weights`, when given, assigns a (not necessarily normalized) probability
/// mass to each member. With `issorted` the members are taken to be ascending
/// already, with any NaN at the end, and the sort is skipped.
///
/// NaN members are ignored. A NaN observation, an all-NaN ensemble, or a
/// negative/NaN weight among the valid members yields NaN.
pub fn crps_ensemble(
    observation: f64,
    members: &[f64],
    weights: Option<&[f64]>,
    issorted: bool,
) -> Result<f64, KernelError> {
    if members.is_empty() {
        return Err(KernelError::EmptyEnsemble);
    }
    if let Some(w) = weights {
        if w.len() != members.len() {
            return Err(KernelError::MemberWeightsLength {
                expected: members.len(),
                found: w.len(),
            });
        }
    }
    if observation.is_nan() {
        return Ok(f64::NAN);
    }

    let mut pairs: Vec<(f64, f64)> = match weights {
        Some(w) => members.iter().copied().zip(w.iter().copied()).collect(),
        None => members.iter().map(|&m| (m, 1.0)).collect(),
    };
    if !issorted {
        pairs.sort_by(|a, b| nan_last(&a.0, &b.0));
    }

    let valid = pairs.iter().take_while(|(m, _)| !m.is_nan()).count();
    if valid == 0 {
        return Ok(f64::NAN);
    }
    let pairs = &pairs[..valid];

    let mut total_weight = 0.0;
    for &(_, w) in pairs {
        if w.is_nan() || w < 0.0 {
            return Ok(f64::NAN);
        }
        total_weight += w;
    }

    let mut obs_cdf = 0.0;
    let mut forecast_cdf = 0.0;
    let mut prev_forecast = 0.0;
    let mut integral = 0.0;

    for &(forecast, w) in pairs {
        if obs_cdf == 0.0 && observation < forecast {
            integral += (observation - prev_forecast) * forecast_cdf * forecast_cdf;
            integral += (forecast - observation) * (forecast_cdf - 1.0) * (forecast_cdf - 1.0);
            obs_cdf = 1.0;
        } else {
            let gap = forecast_cdf - obs_cdf;
            integral += (forecast - prev_forecast) * gap * gap;
        }
        forecast_cdf += w / total_weight;
        prev_forecast = forecast;
    }

    if obs_cdf == 0.0 {
        integral += observation - prev_forecast;
    }

    Ok(integral)
}
