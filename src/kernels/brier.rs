use super::crps::nan_last;
use super::KernelError;

/// Brier score of a probability forecast against a binary outcome.
///
/// BS(p, k) = (p - k)^2, with `observation` in {0, 1} (or NaN) and
/// `forecast` in [0, 1].
pub fn brier_score(observation: f64, forecast: f64) -> Result<f64, KernelError> {
    if !forecast.is_nan() && !(0.0..=1.0).contains(&forecast) {
        return Err(KernelError::ProbabilityOutOfRange(forecast));
    }
    if !(observation.is_nan() || observation == 0.0 || observation == 1.0) {
        return Err(KernelError::NonBinaryObservation(observation));
    }
    Ok((forecast - observation).powi(2))
}

/// Brier scores of an ensemble for exceeding each of `thresholds`.
///
/// For every threshold t, the forecast probability is the fraction of valid
/// (non-NaN) members strictly above t and the outcome is `observation > t`.
/// Writes one score per threshold into `out`.
///
/// `thresholds` must be ascending. With `issorted` the members are taken to be
/// ascending with any NaN at the end, which turns each exceedance count into a
/// binary search.
pub fn threshold_brier_score(
    observation: f64,
    members: &[f64],
    thresholds: &[f64],
    issorted: bool,
    out: &mut [f64],
) -> Result<(), KernelError> {
    if members.is_empty() {
        return Err(KernelError::EmptyEnsemble);
    }
    if thresholds.iter().any(|t| t.is_nan()) || thresholds.windows(2).any(|w| w[0] > w[1]) {
        return Err(KernelError::UnsortedThresholds);
    }
    debug_assert_eq!(out.len(), thresholds.len());

    let sorted: Vec<f64>;
    let members = if issorted {
        members
    } else {
        let mut owned = members.to_vec();
        owned.sort_by(nan_last);
        sorted = owned;
        &sorted
    };
    let valid = &members[..members.iter().take_while(|m| !m.is_nan()).count()];

    for (slot, &t) in out.iter_mut().zip(thresholds) {
        *slot = if observation.is_nan() || valid.is_empty() {
            f64::NAN
        } else {
            let at_or_below = valid.partition_point(|&m| m <= t);
            let prob = (valid.len() - at_or_below) as f64 / valid.len() as f64;
            let outcome = if observation > t { 1.0 } else { 0.0 };
            (prob - outcome).powi(2)
        };
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_brier_score_values() {
        assert_abs_diff_eq!(brier_score(1.0, 0.7).unwrap(), 0.09, epsilon = 1e-12);
        assert_abs_diff_eq!(brier_score(0.0, 0.7).unwrap(), 0.49, epsilon = 1e-12);
        assert!(brier_score(f64::NAN, 0.2).unwrap().is_nan());
    }

    #[test]
    fn test_brier_score_validation() {
        assert_eq!(
            brier_score(1.0, 1.5),
            Err(KernelError::ProbabilityOutOfRange(1.5))
        );
        let just_above = 1.0 + f64::EPSILON;
        assert_eq!(
            brier_score(1.0, just_above),
            Err(KernelError::ProbabilityOutOfRange(just_above))
        );
        assert_eq!(brier_score(1.0, 1.0), Ok(0.0));
        assert!(brier_score(1.0, f64::NAN).unwrap().is_nan());
        assert_eq!(
            brier_score(0.5, 0.2),
            Err(KernelError::NonBinaryObservation(0.5))
        );
    }

    #[test]
    fn test_threshold_brier_two_levels() {
        let mut out = [0.0; 2];
        threshold_brier_score(2.0, &[3.0, 1.0, 2.0], &[1.5, 2.5], false, &mut out).unwrap();
        assert_abs_diff_eq!(out[0], 1.0 / 9.0, epsilon = 1e-12);
        assert_abs_diff_eq!(out[1], 1.0 / 9.0, epsilon = 1e-12);
    }

    #[test]
    fn test_threshold_brier_member_equal_to_threshold_does_not_exceed() {
        let mut out = [0.0];
        threshold_brier_score(0.0, &[1.0, 1.0], &[1.0], true, &mut out).unwrap();
        assert_abs_diff_eq!(out[0], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_threshold_brier_nan_handling() {
        let mut out = [0.0];
        threshold_brier_score(1.0, &[2.0, f64::NAN], &[0.5], false, &mut out).unwrap();
        assert_abs_diff_eq!(out[0], 0.0, epsilon = 1e-12);

        threshold_brier_score(f64::NAN, &[2.0], &[0.5], false, &mut out).unwrap();
        assert!(out[0].is_nan());
    }

    #[test]
    fn test_threshold_brier_rejects_unsorted_levels() {
        let mut out = [0.0; 2];
        assert_eq!(
            threshold_brier_score(0.0, &[1.0], &[2.0, 1.0], false, &mut out),
            Err(KernelError::UnsortedThresholds)
        );
    }
}
