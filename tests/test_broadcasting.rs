// Name-keyed broadcasting and shape preservation across the scores.

use approx::assert_abs_diff_eq;
use ndarray::Array3;
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use skillscore::broadcast::{broadcast_pair, Frame};
use skillscore::{
    brier_score, crps_ensemble, crps_gaussian, threshold_brier_score, EnsembleOptions,
    LabeledArray, Reduction, ScoreError,
};

// ============================================================================
// Shape preservation
// ============================================================================

#[test]
fn test_unreduced_scores_span_the_joined_frame() {
    let obs = LabeledArray::from_vec("time", vec![0.0, 1.0, 2.0]);
    let mu = LabeledArray::from_vec("lat", vec![0.5, -0.5]);
    let out = crps_gaussian(&obs, &mu, 1.0, &Reduction::skip()).unwrap();

    assert_eq!(out.dims(), ["time", "lat"]);
    assert_eq!(out.shape(), &[3, 2]);
    for (i, x) in [0.0, 1.0, 2.0].into_iter().enumerate() {
        for (j, m) in [0.5, -0.5].into_iter().enumerate() {
            let expected = skillscore::kernels::crps_gaussian(x, m, 1.0).unwrap();
            assert_abs_diff_eq!(out.get(&[i, j]).unwrap(), expected, epsilon = 1e-14);
        }
    }
}

#[test]
fn test_member_dim_is_removed_and_others_kept() {
    let fc = Array3::random((4, 5, 6), Uniform::new(0.0, 1.0));
    let fc = LabeledArray::new(["lat", "member", "lon"], fc.into_dyn()).unwrap();
    let obs = LabeledArray::from_shape_vec(["lat", "lon"], &[4, 6], vec![0.5; 24]).unwrap();

    let crps =
        crps_ensemble(&obs, &fc, None, &EnsembleOptions::default(), &Reduction::skip()).unwrap();
    assert_eq!(crps.dims(), ["lat", "lon"]);
    assert_eq!(crps.shape(), &[4, 6]);

    let tbs = threshold_brier_score(
        &obs,
        &fc,
        vec![0.25, 0.75],
        &EnsembleOptions::default(),
        &Reduction::skip(),
    )
    .unwrap();
    assert_eq!(tbs.dims(), ["lat", "lon", "threshold"]);
    assert_eq!(tbs.shape(), &[4, 6, 2]);
}

#[test]
fn test_scalar_inputs_promote_to_zero_dims() {
    let out = brier_score(1.0, 0.25, &Reduction::skip()).unwrap();
    assert_eq!(out.ndim(), 0);
    assert_abs_diff_eq!(out.item().unwrap(), 0.5625, epsilon = 1e-14);
}

#[test]
fn test_forecast_dims_extend_the_frame() {
    // forecasts carry an extra lead dim the observations lack
    let obs = LabeledArray::from_vec("time", vec![1.0, 0.0]);
    let fc = LabeledArray::from_shape_vec(["time", "lead"], &[2, 3], vec![0.1, 0.5, 0.9, 0.1, 0.5, 0.9])
        .unwrap();
    let out = brier_score(&obs, &fc, &Reduction::skip()).unwrap();
    assert_eq!(out.dims(), ["time", "lead"]);
    assert_abs_diff_eq!(out.get(&[0, 0]).unwrap(), 0.81, epsilon = 1e-12);
    assert_abs_diff_eq!(out.get(&[1, 2]).unwrap(), 0.81, epsilon = 1e-12);
}

// ============================================================================
// Compatibility checks
// ============================================================================

#[test]
fn test_size_one_dims_expand() {
    let obs = LabeledArray::from_vec("time", vec![0.0, 1.0, 2.0]);
    let mu = LabeledArray::from_vec("time", vec![1.0]);
    let out = crps_gaussian(&obs, &mu, 1.0, &Reduction::skip()).unwrap();
    assert_eq!(out.shape(), &[3]);
    assert_abs_diff_eq!(
        out.get(&[1]).unwrap(),
        skillscore::kernels::crps_gaussian(1.0, 1.0, 1.0).unwrap(),
        epsilon = 1e-14
    );
}

#[test]
fn test_incompatible_sizes() {
    let obs = LabeledArray::from_vec("time", vec![0.0, 1.0, 2.0]);
    let mu = LabeledArray::from_vec("time", vec![0.0, 1.0]);
    assert_eq!(
        crps_gaussian(&obs, &mu, 1.0, &Reduction::all()).unwrap_err(),
        ScoreError::Shape {
            dim: "time".into(),
            left: 3,
            right: 2,
        }
    );
}

#[test]
fn test_coordinate_labels_must_match() {
    let obs = LabeledArray::from_vec("time", vec![1.0, 0.0])
        .with_coord("time", vec![0_i64, 1])
        .unwrap();
    let fc = LabeledArray::from_vec("time", vec![0.5, 0.5])
        .with_coord("time", vec![1_i64, 2])
        .unwrap();
    assert_eq!(
        brier_score(&obs, &fc, &Reduction::all()).unwrap_err(),
        ScoreError::CoordinateMismatch { dim: "time".into() }
    );

    let same = LabeledArray::from_vec("time", vec![0.5, 0.5])
        .with_coord("time", vec![0_i64, 1])
        .unwrap();
    let out = brier_score(&obs, &same, &Reduction::skip()).unwrap();
    assert_eq!(out.coord("time"), obs.coord("time"));
}

#[test]
fn test_broadcast_pair_borrows_aligned_inputs() {
    let a = LabeledArray::from_vec("x", vec![1.0, 2.0]);
    let b = LabeledArray::from_vec("x", vec![3.0, 4.0]);
    let (a2, b2) = broadcast_pair(&a, &b).unwrap();
    assert!(matches!(a2, std::borrow::Cow::Borrowed(_)));
    assert!(matches!(b2, std::borrow::Cow::Borrowed(_)));

    let c = LabeledArray::from_vec("y", vec![5.0, 6.0, 7.0]);
    let (a3, c3) = broadcast_pair(&a, &c).unwrap();
    assert_eq!(a3.dims(), ["x", "y"]);
    assert_eq!(c3.dims(), ["x", "y"]);
    assert_eq!(c3.get(&[1, 2]), Some(7.0));
}

#[test]
fn test_frame_join_order() {
    let a = LabeledArray::from_shape_vec(["lat", "time"], &[2, 1], vec![0.0, 1.0]).unwrap();
    let b = LabeledArray::from_shape_vec(["time", "lon"], &[4, 3], vec![0.0; 12]).unwrap();
    let mut frame = Frame::of(&a);
    frame.join(&b, &[]).unwrap();
    assert_eq!(frame.dims(), ["lat", "time", "lon"]);
    assert_eq!(frame.sizes(), &[2, 4, 3]);
    assert_eq!(frame.n_cells(), 24);
}
