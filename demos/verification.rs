//! Example verifying a synthetic ensemble forecast against observations.
//!
//! Scores the same forecast several ways:
//! - CRPS of the raw ensemble
//! - CRPS of a Gaussian fitted to the ensemble (closed form and quadrature)
//! - Brier scores for exceeding a set of thresholds
//!
//! Run with `RUST_LOG=skillscore=debug` to see the dispatch and reduction steps.

use ndarray::{Array2, Array3, Axis};
use ndarray_rand::rand_distr::Normal as Gaussian;
use ndarray_rand::RandomExt;
use skillscore::{
    crps_ensemble, crps_gaussian, crps_quadrature, threshold_brier_score, EnsembleOptions,
    LabeledArray, Normal, QuadratureOptions, Reduction,
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("Forecast Verification Example");
    println!("=============================\n");

    let (n_times, n_stations, n_members) = (60, 8, 25);

    // Truth and an ensemble with a small warm bias and extra spread
    let truth = Array2::random((n_times, n_stations), Gaussian::new(0.0, 1.0)?);
    let noise = Array3::random((n_times, n_stations, n_members), Gaussian::new(0.3, 1.2)?);
    let members = &noise + &truth.view().insert_axis(Axis(2));

    let obs = LabeledArray::new(["time", "station"], truth.into_dyn())?
        .with_coord("station", (1..=n_stations as i64).collect::<Vec<_>>())?
        .with_attr("units", "K");
    let fc = LabeledArray::new(["time", "station", "member"], members.into_dyn())?;
    let options = EnsembleOptions::default();

    // Ensemble CRPS, overall and per station
    let overall = crps_ensemble(&obs, &fc, None, &options, &Reduction::all())?;
    println!("Ensemble CRPS (all cells): {:.4}", overall.item().unwrap_or(f64::NAN));

    let per_station = crps_ensemble(&obs, &fc, None, &options, &Reduction::over(["time"]))?;
    println!("\nEnsemble CRPS per station:");
    for (i, score) in per_station.into_values().iter().enumerate() {
        println!("  station {:>2}: {:.4}", i + 1, score);
    }

    // Gaussian fitted to each cell's members
    let mean = fc.values().mean_axis(Axis(2)).ok_or("empty ensemble")?;
    let std = fc.values().std_axis(Axis(2), 1.0);
    let mu = LabeledArray::new(["time", "station"], mean)?;
    let sig = LabeledArray::new(["time", "station"], std)?;
    let gaussian = crps_gaussian(&obs, &mu, &sig, &Reduction::all())?;
    println!("\nGaussian CRPS (fitted): {:.4}", gaussian.item().unwrap_or(f64::NAN));

    // One shared climatological distribution, by quadrature
    let climatology = Normal::new(0.0, 1.0)?;
    let numeric = crps_quadrature(
        &obs,
        &climatology,
        &QuadratureOptions::default(),
        &Reduction::all(),
    )?;
    let exact = crps_gaussian(&obs, 0.0, 1.0, &Reduction::all())?;
    println!(
        "Climatology CRPS: quadrature {:.6}, closed form {:.6}",
        numeric.item().unwrap_or(f64::NAN),
        exact.item().unwrap_or(f64::NAN)
    );

    // Exceedance Brier scores, kept per threshold
    let thresholds = vec![-1.0, 0.0, 1.0];
    let brier = threshold_brier_score(
        &obs,
        &fc,
        thresholds.clone(),
        &options,
        &Reduction::over(["time", "station"]).keep_attrs(true),
    )?;
    println!("\nThreshold Brier scores:");
    for (t, score) in thresholds.iter().zip(brier.values().iter()) {
        println!("  P(x > {t:>4.1}): {score:.4}");
    }
    println!("Attributes kept: {:?}", brier.attrs());

    Ok(())
}
