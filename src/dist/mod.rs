pub mod normal;

pub use normal::Normal;

use statrs::distribution::ContinuousCDF;

/// A forecast distribution known only through its cumulative distribution function.
///
/// This is what quadrature CRPS integrates against. Any `Fn(f64) -> f64` closure
/// is a `Cdf`, as is any `statrs` continuous distribution wrapped in
/// [`Parametric`]. The same object is shared by every broadcast cell, so it must
/// be `Sync`.
pub trait Cdf: Sync {
    /// Evaluates P(X <= x).
    fn cdf(&self, x: f64) -> f64;

    /// Returns the value x such that P(X <= x) = p, if the distribution knows it.
    ///
    /// Used to pick integration bounds. The default returns `None`, in which
    /// case bounds are found by bracketing and bisection on [`Cdf::cdf`].
    fn quantile(&self, _p: f64) -> Option<f64> {
        None
    }
}

impl<F> Cdf for F
where
    F: Fn(f64) -> f64 + Sync,
{
    fn cdf(&self, x: f64) -> f64 {
        self(x)
    }
}

/// Adapter exposing a `statrs` distribution as a [`Cdf`].
#[derive(Debug, Clone)]
pub struct Parametric<D>(pub D);

impl<D> Cdf for Parametric<D>
where
    D: ContinuousCDF<f64, f64> + Sync,
{
    fn cdf(&self, x: f64) -> f64 {
        self.0.cdf(x)
    }

    fn quantile(&self, p: f64) -> Option<f64> {
        Some(self.0.inverse_cdf(p))
    }
}
