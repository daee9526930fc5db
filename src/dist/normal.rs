use super::Cdf;
use crate::kernels::KernelError;
use statrs::distribution::{ContinuousCDF, Normal as NormalDist};

/// The Normal (Gaussian) forecast distribution.
#[derive(Debug, Clone, Copy)]
pub struct Normal {
    /// The mean of the distribution (loc).
    pub loc: f64,
    /// The standard deviation of the distribution (scale).
    pub scale: f64,
    dist: NormalDist,
}

impl Normal {
    pub fn new(loc: f64, scale: f64) -> Result<Self, KernelError> {
        if scale.is_nan() || scale <= 0.0 || scale.is_infinite() {
            return Err(KernelError::NonPositiveScale(scale));
        }
        let dist = NormalDist::new(loc, scale).map_err(|_| KernelError::NonPositiveScale(scale))?;
        Ok(Normal { loc, scale, dist })
    }

    /// The standard normal, N(0, 1).
    pub fn standard() -> Self {
        Normal {
            loc: 0.0,
            scale: 1.0,
            dist: NormalDist::standard(),
        }
    }
}

impl Cdf for Normal {
    fn cdf(&self, x: f64) -> f64 {
        self.dist.cdf(x)
    }

    fn quantile(&self, p: f64) -> Option<f64> {
        Some(self.dist.inverse_cdf(p))
    }
}
