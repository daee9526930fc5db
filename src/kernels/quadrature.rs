use super::KernelError;
use crate::dist::Cdf;

/// Tail probability used when integration bounds have to be discovered.
const DISCOVERY_TAIL: f64 = 1e-7;
/// Absolute accuracy requested from each half-integral.
const INTEGRATION_EPS: f64 = 1.49e-8;
/// Maximum bisection depth of the adaptive Simpson rule.
const MAX_DEPTH: u32 = 48;
/// Hard cap on integrand evaluations per half-integral.
const MAX_EVALS: usize = 200_000;

/// CRPS of an arbitrary forecast CDF by numerical integration.
///
/// CRPS = int_{xmin}^{x} F(y)^2 dy + int_{x}^{xmax} (1 - F(y))^2 dy
///
/// Missing bounds are discovered from the CDF's extreme quantiles. With a
/// tolerance, the bounds must not clip more than `tol` of probability mass and
/// each half-integral must converge to within `tol / 2`.
pub fn crps_quadrature<C: Cdf + ?Sized>(
    x: f64,
    cdf: &C,
    xmin: Option<f64>,
    xmax: Option<f64>,
    tol: Option<f64>,
) -> Result<f64, KernelError> {
    let (lower, upper) = resolve_bounds(cdf, xmin, xmax, tol)?;
    crps_within(x, cdf, lower, upper, tol)
}

/// Fills in missing bounds and checks them against `tol`.
///
/// Bounds depend only on the CDF, so a caller scoring many observations
/// against one distribution resolves them once and reuses them.
pub fn resolve_bounds<C: Cdf + ?Sized>(
    cdf: &C,
    xmin: Option<f64>,
    xmax: Option<f64>,
    tol: Option<f64>,
) -> Result<(f64, f64), KernelError> {
    let lower = match xmin {
        Some(v) => v,
        None => quantile(cdf, DISCOVERY_TAIL)?,
    };
    let upper = match xmax {
        Some(v) => v,
        None => quantile(cdf, 1.0 - DISCOVERY_TAIL)?,
    };

    if let Some(tol) = tol {
        let at_lower = cdf.cdf(lower);
        if at_lower >= tol {
            return Err(KernelError::CdfTolerance {
                side: "lower",
                value: lower,
            });
        }
        let at_upper = cdf.cdf(upper);
        if at_upper <= 1.0 - tol {
            return Err(KernelError::CdfTolerance {
                side: "upper",
                value: upper,
            });
        }
    }
    Ok((lower, upper))
}

/// Lower and upper bounds enclosing all but `1e-7` of the mass on each side.
pub fn discover_bounds<C: Cdf + ?Sized>(cdf: &C) -> Result<(f64, f64), KernelError> {
    Ok((
        quantile(cdf, DISCOVERY_TAIL)?,
        quantile(cdf, 1.0 - DISCOVERY_TAIL)?,
    ))
}

pub(crate) fn crps_within<C: Cdf + ?Sized>(
    x: f64,
    cdf: &C,
    lower: f64,
    upper: f64,
    tol: Option<f64>,
) -> Result<f64, KernelError> {
    if x.is_nan() {
        return Ok(f64::NAN);
    }

    let below = |y: f64| {
        let f = cdf.cdf(y);
        f * f
    };
    let above = |y: f64| {
        let s = 1.0 - cdf.cdf(y);
        s * s
    };

    let (lhs, lhs_err) = integrate(&below, lower, x);
    check_error("lower", lhs_err, tol)?;
    let (rhs, rhs_err) = integrate(&above, x, upper);
    check_error("upper", rhs_err, tol)?;

    Ok(lhs + rhs)
}

fn check_error(side: &'static str, achieved: f64, tol: Option<f64>) -> Result<(), KernelError> {
    match tol {
        Some(tol) if achieved.is_nan() || achieved >= 0.5 * tol => {
            Err(KernelError::IntegrationTolerance { side, achieved })
        }
        _ => Ok(()),
    }
}

/// Inverts the CDF at `p`, preferring the distribution's own quantile function.
fn quantile<C: Cdf + ?Sized>(cdf: &C, p: f64) -> Result<f64, KernelError> {
    if let Some(q) = cdf.quantile(p) {
        if q.is_finite() {
            return Ok(q);
        }
    }

    let not_found = KernelError::BoundsNotFound { probability: p };
    let (mut lo, mut hi) = (-1.0_f64, 1.0_f64);
    while cdf.cdf(lo) > p {
        lo *= 2.0;
        if !lo.is_finite() {
            return Err(not_found);
        }
    }
    while cdf.cdf(hi) < p {
        hi *= 2.0;
        if !hi.is_finite() {
            return Err(not_found);
        }
    }

    for _ in 0..2048 {
        let mid = 0.5 * (lo + hi);
        if cdf.cdf(mid) < p {
            lo = mid;
        } else {
            hi = mid;
        }
        if hi - lo <= 1e-12 * (1.0 + mid.abs()) {
            break;
        }
    }
    Ok(0.5 * (lo + hi))
}

/// Integrates `f` over [a, b], mapping infinite ends onto a finite interval.
///
/// Returns the value and an estimate of the absolute error. Reversed bounds
/// give the negated integral.
fn integrate<F: Fn(f64) -> f64>(f: &F, a: f64, b: f64) -> (f64, f64) {
    if a == b {
        return (0.0, 0.0);
    }
    if a > b {
        let (v, e) = integrate(f, b, a);
        return (-v, e);
    }

    match (a.is_finite(), b.is_finite()) {
        (true, true) => adaptive_simpson(f, a, b),
        (false, true) => {
            // y = b - (1 - t) / t, t in (0, 1]
            let g = |t: f64| finite_or_zero(f(b - (1.0 - t) / t) / (t * t));
            adaptive_simpson(&g, 0.0, 1.0)
        }
        (true, false) => {
            // y = a + t / (1 - t), t in [0, 1)
            let g = |t: f64| finite_or_zero(f(a + t / (1.0 - t)) / ((1.0 - t) * (1.0 - t)));
            adaptive_simpson(&g, 0.0, 1.0)
        }
        (false, false) => {
            let (lv, le) = integrate(f, a, 0.0);
            let (rv, re) = integrate(f, 0.0, b);
            (lv + rv, le + re)
        }
    }
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

fn adaptive_simpson<F: Fn(f64) -> f64>(f: &F, a: f64, b: f64) -> (f64, f64) {
    let fa = f(a);
    let fb = f(b);
    let m = 0.5 * (a + b);
    let fm = f(m);
    let whole = (b - a) / 6.0 * (fa + 4.0 * fm + fb);
    let mut evals = 3;
    simpson_step(
        f,
        Panel { a, b, fa, fm, fb, whole },
        INTEGRATION_EPS,
        MAX_DEPTH,
        &mut evals,
    )
}

#[derive(Clone, Copy)]
struct Panel {
    a: f64,
    b: f64,
    fa: f64,
    fm: f64,
    fb: f64,
    whole: f64,
}

fn simpson_step<F: Fn(f64) -> f64>(
    f: &F,
    p: Panel,
    eps: f64,
    depth: u32,
    evals: &mut usize,
) -> (f64, f64) {
    let m = 0.5 * (p.a + p.b);
    let flm = f(0.5 * (p.a + m));
    let frm = f(0.5 * (m + p.b));
    *evals += 2;

    let left = (m - p.a) / 6.0 * (p.fa + 4.0 * flm + p.fm);
    let right = (p.b - m) / 6.0 * (p.fm + 4.0 * frm + p.fb);
    let delta = left + right - p.whole;

    if depth == 0 || *evals >= MAX_EVALS || delta.abs() <= 15.0 * eps {
        return (left + right + delta / 15.0, delta.abs() / 15.0);
    }

    let half = (0.5 * eps).max(f64::MIN_POSITIVE);
    let (lv, le) = simpson_step(
        f,
        Panel {
            a: p.a,
            b: m,
            fa: p.fa,
            fm: flm,
            fb: p.fm,
            whole: left,
        },
        half,
        depth - 1,
        evals,
    );
    let (rv, re) = simpson_step(
        f,
        Panel {
            a: m,
            b: p.b,
            fa: p.fm,
            fm: frm,
            fb: p.fb,
            whole: right,
        },
        half,
        depth - 1,
        evals,
    );
    (lv + rv, le + re)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dist::Normal;
    use crate::kernels::crps_gaussian;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_quadrature_matches_closed_form_gaussian() {
        let normal = Normal::standard();
        for x in [-1.5, 0.0, 0.3, 2.0] {
            let numeric = crps_quadrature(x, &normal, None, None, Some(1e-6)).unwrap();
            let exact = crps_gaussian(x, 0.0, 1.0).unwrap();
            assert_abs_diff_eq!(numeric, exact, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_quadrature_with_closure_and_infinite_bounds() {
        let normal = Normal::new(1.0, 2.0).unwrap();
        let cdf = |y: f64| normal.cdf(y);
        let numeric =
            crps_quadrature(0.5, &cdf, Some(f64::NEG_INFINITY), Some(f64::INFINITY), Some(1e-6))
                .unwrap();
        let exact = crps_gaussian(0.5, 1.0, 2.0).unwrap();
        assert_abs_diff_eq!(numeric, exact, epsilon = 1e-5);
    }

    #[test]
    fn test_bisection_bounds_for_closure() {
        // Uniform(0, 4)
        let cdf = |y: f64| (y / 4.0).clamp(0.0, 1.0);
        let (lo, hi) = discover_bounds(&cdf).unwrap();
        assert_abs_diff_eq!(lo, 4e-7, epsilon = 1e-9);
        assert_abs_diff_eq!(hi, 4.0 - 4e-7, epsilon = 1e-9);
    }

    #[test]
    fn test_clipping_bounds_rejected() {
        let normal = Normal::standard();
        let err = crps_quadrature(0.0, &normal, Some(-1.0), Some(1.0), Some(1e-6)).unwrap_err();
        assert_eq!(
            err,
            KernelError::CdfTolerance {
                side: "lower",
                value: -1.0
            }
        );
        // Without a tolerance the clipped integral is accepted as is.
        assert!(crps_quadrature(0.0, &normal, Some(-1.0), Some(1.0), None).is_ok());
    }

    #[test]
    fn test_nan_observation() {
        let normal = Normal::standard();
        assert!(crps_quadrature(f64::NAN, &normal, None, None, Some(1e-6))
            .unwrap()
            .is_nan());
    }
}
