use super::{EnsembleOptions, QuadratureOptions, Reduction};
use crate::broadcast::{broadcast_all, Input};
use crate::core_dims::Operation;
use crate::dispatch::apply_kernel;
use crate::dist::Cdf;
use crate::error::{Result, ScoreError};
use crate::kernels;
use crate::labeled::LabeledArray;

/// Continuous Ranked Probability Score of a Gaussian forecast.
///
/// `mu` and `sig` are the forecast mean and standard deviation, as arrays or
/// plain numbers; they are broadcast against `observations` by dimension name.
/// A non-positive `sig` anywhere fails the whole call.
pub fn crps_gaussian<'a>(
    observations: impl Into<Input<'a>>,
    mu: impl Into<Input<'a>>,
    sig: impl Into<Input<'a>>,
    reduction: &Reduction,
) -> Result<LabeledArray> {
    let observations = observations.into().promote();
    let mu = mu.into().promote();
    let sig = sig.into().promote();
    let aligned = broadcast_all(&[&*observations, &*mu, &*sig])?;
    let inputs: Vec<&LabeledArray> = aligned.iter().map(|a| &**a).collect();

    let scores = apply_kernel(
        Operation::GaussianCrps,
        "",
        &inputs,
        None,
        reduction.keep_attrs,
        |args, slot| {
            slot[0] = kernels::crps_gaussian(args[0][0], args[1][0], args[2][0])?;
            Ok(())
        },
    )?;
    reduction.finish(scores)
}

/// CRPS of an arbitrary forecast distribution by numerical integration.
///
/// `cdf` is shared by every observation: a closure, a [`crate::dist::Normal`],
/// or any `statrs` distribution wrapped in [`crate::dist::Parametric`].
/// Integration bounds are resolved once per call.
pub fn crps_quadrature<'a, C>(
    observations: impl Into<Input<'a>>,
    cdf: &C,
    options: &QuadratureOptions,
    reduction: &Reduction,
) -> Result<LabeledArray>
where
    C: Cdf + ?Sized,
{
    let operation = Operation::QuadratureCrps;
    let observations = observations.into().promote();
    let (lower, upper) = kernels::resolve_bounds(cdf, options.xmin, options.xmax, options.tol)
        .map_err(|source| ScoreError::KernelComputation {
            operation: operation.name(),
            source,
        })?;

    let scores = apply_kernel(
        operation,
        "",
        &[&*observations],
        None,
        reduction.keep_attrs,
        |args, slot| {
            slot[0] = kernels::crps_within(args[0][0], cdf, lower, upper, options.tol)?;
            Ok(())
        },
    )?;
    reduction.finish(scores)
}

/// CRPS of an ensemble forecast.
///
/// The member axis (`options.member_dim`) of `forecasts` is consumed: each grid
/// cell's members form one empirical distribution. `member_weights`, when
/// given, must also span the member axis and assigns unequal probability to
/// members; it plays no part in the reduction.
pub fn crps_ensemble<'a>(
    observations: impl Into<Input<'a>>,
    forecasts: &LabeledArray,
    member_weights: Option<&LabeledArray>,
    options: &EnsembleOptions,
    reduction: &Reduction,
) -> Result<LabeledArray> {
    let observations = observations.into().promote();
    let member_dim = options.member_dim.as_str();

    if let (Some(weights), Some(members)) = (member_weights, forecasts.len_of(member_dim)) {
        if let Some(n) = weights.len_of(member_dim) {
            if n != members {
                return Err(ScoreError::Shape {
                    dim: member_dim.to_string(),
                    left: members,
                    right: n,
                });
            }
        }
    }

    let mut inputs: Vec<&LabeledArray> = vec![&*observations, forecasts];
    inputs.extend(member_weights);

    let issorted = options.issorted;
    let scores = apply_kernel(
        Operation::EnsembleCrps {
            member_weights: member_weights.is_some(),
        },
        member_dim,
        &inputs,
        None,
        reduction.keep_attrs,
        |args, slot| {
            slot[0] = kernels::crps_ensemble(args[0][0], args[1], args.get(2).copied(), issorted)?;
            Ok(())
        },
    )?;
    reduction.finish(scores)
}
