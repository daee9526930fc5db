//! Which dimensions each scoring kernel consumes and produces.
//!
//! This is a static table: every public score maps to an [`Operation`], and an
//! operation plus the configured member dimension name fixes the core dims of
//! each array input and the new dims of the kernel output.

use std::fmt;

/// Name of the axis along which vector thresholds are laid out.
pub const THRESHOLD_DIM: &str = "threshold";

/// Default name of the ensemble member axis.
pub const DEFAULT_MEMBER_DIM: &str = "member";

/// The five scoring operations, tagged with the shape variants that change
/// their core dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    GaussianCrps,
    QuadratureCrps,
    EnsembleCrps { member_weights: bool },
    BrierScore,
    ThresholdBrierScore { vector: bool },
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::GaussianCrps => "crps_gaussian",
            Operation::QuadratureCrps => "crps_quadrature",
            Operation::EnsembleCrps { .. } => "crps_ensemble",
            Operation::BrierScore => "brier_score",
            Operation::ThresholdBrierScore { .. } => "threshold_brier_score",
        }
    }

    /// Core dimensions of every array input, in argument order, and of the output.
    pub fn core_dims(&self, member_dim: &str) -> CoreDimTable {
        let member = || vec![member_dim.to_string()];
        let (inputs, output) = match *self {
            Operation::GaussianCrps => (
                vec![
                    InputCore::plain("observations"),
                    InputCore::plain("mu"),
                    InputCore::plain("sig"),
                ],
                vec![],
            ),
            Operation::QuadratureCrps => (vec![InputCore::plain("observations")], vec![]),
            Operation::EnsembleCrps { member_weights } => {
                let mut inputs = vec![
                    InputCore::plain("observations"),
                    InputCore::new("forecasts", member()),
                ];
                if member_weights {
                    inputs.push(InputCore::new("member_weights", member()));
                }
                (inputs, vec![])
            }
            Operation::BrierScore => (
                vec![
                    InputCore::plain("observations"),
                    InputCore::plain("forecasts"),
                ],
                vec![],
            ),
            Operation::ThresholdBrierScore { vector: false } => (
                vec![
                    InputCore::plain("observations"),
                    InputCore::new("forecasts", member()),
                    InputCore::plain("threshold"),
                ],
                vec![],
            ),
            Operation::ThresholdBrierScore { vector: true } => (
                vec![
                    InputCore::plain("observations"),
                    InputCore::new("forecasts", member()),
                    InputCore::new("threshold", vec![THRESHOLD_DIM.to_string()]),
                ],
                vec![THRESHOLD_DIM.to_string()],
            ),
        };
        CoreDimTable { inputs, output }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The role of one array input and the dims its kernel consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputCore {
    pub role: &'static str,
    pub dims: Vec<String>,
}

impl InputCore {
    fn new(role: &'static str, dims: Vec<String>) -> Self {
        InputCore { role, dims }
    }

    fn plain(role: &'static str) -> Self {
        InputCore {
            role,
            dims: Vec::new(),
        }
    }
}

/// Consumed dims per input and the dims the kernel adds to its output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreDimTable {
    pub inputs: Vec<InputCore>,
    pub output: Vec<String>,
}

impl CoreDimTable {
    /// Every dim consumed by at least one input.
    pub fn consumed(&self) -> impl Iterator<Item = &String> {
        self.inputs.iter().flat_map(|input| input.dims.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointwise_operations_consume_nothing() {
        for op in [
            Operation::GaussianCrps,
            Operation::QuadratureCrps,
            Operation::BrierScore,
        ] {
            let cores = op.core_dims(DEFAULT_MEMBER_DIM);
            assert_eq!(cores.consumed().count(), 0, "{op}");
            assert!(cores.output.is_empty());
        }
    }

    #[test]
    fn test_ensemble_consumes_member_dim_on_forecasts_only() {
        let cores = Operation::EnsembleCrps {
            member_weights: false,
        }
        .core_dims("realization");
        assert_eq!(cores.inputs[0].dims, Vec::<String>::new());
        assert_eq!(cores.inputs[1].role, "forecasts");
        assert_eq!(cores.inputs[1].dims, vec!["realization".to_string()]);
        assert!(cores.output.is_empty());

        let weighted = Operation::EnsembleCrps {
            member_weights: true,
        }
        .core_dims("member");
        assert_eq!(weighted.inputs.len(), 3);
        assert_eq!(weighted.inputs[2].dims, vec!["member".to_string()]);
    }

    #[test]
    fn test_vector_threshold_adds_output_dim() {
        let scalar = Operation::ThresholdBrierScore { vector: false }.core_dims("member");
        assert!(scalar.output.is_empty());
        assert!(scalar.inputs[2].dims.is_empty());

        let vector = Operation::ThresholdBrierScore { vector: true }.core_dims("member");
        assert_eq!(vector.inputs[2].dims, vec![THRESHOLD_DIM.to_string()]);
        assert_eq!(vector.output, vec![THRESHOLD_DIM.to_string()]);
    }
}
