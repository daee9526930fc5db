use super::{AttrValue, Attrs, LabeledArray};
use crate::error::{Result, ScoreError};
use crate::reduce::weighted_mean;
use crate::scores::Reduction;
use std::collections::BTreeMap;
use tracing::debug;

/// A named collection of labeled arrays.
///
/// Scoring a dataset scores each variable independently against the forecast
/// variable of the same name.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Dataset {
    variables: BTreeMap<String, LabeledArray>,
    attrs: Attrs,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_variable(mut self, name: impl Into<String>, arr: LabeledArray) -> Self {
        self.variables.insert(name.into(), arr);
        self
    }

    /// Adds or replaces a variable, returning the previous one.
    pub fn insert(&mut self, name: impl Into<String>, arr: LabeledArray) -> Option<LabeledArray> {
        self.variables.insert(name.into(), arr)
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&LabeledArray> {
        self.variables.get(name)
    }

    /// Variables in name order.
    pub fn variables(&self) -> impl Iterator<Item = (&str, &LabeledArray)> {
        self.variables.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.variables.keys().map(String::as_str)
    }

    pub fn attrs(&self) -> &Attrs {
        &self.attrs
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Applies `f` to every variable.
    pub fn map<F>(&self, keep_attrs: bool, mut f: F) -> Result<Dataset>
    where
        F: FnMut(&LabeledArray) -> Result<LabeledArray>,
    {
        let variables = self
            .variables
            .iter()
            .map(|(name, arr)| Ok((name.clone(), f(arr)?)))
            .collect::<Result<BTreeMap<_, _>>>()?;
        Ok(Dataset {
            variables,
            attrs: self.kept_attrs(keep_attrs),
        })
    }

    /// Applies `f` to every variable paired with its namesake in `other`.
    ///
    /// Every variable of `self` needs a counterpart; extra variables in
    /// `other` are ignored.
    pub fn zip_with<F>(&self, other: &Dataset, keep_attrs: bool, mut f: F) -> Result<Dataset>
    where
        F: FnMut(&LabeledArray, &LabeledArray) -> Result<LabeledArray>,
    {
        let variables = self
            .variables
            .iter()
            .map(|(name, arr)| {
                let partner = other
                    .get(name)
                    .ok_or_else(|| ScoreError::MissingVariable(name.clone()))?;
                Ok((name.clone(), f(arr, partner)?))
            })
            .collect::<Result<BTreeMap<_, _>>>()?;
        Ok(Dataset {
            variables,
            attrs: self.kept_attrs(keep_attrs),
        })
    }

    /// Averages every variable according to `reduction`.
    ///
    /// With explicit dims each variable is reduced over those it has; a dim
    /// that no variable has is an error. Weights apply to the variables that
    /// span every weight dim; the others are averaged without them.
    pub fn mean(&self, reduction: &Reduction) -> Result<Dataset> {
        if let Some(dims) = &reduction.dim {
            for dim in dims {
                if !self.variables.values().any(|v| v.has_dim(dim)) {
                    let found: Vec<String> = self
                        .variables
                        .values()
                        .flat_map(|v| v.dims().iter().cloned())
                        .collect();
                    return Err(ScoreError::missing_dimension("dataset", dim, &found));
                }
            }
        }
        debug!(variables = self.len(), "reducing dataset");

        self.map(reduction.keep_attrs, |arr| {
            let dims = reduction.dim.as_ref().map(|dims| {
                dims.iter()
                    .filter(|d| arr.has_dim(d))
                    .cloned()
                    .collect::<Vec<_>>()
            });
            let weights = reduction
                .weights
                .as_ref()
                .filter(|w| w.dims().iter().all(|d| arr.has_dim(d)));
            weighted_mean(arr, dims.as_deref(), weights, reduction.keep_attrs)
        })
    }

    fn kept_attrs(&self, keep_attrs: bool) -> Attrs {
        if keep_attrs {
            self.attrs.clone()
        } else {
            Attrs::new()
        }
    }
}

impl FromIterator<(String, LabeledArray)> for Dataset {
    fn from_iter<T: IntoIterator<Item = (String, LabeledArray)>>(iter: T) -> Self {
        Dataset {
            variables: iter.into_iter().collect(),
            attrs: Attrs::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn sample() -> Dataset {
        Dataset::new()
            .with_variable(
                "t2m",
                LabeledArray::from_shape_vec(["time", "lat"], &[2, 2], vec![1.0, 2.0, 3.0, 4.0])
                    .unwrap(),
            )
            .with_variable("slp", LabeledArray::from_vec("time", vec![10.0, 20.0]))
            .with_attr("source", "station")
    }

    #[test]
    fn test_zip_with_requires_every_variable() {
        let obs = sample();
        let partial = Dataset::new().with_variable("t2m", LabeledArray::scalar(0.0));
        let err = obs.zip_with(&partial, false, |a, _| Ok(a.clone())).unwrap_err();
        assert_eq!(err, ScoreError::MissingVariable("slp".into()));
    }

    #[test]
    fn test_insert_replaces_variable() {
        let mut ds = sample();
        let previous = ds.insert("slp", LabeledArray::from_vec("time", vec![0.0, 1.0]));
        assert_eq!(previous.unwrap().get(&[1]), Some(20.0));
        assert!(ds.insert("u10", LabeledArray::scalar(2.0)).is_none());
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.get("slp").unwrap().get(&[1]), Some(1.0));
    }

    #[test]
    fn test_zip_with_attrs() {
        let obs = sample();
        let kept = obs.zip_with(&obs, true, |a, _| Ok(a.clone())).unwrap();
        assert_eq!(kept.attrs(), obs.attrs());
        let dropped = obs.zip_with(&obs, false, |a, _| Ok(a.clone())).unwrap();
        assert!(dropped.attrs().is_empty());
        assert_eq!(dropped.names().collect::<Vec<_>>(), ["slp", "t2m"]);
    }

    #[test]
    fn test_mean_reduces_each_variable_over_its_own_dims() {
        let out = sample().mean(&Reduction::over(["lat"])).unwrap();
        let t2m = out.get("t2m").unwrap();
        assert_eq!(t2m.dims(), ["time"]);
        assert_abs_diff_eq!(t2m.get(&[0]).unwrap(), 1.5, epsilon = 1e-12);
        // slp has no lat and passes through
        assert_eq!(out.get("slp").unwrap().dims(), ["time"]);

        let all = sample().mean(&Reduction::all()).unwrap();
        assert_abs_diff_eq!(all.get("slp").unwrap().item().unwrap(), 15.0, epsilon = 1e-12);
    }

    #[test]
    fn test_weighted_mean_skips_weights_for_variables_without_their_dims() {
        let lat_weights = LabeledArray::from_vec("lat", vec![1.0, 3.0]);
        let unweighted = sample().mean(&Reduction::over(["lat"])).unwrap();
        let weighted = sample()
            .mean(&Reduction::over(["lat"]).weighted(lat_weights.clone()))
            .unwrap();

        assert_eq!(weighted.get("slp"), unweighted.get("slp"));
        let t2m = weighted.get("t2m").unwrap();
        assert_abs_diff_eq!(t2m.get(&[0]).unwrap(), 1.75, epsilon = 1e-12);
        assert_abs_diff_eq!(t2m.get(&[1]).unwrap(), 3.75, epsilon = 1e-12);

        let all = sample()
            .mean(&Reduction::all().weighted(lat_weights))
            .unwrap();
        assert_abs_diff_eq!(all.get("t2m").unwrap().item().unwrap(), 2.75, epsilon = 1e-12);
        assert_abs_diff_eq!(all.get("slp").unwrap().item().unwrap(), 15.0, epsilon = 1e-12);
    }

    #[test]
    fn test_mean_unknown_dim() {
        assert!(matches!(
            sample().mean(&Reduction::over(["level"])),
            Err(ScoreError::MissingDimension { .. })
        ));
    }
}
