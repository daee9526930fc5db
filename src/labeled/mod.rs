//! Dimension-labeled arrays.
//!
//! A [`LabeledArray`] is an `ndarray::ArrayD<f64>` whose axes carry unique
//! names, optional coordinate labels and free-form metadata. It is an
//! immutable value: every operation returns a new array.
//!
//! Arrays never broadcast positionally. Combining two arrays always goes
//! through [`crate::broadcast`], which joins them by dimension name.

mod dataset;

pub use dataset::Dataset;

use crate::error::{Result, ScoreError};
use ndarray::{Array1, ArrayD, Axis, IxDyn};
use std::collections::BTreeMap;

/// Free-form key/value metadata attached to an array or dataset.
pub type Attrs = BTreeMap<String, AttrValue>;

/// A single metadata value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AttrValue {
    Text(String),
    Number(f64),
    Integer(i64),
    Flag(bool),
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        AttrValue::Text(v.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        AttrValue::Text(v)
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::Number(v)
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        AttrValue::Integer(v)
    }
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        AttrValue::Flag(v)
    }
}

/// Coordinate labels along one dimension.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Coord {
    Int(Vec<i64>),
    Float(Vec<f64>),
    Text(Vec<String>),
}

impl Coord {
    pub fn len(&self) -> usize {
        match self {
            Coord::Int(v) => v.len(),
            Coord::Float(v) => v.len(),
            Coord::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Vec<i64>> for Coord {
    fn from(v: Vec<i64>) -> Self {
        Coord::Int(v)
    }
}

impl From<Vec<f64>> for Coord {
    fn from(v: Vec<f64>) -> Self {
        Coord::Float(v)
    }
}

impl From<Vec<String>> for Coord {
    fn from(v: Vec<String>) -> Self {
        Coord::Text(v)
    }
}

impl From<Vec<&str>> for Coord {
    fn from(v: Vec<&str>) -> Self {
        Coord::Text(v.into_iter().map(str::to_string).collect())
    }
}

/// An n-dimensional `f64` array with named axes.
///
/// Deserialization goes through the same checks as [`LabeledArray::new`] and
/// [`LabeledArray::with_coord`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawLabeledArray"))]
pub struct LabeledArray {
    data: ArrayD<f64>,
    dims: Vec<String>,
    coords: BTreeMap<String, Coord>,
    attrs: Attrs,
}

/// Serialized form of a [`LabeledArray`], not yet validated.
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawLabeledArray {
    data: ArrayD<f64>,
    dims: Vec<String>,
    #[serde(default)]
    coords: BTreeMap<String, Coord>,
    #[serde(default)]
    attrs: Attrs,
}

#[cfg(feature = "serde")]
impl TryFrom<RawLabeledArray> for LabeledArray {
    type Error = ScoreError;

    fn try_from(raw: RawLabeledArray) -> Result<Self> {
        let mut arr = LabeledArray::new(raw.dims, raw.data)?;
        for (dim, coord) in raw.coords {
            arr = arr.with_coord(&dim, coord)?;
        }
        Ok(arr.with_attrs(raw.attrs))
    }
}

impl LabeledArray {
    /// Wraps `data`, naming its axes in order.
    ///
    /// Fails if the number of names differs from the number of axes or a name
    /// repeats.
    pub fn new<I, S>(dims: I, data: ArrayD<f64>) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let dims: Vec<String> = dims.into_iter().map(Into::into).collect();
        if dims.len() != data.ndim() {
            return Err(ScoreError::InvalidArray(format!(
                "{} dimension names given for a {}-dimensional array",
                dims.len(),
                data.ndim()
            )));
        }
        for (i, d) in dims.iter().enumerate() {
            if dims[..i].contains(d) {
                return Err(ScoreError::InvalidArray(format!(
                    "dimension `{d}` appears more than once"
                )));
            }
        }
        Ok(LabeledArray {
            data,
            dims,
            coords: BTreeMap::new(),
            attrs: Attrs::new(),
        })
    }

    /// A zero-dimensional array holding `value`.
    pub fn scalar(value: f64) -> Self {
        LabeledArray {
            data: ArrayD::from_elem(IxDyn(&[]), value),
            dims: Vec::new(),
            coords: BTreeMap::new(),
            attrs: Attrs::new(),
        }
    }

    /// A one-dimensional array along `dim`.
    pub fn from_vec(dim: impl Into<String>, values: Vec<f64>) -> Self {
        LabeledArray {
            data: Array1::from_vec(values).into_dyn(),
            dims: vec![dim.into()],
            coords: BTreeMap::new(),
            attrs: Attrs::new(),
        }
    }

    /// Builds an array from row-major `values` with the given dims and shape.
    pub fn from_shape_vec<I, S>(dims: I, shape: &[usize], values: Vec<f64>) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let data = ArrayD::from_shape_vec(IxDyn(shape), values)
            .map_err(|e| ScoreError::InvalidArray(e.to_string()))?;
        Self::new(dims, data)
    }

    /// Attaches coordinate labels to `dim`.
    pub fn with_coord(mut self, dim: &str, coord: impl Into<Coord>) -> Result<Self> {
        let coord = coord.into();
        let size = self
            .len_of(dim)
            .ok_or_else(|| ScoreError::missing_dimension("array", dim, &self.dims))?;
        if coord.len() != size {
            return Err(ScoreError::Shape {
                dim: dim.to_string(),
                left: size,
                right: coord.len(),
            });
        }
        self.coords.insert(dim.to_string(), coord);
        Ok(self)
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    pub fn with_attrs(mut self, attrs: Attrs) -> Self {
        self.attrs = attrs;
        self
    }

    pub fn dims(&self) -> &[String] {
        &self.dims
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn ndim(&self) -> usize {
        self.data.ndim()
    }

    /// Total number of elements.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn axis_of(&self, dim: &str) -> Option<usize> {
        self.dims.iter().position(|d| d == dim)
    }

    pub fn has_dim(&self, dim: &str) -> bool {
        self.axis_of(dim).is_some()
    }

    /// Size of `dim`, if present.
    pub fn len_of(&self, dim: &str) -> Option<usize> {
        self.axis_of(dim).map(|axis| self.data.len_of(Axis(axis)))
    }

    pub fn values(&self) -> &ArrayD<f64> {
        &self.data
    }

    pub fn into_values(self) -> ArrayD<f64> {
        self.data
    }

    pub fn coord(&self, dim: &str) -> Option<&Coord> {
        self.coords.get(dim)
    }

    pub fn coords(&self) -> &BTreeMap<String, Coord> {
        &self.coords
    }

    pub fn attrs(&self) -> &Attrs {
        &self.attrs
    }

    /// Element at a positional index (one entry per dim, in dim order).
    pub fn get(&self, index: &[usize]) -> Option<f64> {
        self.data.get(index).copied()
    }

    /// The value of a zero-dimensional (or single-element) array.
    pub fn item(&self) -> Option<f64> {
        if self.data.len() == 1 {
            self.data.iter().next().copied()
        } else {
            None
        }
    }

    /// Selects position `index` along `dim` and drops that dimension.
    pub fn index_axis(&self, dim: &str, index: usize) -> Result<Self> {
        let axis = self
            .axis_of(dim)
            .ok_or_else(|| ScoreError::missing_dimension("array", dim, &self.dims))?;
        let size = self.data.len_of(Axis(axis));
        if index >= size {
            return Err(ScoreError::InvalidArray(format!(
                "index {index} out of bounds for dimension `{dim}` of size {size}"
            )));
        }
        let mut coords = self.coords.clone();
        coords.remove(dim);
        Ok(LabeledArray {
            data: self.data.index_axis(Axis(axis), index).to_owned(),
            dims: self.dims.iter().filter(|d| *d != dim).cloned().collect(),
            coords,
            attrs: self.attrs.clone(),
        })
    }

    /// Drops a dimension of size one.
    pub fn squeeze(&self, dim: &str) -> Result<Self> {
        match self.len_of(dim) {
            Some(1) => self.index_axis(dim, 0),
            Some(size) => Err(ScoreError::InvalidArray(format!(
                "cannot squeeze dimension `{dim}` of size {size}"
            ))),
            None => Err(ScoreError::missing_dimension("array", dim, &self.dims)),
        }
    }

    /// Reorders the axes to follow `order`, which must name every dim exactly once.
    pub fn transpose(&self, order: &[&str]) -> Result<Self> {
        if order.len() != self.dims.len() {
            return Err(ScoreError::InvalidArray(format!(
                "transpose order {order:?} does not match dimensions {:?}",
                self.dims
            )));
        }
        let perm = order
            .iter()
            .map(|d| {
                self.axis_of(d)
                    .ok_or_else(|| ScoreError::missing_dimension("array", d, &self.dims))
            })
            .collect::<Result<Vec<_>>>()?;
        let mut seen = vec![false; perm.len()];
        for &p in &perm {
            if std::mem::replace(&mut seen[p], true) {
                return Err(ScoreError::InvalidArray(format!(
                    "transpose order {order:?} repeats a dimension"
                )));
            }
        }
        Ok(LabeledArray {
            data: self.data.clone().permuted_axes(perm),
            dims: order.iter().map(|d| d.to_string()).collect(),
            coords: self.coords.clone(),
            attrs: self.attrs.clone(),
        })
    }

    /// Assembles an array from parts already known to be consistent.
    pub(crate) fn from_parts(
        data: ArrayD<f64>,
        dims: Vec<String>,
        coords: BTreeMap<String, Coord>,
        attrs: Attrs,
    ) -> Self {
        debug_assert_eq!(data.ndim(), dims.len());
        LabeledArray {
            data,
            dims,
            coords,
            attrs,
        }
    }
}

impl From<f64> for LabeledArray {
    fn from(value: f64) -> Self {
        LabeledArray::scalar(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> LabeledArray {
        LabeledArray::from_shape_vec(["lat", "lon"], &[2, 3], (0..6).map(f64::from).collect())
            .unwrap()
            .with_coord("lon", vec![10.0, 20.0, 30.0])
            .unwrap()
    }

    #[test]
    fn test_new_rejects_bad_dims() {
        let data = ArrayD::zeros(IxDyn(&[2, 2]));
        assert!(matches!(
            LabeledArray::new(["x"], data.clone()),
            Err(ScoreError::InvalidArray(_))
        ));
        assert!(matches!(
            LabeledArray::new(["x", "x"], data),
            Err(ScoreError::InvalidArray(_))
        ));
    }

    #[test]
    fn test_coord_length_checked() {
        let arr = LabeledArray::from_vec("x", vec![1.0, 2.0]);
        assert_eq!(
            arr.clone().with_coord("x", vec![1_i64]),
            Err(ScoreError::Shape {
                dim: "x".into(),
                left: 2,
                right: 1
            })
        );
        assert!(matches!(
            arr.with_coord("y", vec![1_i64, 2]),
            Err(ScoreError::MissingDimension { .. })
        ));
    }

    #[test]
    fn test_index_axis_drops_dim_and_coord() {
        let row = grid().index_axis("lat", 1).unwrap();
        assert_eq!(row.dims(), ["lon"]);
        assert_eq!(row.get(&[2]), Some(5.0));
        assert!(row.coord("lon").is_some());

        let col = grid().index_axis("lon", 0).unwrap();
        assert!(col.coord("lon").is_none());
        assert_eq!(col.get(&[1]), Some(3.0));
    }

    #[test]
    fn test_transpose_by_name() {
        let t = grid().transpose(&["lon", "lat"]).unwrap();
        assert_eq!(t.shape(), [3, 2]);
        assert_eq!(t.get(&[2, 1]), Some(5.0));
        assert!(grid().transpose(&["lon", "lon"]).is_err());
    }

    #[test]
    fn test_squeeze_only_unit_dims() {
        let arr = LabeledArray::from_shape_vec(["a", "b"], &[1, 2], vec![1.0, 2.0]).unwrap();
        assert_eq!(arr.squeeze("a").unwrap().dims(), ["b"]);
        assert!(arr.squeeze("b").is_err());
    }

    #[test]
    fn test_scalar_item() {
        assert_eq!(LabeledArray::scalar(3.5).item(), Some(3.5));
        assert_eq!(LabeledArray::from(1.0).ndim(), 0);
        assert_eq!(grid().item(), None);
    }
}
