//! Scalar promotion and name-keyed broadcasting.
//!
//! Two arrays combine by an outer join on dimension names. The joined frame
//! lists the first array's dims in order, followed by new dims in order of
//! appearance. A shared dim must have equal sizes on both sides, or size one on
//! one side, which is then expanded. Shared coordinate labels of equal length
//! must match exactly.

use crate::error::{Result, ScoreError};
use crate::labeled::{Coord, LabeledArray};
use ndarray::{Axis, IxDyn};
use std::borrow::Cow;
use std::collections::BTreeMap;
use tracing::trace;

/// An operation argument given either as an array or as a bare number.
#[derive(Debug, Clone, Copy)]
pub enum Input<'a> {
    Array(&'a LabeledArray),
    Scalar(f64),
}

impl<'a> Input<'a> {
    /// Promotes a bare number to a zero-dimensional array; arrays are borrowed.
    pub fn promote(self) -> Cow<'a, LabeledArray> {
        match self {
            Input::Array(arr) => Cow::Borrowed(arr),
            Input::Scalar(v) => Cow::Owned(LabeledArray::scalar(v)),
        }
    }
}

impl<'a> From<&'a LabeledArray> for Input<'a> {
    fn from(arr: &'a LabeledArray) -> Self {
        Input::Array(arr)
    }
}

impl From<f64> for Input<'_> {
    fn from(v: f64) -> Self {
        Input::Scalar(v)
    }
}

/// The common dimensional frame of several arrays.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    dims: Vec<String>,
    sizes: Vec<usize>,
    coords: BTreeMap<String, Coord>,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    /// The frame spanned by a single array.
    pub fn of(arr: &LabeledArray) -> Self {
        Frame {
            dims: arr.dims().to_vec(),
            sizes: arr.shape().to_vec(),
            coords: arr.coords().clone(),
        }
    }

    pub fn dims(&self) -> &[String] {
        &self.dims
    }

    pub fn sizes(&self) -> &[usize] {
        &self.sizes
    }

    pub fn coords(&self) -> &BTreeMap<String, Coord> {
        &self.coords
    }

    /// Number of elements an array spanning this frame holds.
    pub fn n_cells(&self) -> usize {
        self.sizes.iter().product()
    }

    /// Outer-joins every dim of `arr` not listed in `skip` into the frame.
    pub fn join(&mut self, arr: &LabeledArray, skip: &[String]) -> Result<()> {
        for (dim, &size) in arr.dims().iter().zip(arr.shape()) {
            if skip.contains(dim) {
                continue;
            }
            let coord = arr.coord(dim);
            match self.dims.iter().position(|d| d == dim) {
                None => {
                    self.dims.push(dim.clone());
                    self.sizes.push(size);
                    if let Some(c) = coord {
                        self.coords.insert(dim.clone(), c.clone());
                    }
                }
                Some(i) if self.sizes[i] == size => match (self.coords.get(dim), coord) {
                    (Some(ours), Some(theirs)) if ours != theirs => {
                        return Err(ScoreError::CoordinateMismatch { dim: dim.clone() });
                    }
                    (None, Some(theirs)) => {
                        self.coords.insert(dim.clone(), theirs.clone());
                    }
                    _ => {}
                },
                Some(i) if self.sizes[i] == 1 => {
                    self.sizes[i] = size;
                    match coord {
                        Some(c) => self.coords.insert(dim.clone(), c.clone()),
                        None => self.coords.remove(dim),
                    };
                }
                Some(_) if size == 1 => {}
                Some(i) => {
                    return Err(ScoreError::Shape {
                        dim: dim.clone(),
                        left: self.sizes[i],
                        right: size,
                    });
                }
            }
        }
        Ok(())
    }

    /// Broadcasts `arr` onto the frame, keeping its attrs.
    ///
    /// Every dim of `arr` must already belong to the frame.
    pub fn expand(&self, arr: &LabeledArray) -> Result<LabeledArray> {
        let values = self.layout(arr, &[])?;
        let data = ndarray::ArrayD::from_shape_vec(IxDyn(&self.sizes), values)
            .map_err(|e| ScoreError::InvalidArray(e.to_string()))?;
        Ok(LabeledArray::from_parts(
            data,
            self.dims.clone(),
            self.coords.clone(),
            arr.attrs().clone(),
        ))
    }

    /// Row-major values of `arr` laid out as `[frame dims..., core dims...]`.
    ///
    /// Frame dims missing from `arr` (or of size one on it) are repeated; the
    /// core dims keep their own sizes and come last, in the order given.
    pub(crate) fn layout(&self, arr: &LabeledArray, core: &[String]) -> Result<Vec<f64>> {
        let mut perm = Vec::with_capacity(arr.ndim());
        let mut shape = Vec::with_capacity(self.dims.len() + core.len());

        for (dim, &size) in self.dims.iter().zip(&self.sizes) {
            if let Some(axis) = arr.axis_of(dim) {
                let own = arr.shape()[axis];
                if own != size && own != 1 {
                    return Err(ScoreError::Shape {
                        dim: dim.clone(),
                        left: size,
                        right: own,
                    });
                }
                perm.push(axis);
            }
            shape.push(size);
        }
        for dim in core {
            let axis = arr
                .axis_of(dim)
                .ok_or_else(|| ScoreError::missing_dimension("input", dim, arr.dims()))?;
            perm.push(axis);
            shape.push(arr.shape()[axis]);
        }
        if perm.len() != arr.ndim() {
            let stray = arr
                .dims()
                .iter()
                .find(|d| !self.dims.contains(d) && !core.contains(d))
                .map(String::as_str)
                .unwrap_or_default();
            return Err(ScoreError::missing_dimension("broadcast frame", stray, &self.dims));
        }

        let mut view = arr.values().view().permuted_axes(perm);
        for (i, dim) in self.dims.iter().enumerate() {
            if !arr.has_dim(dim) {
                view = view.insert_axis(Axis(i));
            }
        }
        let expanded = view.broadcast(IxDyn(&shape)).ok_or_else(|| {
            ScoreError::InvalidArray(format!(
                "cannot broadcast {:?} onto {:?}",
                arr.shape(),
                shape
            ))
        })?;
        Ok(expanded.iter().copied().collect())
    }
}

/// Broadcasts two arrays onto their joint frame.
///
/// Arrays that already share the same dims and shape are returned borrowed.
pub fn broadcast_pair<'a>(
    a: &'a LabeledArray,
    b: &'a LabeledArray,
) -> Result<(Cow<'a, LabeledArray>, Cow<'a, LabeledArray>)> {
    let mut frame = Frame::of(a);
    frame.join(b, &[])?;
    if a.dims() == b.dims() && a.shape() == b.shape() {
        trace!(dims = ?a.dims(), "inputs already aligned");
        return Ok((Cow::Borrowed(a), Cow::Borrowed(b)));
    }
    Ok((Cow::Owned(frame.expand(a)?), Cow::Owned(frame.expand(b)?)))
}

/// Broadcasts any number of arrays onto their joint frame.
pub fn broadcast_all<'a>(arrays: &[&'a LabeledArray]) -> Result<Vec<Cow<'a, LabeledArray>>> {
    let mut frame = Frame::new();
    for arr in arrays {
        frame.join(arr, &[])?;
    }
    arrays
        .iter()
        .map(|&arr| {
            if arr.dims() == frame.dims() && arr.shape() == frame.sizes() {
                Ok(Cow::Borrowed(arr))
            } else {
                frame.expand(arr).map(Cow::Owned)
            }
        })
        .collect()
}
