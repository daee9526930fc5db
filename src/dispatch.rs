//! Lifts a flat scoring kernel onto labeled arrays.
//!
//! Each input is split into its loop dims, which are joined into one frame
//! and broadcast, and its core dims, which are handed to the kernel whole.
//! The kernel then runs once per frame cell, in parallel.

use crate::broadcast::Frame;
use crate::core_dims::Operation;
use crate::error::{Result, ScoreError};
use crate::kernels::KernelError;
use crate::labeled::{Attrs, Coord, LabeledArray};
use ndarray::{ArrayD, IxDyn};
use rayon::prelude::*;
use tracing::debug;

/// A new dimension appended to the kernel output.
#[derive(Debug, Clone)]
pub(crate) struct OutputAxis {
    pub dim: String,
    pub size: usize,
    pub coord: Option<Coord>,
}

/// One input flattened to `(cells, width)`, with its core dims innermost.
struct Cells {
    data: Vec<f64>,
    width: usize,
}

impl Cells {
    fn row(&self, cell: usize) -> &[f64] {
        &self.data[cell * self.width..(cell + 1) * self.width]
    }
}

/// Applies `kernel` to every broadcast cell of `arrays`.
///
/// `arrays` follow the argument order of `operation`'s core-dim table. The
/// kernel receives one slice per input (its core values, member axis last)
/// and fills one slot, or one slot per entry of `output_axis`.
///
/// The result spans the joined loop dims followed by `output_axis`. It carries
/// the first input's attrs when `keep_attrs` is set and none otherwise.
pub(crate) fn apply_kernel<K>(
    operation: Operation,
    member_dim: &str,
    arrays: &[&LabeledArray],
    output_axis: Option<OutputAxis>,
    keep_attrs: bool,
    kernel: K,
) -> Result<LabeledArray>
where
    K: Fn(&[&[f64]], &mut [f64]) -> std::result::Result<(), KernelError> + Sync,
{
    let cores = operation.core_dims(member_dim);
    debug_assert_eq!(cores.inputs.len(), arrays.len());
    debug_assert_eq!(
        cores.output,
        output_axis.iter().map(|a| a.dim.clone()).collect::<Vec<_>>()
    );

    for (input, arr) in cores.inputs.iter().zip(arrays) {
        for dim in &input.dims {
            if !arr.has_dim(dim) {
                return Err(ScoreError::missing_dimension(input.role, dim, arr.dims()));
            }
        }
    }

    let consumed: Vec<&String> = cores.consumed().collect();
    for (input, arr) in cores.inputs.iter().zip(arrays) {
        if let Some(dim) = arr
            .dims()
            .iter()
            .find(|d| consumed.contains(d) && !input.dims.contains(*d))
        {
            return Err(ScoreError::InvalidArray(format!(
                "{} carries dimension `{dim}`, which {operation} consumes",
                input.role
            )));
        }
    }

    let mut frame = Frame::new();
    for (input, arr) in cores.inputs.iter().zip(arrays) {
        frame.join(arr, &input.dims)?;
    }

    let cells = cores
        .inputs
        .iter()
        .zip(arrays)
        .map(|(input, arr)| {
            let width: usize = input
                .dims
                .iter()
                .map(|d| arr.len_of(d).unwrap_or(1))
                .product();
            Ok(Cells {
                data: frame.layout(arr, &input.dims)?,
                width,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let n_cells = frame.n_cells();
    let width = output_axis.as_ref().map_or(1, |axis| axis.size);
    debug!(
        operation = %operation,
        cells = n_cells,
        dims = ?frame.dims(),
        "applying kernel"
    );

    let mut out = vec![0.0; n_cells * width];
    if width > 0 {
        out.par_chunks_mut(width)
            .enumerate()
            .try_for_each(|(cell, slot)| {
                let args: Vec<&[f64]> = cells.iter().map(|c| c.row(cell)).collect();
                kernel(&args, slot)
            })
            .map_err(|source| ScoreError::KernelComputation {
                operation: operation.name(),
                source,
            })?;
    }

    let mut dims = frame.dims().to_vec();
    let mut shape = frame.sizes().to_vec();
    let mut coords = frame.coords().clone();
    if let Some(axis) = output_axis {
        if let Some(coord) = axis.coord {
            coords.insert(axis.dim.clone(), coord);
        }
        dims.push(axis.dim);
        shape.push(axis.size);
    }

    let data = ArrayD::from_shape_vec(IxDyn(&shape), out)
        .map_err(|e| ScoreError::InvalidArray(e.to_string()))?;
    let attrs = match arrays.first() {
        Some(first) if keep_attrs => first.attrs().clone(),
        _ => Attrs::new(),
    };
    Ok(LabeledArray::from_parts(data, dims, coords, attrs))
}
