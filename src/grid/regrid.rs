//! Four-point weighted regridding onto the SalishSeaCast grid.

use ndarray::{s, Array3, ArrayD, ArrayViewD, Axis, Ix3, Zip};

use super::weights::WeightingMatrix;
use crate::error::{ForcingError, Result};

/// Missing-data policy of a regrid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegridMethod {
    /// Every corner exists (HRDPS winds); plain weighted sum
    Dense,
    /// Corners may be absent (WaveWatch3); cells with no corner are NaN
    Sparse,
}

/// Regrid a `(y, x)` or `(time, y, x)` field onto the matrix's target grid
///
/// The output keeps the input's rank: `(rows, cols)` or `(time, rows, cols)`.
pub fn regrid(
    source: ArrayViewD<f64>,
    matrix: &WeightingMatrix,
    method: RegridMethod,
) -> Result<ArrayD<f64>> {
    let spatial_only = match source.ndim() {
        2 => true,
        3 => false,
        n => {
            return Err(ForcingError::Regrid(format!(
                "Expected a 2-D or 3-D field, got {} dimensions",
                n
            )))
        }
    };
    let stacked = if spatial_only {
        source.insert_axis(Axis(0))
    } else {
        source
    };
    let stacked = stacked
        .into_dimensionality::<Ix3>()
        .map_err(|e| ForcingError::Regrid(e.to_string()))?;

    let (nt, ny, nx) = stacked.dim();
    let (need_rows, need_cols) = matrix.required_source_shape();
    if need_rows > ny || need_cols > nx {
        return Err(ForcingError::Regrid(format!(
            "Source grid {} x {} is smaller than the {} x {} the weights reference",
            ny, nx, need_rows, need_cols
        )));
    }
    if method == RegridMethod::Dense && !matrix.is_dense() {
        return Err(ForcingError::Regrid(
            "Weighting matrix has missing corners; use the sparse regrid".to_string(),
        ));
    }

    // time becomes the trailing axis so each source point is one contiguous lane
    let transposed = stacked.permuted_axes([1, 2, 0]);
    let src = transposed.as_standard_layout();

    let (rows, cols) = matrix.shape();
    let mut out = match method {
        RegridMethod::Dense => Array3::<f64>::zeros((rows, cols, nt)),
        RegridMethod::Sparse => Array3::<f64>::from_elem((rows, cols, nt), f64::NAN),
    };
    let corners = matrix.corners();

    Zip::indexed(out.lanes_mut(Axis(2))).par_for_each(|(i, j), mut lane| match method {
        RegridMethod::Dense => {
            for corner in corners {
                if let Some(idx) = corner.index[[i, j]] {
                    let w = corner.weight[[i, j]];
                    let values = src.slice(s![idx.row, idx.col, ..]);
                    lane.zip_mut_with(&values, |o, &v| *o += v * w);
                }
            }
        }
        RegridMethod::Sparse => {
            let mut touched = false;
            for corner in corners {
                if let Some(idx) = corner.index[[i, j]] {
                    if !touched {
                        lane.fill(0.0);
                        touched = true;
                    }
                    let w = corner.weight[[i, j]];
                    let values = src.slice(s![idx.row, idx.col, ..]);
                    lane.zip_mut_with(&values, |o, &v| {
                        let contribution = v * w;
                        if !contribution.is_nan() {
                            *o += contribution;
                        }
                    });
                }
            }
        }
    });

    let restored = out
        .permuted_axes([2, 0, 1])
        .as_standard_layout()
        .into_owned();
    if spatial_only {
        Ok(restored.index_axis_move(Axis(0), 0).into_dyn())
    } else {
        Ok(restored.into_dyn())
    }
}

/// Regrid HRDPS-style fields; every corner must exist
pub fn regrid_dense(source: ArrayViewD<f64>, matrix: &WeightingMatrix) -> Result<ArrayD<f64>> {
    regrid(source, matrix, RegridMethod::Dense)
}

/// Regrid WaveWatch3-style fields; absent corners are excluded, not zeroed
pub fn regrid_sparse(source: ArrayViewD<f64>, matrix: &WeightingMatrix) -> Result<ArrayD<f64>> {
    regrid(source, matrix, RegridMethod::Sparse)
}
