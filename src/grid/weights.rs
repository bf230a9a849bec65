//! Four-corner interpolation weights from SalishSeaCast-grid cells to a source grid.

use ndarray::{Array2, Array3, ArrayD, Axis, Ix3, IxDyn};
use rayon::prelude::*;
use std::path::Path;
use tracing::debug;

use crate::error::{ForcingError, Result};

/// SalishSeaCast target grid (y, x)
pub const TARGET_GRID_SHAPE: (usize, usize) = (898, 398);

/// Integer written by the weights generator for "no source point"
pub const MISSING_INDEX_SENTINEL: i64 = i64::MIN;

/// Number of contributing source points per target cell
pub const CORNERS: usize = 4;

/// A (row, column) position on the source grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceIndex {
    pub row: usize,
    pub col: usize,
}

/// One of the four contributions: where to read and how much it counts
#[derive(Debug, Clone)]
pub struct Corner {
    pub index: Array2<Option<SourceIndex>>,
    pub weight: Array2<f64>,
}

/// Precomputed regridding weights, immutable once loaded
#[derive(Debug, Clone)]
pub struct WeightingMatrix {
    corners: [Corner; CORNERS],
    shape: (usize, usize),
}

impl WeightingMatrix {
    /// Build from already-converted corners; all arrays must share one shape
    pub fn new(corners: [Corner; CORNERS]) -> Result<Self> {
        let shape = corners[0].weight.dim();
        for (k, corner) in corners.iter().enumerate() {
            if corner.index.dim() != shape || corner.weight.dim() != shape {
                return Err(ForcingError::Regrid(format!(
                    "Corner {} has index shape {:?} and weight shape {:?}, expected {:?}",
                    k,
                    corner.index.dim(),
                    corner.weight.dim(),
                    shape
                )));
            }
        }
        Ok(Self { corners, shape })
    }

    /// Build from raw integer indices, where [`MISSING_INDEX_SENTINEL`] marks absent corners
    pub fn from_sentinel_indices(
        rows: [Array2<i64>; CORNERS],
        cols: [Array2<i64>; CORNERS],
        weights: [Array2<f64>; CORNERS],
    ) -> Result<Self> {
        let mut corners = Vec::with_capacity(CORNERS);
        for ((row, col), weight) in rows.into_iter().zip(cols).zip(weights) {
            if row.dim() != col.dim() {
                return Err(ForcingError::Regrid(format!(
                    "Row index shape {:?} differs from column index shape {:?}",
                    row.dim(),
                    col.dim()
                )));
            }
            let mut index = Array2::from_elem(row.dim(), None);
            for ((slot, &r), &c) in index.iter_mut().zip(row.iter()).zip(col.iter()) {
                *slot = source_index(r as f64, c as f64)
                    .map_err(ForcingError::Regrid)?;
            }
            corners.push(Corner { index, weight });
        }
        let corners: [Corner; CORNERS] = corners
            .try_into()
            .map_err(|_| ForcingError::Regrid("Expected four corners".to_string()))?;
        Self::new(corners)
    }

    /// Load the weights resource for the SalishSeaCast grid
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_with_shape(path, TARGET_GRID_SHAPE)
    }

    /// Load a weights resource, requiring every array to match `expected_shape`
    ///
    /// The resource holds `y`, `x` and `weights` variables, each with an
    /// `index` dimension of length 4 next to the two target-grid dimensions.
    pub fn load_with_shape(path: impl AsRef<Path>, expected_shape: (usize, usize)) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ForcingError::weights(path, "file does not exist"));
        }
        let file = netcdf::open(path)
            .map_err(|e| ForcingError::weights(path, format!("cannot open: {}", e)))?;

        let rows = read_corner_stack(&file, "y", path, expected_shape)?;
        let cols = read_corner_stack(&file, "x", path, expected_shape)?;
        let weights = read_corner_stack(&file, "weights", path, expected_shape)?;

        let corners: Vec<Corner> = (0..CORNERS)
            .into_par_iter()
            .map(|k| -> std::result::Result<Corner, String> {
                let row = rows.index_axis(Axis(0), k);
                let col = cols.index_axis(Axis(0), k);
                let mut index = Array2::from_elem(expected_shape, None);
                for ((slot, &r), &c) in index.iter_mut().zip(row.iter()).zip(col.iter()) {
                    *slot = source_index(r, c)?;
                }
                Ok(Corner {
                    index,
                    weight: weights.index_axis(Axis(0), k).to_owned(),
                })
            })
            .collect::<std::result::Result<_, String>>()
            .map_err(|reason| ForcingError::weights(path, reason))?;
        let corners: [Corner; CORNERS] = corners
            .try_into()
            .map_err(|_| ForcingError::weights(path, "expected four corners"))?;

        let matrix = Self::new(corners)?;
        debug!(
            "Loaded weighting matrix {} ({} x {}, dense: {})",
            path.display(),
            expected_shape.0,
            expected_shape.1,
            matrix.is_dense()
        );
        Ok(matrix)
    }

    /// Target grid shape (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    pub fn corners(&self) -> &[Corner; CORNERS] {
        &self.corners
    }

    /// True when no corner anywhere is missing
    pub fn is_dense(&self) -> bool {
        self.corners
            .iter()
            .all(|c| c.index.iter().all(Option::is_some))
    }

    /// Smallest source grid (rows, columns) that covers every referenced index
    pub fn required_source_shape(&self) -> (usize, usize) {
        self.corners
            .iter()
            .flat_map(|c| c.index.iter().flatten())
            .fold((0, 0), |(rows, cols), idx| {
                (rows.max(idx.row + 1), cols.max(idx.col + 1))
            })
    }
}

/// Convert a raw (row, column) pair into an optional source index
fn source_index(row: f64, col: f64) -> std::result::Result<Option<SourceIndex>, String> {
    let missing = |v: f64| v.is_nan() || v <= MISSING_INDEX_SENTINEL as f64;
    if missing(row) || missing(col) {
        return Ok(None);
    }
    if row < 0.0 || col < 0.0 || row.fract() != 0.0 || col.fract() != 0.0 {
        return Err(format!("invalid source index ({}, {})", row, col));
    }
    Ok(Some(SourceIndex {
        row: row as usize,
        col: col as usize,
    }))
}

/// Read one variable as a (4, rows, cols) stack with the `index` axis first
fn read_corner_stack(
    file: &netcdf::File,
    name: &str,
    path: &Path,
    expected_shape: (usize, usize),
) -> Result<Array3<f64>> {
    let var = file
        .variable(name)
        .ok_or_else(|| ForcingError::weights(path, format!("variable '{}' not found", name)))?;

    let dims: Vec<(String, usize)> = var
        .dimensions()
        .iter()
        .map(|d| (d.name(), d.len()))
        .collect();
    if dims.len() != 3 {
        return Err(ForcingError::weights(
            path,
            format!("variable '{}' has {} dimensions, expected 3", name, dims.len()),
        ));
    }
    let index_axis = dims
        .iter()
        .position(|(dim, _)| dim == "index")
        .unwrap_or(0);
    if dims[index_axis].1 != CORNERS {
        return Err(ForcingError::weights(
            path,
            format!("variable '{}' has {} corners, expected {}", name, dims[index_axis].1, CORNERS),
        ));
    }

    let values = var
        .get_values::<f64, _>(..)
        .map_err(|e| ForcingError::weights(path, format!("cannot read '{}': {}", name, e)))?;
    let shape: Vec<usize> = dims.iter().map(|(_, len)| *len).collect();
    let array = ArrayD::from_shape_vec(IxDyn(&shape), values)
        .map_err(|e| ForcingError::weights(path, e.to_string()))?
        .into_dimensionality::<Ix3>()
        .map_err(|e| ForcingError::weights(path, e.to_string()))?;

    let mut order: Vec<usize> = (0..3).filter(|&a| a != index_axis).collect();
    order.insert(0, index_axis);
    let stack = array
        .permuted_axes([order[0], order[1], order[2]])
        .as_standard_layout()
        .into_owned();

    let grid = (stack.dim().1, stack.dim().2);
    if grid != expected_shape {
        return Err(ForcingError::weights(
            path,
            format!(
                "variable '{}' covers a {:?} grid, expected {:?}",
                name, grid, expected_shape
            ),
        ));
    }
    Ok(stack)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    #[test]
    fn test_sentinel_becomes_none() {
        assert_eq!(source_index(MISSING_INDEX_SENTINEL as f64, 3.0), Ok(None));
        assert_eq!(source_index(f64::NAN, 3.0), Ok(None));
        assert_eq!(
            source_index(2.0, 3.0),
            Ok(Some(SourceIndex { row: 2, col: 3 }))
        );
        assert!(source_index(-1.0, 3.0).is_err());
    }

    #[test]
    fn test_from_sentinel_indices() {
        let s = MISSING_INDEX_SENTINEL;
        let rows = [arr2(&[[0, s]]), arr2(&[[1, 1]]), arr2(&[[0, 0]]), arr2(&[[1, 4]])];
        let cols = [arr2(&[[0, 0]]), arr2(&[[0, 0]]), arr2(&[[1, 1]]), arr2(&[[1, 2]])];
        let weights = [
            arr2(&[[0.25, 0.0]]),
            arr2(&[[0.25, 0.5]]),
            arr2(&[[0.25, 0.25]]),
            arr2(&[[0.25, 0.25]]),
        ];
        let matrix = WeightingMatrix::from_sentinel_indices(rows, cols, weights).unwrap();
        assert_eq!(matrix.shape(), (1, 2));
        assert!(!matrix.is_dense());
        assert_eq!(matrix.corners()[0].index[[0, 1]], None);
        assert_eq!(matrix.required_source_shape(), (5, 3));
    }

    #[test]
    fn test_mismatched_corner_shapes_rejected() {
        let good = Corner {
            index: Array2::from_elem((2, 2), Some(SourceIndex { row: 0, col: 0 })),
            weight: Array2::zeros((2, 2)),
        };
        let bad = Corner {
            index: Array2::from_elem((2, 3), None),
            weight: Array2::zeros((2, 3)),
        };
        let result = WeightingMatrix::new([good.clone(), good.clone(), good, bad]);
        assert!(matches!(result, Err(ForcingError::Regrid(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let err = WeightingMatrix::load("/nonexistent/weights.nc").unwrap_err();
        assert!(matches!(err, ForcingError::WeightingResource { .. }));
    }
}
