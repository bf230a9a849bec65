//! Convert SalishSeaCast array layout to the MOHID layout.

use ndarray::{ArrayD, ArrayViewD, Axis, Slice};
use num_traits::Float;
use std::fmt;
use std::str::FromStr;

use crate::error::{ForcingError, Result};

/// Spatial rank of a field, not counting a leading time axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceType {
    /// (y, x), optionally preceded by time
    TwoD,
    /// (depth, y, x), optionally preceded by time
    ThreeD,
}

impl SliceType {
    fn allowed_ndims(&self) -> [usize; 2] {
        match self {
            SliceType::TwoD => [2, 3],
            SliceType::ThreeD => [3, 4],
        }
    }
}

impl fmt::Display for SliceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SliceType::TwoD => write!(f, "2D"),
            SliceType::ThreeD => write!(f, "3D"),
        }
    }
}

impl FromStr for SliceType {
    type Err = ForcingError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "2D" => Ok(SliceType::TwoD),
            "3D" => Ok(SliceType::ThreeD),
            other => Err(ForcingError::Munge(format!(
                "Invalid option {}. array_slice_type must be one of ('2D', '3D')",
                other
            ))),
        }
    }
}

/// Munge a SalishSeaCast-gridded array into a MOHID-gridded `f64` array
///
/// 1. cut the first and last row and column (boundary cells)
/// 2. swap the two spatial axes
/// 3. reverse the depth axis of 3-D slices (MOHID counts from the bottom)
/// 4. NaN becomes 0, infinities become the largest finite values
///
/// A leading time axis, when present, stays first.
pub fn munge<T: Float>(array: ArrayViewD<T>, slice_type: SliceType) -> Result<ArrayD<f64>> {
    let ndim = array.ndim();
    if !slice_type.allowed_ndims().contains(&ndim) {
        return Err(ForcingError::Munge(format!(
            "The shape of the array given is {:?}, while the option chosen was {}",
            array.shape(),
            slice_type
        )));
    }
    let (ny, nx) = (array.shape()[ndim - 2], array.shape()[ndim - 1]);
    if ny < 2 || nx < 2 {
        return Err(ForcingError::Munge(format!(
            "Cannot trim boundary cells from a {} x {} grid",
            ny, nx
        )));
    }

    let mut view = array.slice_each_axis(|desc| {
        if desc.axis.index() + 2 >= ndim {
            Slice::from(1..desc.len - 1)
        } else {
            Slice::from(..)
        }
    });
    view.swap_axes(ndim - 2, ndim - 1);
    if slice_type == SliceType::ThreeD {
        view.invert_axis(Axis(ndim - 3));
    }

    Ok(view.mapv(|v| nan_to_num(v.to_f64().unwrap_or(f64::NAN))))
}

fn nan_to_num(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else if v == f64::INFINITY {
        f64::MAX
    } else if v == f64::NEG_INFINITY {
        f64::MIN
    } else {
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr2, Array, Array3, IxDyn};

    #[test]
    fn test_slice_type_parse() {
        assert_eq!("2D".parse::<SliceType>().unwrap(), SliceType::TwoD);
        assert_eq!("3D".parse::<SliceType>().unwrap(), SliceType::ThreeD);
        assert!("4D".parse::<SliceType>().is_err());
    }

    #[test]
    fn test_munge_2d_trims_and_transposes() {
        let arr = Array::from_shape_fn((4, 5), |(j, i)| (10 * j + i) as f64);
        let out = munge(arr.view().into_dyn(), SliceType::TwoD).unwrap();
        assert_eq!(out.shape(), &[3, 2]);
        // out[x-1, y-1] == arr[y, x]
        assert_eq!(out[[0, 0]], 11.0);
        assert_eq!(out[[2, 1]], 23.0);
    }

    #[test]
    fn test_munge_replaces_nan_and_casts() {
        let mut arr = Array3::<f32>::ones((2, 3, 3));
        arr[[1, 1, 1]] = f32::NAN;
        let out = munge(arr.view().into_dyn(), SliceType::TwoD).unwrap();
        assert_eq!(out.shape(), &[2, 1, 1]);
        assert_eq!(out[[0, 0, 0]], 1.0);
        assert_eq!(out[[1, 0, 0]], 0.0);
    }

    #[test]
    fn test_munge_3d_flips_depth() {
        let arr = Array::from_shape_fn((3, 3, 3), |(k, _, _)| k as f64);
        let out = munge(arr.view().into_dyn(), SliceType::ThreeD).unwrap();
        assert_eq!(out.shape(), &[3, 1, 1]);
        assert_eq!(out[[0, 0, 0]], 2.0);
        assert_eq!(out[[2, 0, 0]], 0.0);
    }

    #[test]
    fn test_munge_rejects_wrong_rank() {
        let flat = Array::<f64, _>::zeros(IxDyn(&[5]));
        assert!(munge(flat.view(), SliceType::TwoD).is_err());
        let two = arr2(&[[1.0, 2.0], [3.0, 4.0]]).into_dyn();
        assert!(matches!(
            munge(two.view(), SliceType::ThreeD),
            Err(ForcingError::Munge(_))
        ));
    }
}
