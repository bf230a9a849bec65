//! Read-only access to model output datasets.

use chrono::NaiveDateTime;
use ndarray::{ArrayD, IxDyn};
use netcdf::AttributeValue;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{ForcingError, Result};
use crate::time_utils::decode_cf_times;

/// A variable read into memory together with its dimension names
#[derive(Debug, Clone)]
pub struct SourceField {
    pub name: String,
    pub dims: Vec<String>,
    pub data: ArrayD<f64>,
}

impl SourceField {
    /// Position of a named dimension
    pub fn axis_of(&self, dim: &str) -> Option<usize> {
        self.dims.iter().position(|d| d == dim)
    }
}

/// Common interface over model output datasets
pub trait SourceDataset {
    /// Read a whole variable, decoded to `f64` with fill values as NaN
    fn read_variable(&self, name: &str) -> Result<SourceField>;

    /// Read and decode a CF time coordinate
    fn read_times(&self, axis: &str) -> Result<Vec<NaiveDateTime>>;

    /// Path or endpoint of the dataset, for diagnostics
    fn location(&self) -> String;
}

/// A netCDF file or remote endpoint opened through netCDF-C
pub struct NetcdfSource {
    path: PathBuf,
    file: netcdf::File,
}

impl NetcdfSource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        debug!("Opening source dataset {}", path.display());
        let file = netcdf::open(&path)?;
        Ok(Self { path, file })
    }

    fn variable(&self, name: &str) -> Result<netcdf::Variable<'_>> {
        self.file.variable(name).ok_or_else(|| {
            ForcingError::Source(format!(
                "Variable {} not found in {}",
                name,
                self.path.display()
            ))
        })
    }
}

impl SourceDataset for NetcdfSource {
    fn read_variable(&self, name: &str) -> Result<SourceField> {
        let var = self.variable(name)?;
        let dims: Vec<String> = var.dimensions().iter().map(|d| d.name()).collect();
        let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
        let mut values = var.get_values::<f64, _>(..)?;

        let fill = numeric_attribute(&var, "_FillValue")
            .or_else(|| numeric_attribute(&var, "missing_value"));
        let scale = numeric_attribute(&var, "scale_factor").unwrap_or(1.0);
        let offset = numeric_attribute(&var, "add_offset").unwrap_or(0.0);
        for v in values.iter_mut() {
            *v = match fill {
                Some(f) if *v == f => f64::NAN,
                _ => *v * scale + offset,
            };
        }

        let data = ArrayD::from_shape_vec(IxDyn(&shape), values)
            .map_err(|e| ForcingError::Source(format!("{}: {}", name, e)))?;
        Ok(SourceField {
            name: name.to_string(),
            dims,
            data,
        })
    }

    fn read_times(&self, axis: &str) -> Result<Vec<NaiveDateTime>> {
        let var = self.variable(axis)?;
        let units = match var.attribute_value("units") {
            Some(Ok(AttributeValue::Str(units))) => units,
            _ => {
                return Err(ForcingError::Source(format!(
                    "Time axis {} in {} has no units attribute",
                    axis,
                    self.path.display()
                )))
            }
        };
        let values = var.get_values::<f64, _>(..)?;
        decode_cf_times(&values, &units)
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

fn numeric_attribute(var: &netcdf::Variable<'_>, name: &str) -> Option<f64> {
    match var.attribute_value(name)?.ok()? {
        AttributeValue::Uchar(v) => Some(v as f64),
        AttributeValue::Schar(v) => Some(v as f64),
        AttributeValue::Ushort(v) => Some(v as f64),
        AttributeValue::Short(v) => Some(v as f64),
        AttributeValue::Uint(v) => Some(v as f64),
        AttributeValue::Int(v) => Some(v as f64),
        AttributeValue::Ulonglong(v) => Some(v as f64),
        AttributeValue::Longlong(v) => Some(v as f64),
        AttributeValue::Float(v) => Some(v as f64),
        AttributeValue::Double(v) => Some(v),
        AttributeValue::Floats(v) => v.first().map(|&x| x as f64),
        AttributeValue::Doubles(v) => v.first().copied(),
        _ => None,
    }
}
