use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building forcing files
#[derive(Error, Debug)]
pub enum ForcingError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("File {} not found. Check Directory and/or Date Range.", .0.display())]
    SourceUnavailable(PathBuf),

    #[error("Weighting matrix {}: {reason}", path.display())]
    WeightingResource { path: PathBuf, reason: String },

    #[error("Time record {record} exists and does not match with {incoming:?} (stored {stored:?})")]
    Consistency {
        record: String,
        stored: Vec<f64>,
        incoming: [f64; 6],
    },

    #[error("Munge error: {0}")]
    Munge(String),

    #[error("Regrid error: {0}")]
    Regrid(String),

    #[error("Source data error: {0}")]
    Source(String),

    #[error("NetCDF error: {0}")]
    Netcdf(#[from] netcdf::Error),

    #[error("HDF5 error: {0}")]
    Hdf5(#[from] hdf5::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ForcingError {
    /// Process exit status for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            ForcingError::Configuration(_) | ForcingError::Yaml(_) => 2,
            ForcingError::SourceUnavailable(_) => 3,
            ForcingError::WeightingResource { .. } => 4,
            ForcingError::Consistency { .. } => 5,
            _ => 1,
        }
    }

    pub(crate) fn weights(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        ForcingError::WeightingResource {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ForcingError>;
