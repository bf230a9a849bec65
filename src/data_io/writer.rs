//! Append-only MOHID HDF5 forcing container.
//!
//! Layout:
//!
//! ```text
//! /Time/Time_00001                 [Y, M, D, h, m, s]  f64[6]
//! /Results/<group>/<group>_00001   one time step of the field
//! ```
//!
//! Records are never overwritten. An existing data record is skipped; an
//! existing time record must hold exactly the incoming timestamp.

use hdf5::types::FixedAscii;
use hdf5::{Dataset, Group};
use ndarray::{ArrayViewD, Axis};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{ForcingError, Result};
use crate::time_utils::Timestamp;

pub const TIME_GROUP: &str = "Time";
pub const RESULTS_GROUP: &str = "Results";
pub const TIME_UNITS: &str = "YYYY/MM/DD HH:MM:SS";
pub const DEFAULT_COMPRESSION_LEVEL: u8 = 4;

/// Fixed-length string type used for `Units` attributes
pub type AttrString = FixedAscii<32>;

/// Attributes attached to every data record of a group
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMetadata {
    pub fill_value: f64,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub units: &'static str,
}

/// What happened to one data record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Written,
    Skipped,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteSummary {
    pub written: usize,
    pub skipped: usize,
}

impl WriteSummary {
    fn record(&mut self, outcome: RecordOutcome) {
        match outcome {
            RecordOutcome::Written => self.written += 1,
            RecordOutcome::Skipped => self.skipped += 1,
        }
    }
}

impl std::ops::AddAssign for WriteSummary {
    fn add_assign(&mut self, other: Self) {
        self.written += other.written;
        self.skipped += other.skipped;
    }
}

/// Writer for one container file
#[derive(Debug, Clone)]
pub struct ContainerWriter {
    path: PathBuf,
    compression_level: u8,
}

impl ContainerWriter {
    /// Create an empty container, truncating any existing file
    pub fn create(path: impl AsRef<Path>, compression_level: u8) -> Result<Self> {
        let writer = Self::new(path, compression_level)?;
        hdf5::File::create(&writer.path)?;
        debug!("{} created", writer.path.display());
        Ok(writer)
    }

    /// Attach to a container, creating it if it does not exist yet
    pub fn open(path: impl AsRef<Path>, compression_level: u8) -> Result<Self> {
        let writer = Self::new(path, compression_level)?;
        hdf5::File::append(&writer.path)?;
        Ok(writer)
    }

    fn new(path: impl AsRef<Path>, compression_level: u8) -> Result<Self> {
        if !(1..=9).contains(&compression_level) {
            return Err(ForcingError::Configuration(format!(
                "Invalid compression level: {} provided. Compression level is int[1,9]. Default is {}",
                compression_level, DEFAULT_COMPRESSION_LEVEL
            )));
        }
        Ok(Self {
            path: path.as_ref().to_path_buf(),
            compression_level,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append time steps of one field, starting at time index `first_index`
    ///
    /// `data` has time as its leading axis, one entry per timestamp.
    pub fn write_grid(
        &self,
        group_name: &str,
        first_index: usize,
        timestamps: &[Timestamp],
        data: ArrayViewD<f64>,
        metadata: &FieldMetadata,
    ) -> Result<WriteSummary> {
        if data.ndim() == 0 || data.shape()[0] != timestamps.len() {
            return Err(ForcingError::Source(format!(
                "{} timestamps for a field of shape {:?}",
                timestamps.len(),
                data.shape()
            )));
        }
        if first_index == 0 {
            return Err(ForcingError::Source(
                "Time indices start at 1".to_string(),
            ));
        }

        let file = hdf5::File::append(&self.path)?;
        let time_group = ensure_group(&file, TIME_GROUP)?;
        let results = ensure_group(&file, RESULTS_GROUP)?;
        let data_group = ensure_group(&results, group_name)?;

        let mut summary = WriteSummary::default();
        for (i, timestamp) in timestamps.iter().enumerate() {
            let index = first_index + i;
            self.write_timestamp(&time_group, index, timestamp)?;

            let record = data.index_axis(Axis(0), i);
            let outcome = self.write_record(&data_group, group_name, index, record, metadata)?;
            summary.record(outcome);
        }
        file.flush()?;
        Ok(summary)
    }

    fn write_timestamp(&self, time_group: &Group, index: usize, timestamp: &Timestamp) -> Result<()> {
        let name = format!("Time_{:05}", index);
        if time_group.link_exists(&name) {
            let stored = time_group.dataset(&name)?.read_raw::<f64>()?;
            if !timestamp.matches(&stored) {
                return Err(ForcingError::Consistency {
                    record: name,
                    stored,
                    incoming: timestamp.0,
                });
            }
            return Ok(());
        }

        let dataset = time_group
            .new_dataset::<f64>()
            .shape(vec![6])
            .chunk(vec![6])
            .deflate(self.compression_level)
            .create(name.as_str())?;
        dataset.write_raw(&timestamp.0[..])?;
        write_scalar_attr(&dataset, "Maximum", timestamp.year())?;
        write_array_attr(&dataset, "Minimum", &[-0.0])?;
        write_string_attr(&dataset, "Units", TIME_UNITS)?;
        Ok(())
    }

    fn write_record(
        &self,
        data_group: &Group,
        group_name: &str,
        index: usize,
        record: ArrayViewD<f64>,
        metadata: &FieldMetadata,
    ) -> Result<RecordOutcome> {
        let name = format!("{}_{:05}", group_name, index);
        if data_group.link_exists(&name) {
            warn!("Dataset already exists at {}", name);
            return Ok(RecordOutcome::Skipped);
        }

        let record = record.as_standard_layout();
        let values = record
            .as_slice()
            .ok_or_else(|| ForcingError::Source(format!("{} is not contiguous", name)))?;
        let shape = record.shape().to_vec();
        let dataset = data_group
            .new_dataset::<f64>()
            .shape(shape.clone())
            .chunk(shape)
            .deflate(self.compression_level)
            .create(name.as_str())?;
        dataset.write_raw(values)?;

        write_array_attr(&dataset, "FillValue", &[metadata.fill_value])?;
        if let Some(maximum) = metadata.maximum {
            write_array_attr(&dataset, "Maximum", &[maximum])?;
        }
        if let Some(minimum) = metadata.minimum {
            write_array_attr(&dataset, "Minimum", &[minimum])?;
        }
        write_string_attr(&dataset, "Units", metadata.units)?;
        Ok(RecordOutcome::Written)
    }
}

/// Number of data records stored under `/Results/<group_name>`
pub fn count_records(path: impl AsRef<Path>, group_name: &str) -> Result<usize> {
    let file = hdf5::File::open(path)?;
    let path = format!("{}/{}", RESULTS_GROUP, group_name);
    if !file.link_exists(RESULTS_GROUP) || !file.link_exists(&path) {
        return Ok(0);
    }
    Ok(file.group(&path)?.member_names()?.len())
}

fn ensure_group(parent: &Group, name: &str) -> Result<Group> {
    if parent.link_exists(name) {
        Ok(parent.group(name)?)
    } else {
        Ok(parent.create_group(name)?)
    }
}

fn write_scalar_attr(dataset: &Dataset, name: &str, value: f64) -> Result<()> {
    dataset
        .new_attr::<f64>()
        .shape(())
        .create(name)?
        .write_scalar(&value)?;
    Ok(())
}

fn write_array_attr(dataset: &Dataset, name: &str, values: &[f64]) -> Result<()> {
    dataset
        .new_attr::<f64>()
        .shape(vec![values.len()])
        .create(name)?
        .write_raw(values)?;
    Ok(())
}

fn write_string_attr(dataset: &Dataset, name: &str, value: &str) -> Result<()> {
    let value = AttrString::from_ascii(value.as_bytes())
        .map_err(|e| ForcingError::Source(format!("Attribute {} = {:?}: {}", name, value, e)))?;
    dataset
        .new_attr::<AttrString>()
        .shape(())
        .create(name)?
        .write_scalar(&value)?;
    Ok(())
}
