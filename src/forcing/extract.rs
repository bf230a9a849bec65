//! Turn source files into MOHID forcing records.

use ndarray::{ArrayD, Axis, Slice, Zip};
use std::path::PathBuf;
use tracing::{debug, info};

use super::fields::{FieldDescriptor, FieldKind};
use crate::data_io::source::{NetcdfSource, SourceDataset, SourceField};
use crate::data_io::writer::{ContainerWriter, WriteSummary};
use crate::error::{ForcingError, Result};
use crate::grid::{munge, regrid, SliceType, WeightingMatrix};
use crate::time_utils::Timestamp;

/// SalishSeaCast mesh mask served by the UBC ERDDAP server
pub const DEFAULT_MESH_MASK: &str =
    "https://salishsea.eos.ubc.ca/erddap/griddap/ubcSSn3DMeshMaskV17-02";

/// Timestamps and munged data of one source file, time leading
#[derive(Debug, Clone)]
pub struct ExtractedGrid {
    pub timestamps: Vec<Timestamp>,
    pub data: ArrayD<f64>,
}

/// Average a staggered component with its neighbour one cell back along `dim`
///
/// The first cell along `dim` has no neighbour and becomes NaN.
pub fn unstagger(field: &SourceField, dim: &str) -> Result<ArrayD<f64>> {
    let axis = field.axis_of(dim).ok_or_else(|| {
        ForcingError::Source(format!(
            "{} has no dimension {} to unstagger along (dims {:?})",
            field.name, dim, field.dims
        ))
    })?;
    let axis = Axis(axis);
    let n = field.data.len_of(axis);

    let mut out = ArrayD::from_elem(field.data.raw_dim(), f64::NAN);
    if n > 1 {
        Zip::from(out.slice_axis_mut(axis, Slice::from(1..)))
            .and(field.data.slice_axis(axis, Slice::from(1..)))
            .and(field.data.slice_axis(axis, Slice::from(..n - 1)))
            .for_each(|o, &here, &behind| *o = (here + behind) / 2.0);
    }
    Ok(out)
}

/// Munged first-time-step `tmask` of the SalishSeaCast mesh mask
#[derive(Debug, Clone)]
pub struct LandMask {
    mask: ArrayD<f64>,
}

impl LandMask {
    pub fn from_source(source: &dyn SourceDataset) -> Result<Self> {
        let field = source.read_variable("tmask")?;
        let data = match field.data.ndim() {
            4 => field.data.index_axis_move(Axis(0), 0),
            3 => field.data,
            n => {
                return Err(ForcingError::Source(format!(
                    "tmask in {} has {} dimensions",
                    source.location(),
                    n
                )))
            }
        };
        let mask = munge(data.view(), SliceType::ThreeD)?;
        debug!("Land mask {:?} from {}", mask.shape(), source.location());
        Ok(Self { mask })
    }

    /// Open a mesh mask file or ERDDAP endpoint
    pub fn load(location: &str) -> Result<Self> {
        info!("Loading land mask from {}", location);
        Self::from_source(&NetcdfSource::open(location)?)
    }

    pub fn shape(&self) -> &[usize] {
        self.mask.shape()
    }

    /// Multiply every time step of a munged (time, depth, x, y) field by the mask
    pub fn apply(&self, data: &mut ArrayD<f64>) -> Result<()> {
        if data.ndim() != self.mask.ndim() + 1 || data.shape()[1..] != *self.mask.shape() {
            return Err(ForcingError::Source(format!(
                "Land mask of shape {:?} does not fit a field of shape {:?}",
                self.mask.shape(),
                data.shape()
            )));
        }
        for mut step in data.outer_iter_mut() {
            step *= &self.mask;
        }
        Ok(())
    }
}

/// Extracts one quantity from a series of source files into one container
pub struct GridProcessor<'a> {
    descriptor: &'static FieldDescriptor,
    writer: &'a ContainerWriter,
    weights: Option<&'a WeightingMatrix>,
    land_mask: Option<&'a LandMask>,
}

impl<'a> GridProcessor<'a> {
    pub fn new(kind: FieldKind, writer: &'a ContainerWriter) -> Self {
        Self {
            descriptor: kind.descriptor(),
            writer,
            weights: None,
            land_mask: None,
        }
    }

    pub fn with_weights(mut self, weights: &'a WeightingMatrix) -> Self {
        self.weights = Some(weights);
        self
    }

    pub fn with_land_mask(mut self, land_mask: &'a LandMask) -> Self {
        self.land_mask = Some(land_mask);
        self
    }

    pub fn descriptor(&self) -> &'static FieldDescriptor {
        self.descriptor
    }

    /// Read, unstagger, regrid and munge the quantity from one dataset
    pub fn extract(&self, source: &dyn SourceDataset) -> Result<ExtractedGrid> {
        let d = self.descriptor;
        let mut times = source.read_times(d.time_axis)?;
        let field = source.read_variable(d.variable)?;
        if field.axis_of(d.time_axis) != Some(0) {
            return Err(ForcingError::Source(format!(
                "{} in {} does not lead with {} (dims {:?})",
                d.variable,
                source.location(),
                d.time_axis,
                field.dims
            )));
        }

        let mut data = match d.unstagger {
            Some(dim) => unstagger(&field, dim)?,
            None => field.data,
        };
        if d.odd_samples_only {
            data = data
                .slice_axis(Axis(0), Slice::new(1, None, 2))
                .to_owned();
            times = times.into_iter().skip(1).step_by(2).collect();
        }
        if data.len_of(Axis(0)) != times.len() {
            return Err(ForcingError::Source(format!(
                "{} in {} has {} time steps but {} has {}",
                d.variable,
                source.location(),
                data.len_of(Axis(0)),
                d.time_axis,
                times.len()
            )));
        }

        if let Some(method) = d.regrid {
            let weights = self.weights.ok_or_else(|| {
                ForcingError::Configuration(format!("No weighting matrix given for {}", d.id))
            })?;
            data = regrid(data.view(), weights, method)?;
        }

        let mut data = munge(data.view(), d.slice)?;
        if d.land_masked {
            let mask = self.land_mask.ok_or_else(|| {
                ForcingError::Configuration(format!("No land mask given for {}", d.id))
            })?;
            mask.apply(&mut data)?;
        }

        Ok(ExtractedGrid {
            timestamps: times.iter().map(Timestamp::from_datetime).collect(),
            data,
        })
    }

    /// Write one dataset's records starting at `next_index`
    ///
    /// Returns the index following the last record written, so consecutive
    /// files append rather than overlap.
    pub fn process_source(
        &self,
        source: &dyn SourceDataset,
        next_index: usize,
    ) -> Result<(usize, WriteSummary)> {
        let grid = self.extract(source)?;
        let summary = self.writer.write_grid(
            self.descriptor.group,
            next_index,
            &grid.timestamps,
            grid.data.view(),
            &self.descriptor.metadata,
        )?;
        debug!(
            "{}: records {}..{} from {}",
            self.descriptor.group,
            next_index,
            next_index + grid.timestamps.len(),
            source.location()
        );
        Ok((next_index + grid.timestamps.len(), summary))
    }

    /// Process daily files in order, numbering records from 1
    pub fn process_files(&self, paths: &[PathBuf]) -> Result<WriteSummary> {
        info!(
            "Writing {} to {}...",
            self.descriptor.group,
            self.writer.path().display()
        );
        let mut next_index = 1;
        let mut total = WriteSummary::default();
        for path in paths {
            let source = NetcdfSource::open(path)?;
            let (next, summary) = self.process_source(&source, next_index)?;
            next_index = next;
            total += summary;
        }
        Ok(total)
    }
}
