//! Drive a whole forcing run from a YAML run description.

use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

use crate::config::RunDescription;
use crate::data_io::paths::ForcingSource;
use crate::data_io::writer::ContainerWriter;
use crate::error::{ForcingError, Result};
use crate::forcing::extract::{GridProcessor, LandMask, DEFAULT_MESH_MASK};
use crate::forcing::fields::FieldKind;
use crate::grid::WeightingMatrix;
use crate::time_utils::{date_range, folder_name, format_elapsed};

/// Records produced for one quantity
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSummary {
    pub kind: FieldKind,
    pub file: PathBuf,
    pub source_files: usize,
    pub written: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub output_dir: PathBuf,
    pub containers: Vec<PathBuf>,
    pub groups: Vec<GroupSummary>,
}

struct Job {
    kind: FieldKind,
    filename: String,
    files: Vec<PathBuf>,
}

/// Create the HDF5 forcing files described by `yaml_filename`
///
/// Covers `start_date` through `start_date + n_days`; `n_days = 1` gives the
/// two days a one-day MOHID run needs.
pub fn create_forcing(yaml_filename: &Path, start_date: NaiveDate, n_days: u32) -> Result<RunSummary> {
    let started = Instant::now();
    let description = RunDescription::load(yaml_filename)?;
    let summary = create_forcing_from(&description, start_date, n_days);
    info!("Time elapsed: {}", format_elapsed(started.elapsed()));
    summary
}

/// Same as [`create_forcing`] with an already parsed run description
pub fn create_forcing_from(
    description: &RunDescription,
    start_date: NaiveDate,
    n_days: u32,
) -> Result<RunSummary> {
    let requested = description.requested();
    let uses = |source: fn(&ForcingSource) -> bool| {
        requested
            .iter()
            .any(|(kind, _)| source(&kind.descriptor().source))
    };

    // everything that can fail cheaply is checked before any output exists
    description.check_source_paths()?;
    let wind_weights = match &description.paths.wind_weights {
        Some(path) if uses(|s| *s == ForcingSource::Hrdps) => Some(WeightingMatrix::load(path)?),
        _ => None,
    };
    let wave_weights = match &description.paths.wave_weights {
        Some(path) if uses(|s| *s == ForcingSource::WaveWatch3) => {
            Some(WeightingMatrix::load(path)?)
        }
        _ => None,
    };
    let compression_level = description.compression_level()?;

    let dates = date_range(start_date, n_days);
    let mut jobs = Vec::with_capacity(requested.len());
    for (kind, filename) in requested {
        let source = kind.descriptor().source;
        let files = source.resolve(&dates, description.source_root(&source)?)?;
        jobs.push(Job {
            kind,
            filename,
            files,
        });
    }
    let output_root = description.output_root()?;

    let land_mask = if jobs.iter().any(|job| job.kind.descriptor().land_masked) {
        let location = description
            .paths
            .mesh_mask
            .as_deref()
            .unwrap_or(DEFAULT_MESH_MASK);
        Some(LandMask::load(location)?)
    } else {
        None
    };

    let end_date = dates.last().copied().unwrap_or(start_date);
    let output_dir = output_root
        .join("MF0")
        .join(folder_name(start_date, end_date));
    fs::create_dir_all(&output_dir)?;
    info!("Output directory {} created", output_dir.display());

    let mut writers = BTreeMap::new();
    for job in &jobs {
        if !writers.contains_key(&job.filename) {
            let writer = ContainerWriter::create(output_dir.join(&job.filename), compression_level)?;
            info!("{} created", writer.path().display());
            writers.insert(job.filename.clone(), writer);
        }
    }

    let mut groups = Vec::with_capacity(jobs.len());
    for job in &jobs {
        let writer = writers.get(&job.filename).ok_or_else(|| {
            ForcingError::Configuration(format!("No container for {}", job.filename))
        })?;
        let descriptor = job.kind.descriptor();
        let mut processor = GridProcessor::new(job.kind, writer);
        processor = match descriptor.source {
            ForcingSource::Hrdps => processor.with_weights(required(&wind_weights, "wind")?),
            ForcingSource::WaveWatch3 => processor.with_weights(required(&wave_weights, "wave")?),
            ForcingSource::SalishSeaCast(_) => processor,
        };
        if let Some(mask) = &land_mask {
            processor = processor.with_land_mask(mask);
        }

        let written = processor.process_files(&job.files)?;
        groups.push(GroupSummary {
            kind: job.kind,
            file: writer.path().to_path_buf(),
            source_files: job.files.len(),
            written: written.written,
            skipped: written.skipped,
        });
    }

    Ok(RunSummary {
        output_dir,
        containers: writers.values().map(|w| w.path().to_path_buf()).collect(),
        groups,
    })
}

fn required<'a>(weights: &'a Option<WeightingMatrix>, kind: &str) -> Result<&'a WeightingMatrix> {
    weights.as_ref().ok_or_else(|| {
        ForcingError::Configuration(format!(
            "Path to {} interpolation weights file is not provided",
            kind
        ))
    })
}
