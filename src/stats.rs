//! Point statistics of a finished set of forcing files.

use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::data_io::writer::RESULTS_GROUP;
use crate::error::{ForcingError, Result};

/// Component pairs reported as a combined speed
const SPEEDS: [(&str, &str, &str); 3] = [
    ("wind speed", "wind velocity X", "wind velocity Y"),
    ("currents speed", "velocity U", "velocity V"),
    ("stokes speed", "Stokes U", "Stokes V"),
];

/// Summary of one time series, serialized with 4 significant digits
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesStats {
    #[serde(serialize_with = "four_significant")]
    pub max: f64,
    #[serde(serialize_with = "four_significant")]
    pub mean: f64,
    #[serde(serialize_with = "four_significant")]
    pub min: f64,
    /// Population standard deviation
    #[serde(serialize_with = "four_significant")]
    pub std: f64,
}

impl SeriesStats {
    pub fn from_series(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        Some(Self {
            max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            mean,
            min: values.iter().copied().fold(f64::INFINITY, f64::min),
            std: variance.sqrt(),
        })
    }
}

fn four_significant<S: Serializer>(value: &f64, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_g(*value, 4))
}

/// C `%.<precision>g` formatting
pub fn format_g(value: f64, precision: usize) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_string();
    }
    let precision = precision.max(1);
    let scientific = format!("{:.*e}", precision - 1, value);
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (scientific.as_str(), 0),
    };

    if exponent < -4 || exponent >= precision as i32 {
        format!(
            "{}e{}{:02}",
            trim_zeros(mantissa),
            if exponent < 0 { '-' } else { '+' },
            exponent.abs()
        )
    } else {
        let decimals = (precision as i32 - 1 - exponent).max(0) as usize;
        trim_zeros(&format!("{:.*}", decimals, value)).to_string()
    }
}

fn trim_zeros(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

/// All `.hdf5` files below `dir`, sorted
fn find_containers(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            found.extend(find_containers(&path)?);
        } else if path.extension().map_or(false, |ext| ext == "hdf5") {
            found.push(path);
        }
    }
    found.sort();
    Ok(found)
}

/// Value at `(grid_x, grid_y)` of every record of every `/Results` group
///
/// 3-D records contribute their last (surface) layer.
pub fn collect_series(dir: &Path, grid_x: usize, grid_y: usize) -> Result<BTreeMap<String, Vec<f64>>> {
    let mut series = BTreeMap::new();
    for path in find_containers(dir)? {
        debug!("Reading {}", path.display());
        let file = hdf5::File::open(&path)?;
        if !file.link_exists(RESULTS_GROUP) {
            warn!("{} has no {} group", path.display(), RESULTS_GROUP);
            continue;
        }
        let results = file.group(RESULTS_GROUP)?;
        for group_name in results.member_names()? {
            let group = results.group(&group_name)?;
            let mut values = Vec::new();
            for record in group.member_names()? {
                let dataset = group.dataset(&record)?;
                let shape = dataset.shape();
                let data = dataset.read_raw::<f64>()?;
                values.push(point_value(&data, &shape, grid_x, grid_y).ok_or_else(|| {
                    ForcingError::Source(format!(
                        "[{}, {}] is outside {} of shape {:?} in {}",
                        grid_x,
                        grid_y,
                        record,
                        shape,
                        path.display()
                    ))
                })?);
            }
            series.insert(group_name, values);
        }
    }
    Ok(series)
}

fn point_value(data: &[f64], shape: &[usize], x: usize, y: usize) -> Option<f64> {
    match *shape {
        [nx, ny] if x < nx && y < ny => data.get(x * ny + y).copied(),
        [nz, nx, ny] if nz > 0 && x < nx && y < ny => {
            data.get((nz - 1) * nx * ny + x * ny + y).copied()
        }
        _ => None,
    }
}

/// Statistics per group plus the derived speeds
pub fn summarise(series: &BTreeMap<String, Vec<f64>>) -> BTreeMap<String, SeriesStats> {
    let mut report: BTreeMap<String, SeriesStats> = series
        .iter()
        .filter_map(|(name, values)| SeriesStats::from_series(values).map(|s| (name.clone(), s)))
        .collect();

    for (speed, first, second) in SPEEDS {
        if let (Some(a), Some(b)) = (series.get(first), series.get(second)) {
            if a.len() != b.len() {
                warn!("{} and {} differ in length, skipping {}", first, second, speed);
                continue;
            }
            let combined: Vec<f64> = a.iter().zip(b).map(|(a, b)| (a + b) / 2.0).collect();
            if let Some(stats) = SeriesStats::from_series(&combined) {
                report.insert(speed.to_string(), stats);
            }
        }
    }
    report
}

/// Write the statistics report for all forcing files under `dir`
pub fn make_stats_file(
    dir: &Path,
    grid_x: usize,
    grid_y: usize,
    output: &Path,
) -> Result<BTreeMap<String, SeriesStats>> {
    let series = collect_series(dir, grid_x, grid_y)?;
    let report = summarise(&series);
    fs::write(output, serde_yaml::to_string(&report)?)?;
    info!(
        "Statistics of {} series at [{}, {}] written to {}",
        report.len(),
        grid_x,
        grid_y,
        output.display()
    );
    Ok(report)
}
