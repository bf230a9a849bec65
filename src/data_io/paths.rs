//! Daily source file naming for each forcing model.

use chrono::NaiveDate;
use std::path::{Path, PathBuf};

use crate::error::{ForcingError, Result};
use crate::time_utils::ddmonyy;

/// SalishSeaCast hourly results file types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SalishSeaCastFile {
    GridU,
    GridV,
    GridW,
    GridT,
    CarpT,
}

impl SalishSeaCastFile {
    pub fn as_str(&self) -> &'static str {
        match self {
            SalishSeaCastFile::GridU => "grid_U",
            SalishSeaCastFile::GridV => "grid_V",
            SalishSeaCastFile::GridW => "grid_W",
            SalishSeaCastFile::GridT => "grid_T",
            SalishSeaCastFile::CarpT => "carp_T",
        }
    }
}

/// Which model a forcing quantity is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ForcingSource {
    SalishSeaCast(SalishSeaCastFile),
    Hrdps,
    WaveWatch3,
}

impl ForcingSource {
    /// Resolve and existence-check one file per date
    pub fn resolve(&self, dates: &[NaiveDate], root: &Path) -> Result<Vec<PathBuf>> {
        match self {
            ForcingSource::SalishSeaCast(kind) => salishseacast_paths(dates, root, *kind),
            ForcingSource::Hrdps => hrdps_paths(dates, root),
            ForcingSource::WaveWatch3 => ww3_paths(dates, root),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ForcingSource::SalishSeaCast(_) => "SalishSeaCast",
            ForcingSource::Hrdps => "HRDPS",
            ForcingSource::WaveWatch3 => "WaveWatch3",
        }
    }
}

fn require(path: PathBuf) -> Result<PathBuf> {
    if path.exists() {
        Ok(path)
    } else {
        Err(ForcingError::SourceUnavailable(path))
    }
}

/// `<root>/<ddmonyy>/SalishSea_1h_<YYYYMMDD>_<YYYYMMDD>_<filetype>.nc`
pub fn salishseacast_path(date: NaiveDate, root: &Path, kind: SalishSeaCastFile) -> PathBuf {
    let stamp = date.format("%Y%m%d");
    root.join(ddmonyy(date)).join(format!(
        "SalishSea_1h_{}_{}_{}.nc",
        stamp,
        stamp,
        kind.as_str()
    ))
}

/// `<root>/ops_y<YYYY>m<MM>d<DD>.nc`
pub fn hrdps_path(date: NaiveDate, root: &Path) -> PathBuf {
    root.join(date.format("ops_y%Ym%md%d.nc").to_string())
}

/// `<root>/<ddmonyy>/SoG_ww3_fields_<YYYYMMDD>.nc` and its two-date alternative
pub fn ww3_candidates(date: NaiveDate, root: &Path) -> [PathBuf; 2] {
    let stamp = date.format("%Y%m%d");
    let dir = root.join(ddmonyy(date));
    [
        dir.join(format!("SoG_ww3_fields_{}.nc", stamp)),
        dir.join(format!("SoG_ww3_fields_{}_{}.nc", stamp, stamp)),
    ]
}

pub fn salishseacast_paths(
    dates: &[NaiveDate],
    root: &Path,
    kind: SalishSeaCastFile,
) -> Result<Vec<PathBuf>> {
    dates
        .iter()
        .map(|&d| require(salishseacast_path(d, root, kind)))
        .collect()
}

pub fn hrdps_paths(dates: &[NaiveDate], root: &Path) -> Result<Vec<PathBuf>> {
    dates.iter().map(|&d| require(hrdps_path(d, root))).collect()
}

pub fn ww3_paths(dates: &[NaiveDate], root: &Path) -> Result<Vec<PathBuf>> {
    dates
        .iter()
        .map(|&d| {
            let [single, double] = ww3_candidates(d, root);
            if single.exists() {
                Ok(single)
            } else {
                require(double)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_file_names() {
        let root = Path::new("/results");
        assert_eq!(
            salishseacast_path(ymd(2020, 1, 4), root, SalishSeaCastFile::GridU),
            PathBuf::from("/results/04jan20/SalishSea_1h_20200104_20200104_grid_U.nc")
        );
        assert_eq!(
            hrdps_path(ymd(2020, 1, 4), root),
            PathBuf::from("/results/ops_y2020m01d04.nc")
        );
        let [single, double] = ww3_candidates(ymd(2020, 1, 4), root);
        assert_eq!(single, PathBuf::from("/results/04jan20/SoG_ww3_fields_20200104.nc"));
        assert_eq!(
            double,
            PathBuf::from("/results/04jan20/SoG_ww3_fields_20200104_20200104.nc")
        );
    }

    #[test]
    fn test_missing_file_reported() {
        let dir = tempfile::tempdir().unwrap();
        let dates = [ymd(2020, 1, 4), ymd(2020, 1, 5)];
        fs::write(hrdps_path(dates[0], dir.path()), b"").unwrap();

        match hrdps_paths(&dates, dir.path()) {
            Err(ForcingError::SourceUnavailable(path)) => {
                assert!(path.ends_with("ops_y2020m01d05.nc"))
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_ww3_fallback_name() {
        let dir = tempfile::tempdir().unwrap();
        let date = ymd(2020, 1, 4);
        let [_, double] = ww3_candidates(date, dir.path());
        fs::create_dir_all(double.parent().unwrap()).unwrap();
        fs::write(&double, b"").unwrap();

        let paths = ForcingSource::WaveWatch3.resolve(&[date], dir.path()).unwrap();
        assert_eq!(paths, vec![double]);
    }
}
