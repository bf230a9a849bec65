//! Command-line arguments and the YAML run description.

use chrono::NaiveDate;
use clap::{Arg, ArgMatches, Command};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::Level;

use crate::data_io::paths::ForcingSource;
use crate::data_io::writer::DEFAULT_COMPRESSION_LEVEL;
use crate::error::{ForcingError, Result};
use crate::forcing::fields::FieldKind;

/// Root directories and auxiliary resources
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    pub salishseacast: Option<PathBuf>,
    pub hrdps: Option<PathBuf>,
    pub wavewatch3: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub wind_weights: Option<PathBuf>,
    pub wave_weights: Option<PathBuf>,
    /// File path or ERDDAP URL of the SalishSeaCast mesh mask
    pub mesh_mask: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputFile {
    pub hdf5_filename: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CurrentsConfig {
    pub currents_u_hdf5_filename: Option<String>,
    pub currents_v_hdf5_filename: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SalishSeaCastForcing {
    #[serde(default)]
    pub currents: CurrentsConfig,
    #[serde(default)]
    pub vertical_velocity: OutputFile,
    #[serde(default)]
    pub diffusivity: OutputFile,
    #[serde(default)]
    pub salinity: OutputFile,
    #[serde(default)]
    pub temperature: OutputFile,
    #[serde(default)]
    pub sea_surface_height: OutputFile,
    #[serde(default)]
    pub e3t: OutputFile,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WindsConfig {
    pub wind_u_hdf5_filename: Option<String>,
    pub wind_v_hdf5_filename: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HrdpsForcing {
    #[serde(default)]
    pub winds: WindsConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WaveWatch3Forcing {
    #[serde(default)]
    pub whitecap_coverage: OutputFile,
    #[serde(default)]
    pub mean_wave_period: OutputFile,
    #[serde(default)]
    pub mean_wave_length: OutputFile,
    #[serde(default)]
    pub significant_wave_height: OutputFile,
    #[serde(default, rename = "stokesU")]
    pub stokes_u: OutputFile,
    #[serde(default, rename = "stokesV")]
    pub stokes_v: OutputFile,
}

fn default_compression_level() -> i64 {
    DEFAULT_COMPRESSION_LEVEL as i64
}

/// Parsed contents of a run description YAML file
#[derive(Debug, Clone, Deserialize)]
pub struct RunDescription {
    #[serde(default)]
    pub paths: PathsConfig,
    pub salish_seacast_forcing: Option<SalishSeaCastForcing>,
    pub hrdps_forcing: Option<HrdpsForcing>,
    pub wavewatch3_forcing: Option<WaveWatch3Forcing>,
    #[serde(default = "default_compression_level")]
    pub hdf5_compression_level: i64,
}

impl RunDescription {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ForcingError::Configuration(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Configured output file name for one quantity
    pub fn output_for(&self, kind: FieldKind) -> Option<&str> {
        let name = match kind {
            FieldKind::OceanVelocityU => self
                .salish_seacast_forcing
                .as_ref()
                .and_then(|f| f.currents.currents_u_hdf5_filename.as_ref()),
            FieldKind::OceanVelocityV => self
                .salish_seacast_forcing
                .as_ref()
                .and_then(|f| f.currents.currents_v_hdf5_filename.as_ref()),
            FieldKind::OceanVelocityW => self
                .salish_seacast_forcing
                .as_ref()
                .and_then(|f| f.vertical_velocity.hdf5_filename.as_ref()),
            FieldKind::VertEddyDiff => self
                .salish_seacast_forcing
                .as_ref()
                .and_then(|f| f.diffusivity.hdf5_filename.as_ref()),
            FieldKind::Temperature => self
                .salish_seacast_forcing
                .as_ref()
                .and_then(|f| f.temperature.hdf5_filename.as_ref()),
            FieldKind::Salinity => self
                .salish_seacast_forcing
                .as_ref()
                .and_then(|f| f.salinity.hdf5_filename.as_ref()),
            FieldKind::SeaSurfaceHeight => self
                .salish_seacast_forcing
                .as_ref()
                .and_then(|f| f.sea_surface_height.hdf5_filename.as_ref()),
            FieldKind::E3t => self
                .salish_seacast_forcing
                .as_ref()
                .and_then(|f| f.e3t.hdf5_filename.as_ref()),
            FieldKind::WindVelocityU => self
                .hrdps_forcing
                .as_ref()
                .and_then(|f| f.winds.wind_u_hdf5_filename.as_ref()),
            FieldKind::WindVelocityV => self
                .hrdps_forcing
                .as_ref()
                .and_then(|f| f.winds.wind_v_hdf5_filename.as_ref()),
            FieldKind::WhitecapCoverage => self
                .wavewatch3_forcing
                .as_ref()
                .and_then(|f| f.whitecap_coverage.hdf5_filename.as_ref()),
            FieldKind::MeanWavePeriod => self
                .wavewatch3_forcing
                .as_ref()
                .and_then(|f| f.mean_wave_period.hdf5_filename.as_ref()),
            FieldKind::MeanWaveLength => self
                .wavewatch3_forcing
                .as_ref()
                .and_then(|f| f.mean_wave_length.hdf5_filename.as_ref()),
            FieldKind::SignificantWaveHeight => self
                .wavewatch3_forcing
                .as_ref()
                .and_then(|f| f.significant_wave_height.hdf5_filename.as_ref()),
            FieldKind::StokesU => self
                .wavewatch3_forcing
                .as_ref()
                .and_then(|f| f.stokes_u.hdf5_filename.as_ref()),
            FieldKind::StokesV => self
                .wavewatch3_forcing
                .as_ref()
                .and_then(|f| f.stokes_v.hdf5_filename.as_ref()),
        };
        name.map(String::as_str)
    }

    /// Requested quantities with their output file names, in processing order
    pub fn requested(&self) -> Vec<(FieldKind, String)> {
        FieldKind::ALL
            .iter()
            .filter_map(|&kind| self.output_for(kind).map(|name| (kind, name.to_string())))
            .collect()
    }

    fn requests_from(&self, pick: impl Fn(&ForcingSource) -> bool) -> bool {
        self.requested()
            .iter()
            .any(|(kind, _)| pick(&kind.descriptor().source))
    }

    /// Check root directories and weights files of every source in use
    pub fn check_source_paths(&self) -> Result<()> {
        let paths = &self.paths;
        if self.requests_from(|s| matches!(s, ForcingSource::SalishSeaCast(_))) {
            let root = paths.salishseacast.as_ref().ok_or_else(|| {
                ForcingError::Configuration("Path to SalishSeaCast forcing not provided".into())
            })?;
            require_dir(root, "SalishSeaCast")?;
        }
        if self.requests_from(|s| *s == ForcingSource::Hrdps) {
            let root = paths.hrdps.as_ref().ok_or_else(|| {
                ForcingError::Configuration("Path to HRDPS forcing not provided".into())
            })?;
            require_dir(root, "HRDPS")?;
            require_weights(paths.wind_weights.as_deref(), "wind")?;
        }
        if self.requests_from(|s| *s == ForcingSource::WaveWatch3) {
            let root = paths.wavewatch3.as_ref().ok_or_else(|| {
                ForcingError::Configuration("Path to WaveWatch3 forcing not provided".into())
            })?;
            require_dir(root, "WaveWatch3")?;
            require_weights(paths.wave_weights.as_deref(), "wave")?;
        }
        Ok(())
    }

    /// Compression level, which must lie in 1..=9
    pub fn compression_level(&self) -> Result<u8> {
        match u8::try_from(self.hdf5_compression_level) {
            Ok(level) if (1..=9).contains(&level) => Ok(level),
            _ => Err(ForcingError::Configuration(format!(
                "Invalid compression level: {} provided. Compression level is int[1,9]. Default is {}",
                self.hdf5_compression_level, DEFAULT_COMPRESSION_LEVEL
            ))),
        }
    }

    pub fn output_root(&self) -> Result<&Path> {
        self.paths
            .output
            .as_deref()
            .ok_or_else(|| ForcingError::Configuration("No output file path provided".into()))
    }

    /// Root directory of a source
    pub fn source_root(&self, source: &ForcingSource) -> Result<&Path> {
        let (root, name) = match source {
            ForcingSource::SalishSeaCast(_) => (&self.paths.salishseacast, "SalishSeaCast"),
            ForcingSource::Hrdps => (&self.paths.hrdps, "HRDPS"),
            ForcingSource::WaveWatch3 => (&self.paths.wavewatch3, "WaveWatch3"),
        };
        root.as_deref().ok_or_else(|| {
            ForcingError::Configuration(format!("Path to {} forcing not provided", name))
        })
    }
}

fn require_dir(root: &Path, name: &str) -> Result<()> {
    if root.exists() {
        Ok(())
    } else {
        Err(ForcingError::Configuration(format!(
            "{} path {} does not exist",
            name,
            root.display()
        )))
    }
}

fn require_weights(path: Option<&Path>, kind: &str) -> Result<()> {
    let path = path.ok_or_else(|| {
        ForcingError::Configuration(format!(
            "Path to {} interpolation weights file is not provided",
            kind
        ))
    })?;
    if !path.exists() {
        return Err(ForcingError::weights(path, "file does not exist"));
    }
    Ok(())
}

/// Arguments of `make-hdf5`
#[derive(Debug, Clone, PartialEq)]
pub struct MakeHdf5Args {
    pub yaml_filename: PathBuf,
    pub start_date: NaiveDate,
    /// Days after `start_date` to include; 1 gives the 2 days a 1-day MOHID run needs
    pub n_days: u32,
}

/// Arguments of `stats`
#[derive(Debug, Clone, PartialEq)]
pub struct StatsArgs {
    pub directory: PathBuf,
    pub grid_x: usize,
    pub grid_y: usize,
    pub output: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CliCommand {
    MakeHdf5(MakeHdf5Args),
    Stats(StatsArgs),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CliArgs {
    pub command: CliCommand,
    pub log_level: Level,
}

impl CliArgs {
    pub fn command() -> Command {
        Command::new("make-midoss-forcing")
            .version(env!("CARGO_PKG_VERSION"))
            .about("Create MOHID HDF5 forcing files from SalishSeaCast, HRDPS and WaveWatch3 results")
            .subcommand_required(true)
            .arg_required_else_help(true)
            .arg(
                Arg::new("log-level")
                    .long("log-level")
                    .value_name("LEVEL")
                    .help("Logging verbosity")
                    .value_parser(["trace", "debug", "info", "warn", "error"])
                    .default_value("info")
                    .global(true),
            )
            .subcommand(
                Command::new("make-hdf5")
                    .about("Create HDF5 forcing files for a MIDOSS-MOHID run")
                    .arg(
                        Arg::new("yaml-filename")
                            .value_name("YAML_FILENAME")
                            .help("YAML file controlling HDF5 forcing files creation")
                            .required(true),
                    )
                    .arg(
                        Arg::new("start-date")
                            .value_name("START_DATE")
                            .help("Date on which to start HDF5 forcing files creation (%Y-%m-%d)")
                            .required(true),
                    )
                    .arg(
                        Arg::new("n-days")
                            .value_name("N_DAYS")
                            .help("Number of days plus 1 of forcing to create in each file")
                            .value_parser(clap::value_parser!(u32))
                            .default_value("0"),
                    ),
            )
            .subcommand(
                Command::new("stats")
                    .about("Summarise forcing values at one grid point")
                    .arg(
                        Arg::new("directory")
                            .value_name("DIRECTORY")
                            .help("Directory searched recursively for .hdf5 files")
                            .required(true),
                    )
                    .arg(
                        Arg::new("grid-x")
                            .value_name("GRID_X")
                            .value_parser(clap::value_parser!(usize))
                            .required(true),
                    )
                    .arg(
                        Arg::new("grid-y")
                            .value_name("GRID_Y")
                            .value_parser(clap::value_parser!(usize))
                            .required(true),
                    )
                    .arg(
                        Arg::new("output")
                            .value_name("OUTPUT_YAML")
                            .help("Statistics report to write")
                            .required(true),
                    ),
            )
    }

    /// Parse from an argument list, reporting usage errors as configuration errors
    pub fn try_parse_from<I, T>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let matches = Self::command()
            .try_get_matches_from(args)
            .map_err(|e| ForcingError::Configuration(e.to_string()))?;
        Self::from_matches(&matches)
    }

    pub fn from_matches(matches: &ArgMatches) -> Result<Self> {
        let (name, sub) = matches
            .subcommand()
            .ok_or_else(|| ForcingError::Configuration("No subcommand given".into()))?;
        // global, so every subcommand sees it
        let log_level = parse_level(required::<String>(sub, "log-level")?)?;
        let command = match (name, sub) {
            ("make-hdf5", sub) => {
                let yaml_filename = PathBuf::from(required::<String>(sub, "yaml-filename")?);
                if !yaml_filename.exists() {
                    return Err(ForcingError::Configuration(format!(
                        "Path '{}' does not exist",
                        yaml_filename.display()
                    )));
                }
                let start = required::<String>(sub, "start-date")?;
                let start_date = NaiveDate::parse_from_str(start, "%Y-%m-%d").map_err(|_| {
                    ForcingError::Configuration(format!(
                        "'{}' does not match the format %Y-%m-%d",
                        start
                    ))
                })?;
                CliCommand::MakeHdf5(MakeHdf5Args {
                    yaml_filename,
                    start_date,
                    n_days: *required::<u32>(sub, "n-days")?,
                })
            }
            ("stats", sub) => CliCommand::Stats(StatsArgs {
                directory: PathBuf::from(required::<String>(sub, "directory")?),
                grid_x: *required::<usize>(sub, "grid-x")?,
                grid_y: *required::<usize>(sub, "grid-y")?,
                output: PathBuf::from(required::<String>(sub, "output")?),
            }),
            (other, _) => {
                return Err(ForcingError::Configuration(format!(
                    "Unknown subcommand {}",
                    other
                )))
            }
        };
        Ok(Self { command, log_level })
    }
}

fn required<'m, T>(matches: &'m ArgMatches, name: &str) -> Result<&'m T>
where
    T: Clone + Send + Sync + 'static,
{
    matches
        .get_one::<T>(name)
        .ok_or_else(|| ForcingError::Configuration(format!("Missing argument {}", name)))
}

fn parse_level(level: &str) -> Result<Level> {
    level
        .parse::<Level>()
        .map_err(|_| ForcingError::Configuration(format!("Invalid log level {}", level)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const WIND_ONLY: &str = r#"
paths:
  hrdps: /results/forcing/atmospheric/GEM2.5/operational/
  output: /results/MIDOSS/forcing/
  wind_weights: /data/MIDOSS/hrdps_weights.nc
hrdps_forcing:
  winds:
    wind_u_hdf5_filename: winds.hdf5
    wind_v_hdf5_filename: winds.hdf5
"#;

    #[test]
    fn test_requested_fields_follow_processing_order() {
        let yaml = r#"
paths: {}
wavewatch3_forcing:
  stokesV:
    hdf5_filename: stokes.hdf5
salish_seacast_forcing:
  e3t:
    hdf5_filename: e3t.hdf5
  currents:
    currents_u_hdf5_filename: currents.hdf5
"#;
        let run = RunDescription::from_yaml(yaml).unwrap();
        let kinds: Vec<_> = run.requested().into_iter().map(|(k, _)| k).collect();
        assert_eq!(
            kinds,
            vec![FieldKind::OceanVelocityU, FieldKind::E3t, FieldKind::StokesV]
        );
        assert_eq!(run.output_for(FieldKind::StokesV), Some("stokes.hdf5"));
        assert_eq!(run.compression_level().unwrap(), 4);
    }

    #[test]
    fn test_missing_source_path_is_configuration_error() {
        let run = RunDescription::from_yaml(
            "hrdps_forcing:\n  winds:\n    wind_u_hdf5_filename: winds.hdf5\n",
        )
        .unwrap();
        match run.check_source_paths() {
            Err(ForcingError::Configuration(msg)) => assert!(msg.contains("HRDPS")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_missing_weights_file() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = WIND_ONLY.replace(
            "/results/forcing/atmospheric/GEM2.5/operational/",
            dir.path().to_str().unwrap(),
        );
        let run = RunDescription::from_yaml(&yaml).unwrap();
        assert!(matches!(
            run.check_source_paths(),
            Err(ForcingError::WeightingResource { .. })
        ));
    }

    #[test]
    fn test_compression_level_range() {
        let mut run = RunDescription::from_yaml(WIND_ONLY).unwrap();
        run.hdf5_compression_level = 0;
        assert!(run.compression_level().is_err());
        run.hdf5_compression_level = 300;
        assert!(run.compression_level().is_err());
        run.hdf5_compression_level = 9;
        assert_eq!(run.compression_level().unwrap(), 9);
    }

    #[test]
    fn test_cli_make_hdf5() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = dir.path().join("run.yaml");
        std::fs::write(&yaml, WIND_ONLY).unwrap();

        let args = CliArgs::try_parse_from([
            "make-midoss-forcing",
            "make-hdf5",
            yaml.to_str().unwrap(),
            "2020-01-04",
            "1",
        ])
        .unwrap();
        assert_eq!(args.log_level, Level::INFO);
        assert_eq!(
            args.command,
            CliCommand::MakeHdf5(MakeHdf5Args {
                yaml_filename: yaml,
                start_date: NaiveDate::from_ymd_opt(2020, 1, 4).unwrap(),
                n_days: 1,
            })
        );
    }

    #[test]
    fn test_cli_rejects_bad_input() {
        assert!(CliArgs::try_parse_from([
            "make-midoss-forcing",
            "make-hdf5",
            "/nonexistent/run.yaml",
            "2020-01-04",
        ])
        .is_err());
        assert!(CliArgs::try_parse_from([
            "make-midoss-forcing",
            "stats",
            "/results",
            "-1",
            "342",
            "stats.yaml",
        ])
        .is_err());
    }

    #[test]
    fn test_cli_stats_with_log_level() {
        let args = CliArgs::try_parse_from([
            "make-midoss-forcing",
            "stats",
            "/results/MF0/21nov17-28nov17",
            "249",
            "342",
            "stats.yaml",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(args.log_level, Level::DEBUG);
        assert_eq!(
            args.command,
            CliCommand::Stats(StatsArgs {
                directory: PathBuf::from("/results/MF0/21nov17-28nov17"),
                grid_x: 249,
                grid_y: 342,
                output: PathBuf::from("stats.yaml"),
            })
        );
    }
}
