//! Catalogue of the physical quantities written to MOHID forcing files.
//!
//! Each quantity maps to one [`FieldDescriptor`]: where the raw values come
//! from, how they are brought onto the MOHID grid and which metadata the
//! records carry.

use std::fmt;
use std::str::FromStr;

use crate::data_io::paths::{ForcingSource, SalishSeaCastFile};
use crate::data_io::writer::FieldMetadata;
use crate::error::{ForcingError, Result};
use crate::grid::{RegridMethod, SliceType};

/// Time coordinate of SalishSeaCast and HRDPS files
pub const TIME_COUNTER: &str = "time_counter";
/// Time coordinate of WaveWatch3 files
pub const WW3_TIME: &str = "time";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    OceanVelocityU,
    OceanVelocityV,
    OceanVelocityW,
    VertEddyDiff,
    Temperature,
    Salinity,
    SeaSurfaceHeight,
    E3t,
    WindVelocityU,
    WindVelocityV,
    WhitecapCoverage,
    MeanWavePeriod,
    MeanWaveLength,
    SignificantWaveHeight,
    StokesU,
    StokesV,
}

/// How one quantity is extracted and described
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub kind: FieldKind,
    /// Identifier used in logs and on the command line
    pub id: &'static str,
    /// Variable name in the source dataset
    pub variable: &'static str,
    /// Dimension to unstagger along before munging
    pub unstagger: Option<&'static str>,
    pub regrid: Option<RegridMethod>,
    pub slice: SliceType,
    /// Group under `/Results`
    pub group: &'static str,
    pub metadata: FieldMetadata,
    pub source: ForcingSource,
    pub time_axis: &'static str,
    /// Keep only odd raw time samples
    pub odd_samples_only: bool,
    /// Multiply by the land mask after munging
    pub land_masked: bool,
}

const fn meta(
    minimum: Option<f64>,
    maximum: Option<f64>,
    units: &'static str,
) -> FieldMetadata {
    FieldMetadata {
        fill_value: 0.0,
        minimum,
        maximum,
        units,
    }
}

const fn salishseacast(
    kind: FieldKind,
    id: &'static str,
    variable: &'static str,
    unstagger: Option<&'static str>,
    slice: SliceType,
    group: &'static str,
    metadata: FieldMetadata,
    file: SalishSeaCastFile,
) -> FieldDescriptor {
    FieldDescriptor {
        kind,
        id,
        variable,
        unstagger,
        regrid: None,
        slice,
        group,
        metadata,
        source: ForcingSource::SalishSeaCast(file),
        time_axis: TIME_COUNTER,
        odd_samples_only: false,
        land_masked: false,
    }
}

const fn hrdps(
    kind: FieldKind,
    id: &'static str,
    variable: &'static str,
    group: &'static str,
) -> FieldDescriptor {
    FieldDescriptor {
        kind,
        id,
        variable,
        unstagger: None,
        regrid: Some(RegridMethod::Dense),
        slice: SliceType::TwoD,
        group,
        metadata: meta(Some(-100.0), Some(100.0), "m/s"),
        source: ForcingSource::Hrdps,
        time_axis: TIME_COUNTER,
        odd_samples_only: false,
        land_masked: false,
    }
}

const fn wavewatch3(
    kind: FieldKind,
    id: &'static str,
    variable: &'static str,
    group: &'static str,
    metadata: FieldMetadata,
) -> FieldDescriptor {
    FieldDescriptor {
        kind,
        id,
        variable,
        unstagger: None,
        regrid: Some(RegridMethod::Sparse),
        slice: SliceType::TwoD,
        group,
        metadata,
        source: ForcingSource::WaveWatch3,
        time_axis: WW3_TIME,
        odd_samples_only: true,
        land_masked: false,
    }
}

static OCEAN_VELOCITY_U: FieldDescriptor = salishseacast(
    FieldKind::OceanVelocityU,
    "ocean_velocity_u",
    "vozocrtx",
    Some("x"),
    SliceType::ThreeD,
    "velocity U",
    meta(Some(-5.0), Some(5.0), "m/s"),
    SalishSeaCastFile::GridU,
);
static OCEAN_VELOCITY_V: FieldDescriptor = salishseacast(
    FieldKind::OceanVelocityV,
    "ocean_velocity_v",
    "vomecrty",
    Some("y"),
    SliceType::ThreeD,
    "velocity V",
    meta(Some(-5.0), Some(5.0), "m/s"),
    SalishSeaCastFile::GridV,
);
static OCEAN_VELOCITY_W: FieldDescriptor = salishseacast(
    FieldKind::OceanVelocityW,
    "ocean_velocity_w",
    "vovecrtz",
    None,
    SliceType::ThreeD,
    "velocity W",
    meta(Some(-5.0), Some(5.0), "m/s"),
    SalishSeaCastFile::GridW,
);
static VERT_EDDY_DIFF: FieldDescriptor = salishseacast(
    FieldKind::VertEddyDiff,
    "vert_eddy_diff",
    "vert_eddy_diff",
    None,
    SliceType::ThreeD,
    "Diffusivity",
    meta(Some(0.0), Some(5.0), "m2/s"),
    SalishSeaCastFile::GridW,
);
static TEMPERATURE: FieldDescriptor = salishseacast(
    FieldKind::Temperature,
    "temperature",
    "votemper",
    None,
    SliceType::ThreeD,
    "temperature",
    meta(Some(-100.0), Some(100.0), "?C"),
    SalishSeaCastFile::GridT,
);
static SALINITY: FieldDescriptor = salishseacast(
    FieldKind::Salinity,
    "salinity",
    "vosaline",
    None,
    SliceType::ThreeD,
    "salinity",
    meta(Some(-100.0), Some(100.0), "psu"),
    SalishSeaCastFile::GridT,
);
static SEA_SURFACE_HEIGHT: FieldDescriptor = salishseacast(
    FieldKind::SeaSurfaceHeight,
    "sea_surface_height",
    "sossheig",
    None,
    SliceType::TwoD,
    "water level",
    meta(Some(-5.0), Some(5.0), "m"),
    SalishSeaCastFile::GridT,
);
static E3T: FieldDescriptor = FieldDescriptor {
    land_masked: true,
    ..salishseacast(
        FieldKind::E3t,
        "e3t",
        "e3t",
        None,
        SliceType::ThreeD,
        "vvl",
        meta(None, None, "m"),
        SalishSeaCastFile::CarpT,
    )
};
static WIND_VELOCITY_U: FieldDescriptor = hrdps(
    FieldKind::WindVelocityU,
    "wind_velocity_u",
    "u_wind",
    "wind velocity X",
);
static WIND_VELOCITY_V: FieldDescriptor = hrdps(
    FieldKind::WindVelocityV,
    "wind_velocity_v",
    "v_wind",
    "wind velocity Y",
);
static WHITECAP_COVERAGE: FieldDescriptor = wavewatch3(
    FieldKind::WhitecapCoverage,
    "whitecap_coverage",
    "wcc",
    "whitecap coverage",
    meta(Some(0.0), Some(1.0), "1"),
);
static MEAN_WAVE_PERIOD: FieldDescriptor = wavewatch3(
    FieldKind::MeanWavePeriod,
    "mean_wave_period",
    "t02",
    "mean wave period",
    meta(Some(0.0), Some(100000.0), "s"),
);
static MEAN_WAVE_LENGTH: FieldDescriptor = wavewatch3(
    FieldKind::MeanWaveLength,
    "mean_wave_length",
    "lm",
    "mean wave length",
    meta(Some(0.0), Some(3200.0), "m"),
);
static SIGNIFICANT_WAVE_HEIGHT: FieldDescriptor = wavewatch3(
    FieldKind::SignificantWaveHeight,
    "significant_wave_height",
    "hs",
    "significant wave height",
    meta(Some(-100.0), Some(100.0), "m"),
);
static STOKES_U: FieldDescriptor = wavewatch3(
    FieldKind::StokesU,
    "stokesU",
    "uuss",
    "Stokes U",
    meta(Some(-9900.0), Some(9900.0), "m/s"),
);
static STOKES_V: FieldDescriptor = wavewatch3(
    FieldKind::StokesV,
    "stokesV",
    "vuss",
    "Stokes V",
    meta(Some(-9900.0), Some(9900.0), "m/s"),
);

impl FieldKind {
    /// Every quantity, in the order a run processes them
    pub const ALL: [FieldKind; 16] = [
        FieldKind::OceanVelocityU,
        FieldKind::OceanVelocityV,
        FieldKind::OceanVelocityW,
        FieldKind::VertEddyDiff,
        FieldKind::Temperature,
        FieldKind::Salinity,
        FieldKind::SeaSurfaceHeight,
        FieldKind::E3t,
        FieldKind::WindVelocityU,
        FieldKind::WindVelocityV,
        FieldKind::WhitecapCoverage,
        FieldKind::MeanWavePeriod,
        FieldKind::MeanWaveLength,
        FieldKind::SignificantWaveHeight,
        FieldKind::StokesU,
        FieldKind::StokesV,
    ];

    pub fn descriptor(&self) -> &'static FieldDescriptor {
        match self {
            FieldKind::OceanVelocityU => &OCEAN_VELOCITY_U,
            FieldKind::OceanVelocityV => &OCEAN_VELOCITY_V,
            FieldKind::OceanVelocityW => &OCEAN_VELOCITY_W,
            FieldKind::VertEddyDiff => &VERT_EDDY_DIFF,
            FieldKind::Temperature => &TEMPERATURE,
            FieldKind::Salinity => &SALINITY,
            FieldKind::SeaSurfaceHeight => &SEA_SURFACE_HEIGHT,
            FieldKind::E3t => &E3T,
            FieldKind::WindVelocityU => &WIND_VELOCITY_U,
            FieldKind::WindVelocityV => &WIND_VELOCITY_V,
            FieldKind::WhitecapCoverage => &WHITECAP_COVERAGE,
            FieldKind::MeanWavePeriod => &MEAN_WAVE_PERIOD,
            FieldKind::MeanWaveLength => &MEAN_WAVE_LENGTH,
            FieldKind::SignificantWaveHeight => &SIGNIFICANT_WAVE_HEIGHT,
            FieldKind::StokesU => &STOKES_U,
            FieldKind::StokesV => &STOKES_V,
        }
    }

    pub fn id(&self) -> &'static str {
        self.descriptor().id
    }

    pub fn group(&self) -> &'static str {
        self.descriptor().group
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for FieldKind {
    type Err = ForcingError;

    fn from_str(s: &str) -> Result<Self> {
        FieldKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.id() == s)
            .ok_or_else(|| ForcingError::Configuration(format!("Unknown forcing field {}", s)))
    }
}
