#![allow(dead_code)]

use chrono::NaiveDate;
use ndarray::{Array3, ArrayD};
use std::path::Path;

/// Write a weights resource with `y`, `x` and `weights` shaped (index, y, x)
pub fn write_weights(path: &Path, rows: &Array3<f64>, cols: &Array3<f64>, weights: &Array3<f64>) {
    let (corners, ny, nx) = weights.dim();
    let mut file = netcdf::create(path).unwrap();
    file.add_dimension("index", corners).unwrap();
    file.add_dimension("y", ny).unwrap();
    file.add_dimension("x", nx).unwrap();
    for (name, values) in [("y", rows), ("x", cols), ("weights", weights)] {
        let mut var = file.add_variable::<f64>(name, &["index", "y", "x"]).unwrap();
        var.put_values(values.as_standard_layout().as_slice().unwrap(), ..)
            .unwrap();
    }
}

/// Weights averaging the four cells of a 2 x 2 source grid into every target cell
pub fn write_uniform_weights(path: &Path, shape: (usize, usize)) {
    let (ny, nx) = shape;
    let rows = Array3::from_shape_fn((4, ny, nx), |(k, _, _)| (k / 2) as f64);
    let cols = Array3::from_shape_fn((4, ny, nx), |(k, _, _)| (k % 2) as f64);
    let weights = Array3::from_elem((4, ny, nx), 0.25);
    write_weights(path, &rows, &cols, &weights);
}

/// One HRDPS day file with hourly `u_wind`/`v_wind` on a small grid
///
/// Step `t` holds `t + 1` in `u_wind` and `-(t + 1)` in `v_wind` everywhere.
pub fn write_hrdps_day(path: &Path, date: NaiveDate, steps: usize, shape: (usize, usize)) {
    let (ny, nx) = shape;
    let mut file = netcdf::create(path).unwrap();
    file.add_dimension("time_counter", steps).unwrap();
    file.add_dimension("y", ny).unwrap();
    file.add_dimension("x", nx).unwrap();

    let mut time = file.add_variable::<f64>("time_counter", &["time_counter"]).unwrap();
    let units = format!("seconds since {} 00:00:00", date.format("%Y-%m-%d"));
    time.put_attribute("units", units.as_str()).unwrap();
    let seconds: Vec<f64> = (0..steps).map(|t| t as f64 * 3600.0).collect();
    time.put_values(&seconds, ..).unwrap();

    for (name, sign) in [("u_wind", 1.0), ("v_wind", -1.0)] {
        let data = ArrayD::from_shape_fn(ndarray::IxDyn(&[steps, ny, nx]), |ix| {
            sign * (ix[0] + 1) as f64
        });
        let mut var = file
            .add_variable::<f64>(name, &["time_counter", "y", "x"])
            .unwrap();
        var.put_values(data.as_slice().unwrap(), ..).unwrap();
    }
}

/// Packed fill value of the WaveWatch3 `hs` fixture
pub const HS_FILL: i16 = -32767;
/// Scale applied when unpacking `hs`
pub const HS_SCALE: f32 = 0.01;

/// One WaveWatch3 day file with a short-packed `hs` on a 2 x 2 grid
///
/// Raw sample `t` is stamped `t * 30` minutes after midnight and unpacks to
/// `t + 1` metres, except cell (1, 1) which holds the fill value throughout.
pub fn write_ww3_day(path: &Path, date: NaiveDate, samples: usize) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let mut file = netcdf::create(path).unwrap();
    file.add_dimension("time", samples).unwrap();
    file.add_dimension("latitude", 2).unwrap();
    file.add_dimension("longitude", 2).unwrap();

    let mut time = file.add_variable::<f64>("time", &["time"]).unwrap();
    let units = format!("seconds since {} 00:00:00", date.format("%Y-%m-%d"));
    time.put_attribute("units", units.as_str()).unwrap();
    let seconds: Vec<f64> = (0..samples).map(|t| t as f64 * 1800.0).collect();
    time.put_values(&seconds, ..).unwrap();

    let packed = ArrayD::from_shape_fn(ndarray::IxDyn(&[samples, 2, 2]), |ix| {
        if ix[1] == 1 && ix[2] == 1 {
            HS_FILL
        } else {
            (100 * (ix[0] + 1)) as i16
        }
    });
    let mut hs = file
        .add_variable::<i16>("hs", &["time", "latitude", "longitude"])
        .unwrap();
    hs.put_attribute("_FillValue", HS_FILL).unwrap();
    hs.put_attribute("scale_factor", HS_SCALE).unwrap();
    hs.put_values(packed.as_slice().unwrap(), ..).unwrap();
}
