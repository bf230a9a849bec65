mod common;

use approx::assert_abs_diff_eq;
use chrono::NaiveDate;
use midoss_forcing::data_io::{NetcdfSource, SourceDataset};

#[test]
fn test_packed_variable_is_unpacked_and_masked() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("SoG_ww3_fields_20200104.nc");
    let date = NaiveDate::from_ymd_opt(2020, 1, 4).unwrap();
    common::write_ww3_day(&path, date, 4);

    let source = NetcdfSource::open(&path).unwrap();
    let hs = source.read_variable("hs").unwrap();
    assert_eq!(hs.dims, vec!["time", "latitude", "longitude"]);
    assert_eq!(hs.data.shape(), &[4, 2, 2]);
    for t in 0..4 {
        assert!(hs.data[[t, 1, 1]].is_nan());
        assert_abs_diff_eq!(hs.data[[t, 0, 1]], (t + 1) as f64, epsilon = 1e-6);
    }

    let times = source.read_times("time").unwrap();
    assert_eq!(times.len(), 4);
    assert_eq!(times[3], date.and_hms_opt(1, 30, 0).unwrap());
}

#[test]
fn test_unknown_variable_is_a_source_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ww3.nc");
    common::write_ww3_day(&path, NaiveDate::from_ymd_opt(2020, 1, 4).unwrap(), 2);
    let source = NetcdfSource::open(&path).unwrap();
    assert!(matches!(
        source.read_variable("uuss"),
        Err(midoss_forcing::ForcingError::Source(_))
    ));
}
