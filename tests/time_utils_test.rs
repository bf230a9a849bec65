use chrono::NaiveDate;
use midoss_forcing::time_utils::{date_range, ddmonyy, decode_cf_times, folder_name, Timestamp};

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_folder_spans_year_boundary() {
    let dates = date_range(ymd(2019, 12, 31), 1);
    assert_eq!(dates.len(), 2);
    assert_eq!(
        folder_name(dates[0], *dates.last().unwrap()),
        "31dec19-01jan20"
    );
}

#[test]
fn test_ddmonyy_every_month() {
    let expected = [
        "15jan21", "15feb21", "15mar21", "15apr21", "15may21", "15jun21", "15jul21", "15aug21",
        "15sep21", "15oct21", "15nov21", "15dec21",
    ];
    for (month, stamp) in (1..=12).zip(expected) {
        assert_eq!(ddmonyy(ymd(2021, month, 15)), stamp);
    }
}

#[test]
fn test_hourly_model_times() {
    // SalishSeaCast files count seconds from 1900-01-01
    let base = 3_787_084_800.0;
    let values: Vec<f64> = (0..24).map(|h| base + 1800.0 + 3600.0 * h as f64).collect();
    let times = decode_cf_times(&values, "seconds since 1900-01-01 00:00:00").unwrap();
    assert_eq!(times.len(), 24);
    assert_eq!(times[0], ymd(2020, 1, 4).and_hms_opt(0, 30, 0).unwrap());
    assert_eq!(times[23], ymd(2020, 1, 4).and_hms_opt(23, 30, 0).unwrap());

    let stamps: Vec<Timestamp> = times.iter().map(Timestamp::from_datetime).collect();
    assert_eq!(stamps[5].0, [2020.0, 1.0, 4.0, 5.0, 30.0, 0.0]);
}

#[test]
fn test_sub_second_offsets_round() {
    let times = decode_cf_times(&[0.4, 59.6], "seconds since 2020-01-04 00:00:00").unwrap();
    assert_eq!(times[0], ymd(2020, 1, 4).and_hms_opt(0, 0, 0).unwrap());
    assert_eq!(times[1], ymd(2020, 1, 4).and_hms_opt(0, 1, 0).unwrap());
}

#[test]
fn test_non_finite_time_rejected() {
    assert!(decode_cf_times(&[f64::NAN], "hours since 2020-01-01 00:00:00").is_err());
}
