use kinetrace_core::persist::RawTimeSeries;
use kinetrace_core::{KinetraceError, TimeSeries};
use ndarray::{ArrayD, IxDyn};

fn sample() -> TimeSeries {
    let pos = ArrayD::from_shape_vec(
        IxDyn(&[3, 2, 2]),
        (0..12).map(|v| f64::from(v) * 0.1).collect(),
    )
    .unwrap();
    let mut ts = TimeSeries::new(vec![0.0, 0.01, 0.02])
        .with_data("Rot", pos)
        .unwrap()
        .with_scalar("Forces", vec![1.5, f64::NAN, f64::NEG_INFINITY])
        .unwrap();
    ts.add_data_info("Forces", "Unit", "N");
    ts.add_event(0.005, "push").unwrap();
    ts.add_event(0.015, "push").unwrap();
    ts.add_event(0.015, "recovery").unwrap();
    ts.time_info_mut()
        .insert("Source".into(), serde_json::json!("synthetic"));
    ts
}

#[test]
fn json_round_trip_keeps_all_four_parts() {
    let ts = sample();
    let back = TimeSeries::from_json(&ts.to_json().unwrap()).unwrap();
    assert_eq!(back.time(), ts.time());
    assert_eq!(back.events(), ts.events());
    assert_eq!(back.time_info(), ts.time_info());
    assert_eq!(back.data_info("Forces"), ts.data_info("Forces"));
    assert_eq!(back.data("Rot"), ts.data("Rot"));
    let f = back.data("Forces").unwrap();
    assert_eq!(f[[0]], 1.5);
    assert!(f[[1]].is_nan());
    assert_eq!(f[[2]], f64::NEG_INFINITY);
}

#[test]
fn non_finite_values_are_written_losslessly() {
    let json = sample().to_json().unwrap();
    let v: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(
        v["data"]["Forces"]["values"],
        serde_json::json!([1.5, null, "-inf"])
    );
    assert_eq!(v["data"]["Rot"]["shape"], serde_json::json!([3, 2, 2]));
}

#[test]
fn infinities_and_nan_time_survive_a_round_trip() {
    let ts = TimeSeries::new(vec![0.0, f64::NAN, 2.0])
        .with_scalar("x", vec![f64::INFINITY, f64::NEG_INFINITY, 0.0])
        .unwrap();
    let json = ts.to_json().unwrap();
    let back = TimeSeries::from_json(&json).unwrap();
    assert_eq!(back.time()[0], 0.0);
    assert!(back.time()[1].is_nan());
    let x = back.data("x").unwrap();
    assert_eq!(x[[0]], f64::INFINITY);
    assert_eq!(x[[1]], f64::NEG_INFINITY);
    assert_eq!(x[[2]], 0.0);
}

#[test]
fn unknown_text_value_is_rejected() {
    let json = r#"{"time": [0.0], "data": {"x": {"shape": [1], "values": ["big"]}}}"#;
    assert!(matches!(
        TimeSeries::from_json(json),
        Err(KinetraceError::Data(_))
    ));
    let json = r#"{"time": ["-inf", 0.0], "data": {"x": {"shape": [2], "values": ["inf", null]}}}"#;
    let ts = TimeSeries::from_json(json).unwrap();
    assert_eq!(ts.time()[0], f64::NEG_INFINITY);
    assert_eq!(ts.data("x").unwrap()[[0]], f64::INFINITY);
}

#[test]
fn decoding_rechecks_channel_length() {
    let json = r#"{
        "time": [0.0, 1.0, 2.0],
        "data": {"x": {"shape": [2], "values": [1.0, 2.0]}}
    }"#;
    let err = TimeSeries::from_json(json).unwrap_err();
    assert_eq!(err, KinetraceError::shape_mismatch("x", 3, 2));

    let json = r#"{"time": [0.0], "data": {"x": {"shape": [1, 2], "values": [1.0]}}}"#;
    assert!(matches!(
        TimeSeries::from_json(json),
        Err(KinetraceError::Data(_))
    ));
    assert!(matches!(
        TimeSeries::from_json("{not json"),
        Err(KinetraceError::Data(_))
    ));
}

#[test]
fn decoding_sorts_events_and_defaults_missing_parts() {
    let json = r#"{
        "time": [0.0, 1.0],
        "events": [{"time": 0.9, "name": "b"}, {"time": 0.1, "name": "a"}]
    }"#;
    let ts = TimeSeries::from_json(json).unwrap();
    assert_eq!(ts.events()[0].name, "a");
    assert_eq!(ts.channel_count(), 0);
}

#[test]
fn serde_goes_through_raw_form() {
    let ts = sample();
    let raw = RawTimeSeries::from(ts.clone());
    let values = &raw.data["Forces"].values;
    assert_eq!(values[0], 1.5);
    assert!(values[1].is_nan());
    assert_eq!(values[2], f64::NEG_INFINITY);
    let back = TimeSeries::try_from(raw).unwrap();
    assert_eq!(back.events(), ts.events());
}
