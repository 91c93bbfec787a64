use kinetrace_core::{Event, KinetraceError, TimeSeries};
use ndarray::{ArrayD, IxDyn};
use proptest::prelude::*;

fn vec3(n: usize) -> ArrayD<f64> {
    ArrayD::from_shape_vec(IxDyn(&[n, 3]), (0..n * 3).map(|v| v as f64).collect()).unwrap()
}

#[test]
fn events_stay_sorted_and_keep_repeats() {
    let mut ts = TimeSeries::default();
    ts.add_event(5.5, "event1").unwrap();
    ts.add_event(10.8, "event2").unwrap();
    ts.add_event(2.3, "event2").unwrap();
    ts.add_event(5.5, "event1").unwrap();
    ts.add_event(5.5, "a").unwrap();
    let names: Vec<&str> = ts.events().iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["event2", "a", "event1", "event1", "event2"]);
    assert_eq!(ts.event_count("event2"), 2);
    assert_eq!(ts.event_count("event1"), 2);
}

#[test]
fn same_time_same_name_events_are_all_kept() {
    let mut ts = TimeSeries::new(vec![0.0, 1.0]);
    ts.add_event(0.5, "heel").unwrap();
    ts.add_event(0.5, "heel").unwrap();
    ts.add_events(vec![Event::new(0.5, "heel"), Event::new(0.2, "toe")])
        .unwrap();
    assert_eq!(ts.event_count("heel"), 3);

    let mut other = TimeSeries::new(vec![0.0, 1.0]);
    other.add_event(0.5, "heel").unwrap();
    ts.merge(&other, None, false, false).unwrap();
    assert_eq!(ts.event_count("heel"), 4);
    assert_eq!(ts.events()[0].name, "toe");
}

#[test]
fn non_finite_event_is_rejected_without_side_effects() {
    let mut ts = TimeSeries::default();
    ts.add_event(1.0, "ok").unwrap();
    let err = ts
        .add_events(vec![Event::new(2.0, "x"), Event::new(f64::NAN, "y")])
        .unwrap_err();
    assert!(err.is_argument_error());
    assert_eq!(ts.events().len(), 1);
}

#[test]
fn remove_rename_and_sync_events() {
    let mut ts = TimeSeries::new(vec![0.0, 1.0, 2.0, 3.0]);
    ts.add_event(1.0, "push").unwrap();
    ts.add_event(2.0, "push").unwrap();
    let removed = ts.remove_event("push", 1).unwrap();
    assert_eq!(removed.time, 2.0);
    assert!(matches!(
        ts.remove_event("push", 1),
        Err(KinetraceError::NotFound { .. })
    ));
    assert_eq!(ts.rename_event("push", "contact"), 1);
    ts.sync_event("contact", 0).unwrap();
    assert_eq!(ts.time(), &[-1.0, 0.0, 1.0, 2.0]);
    assert_eq!(ts.events()[0].time, 0.0);
}

#[test]
fn trim_events_drops_outside_range() {
    let mut ts = TimeSeries::new(vec![0.0, 1.0]);
    ts.add_events([Event::new(-0.5, "a"), Event::new(0.5, "b"), Event::new(1.5, "c")])
        .unwrap();
    ts.trim_events();
    assert_eq!(ts.events(), &[Event::new(0.5, "b")]);
}

#[test]
fn channel_length_is_enforced() {
    let mut ts = TimeSeries::new(vec![0.0, 1.0, 2.0]);
    let err = ts.add_scalar("x", vec![1.0, 2.0]).unwrap_err();
    assert_eq!(err, KinetraceError::shape_mismatch("x", 3, 2));
    ts.add_data("Pos", vec3(3)).unwrap();
    assert!(matches!(
        ts.set_time(vec![0.0, 1.0]),
        Err(KinetraceError::ShapeMismatch { .. })
    ));
    assert_eq!(ts.len(), 3);
}

#[test]
fn rename_and_remove_channel_carry_metadata() {
    let mut ts = TimeSeries::new(vec![0.0, 1.0]).with_scalar("Fx", vec![1.0, 2.0]).unwrap();
    ts.add_data_info("Fx", "Unit", "N");
    ts.rename_data("Fx", "Force").unwrap();
    assert!(!ts.has_data("Fx"));
    assert_eq!(ts.data_info("Force").unwrap()["Unit"], "N");
    ts.add_scalar("Other", vec![0.0, 0.0]).unwrap();
    assert!(ts.rename_data("Force", "Other").unwrap_err().is_argument_error());
    assert!(ts.remove_data("Force").is_some());
    assert!(ts.data_info("Force").is_none());
}

#[test]
fn isnan_is_per_sample() {
    let mut arr = vec3(3);
    arr[[1, 2]] = f64::NAN;
    let ts = TimeSeries::new(vec![0.0, 1.0, 2.0]).with_data("Pos", arr).unwrap();
    assert_eq!(ts.isnan("Pos").unwrap(), vec![false, true, false]);
}

#[test]
fn subset_keeps_events_and_requested_channels() {
    let mut ts = TimeSeries::new(vec![0.0, 1.0])
        .with_scalar("a", vec![1.0, 2.0])
        .unwrap()
        .with_scalar("b", vec![3.0, 4.0])
        .unwrap();
    ts.add_event(0.5, "e").unwrap();
    let sub = ts.get_subset(&["b"]).unwrap();
    assert_eq!(sub.channel_names().collect::<Vec<_>>(), ["b"]);
    assert_eq!(sub.events().len(), 1);
    assert!(ts.get_subset(&["zzz"]).is_err());
}

#[test]
fn copy_is_deep() {
    let ts = TimeSeries::new(vec![0.0, 1.0]).with_scalar("a", vec![1.0, 2.0]).unwrap();
    let mut other = ts.copy();
    other.data_view_mut("a").unwrap()[[0]] = 99.0;
    assert_eq!(ts.data("a").unwrap()[[0]], 1.0);
}

#[derive(Debug, Clone)]
enum Op {
    AddScalar(usize),
    AddVector(usize),
    Window(usize, usize),
    Resample(usize),
    Fill,
    Smooth,
    SetTime(usize),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0usize..40).prop_map(Op::AddScalar),
        (0usize..40).prop_map(Op::AddVector),
        (0usize..40, 0usize..40).prop_map(|(a, b)| Op::Window(a, b)),
        (1usize..40).prop_map(Op::Resample),
        Just(Op::Fill),
        Just(Op::Smooth),
        (0usize..40).prop_map(Op::SetTime),
    ]
}

proptest! {
    #[test]
    fn every_channel_matches_time_length(n in 2usize..30, ops in proptest::collection::vec(arb_op(), 1..12)) {
        use kinetrace_core::{Anchor, Bound, GapFillConfig, Interpolation, Window};

        let mut ts = TimeSeries::with_rate(n, 10.0, 0.0).unwrap();
        for (k, op) in ops.into_iter().enumerate() {
            let name = format!("c{k}");
            let _ = match op {
                Op::AddScalar(m) => ts.add_scalar(name, vec![1.0; m]).map(|_| ()),
                Op::AddVector(m) => ts.add_data(name, vec3(m)).map(|_| ()),
                Op::Window(a, b) => ts
                    .window(&Window::between(
                        Bound::inclusive(Anchor::Index(a.min(b))),
                        Bound::exclusive(Anchor::Index(a.max(b))),
                    ))
                    .map(|w| ts = w),
                Op::Resample(m) => ts.resample_uniform(m, Interpolation::Linear),
                Op::Fill => ts.fill_missing_samples(&GapFillConfig::default()).map(|_| ()),
                Op::Smooth => ts.smooth(3),
                Op::SetTime(m) => ts.set_time((0..m).map(|i| i as f64).collect()),
            };
            prop_assert!(ts.validate().is_ok());
        }
    }
}
