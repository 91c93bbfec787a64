use kinetrace::{DetectConfig, Direction, KinetraceError, TimeSeries, detect_cycles};
use ndarray::{ArrayD, IxDyn};
use proptest::prelude::*;

fn signal(values: Vec<f64>) -> TimeSeries {
    let n = values.len();
    TimeSeries::with_rate(n, 1.0, 0.0)
        .unwrap()
        .with_scalar("Force", values)
        .unwrap()
}

fn ranges(phases: &[kinetrace::Phase]) -> Vec<(usize, usize)> {
    phases.iter().map(|p| (p.start, p.end)).collect()
}

#[test]
fn square_pushes_with_duration_bounds() {
    let mut ts = signal(vec![0., 0., 5., 5., 5., 0., 0., 5., 5., 0.]);
    let config = DetectConfig::new("Force", "push", "recovery", 1.0, 3.0)
        .with_duration(Some(2.0), Some(5.0));
    let phases = detect_cycles(&mut ts, &config).unwrap();
    assert_eq!(ranges(&phases), [(2, 5), (7, 9)]);
    assert_eq!(phases[0].peak, 5.0);
    assert_eq!(phases[0].duration(ts.time()), Some(3.0));

    let events: Vec<(f64, &str)> = ts.events().iter().map(|e| (e.time, e.name.as_str())).collect();
    assert_eq!(
        events,
        [(2.0, "push"), (5.0, "recovery"), (7.0, "push"), (9.0, "recovery")]
    );
}

#[test]
fn duration_bounds_filter_without_error() {
    let mut ts = signal(vec![0., 0., 5., 5., 5., 0., 0., 5., 5., 0.]);
    let config = DetectConfig::new("Force", "push", "recovery", 1.0, 3.0)
        .with_duration(Some(2.5), None);
    let phases = detect_cycles(&mut ts, &config).unwrap();
    assert_eq!(ranges(&phases), [(2, 5)]);
    assert_eq!(ts.events().len(), 2);
}

#[test]
fn peak_height_bounds_filter_candidates() {
    let mut ts = signal(vec![0., 5., 0., 9., 0.]);
    let config =
        DetectConfig::new("Force", "on", "off", 1.0, 3.0).with_peak_height(Some(6.0), None);
    let phases = detect_cycles(&mut ts, &config).unwrap();
    assert_eq!(ranges(&phases), [(3, 4)]);
    assert_eq!(phases[0].peak, 9.0);
    assert_eq!(ts.event_time("on", 0).unwrap(), 3.0);
    assert_eq!(ts.event_time("off", 0).unwrap(), 4.0);
}

#[test]
fn falling_direction_mirrors_rising() {
    let mut ts = signal(vec![10., 10., 0., 0., 10., 10., 0., 10.]);
    let config =
        DetectConfig::new("Force", "dip", "rise", 3.0, 7.0).with_direction(Direction::Falling);
    let phases = detect_cycles(&mut ts, &config).unwrap();
    assert_eq!(ranges(&phases), [(2, 4), (6, 7)]);
    assert!(phases.iter().all(|p| p.peak == 0.0));
}

#[test]
fn detector_arms_only_below_low_threshold() {
    // starts inside a phase: the first push is incomplete and ignored
    let mut ts = signal(vec![5., 5., 0., 5., 0.]);
    let config = DetectConfig::new("Force", "push", "recovery", 1.0, 3.0);
    let phases = detect_cycles(&mut ts, &config).unwrap();
    assert_eq!(ranges(&phases), [(3, 4)]);
}

#[test]
fn non_finite_samples_never_transition() {
    let mut ts = signal(vec![0., 5., f64::NAN, 5., 0.]);
    let config = DetectConfig::new("Force", "push", "recovery", 1.0, 3.0);
    let phases = detect_cycles(&mut ts, &config).unwrap();
    assert_eq!(ranges(&phases), [(1, 4)]);
    assert_eq!(phases[0].peak, 5.0);
}

#[test]
fn phase_open_at_the_end_is_dropped() {
    let mut ts = signal(vec![0., 5., 5.]);
    let config = DetectConfig::new("Force", "push", "recovery", 1.0, 3.0);
    assert!(detect_cycles(&mut ts, &config).unwrap().is_empty());
    assert!(ts.events().is_empty());
}

#[test]
fn hysteresis_ignores_noise_inside_the_band() {
    let mut ts = signal(vec![0., 4., 2., 4., 2., 0., 2., 0.]);
    let config = DetectConfig::new("Force", "push", "recovery", 1.0, 3.0);
    let phases = detect_cycles(&mut ts, &config).unwrap();
    assert_eq!(ranges(&phases), [(1, 5)]);
}

#[test]
fn invalid_inputs_are_rejected_without_mutation() {
    let mut ts = signal(vec![0., 5., 0.]);

    let inverted = DetectConfig::new("Force", "push", "recovery", 3.0, 1.0);
    let err = detect_cycles(&mut ts, &inverted).unwrap_err();
    assert!(matches!(err, KinetraceError::InvalidArg(_)));

    let missing = DetectConfig::new("Grip", "push", "recovery", 1.0, 3.0);
    let err = detect_cycles(&mut ts, &missing).unwrap_err();
    assert!(matches!(err, KinetraceError::NotFound { .. }));

    let vector = ArrayD::from_shape_vec(IxDyn(&[3, 2]), vec![0.0; 6]).unwrap();
    ts.add_data("Rim", vector).unwrap();
    let non_scalar = DetectConfig::new("Rim", "push", "recovery", 1.0, 3.0);
    let err = detect_cycles(&mut ts, &non_scalar).unwrap_err();
    assert!(err.is_argument_error());

    assert!(ts.events().is_empty());
}

#[test]
fn mock_propulsion_yields_one_push_per_cycle() {
    let mut ts = kinetrace_mock::Propulsion::with_cycles(4).series();
    let config = DetectConfig::new("Force", "push", "release", 5.0, 20.0);
    let phases = detect_cycles(&mut ts, &config).unwrap();
    assert_eq!(phases.len(), 4);
    assert_eq!(ts.event_count("push"), 4);
    for p in &phases {
        assert!((p.peak - 50.0).abs() < 0.5);
    }
}

fn arb_signal() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(
        prop_oneof![9 => -10.0..10.0f64, 1 => Just(f64::NAN)],
        0..200,
    )
}

proptest! {
    #[test]
    fn detection_is_deterministic_and_bounded(
        values in arb_signal(),
        low in -5.0..0.0f64,
        high in 0.0..5.0f64,
        min_d in prop::option::of(0.0..5.0f64),
        max_d in prop::option::of(5.0..50.0f64),
        min_h in prop::option::of(0.0..6.0f64),
    ) {
        let config = DetectConfig::new("Force", "on", "off", low, high)
            .with_duration(min_d, max_d)
            .with_peak_height(min_h, None);
        let mut a = signal(values.clone());
        let mut b = signal(values);
        let pa = detect_cycles(&mut a, &config).unwrap();
        let pb = detect_cycles(&mut b, &config).unwrap();
        prop_assert_eq!(&pa, &pb);
        prop_assert_eq!(a.events(), b.events());
        prop_assert_eq!(a.events().len(), pa.len() * 2);

        let mut last_end = 0;
        for p in &pa {
            prop_assert!(p.start < p.end);
            prop_assert!(p.start >= last_end);
            last_end = p.end;
            let d = p.duration(a.time()).unwrap();
            prop_assert!(min_d.is_none_or(|m| d >= m));
            prop_assert!(max_d.is_none_or(|m| d <= m));
            prop_assert!(min_h.is_none_or(|m| p.peak >= m));
            prop_assert!(p.peak > high);
        }
    }
}
