use kinetrace::cycles::keys;
use kinetrace::{
    CycleStack, Interpolation, KinetraceError, NormalizeConfig, TimeSeries, time_normalize,
};
use proptest::prelude::*;

/// Three cycles at 100 Hz with `start` at 0, 1, 2 s and `stop` at 0.8,
/// 1.8, 2.8 s.
fn three_cycles() -> TimeSeries {
    let mut ts = TimeSeries::with_rate(300, 100.0, 0.0).unwrap();
    let a: Vec<f64> = ts.time().iter().map(|t| t * 2.0).collect();
    let b: Vec<f64> = ts.time().iter().map(|t| (t * 3.0).sin()).collect();
    ts.add_scalar("a", a).unwrap();
    ts.add_scalar("b", b).unwrap();
    ts.add_data_info("a", "Unit", "deg");
    for c in 0..3 {
        let t0 = f64::from(c);
        ts.add_event(t0, "start").unwrap();
        ts.add_event(t0 + 0.8, "stop").unwrap();
        ts.add_event(t0 + 0.4, "mid").unwrap();
    }
    ts
}

fn config() -> NormalizeConfig {
    NormalizeConfig::new("start", "stop").with_points(101)
}

#[test]
fn three_cycles_stack_into_cycle_point_column_tensor() {
    let flat = time_normalize(&three_cycles(), &config()).unwrap();
    assert_eq!(flat.len(), 303);

    let stack = CycleStack::stack(&flat, &config()).unwrap();
    assert_eq!(stack.shape(), [3, 101, 2]);
    assert_eq!(stack.tensor().shape(), &[3, 101, 2]);
    assert_eq!(stack.column_names(), ["a", "b"]);

    let back = stack.unstack().unwrap();
    assert_eq!(back.len(), 303);
    assert_eq!(back.channel_count(), 2);
    assert_eq!(back.event_count("start"), 3);
    assert_eq!(back.event_count("stop"), 3);
}

#[test]
fn same_name_boundaries_keep_two_events_per_cycle() {
    let mut ts = TimeSeries::with_rate(400, 100.0, 0.0).unwrap();
    let x: Vec<f64> = ts.time().iter().map(|t| (t * 5.0).cos()).collect();
    ts.add_scalar("x", x).unwrap();
    for c in 0..4 {
        ts.add_event(f64::from(c), "push").unwrap();
    }
    ts.add_event(1.5, "release").unwrap();
    let config = NormalizeConfig::new("push", "push").with_points(101);

    let flat = time_normalize(&ts, &config).unwrap();
    assert_eq!(flat.len(), 303);
    assert_eq!(flat.event_count("push"), 6);
    let pushes: Vec<f64> = flat
        .events()
        .iter()
        .filter(|e| e.name == "push")
        .map(|e| e.time)
        .collect();
    assert_eq!(pushes, [0.0, 100.0, 100.0, 200.0, 200.0, 300.0]);

    let stack = CycleStack::stack(&flat, &config).unwrap();
    assert_eq!(stack.events(0).unwrap().len(), 0);
    assert_eq!(stack.events(1).unwrap().len(), 1);
    assert_eq!(stack.events(2).unwrap().len(), 0);

    let back = stack.unstack().unwrap();
    assert_eq!(back.event_count("push"), 6);
    assert_eq!(back.event_count("release"), 1);
}

#[test]
fn normalized_axis_restarts_every_cycle() {
    let flat = time_normalize(&three_cycles(), &config()).unwrap();
    let pct = 100.0 / 101.0;
    assert_eq!(flat.time()[0], 0.0);
    assert!((flat.time()[1] - pct).abs() < 1e-12);
    assert_eq!(flat.time()[101], 100.0);
    assert_eq!(flat.time()[202], 200.0);

    // a = 2 t, sampled from t = c to t = c + 0.8
    let a = flat.data("a").unwrap();
    assert!((a[[0]] - 0.0).abs() < 1e-9);
    assert!((a[[101]] - 2.0).abs() < 1e-9);
    assert!((a[[50]] - 2.0 * 0.8 * 50.0 / 101.0).abs() < 1e-9);

    assert_eq!(flat.time_info()["Unit"], keys::PERCENT_UNIT);
    assert_eq!(flat.time_info()[keys::NORMALIZATION]["cycles"], 3);
    assert_eq!(flat.data_info("a").unwrap()["Unit"], "deg");
}

#[test]
fn boundary_and_inner_events_land_on_the_percent_axis() {
    let flat = time_normalize(&three_cycles(), &config()).unwrap();
    let starts: Vec<f64> = flat
        .events()
        .iter()
        .filter(|e| e.name == "start")
        .map(|e| e.time)
        .collect();
    let stops: Vec<f64> = flat
        .events()
        .iter()
        .filter(|e| e.name == "stop")
        .map(|e| e.time)
        .collect();
    assert_eq!(starts, [0.0, 100.0, 200.0]);
    assert_eq!(stops, [100.0, 200.0, 300.0]);
    for (c, e) in flat.events().iter().filter(|e| e.name == "mid").enumerate() {
        assert!((e.time - (c as f64 * 100.0 + 50.0)).abs() < 1e-9);
    }

    let stack = CycleStack::stack(&flat, &config()).unwrap();
    for c in 0..3 {
        let events = stack.events(c).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "mid");
        assert!((events[0].time - 50.0).abs() < 1e-9);
    }
}

#[test]
fn unstack_reproduces_the_flat_series() {
    let flat = time_normalize(&three_cycles(), &config()).unwrap();
    let back = CycleStack::stack(&flat, &config())
        .unwrap()
        .unstack()
        .unwrap();
    assert_eq!(back.time(), flat.time());
    assert_eq!(back.data("a"), flat.data("a"));
    assert_eq!(back.data("b"), flat.data("b"));
    assert_eq!(back.time_info(), flat.time_info());
    assert_eq!(back.events().len(), flat.events().len());
    for (x, y) in back.events().iter().zip(flat.events()) {
        assert_eq!(x.name, y.name);
        assert!((x.time - y.time).abs() < 1e-9);
    }
}

#[test]
fn start_without_later_end_is_not_a_cycle() {
    let mut ts = three_cycles();
    ts.remove_event("stop", 2).unwrap();
    let flat = time_normalize(&ts, &config()).unwrap();
    assert_eq!(flat.len(), 202);

    let mut none = three_cycles();
    none.clear_events();
    let err = time_normalize(&none, &config()).unwrap_err();
    assert!(matches!(err, KinetraceError::NotFound { .. }));
}

#[test]
fn vector_channels_keep_trailing_axes() {
    let ts = kinetrace_mock::Propulsion::with_cycles(3).series_with_events();
    let cfg = NormalizeConfig::new("push", "push")
        .with_points(50)
        .with_method(Interpolation::MonotonicCubic);
    let flat = time_normalize(&ts, &cfg).unwrap();
    // the third push has no later push
    assert_eq!(flat.len(), 100);
    assert_eq!(flat.data("Rim").unwrap().shape(), &[100, 3]);

    let stack = CycleStack::stack(&flat, &cfg).unwrap();
    assert_eq!(stack.channel("Rim").unwrap().shape(), &[2, 50, 3]);
    assert_eq!(stack.shape(), [2, 50, 5]);
    assert_eq!(
        stack.column_names(),
        ["Force", "Rim[0]", "Rim[1]", "Rim[2]", "Velocity"]
    );
    let tensor = stack.tensor();
    let rim = stack.channel("Rim").unwrap();
    assert_eq!(tensor[[1, 7, 2]], rim[[1, 7, 1]]);
    // identical synthetic pushes
    let force = stack.channel("Force").unwrap();
    for k in 0..50 {
        assert!((force[[0, k]] - force[[1, k]]).abs() < 1e-9);
    }
    // release at 40% of every cycle
    assert!(stack.events(0).unwrap().iter().any(|e| e.name == "release"
        && (e.time - 40.0).abs() < 1e-9));
}

#[test]
fn uneven_flat_series_is_irregular() {
    let flat = TimeSeries::with_rate(250, 1.0, 0.0)
        .unwrap()
        .with_scalar("x", vec![0.0; 250])
        .unwrap();
    let err = CycleStack::stack(&flat, &config()).unwrap_err();
    assert!(matches!(err, KinetraceError::IrregularCycle { .. }));

    // 202 samples split evenly, but the second cycle does not restart at 100
    let shifted = TimeSeries::with_rate(202, 1.0, 0.0)
        .unwrap()
        .with_scalar("x", vec![0.0; 202])
        .unwrap();
    let err = CycleStack::stack(&shifted, &config()).unwrap_err();
    assert!(matches!(err, KinetraceError::IrregularCycle { .. }));
}

#[test]
fn from_cycles_requires_uniform_cycles() {
    let flat = time_normalize(&three_cycles(), &config()).unwrap();
    let stack = CycleStack::stack(&flat, &config()).unwrap();
    let cycles: Vec<TimeSeries> = (0..3).map(|c| stack.cycle(c).unwrap()).collect();
    assert_eq!(cycles[1].len(), 101);
    assert_eq!(cycles[1].event_count("start"), 1);

    let rebuilt = CycleStack::from_cycles(&cycles, &config()).unwrap();
    assert_eq!(rebuilt.shape(), stack.shape());
    assert_eq!(rebuilt.channel("b"), stack.channel("b"));

    let short = NormalizeConfig::new("start", "stop").with_points(100);
    let err = CycleStack::from_cycles(&cycles, &short).unwrap_err();
    assert!(matches!(err, KinetraceError::IrregularCycle { .. }));

    let mut mixed = cycles.clone();
    mixed[2].remove_data("b");
    let err = CycleStack::from_cycles(&mixed, &config()).unwrap_err();
    assert!(matches!(err, KinetraceError::IrregularCycle { .. }));
}

#[test]
fn select_reorders_and_checks_indices() {
    let flat = time_normalize(&three_cycles(), &config()).unwrap();
    let stack = CycleStack::stack(&flat, &config()).unwrap();
    let picked = stack.select(&[2, 0]).unwrap();
    assert_eq!(picked.n_cycles(), 2);
    let a = stack.channel("a").unwrap();
    let p = picked.channel("a").unwrap();
    assert_eq!(p[[0, 10]], a[[2, 10]]);
    assert_eq!(p[[1, 10]], a[[0, 10]]);

    let err = stack.select(&[3]).unwrap_err();
    assert!(matches!(err, KinetraceError::OutOfBounds { .. }));
    assert!(stack.cycle(3).is_err());
}

#[test]
fn custom_span_offsets_the_axis() {
    let cfg = NormalizeConfig::new("start", "stop")
        .with_points(10)
        .with_span(0.0, 1.0);
    let flat = time_normalize(&three_cycles(), &cfg).unwrap();
    assert_eq!(flat.len(), 30);
    assert_eq!(flat.time()[10], 1.0);
    let back = CycleStack::stack(&flat, &cfg).unwrap().unstack().unwrap();
    assert_eq!(back.time(), flat.time());
}

proptest! {
    #[test]
    fn stack_unstack_round_trip(
        cycles in 1usize..5,
        n_points in 2usize..40,
        seed in prop::collection::vec(-100.0..100.0f64, 8),
    ) {
        let cfg = NormalizeConfig::new("on", "off").with_points(n_points);
        let len = cycles * n_points;
        let mut flat = TimeSeries::new(
            (0..cycles)
                .flat_map(|c| {
                    (0..n_points).map(move |k| {
                        c as f64 * 100.0 + 100.0 * k as f64 / n_points as f64
                    })
                })
                .collect(),
        );
        let values: Vec<f64> = (0..len).map(|i| seed[i % seed.len()] + i as f64).collect();
        flat.add_scalar("x", values).unwrap();
        for c in 0..cycles {
            flat.add_event(c as f64 * 100.0, "on").unwrap();
            flat.add_event((c + 1) as f64 * 100.0, "off").unwrap();
        }

        let stack = CycleStack::stack(&flat, &cfg).unwrap();
        prop_assert_eq!(stack.n_cycles(), cycles);
        let back = stack.unstack().unwrap();
        prop_assert_eq!(back.time(), flat.time());
        prop_assert_eq!(back.data("x"), flat.data("x"));
        prop_assert_eq!(back.events(), flat.events());
        prop_assert!(back.validate().is_ok());
    }
}
