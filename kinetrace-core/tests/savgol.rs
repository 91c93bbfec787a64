use kinetrace_core::TimeSeries;
use ndarray::{ArrayD, IxDyn};
use proptest::prelude::*;

fn cubic(n: usize, rate: f64) -> TimeSeries {
    let ts = TimeSeries::with_rate(n, rate, 0.0).unwrap();
    let x: Vec<f64> = ts
        .time()
        .iter()
        .map(|t| 0.5 * t.powi(3) - t * t + 2.0)
        .collect();
    ts.with_scalar("x", x).unwrap()
}

#[test]
fn moving_average_fits_the_first_and_last_window() {
    let ts = TimeSeries::new(vec![0.0, 1.0, 2.0, 3.0])
        .with_scalar("x", vec![0.0, 3.0, 0.0, 3.0])
        .unwrap();
    let x = ts.smoothed(3).unwrap().data("x").unwrap().clone();
    for (got, want) in x.iter().zip([1.0, 1.0, 2.0, 2.0]) {
        assert!((got - want).abs() < 1e-12, "{got} vs {want}");
    }
}

#[test]
fn cubic_fit_reproduces_a_cubic_and_its_derivatives() {
    let ts = cubic(30, 20.0);
    let smooth = ts.savgol_filtered(7, 3, 0).unwrap();
    let velocity = ts.savgol_filtered(7, 3, 1).unwrap();
    let accel = ts.savgol_filtered(7, 3, 2).unwrap();
    for (i, &t) in ts.time().iter().enumerate() {
        let x = ts.data("x").unwrap()[[i]];
        assert!((smooth.data("x").unwrap()[[i]] - x).abs() < 1e-9);
        assert!((velocity.data("x").unwrap()[[i]] - (1.5 * t * t - 2.0 * t)).abs() < 1e-7);
        assert!((accel.data("x").unwrap()[[i]] - (3.0 * t - 2.0)).abs() < 1e-5);
    }
    assert_eq!(velocity.time(), ts.time());
}

#[test]
fn derivative_beyond_the_polynomial_order_is_zero() {
    let ts = cubic(15, 10.0);
    let d = ts.savgol_filtered(5, 1, 2).unwrap();
    assert!(d.data("x").unwrap().iter().all(|v| *v == 0.0));
}

#[test]
fn missing_sample_is_bridged_then_restored() {
    let values = ArrayD::from_shape_vec(
        IxDyn(&[6, 2]),
        vec![0.0, 0.0, 1.0, 10.0, 2.0, f64::NAN, 3.0, 30.0, 4.0, 40.0, 5.0, 50.0],
    )
    .unwrap();
    let mut ts = TimeSeries::with_rate(6, 1.0, 0.0).unwrap();
    ts.add_data("p", values).unwrap();
    ts.savgol(3, 1, 0).unwrap();

    let p = ts.data("p").unwrap();
    // the whole sample is missing once any element is
    assert!(p[[2, 0]].is_nan() && p[[2, 1]].is_nan());
    // lines pass through a linear fit unchanged, gap included
    for i in [0, 1, 3, 4, 5] {
        assert!((p[[i, 0]] - i as f64).abs() < 1e-9);
        assert!((p[[i, 1]] - 10.0 * i as f64).abs() < 1e-9);
    }
}

#[test]
fn invalid_windows_are_rejected() {
    let ts = cubic(10, 10.0);
    assert!(ts.savgol_filtered(4, 1, 0).unwrap_err().is_argument_error());
    assert!(ts.savgol_filtered(11, 1, 0).unwrap_err().is_argument_error());
    assert!(ts.savgol_filtered(5, 5, 0).unwrap_err().is_argument_error());
    assert!(ts.savgol_filtered(0, 0, 0).is_err());

    let single = TimeSeries::new(vec![0.0]).with_scalar("x", vec![1.0]).unwrap();
    assert!(single.savgol_filtered(1, 0, 1).unwrap_err().is_argument_error());
    assert_eq!(
        single.savgol_filtered(1, 0, 0).unwrap().data("x").unwrap()[[0]],
        1.0
    );
}

proptest! {
    #[test]
    fn smoothing_preserves_shape_and_constants(
        level in -100.0f64..100.0,
        n in 3usize..40,
        half in 0usize..5,
    ) {
        let window = (2 * half + 1).min(if n % 2 == 0 { n - 1 } else { n });
        let ts = TimeSeries::with_rate(n, 50.0, 0.0)
            .unwrap()
            .with_scalar("x", vec![level; n])
            .unwrap();
        let s = ts.smoothed(window).unwrap();
        prop_assert_eq!(s.len(), n);
        prop_assert_eq!(s.events(), ts.events());
        for v in s.data("x").unwrap() {
            prop_assert!((v - level).abs() < 1e-9 * level.abs().max(1.0));
        }
    }
}
