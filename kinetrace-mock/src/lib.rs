//! Deterministic synthetic recordings for tests and examples.
//!
//! Every fixture is a pure function of its parameters, so tests can assert
//! on exact sample counts and event times without shipping data files.

mod fixtures;

pub use fixtures::gaps::{occluded_marker, ramp};
pub use fixtures::propulsion::Propulsion;

/// Five default propulsion cycles with `push`/`release` events.
#[must_use]
pub fn propulsion_with_events() -> kinetrace_core::TimeSeries {
    Propulsion::default().series_with_events()
}

/// `cycles` propulsion cycles where cycle `outlier` pushes `scale` times
/// harder than the others.
#[must_use]
pub fn propulsion_with_outlier(cycles: usize, outlier: usize, scale: f64) -> kinetrace_core::TimeSeries {
    Propulsion::with_cycles(cycles)
        .with_outlier(outlier, scale)
        .series_with_events()
}
