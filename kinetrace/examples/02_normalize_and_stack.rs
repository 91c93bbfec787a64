use kinetrace::{CycleStack, Interpolation, NormalizeConfig, time_normalize};
use kinetrace_mock::Propulsion;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Recording whose pushes are already marked with events.
    let ts = Propulsion::with_cycles(4).series_with_events();

    // 2. One cycle runs from a push to the next one, resampled onto 101 points.
    let config = NormalizeConfig::new("push", "push")
        .with_points(101)
        .with_method(Interpolation::MonotonicCubic);
    let flat = time_normalize(&ts, &config)?;
    println!("normalized: {} samples, time_info {:?}", flat.len(), flat.time_info());

    // 3. Stack to [cycle, point, column] and print the mean force curve.
    let stack = CycleStack::stack(&flat, &config)?;
    println!("stack shape {:?}, columns {:?}", stack.shape(), stack.column_names());
    if let Some(force) = stack.channel("Force") {
        let mean = force.mean_axis(ndarray::Axis(0)).ok_or("no cycles")?;
        for (pct, v) in stack.percent().iter().zip(mean.iter()).step_by(10) {
            println!("{pct:5.1}%  {v:6.2} N");
        }
    }

    // 4. Back to a flat series.
    let back = stack.unstack()?;
    println!("unstacked: {} samples, {} events", back.len(), back.events().len());

    Ok(())
}
