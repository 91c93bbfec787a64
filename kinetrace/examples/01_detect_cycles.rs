use kinetrace::{DetectConfig, detect_cycles};
use kinetrace_mock::Propulsion;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Synthetic hand-rim recording: five pushes at 100 Hz.
    let mut ts = Propulsion::default().series();

    // 2. A push starts above 20 N and ends below 5 N.
    let config = DetectConfig::new("Force", "push", "release", 5.0, 20.0)
        .with_duration(Some(0.1), Some(0.8));
    let phases = detect_cycles(&mut ts, &config)?;

    // 3. Print each phase and the events it added.
    for (i, p) in phases.iter().enumerate() {
        let duration = p.duration(ts.time()).unwrap_or(f64::NAN);
        println!(
            "push {i}: samples [{}, {}), {duration:.2} s, peak {:.1} N",
            p.start, p.end, p.peak
        );
    }
    println!("{} events", ts.events().len());

    Ok(())
}
