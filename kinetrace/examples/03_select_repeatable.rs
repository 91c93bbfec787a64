use kinetrace::{
    AnalysisConfig, CycleAnalysis, DetectConfig, NormalizeConfig, SelectConfig, SelectionPolicy,
};
use kinetrace_mock::Propulsion;
use tracing_subscriber::fmt::format::FmtSpan;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Env-filtered subscriber; build with --features tracing for spans.
    // Suggested: RUST_LOG=info,kinetrace=debug
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .with_span_events(FmtSpan::ENTER | FmtSpan::EXIT)
        .try_init();

    // 1. Eight pushes, the fifth one twice as hard.
    let ts = Propulsion::with_cycles(8).with_outlier(4, 2.0).series();

    // 2. Same pipeline as a JSON document would describe it.
    let cfg = AnalysisConfig {
        detect: Some(DetectConfig::new("Force", "push", "release", 5.0, 20.0)),
        normalize: NormalizeConfig::new("push", "push").with_points(101),
        select: Some(SelectConfig::for_channels(["Force"]).with_policy(
            SelectionPolicy::MinImprovement {
                min_count: 3,
                threshold: 0.05,
            },
        )),
    };
    println!("{}", serde_json::to_string_pretty(&cfg)?);

    // 3. Run and report which cycles survived.
    let report = CycleAnalysis::from_config(cfg)?.run(&ts)?;
    println!(
        "{} phases, {} cycles, retained {:?} ({} rejected)",
        report.phases.len(),
        report.stack.n_cycles(),
        report.retained,
        report.rejected()
    );

    Ok(())
}
