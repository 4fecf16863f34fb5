use anyhow::Context;
use tracing::info;

use venue_capacity::assessment::{assess, Assessment};
use venue_capacity::settings::Settings;
use venue_capacity::utilities::{logging, math::round_to};

fn main() -> anyhow::Result<()> {
    logging::init();

    // Base name of the settings file, any extension the config crate knows
    let config_name = std::env::args().nth(1).unwrap_or_else(|| "Config".to_string());

    let settings = Settings::load(&config_name)
        .with_context(|| format!("failed to load settings from `{}`", config_name))?;

    let threads = settings.worker_threads();
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .context("failed to start worker pool")?;

    info!(threads, config = %config_name, "starting capacity assessment");

    let assessment = assess(&settings).context("capacity assessment failed")?;
    print_report(&assessment);

    Ok(())
}

fn print_report(assessment: &Assessment) {
    println!("Capacity bounds (visitors/day)");
    println!("  indoor:     {:.1}", assessment.indoor);
    println!("  outdoor:    {:.1}", assessment.outdoor);
    println!("  service:    {:.1}", assessment.service.aggregate);
    println!(
        "  evacuation: {:.1} (escape time {:.1})",
        assessment.evacuation.capacity, assessment.evacuation.escape_time
    );

    println!("Service classes");
    for class in &assessment.service.per_class {
        println!(
            "  {}: lambda_max={:.3}/h, capacity={:.1}, Wq={}",
            class.name, class.max_arrival_rate, class.capacity, class.wait
        );
    }

    for warning in &assessment.service.warnings {
        println!("  warning: {}", warning);
    }

    let result = &assessment.result;
    println!(
        "Recommended capacity: {:.2} visitors/day (ceiling {:.2} from {})",
        result.recommended, result.upper, result.limiting_bound
    );

    for bound in &assessment.bounds {
        println!(
            "  {} (w={}): deviation {}",
            bound.name,
            bound.weight,
            round_to(result.deviations[&bound.name], 4)
        );
    }

    if !assessment.profile.is_empty() {
        println!("Objective profile");
        for (capacity, score) in &assessment.profile {
            println!("  {:>10.1}  {:.4}", capacity, score);
        }
    }
}
