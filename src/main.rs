use std::process::ExitCode;

use critters::simulation::ecosystem::Ecosystem;
use critters::simulation::error::SimulationError;
use critters::simulation::params::Params;
use critters::simulation::schedule::Scheduler;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Headless runner.
///
/// Usage: `critters [params.json] [seconds]`. Without a duration the world runs
/// until the population dies out.
fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "simulation aborted");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), SimulationError> {
    let mut args = std::env::args().skip(1);
    let params = match args.next() {
        Some(path) => Params::load(path)?,
        None => Params::default(),
    };
    let duration = match args.next() {
        Some(raw) => Some(raw.parse::<f64>().map_err(|e| {
            SimulationError::InvalidConfig(format!("invalid duration {raw:?}: {e}"))
        })?),
        None => None,
    };

    let frame_ms = params.frame_ms();
    let mut ecosystem = Ecosystem::new(params)?;
    let mut scheduler = Scheduler::new(ecosystem.params());
    let food = ecosystem.generate_initial_food();
    info!(
        creatures = ecosystem.population(),
        food,
        workers = ecosystem.workers(),
        "starting simulation"
    );

    let mut next_report = 1.0;
    while ecosystem.population() > 0 && duration.is_none_or(|limit| ecosystem.time() < limit) {
        scheduler.run_frame(&mut ecosystem, frame_ms);
        if ecosystem.time() >= next_report {
            next_report += 1.0;
            match serde_json::to_string(&ecosystem.stats()) {
                Ok(stats) => info!(%stats, "stats"),
                Err(e) => error!(error = %e, "cannot serialize stats"),
            }
        }
    }

    ecosystem.check_invariants()?;
    info!(
        time = ecosystem.time(),
        population = ecosystem.population(),
        "simulation finished"
    );
    Ok(())
}
