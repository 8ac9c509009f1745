//! Mimic scenario runner
//!
//! Loads a scenario, ticks one stalker against a scripted player at a fixed
//! timestep and prints a JSON report of what happened.
//!
//! Run with: cargo run -p mimic_sim -- scenarios/corridor.toml
//!       or: MIMIC_SIM_CONFIG=scenarios/corridor.toml cargo run --bin mimic-sim

mod config;
mod level;
mod report;
mod runner;

use config::SimConfig;
use mimic_ai::BehaviorKind;
use runner::Simulation;
use std::error::Error;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        log::error!("Simulation failed: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let config = SimConfig::load()?;
    config.print_summary();

    let mut simulation = Simulation::new(config)?;
    let report = simulation.run();

    log::info!(
        "Finished after {:.2}s ({:.2}s agent time): {} transitions, {} chases, {} catches, final state {:?}",
        simulation.time(),
        simulation.mimic().time(),
        report.transitions.len(),
        report.entries_into(BehaviorKind::Chase),
        report.catches.len(),
        report.final_state
    );
    println!("{}", report.to_json()?);
    Ok(())
}
