//! Scheduling simulator entry point: CLI wiring and config-driven rollout.

use std::path::Path;
use std::process;

use tracing_subscriber::EnvFilter;

use energy_scheduling_sim::config::{CONTROLLERS, ScenarioConfig};
use energy_scheduling_sim::io::export::export_csv;
use energy_scheduling_sim::runner::run_episode;
use energy_scheduling_sim::sim::controller::{
    Controller, GreedyController, IdleController, MaskedRandomController,
};
use energy_scheduling_sim::sim::kpi::EpisodeReport;

/// Seed offset for the random controller so it does not mirror the generation process.
const CONTROLLER_SEED_OFFSET: u64 = 57;

/// Parsed CLI arguments.
struct CliArgs {
    scenario_path: Option<String>,
    preset: Option<String>,
    seed_override: Option<u64>,
    steps_override: Option<usize>,
    controller_override: Option<String>,
    telemetry_out: Option<String>,
}

fn print_help() {
    eprintln!("energy-scheduling-sim: multi-battery storage scheduling simulator");
    eprintln!();
    eprintln!("Usage: energy-scheduling-sim [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --scenario <path>        Load scenario from TOML config file");
    eprintln!(
        "  --preset <name>          Use a built-in preset ({})",
        ScenarioConfig::PRESETS.join(", ")
    );
    eprintln!("  --seed <u64>             Override random seed");
    eprintln!("  --steps <usize>          Override rollout horizon");
    eprintln!(
        "  --controller <name>      Override controller ({})",
        CONTROLLERS.join(", ")
    );
    eprintln!("  --telemetry-out <path>   Export step records to CSV");
    eprintln!("  --help                   Show this help message");
    eprintln!();
    eprintln!("If no --scenario or --preset is given, the default preset is used.");
    eprintln!("Set RUST_LOG=debug to trace every step.");
}

/// Returns the value following flag `args[*i]`, or exits with an error.
fn flag_value(args: &[String], i: &mut usize, expected: &str) -> String {
    *i += 1;
    match args.get(*i) {
        Some(value) => value.clone(),
        None => {
            eprintln!("error: {} requires {expected}", args[*i - 1]);
            process::exit(1);
        }
    }
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        scenario_path: None,
        preset: None,
        seed_override: None,
        steps_override: None,
        controller_override: None,
        telemetry_out: None,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--scenario" => {
                cli.scenario_path = Some(flag_value(&args, &mut i, "a path argument"));
            }
            "--preset" => {
                cli.preset = Some(flag_value(&args, &mut i, "a name argument"));
            }
            "--seed" => {
                let raw = flag_value(&args, &mut i, "a u64 argument");
                if let Ok(s) = raw.parse::<u64>() {
                    cli.seed_override = Some(s);
                } else {
                    eprintln!("error: --seed value \"{raw}\" is not a valid u64");
                    process::exit(1);
                }
            }
            "--steps" => {
                let raw = flag_value(&args, &mut i, "a usize argument");
                if let Ok(n) = raw.parse::<usize>() {
                    cli.steps_override = Some(n);
                } else {
                    eprintln!("error: --steps value \"{raw}\" is not a valid usize");
                    process::exit(1);
                }
            }
            "--controller" => {
                cli.controller_override = Some(flag_value(&args, &mut i, "a name argument"));
            }
            "--telemetry-out" => {
                cli.telemetry_out = Some(flag_value(&args, &mut i, "a path argument"));
            }
            other => {
                eprintln!("error: unknown argument \"{other}\"");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

fn build_controller(name: &str, seed: u64) -> Box<dyn Controller> {
    match name {
        "random" => Box::new(MaskedRandomController::new(
            seed.wrapping_add(CONTROLLER_SEED_OFFSET),
        )),
        "idle" => Box::new(IdleController),
        _ => Box::new(GreedyController),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = parse_args();

    if cli.scenario_path.is_some() && cli.preset.is_some() {
        eprintln!("error: --scenario and --preset are mutually exclusive");
        process::exit(1);
    }

    // Load config: --scenario takes priority, then --preset, then the default preset
    let mut scenario = if let Some(ref path) = cli.scenario_path {
        match ScenarioConfig::from_toml_file(Path::new(path)) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else if let Some(ref name) = cli.preset {
        match ScenarioConfig::from_preset(name) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else {
        ScenarioConfig::default_preset()
    };

    if let Some(seed) = cli.seed_override {
        scenario.simulation.seed = seed;
    }
    if let Some(steps) = cli.steps_override {
        scenario.simulation.max_steps = steps;
    }
    if let Some(controller) = cli.controller_override {
        scenario.simulation.controller = controller;
    }

    let errors = scenario.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    let mut stepper = match scenario.build_stepper() {
        Ok(stepper) => stepper,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };
    let sim = &scenario.simulation;
    let mut controller = build_controller(&sim.controller, sim.seed);

    let records = match run_episode(&mut stepper, controller.as_mut(), sim.max_steps) {
        Ok(records) => records,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };

    for r in &records {
        println!("{r}");
    }

    let report = EpisodeReport::from_records(&records);
    println!("\n{report}");

    if let Some(ref path) = cli.telemetry_out {
        if let Err(e) = export_csv(&records, Path::new(path)) {
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        eprintln!("Telemetry written to {path}");
    }
}
