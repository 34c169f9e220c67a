//! Headless mission runner.
//!
//! Loads either a `.tok` bytecode file or a JSON mission script, ticks it
//! against an in-memory [`mission_test::StubWorld`], and prints what
//! happened — a living example of the host-dispatch contract with no
//! rendering layer attached (§1 "Deliberately out of scope").

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use mission_core::rules::{MissionScript, RuleRunner};
use mission_core::Mission;
use mission_test::StubWorld;

#[derive(Parser, Debug)]
#[command(name = "mission-cli")]
#[command(author, version, about = "Run a mission script headlessly", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a `.tok` or JSON mission file and tick it a fixed number of times.
    Run {
        /// Path to a `.tok` bytecode file or a `.json` mission script.
        file: PathBuf,

        /// Number of ticks to run.
        #[arg(long, default_value_t = 100)]
        ticks: u64,

        /// PRNG seed for the run.
        #[arg(long, default_value_t = 1)]
        seed: u32,
    },
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();
    match args.command {
        Command::Run { file, ticks, seed } => match run(&file, ticks, seed) {
            Ok(()) => ExitCode::SUCCESS,
            Err(message) => {
                eprintln!("error: {message}");
                ExitCode::FAILURE
            }
        },
    }
}

fn run(path: &PathBuf, ticks: u64, seed: u32) -> Result<(), String> {
    let bytes = fs::read(path).map_err(|e| format!("reading {}: {e}", path.display()))?;
    let is_json = path.extension().is_some_and(|ext| ext == "json");

    let mut world = StubWorld::new();

    if is_json {
        let script: MissionScript = serde_json::from_slice(&bytes)
            .map_err(|e| format!("parsing mission script: {e}"))?;
        log::info!("loaded mission script '{}' ({} rules)", script.name, script.rules.len());
        if let Some(credits) = script.starting_credits {
            world.set_side_cash(0, credits);
        }
        let mut runner = RuleRunner::load(script);
        let mut dispatch = mission_core::dispatch::state::DispatchState::new(seed);
        for tick in 0..ticks {
            let events = mission_core::events::EventLog::default();
            runner.tick(tick, &mut world, &mut dispatch, &events);
        }
        println!(
            "ran {ticks} ticks; side 0 cash = {}; outcome = {:?}",
            world.side_cash(0),
            world.mission_outcome()
        );
    } else {
        let mut mission = Mission::load(&bytes, seed, Vec::new())
            .map_err(|e| format!("decoding .tok file: {e}"))?;
        log::info!("loaded .tok mission ({} top-level blocks)", mission.program().blocks.len());
        for tick in 0..ticks {
            mission.tick(tick, &mut world);
        }
        println!(
            "ran {ticks} ticks; {} entities live; outcome = {:?}",
            world.entity_count(),
            world.mission_outcome()
        );
    }

    Ok(())
}
