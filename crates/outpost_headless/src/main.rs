//! Headless match runner.
//!
//! Plays matches without a referee server. Frames go to stdout as JSON
//! lines; logs go to stderr.
//!
//! # Usage
//!
//! ```bash
//! # Print a generated map
//! cargo run -p outpost_headless -- generate --seed 42 --league wood1
//!
//! # Play a scenario
//! cargo run -p outpost_headless -- run --scenario scenarios/opening_rush.ron
//!
//! # Batch over seeds
//! cargo run -p outpost_headless -- batch --count 1000 --output results/
//!
//! # Check a scenario loads and replays identically
//! cargo run -p outpost_headless -- validate scenarios/wood3_timeout.ron
//! ```

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use outpost_core::config::{League, MatchConfig, Ruleset};
use outpost_core::protocol::init_input;
use outpost_core::simulation::MatchState;
use outpost_core::view::ViewInit;
use outpost_headless::{
    batch::{run_batch, verify_determinism, BatchConfig},
    protocol::Frame,
    runner::MatchRunner,
    scenario::Scenario,
};

#[derive(Parser)]
#[command(name = "outpost_headless")]
#[command(about = "Headless match runner for scripted matches and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum LeagueArg {
    Wood3,
    Wood2,
    Wood1,
    Bronze,
}

impl From<LeagueArg> for League {
    fn from(arg: LeagueArg) -> Self {
        match arg {
            LeagueArg::Wood3 => League::Wood3,
            LeagueArg::Wood2 => League::Wood2,
            LeagueArg::Wood1 => League::Wood1,
            LeagueArg::Bronze => League::Bronze,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a map and print its layout
    Generate {
        /// Map seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Rule preset
        #[arg(long, value_enum, default_value = "bronze")]
        league: LeagueArg,

        /// Requested factory count (ignored if out of range)
        #[arg(long)]
        factories: Option<u32>,

        /// Requested home garrison (ignored if out of range)
        #[arg(long)]
        units: Option<u32>,

        /// Print the player init input instead of JSON
        #[arg(long)]
        raw: bool,
    },

    /// Play one match and stream frames
    Run {
        /// Scenario file to load (idle skirmish if omitted)
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Override the scenario seed
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Play a scenario over many seeds
    Batch {
        /// Scenario file to load (idle skirmish if omitted)
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Number of games to run
        #[arg(short, long, default_value = "100")]
        count: u32,

        /// Maximum parallel games (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: u32,

        /// Starting seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,
    },

    /// Load a scenario and check it replays identically
    Validate {
        /// Scenario file
        path: PathBuf,

        /// Number of replays to compare
        #[arg(short, long, default_value = "3")]
        runs: u32,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs to stderr (stdout is for frames)
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_ansi(true),
        )
        .with(filter)
        .init();

    let result = match cli.command {
        Commands::Generate {
            seed,
            league,
            factories,
            units,
            raw,
        } => cmd_generate(seed, league.into(), factories, units, raw),
        Commands::Run { scenario, seed } => cmd_run(scenario, seed),
        Commands::Batch {
            scenario,
            count,
            parallel,
            seed,
            output,
        } => cmd_batch(scenario, count, parallel, seed, output),
        Commands::Validate { path, runs } => cmd_validate(path, runs),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            tracing::error!("{message}");
            eprintln!("FATAL: {message}");
            ExitCode::FAILURE
        }
    }
}

fn load_scenario(path: Option<PathBuf>) -> Result<Scenario, String> {
    match path {
        Some(path) => {
            tracing::info!("Loading scenario from: {}", path.display());
            Scenario::load(&path).map_err(|e| e.to_string())
        }
        None => Ok(Scenario::default()),
    }
}

/// Generate a map and print it
fn cmd_generate(
    seed: u64,
    league: League,
    factories: Option<u32>,
    units: Option<u32>,
    raw: bool,
) -> Result<(), String> {
    let config = MatchConfig {
        seed,
        factory_count: factories,
        initial_unit_count: units,
        rules: Ruleset::for_league(league),
    };
    let state = MatchState::new(&config).map_err(|e| e.to_string())?;

    let mut out = io::stdout().lock();
    if raw {
        for line in init_input(&state) {
            writeln!(out, "{line}").map_err(|e| e.to_string())?;
        }
    } else {
        let frame = Frame::Init {
            view: ViewInit::capture(&state),
        };
        out.write_all(frame.to_json_line().as_bytes())
            .map_err(|e| e.to_string())?;
    }
    Ok(())
}

/// Play one match
fn cmd_run(scenario: Option<PathBuf>, seed: Option<u64>) -> Result<(), String> {
    let mut scenario = load_scenario(scenario)?;
    if let Some(seed) = seed {
        scenario = scenario.with_seed(seed);
    }
    tracing::info!(scenario = %scenario.name, seed = scenario.config.seed, "Starting match");

    let mut runner = MatchRunner::from_scenario(&scenario).map_err(|e| e.to_string())?;
    let mut out = io::stdout().lock();
    let mut write_failed = None;
    let result = runner.run(|frame| {
        if write_failed.is_none() {
            if let Err(e) = out.write_all(frame.to_json_line().as_bytes()) {
                write_failed = Some(e);
            }
        }
    });
    let summary = match result {
        Ok(summary) => summary,
        Err(e) => {
            let _ = out.write_all(Frame::error(e.to_string()).to_json_line().as_bytes());
            return Err(e.to_string());
        }
    };
    if let Some(e) = write_failed {
        return Err(format!("Failed to write frames: {e}"));
    }
    out.flush().map_err(|e| e.to_string())?;

    eprintln!(
        "Match over after {} rounds: {:?} ({:?}), scores {:?}",
        summary.rounds, summary.outcome, summary.reason, summary.scores
    );
    Ok(())
}

/// Play many seeds
fn cmd_batch(
    scenario: Option<PathBuf>,
    count: u32,
    parallel: u32,
    seed: u64,
    output: PathBuf,
) -> Result<(), String> {
    let scenario = load_scenario(scenario)?;
    std::fs::create_dir_all(&output).map_err(|e| {
        format!("Cannot create output directory '{}': {e}", output.display())
    })?;

    let config = BatchConfig::new(scenario, count)
        .with_seed(seed)
        .with_parallelism(parallel);
    let results = run_batch(config);

    let results_path = output.join("batch_results.json");
    results
        .save(&results_path)
        .map_err(|e| format!("Failed to save results: {e}"))?;

    let summary = &results.summary;
    eprintln!("\n{}", "=".repeat(50));
    eprintln!("BATCH COMPLETE");
    eprintln!("{}", "=".repeat(50));
    eprintln!("Games played: {}", summary.total_games);
    if !results.errors.is_empty() {
        eprintln!("Games FAILED: {}", results.errors.len());
    }
    eprintln!("Duration: {:.1}s", results.duration_seconds);
    for (player, wins) in summary.wins.iter().enumerate() {
        eprintln!("  Player {player} wins: {wins}");
    }
    eprintln!("  Draws: {}", summary.draws);
    eprintln!("  Stopped at round cap: {}", summary.round_cap_games);
    eprintln!("Average rounds: {:.1}", summary.average_rounds);
    eprintln!("Average factories: {:.1}", summary.average_factories);
    eprintln!(
        "Average total production: {:.1}",
        summary.average_total_production
    );
    for error in results.errors.iter().take(10) {
        eprintln!(
            "  Game {} (seed {}): {}",
            error.game_index, error.seed, error.message
        );
    }
    eprintln!("\nResults saved to: {}", results_path.display());
    Ok(())
}

/// Validate a scenario
fn cmd_validate(path: PathBuf, runs: u32) -> Result<(), String> {
    let scenario = Scenario::load(&path).map_err(|e| e.to_string())?;
    let state = MatchState::new(&scenario.config).map_err(|e| e.to_string())?;
    eprintln!(
        "Scenario '{}': {} factories, {} scripted players",
        scenario.name,
        state.factories().len(),
        scenario.players.len()
    );

    if verify_determinism(&scenario, runs.max(1)) {
        eprintln!("PASS: All {runs} runs produced identical results");
        Ok(())
    } else {
        Err("Non-determinism detected".to_string())
    }
}
