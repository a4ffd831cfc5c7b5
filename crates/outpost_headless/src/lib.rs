//! Headless match runner for scripted matches, batch checks and CI.
//!
//! This crate drives the `outpost_core` engine without a referee server:
//!
//! - **Scripted matches**: replay per-player order scripts from RON
//!   scenario files
//! - **Batch checks**: play many seeds in parallel and summarise outcomes
//!   and map statistics
//! - **Determinism checks**: replay a scenario and compare final states
//!
//! # Output
//!
//! Runs emit JSON lines (one [`protocol::Frame`] per line) on stdout and
//! human-readable logs on stderr.
//!
//! # Example
//!
//! ```bash
//! # Play a scenario and stream frames
//! cargo run -p outpost_headless -- run --scenario scenarios/opening_rush.ron
//!
//! # Play 500 seeds in parallel
//! cargo run -p outpost_headless -- batch --count 500 --output results/
//! ```

pub mod batch;
pub mod protocol;
pub mod runner;
pub mod scenario;

pub use batch::{run_batch, BatchConfig, BatchResults, BatchSummary, MapStats};
pub use protocol::{EndReason, Frame};
pub use runner::{Controller, MatchRunner, MatchSummary, RunnerError, ScriptedController};
pub use scenario::{PlayerScript, Scenario, ScenarioError};
