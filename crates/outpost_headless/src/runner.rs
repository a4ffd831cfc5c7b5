//! Headless match runner.
//!
//! Drives a [`MatchState`] with one [`Controller`] per player: each player
//! gets the init input once, then the turn input every round, and answers
//! with raw order text. The runner stops when the match is decided or the
//! round cap is reached; at the cap scores decide.

use outpost_core::entities::PlayerId;
use outpost_core::error::GameError;
use outpost_core::protocol::{init_input, turn_input};
use outpost_core::simulation::{MatchState, RoundReport};
use outpost_core::victory::Outcome;
use outpost_core::view::{ViewFrame, ViewInit};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::protocol::{EndReason, Frame};
use crate::scenario::{PlayerScript, Scenario, ScenarioError};

/// Errors that stop a run.
#[derive(Error, Debug)]
pub enum RunnerError {
    /// The engine failed.
    #[error(transparent)]
    Game(#[from] GameError),
    /// The scenario could not be used.
    #[error(transparent)]
    Scenario(#[from] ScenarioError),
    /// Controllers do not match the seats.
    #[error("Expected {expected} controllers, got {got}")]
    ControllerCount {
        /// Players in the match.
        expected: usize,
        /// Controllers supplied.
        got: usize,
    },
}

/// Something that plays one seat.
pub trait Controller: Send {
    /// Receive the init input. Called once before the first turn.
    fn init(&mut self, _input: &[String]) {}

    /// Answer one turn. `None` means the player did not answer in time.
    fn play(&mut self, turn: u32, input: &[String]) -> Option<String>;
}

/// Replays a [`PlayerScript`], then waits.
#[derive(Debug, Clone, Default)]
pub struct ScriptedController {
    script: PlayerScript,
}

impl ScriptedController {
    /// Controller for a script.
    #[must_use]
    pub fn new(script: PlayerScript) -> Self {
        Self { script }
    }
}

impl Controller for ScriptedController {
    fn play(&mut self, turn: u32, _input: &[String]) -> Option<String> {
        if self.script.time_out_at.is_some_and(|at| turn >= at) {
            return None;
        }
        let line = usize::try_from(turn)
            .ok()
            .and_then(|t| self.script.turns.get(t))
            .map_or("WAIT", String::as_str);
        Some(line.to_string())
    }
}

/// Result of one finished run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSummary {
    /// Winner or draw.
    pub outcome: Outcome,
    /// Rounds played.
    pub rounds: u32,
    /// Final scores by player.
    pub scores: Vec<u32>,
    /// Why the match stopped.
    pub reason: EndReason,
    /// Hash of the final state.
    pub state_hash: u64,
}

/// Runs one match to completion.
pub struct MatchRunner {
    state: MatchState,
    controllers: Vec<Box<dyn Controller>>,
}

impl MatchRunner {
    /// Runner over an existing state with one controller per player.
    pub fn new(
        state: MatchState,
        controllers: Vec<Box<dyn Controller>>,
    ) -> Result<Self, RunnerError> {
        let expected = state.players().len();
        if controllers.len() != expected {
            return Err(RunnerError::ControllerCount {
                expected,
                got: controllers.len(),
            });
        }
        Ok(Self { state, controllers })
    }

    /// Generate the scenario's map and attach its scripts.
    pub fn from_scenario(scenario: &Scenario) -> Result<Self, RunnerError> {
        scenario.validate()?;
        let state = MatchState::new(&scenario.config)?;
        let controllers = state
            .players()
            .iter()
            .map(|p| Box::new(ScriptedController::new(scenario.script(p.id))) as Box<dyn Controller>)
            .collect();
        Self::new(state, controllers)
    }

    /// Current match state.
    pub fn state(&self) -> &MatchState {
        &self.state
    }

    /// Consume the runner, keeping the state.
    pub fn into_state(self) -> MatchState {
        self.state
    }

    /// Ask every live player for a turn and resolve the round.
    pub fn play_round(&mut self) -> Result<RoundReport, RunnerError> {
        let turn = self.state.round();
        let outputs: Vec<Option<String>> = self
            .state
            .players()
            .iter()
            .zip(self.controllers.iter_mut())
            .map(|(player, controller)| {
                if !player.is_alive() {
                    return None;
                }
                let answer = controller.play(turn, &turn_input(&self.state, player.id));
                if answer.is_none() {
                    tracing::info!(player = %player.id, turn, "Player timed out");
                }
                answer
            })
            .collect();

        let raw: Vec<Option<&str>> = outputs.iter().map(Option::as_deref).collect();
        let report = self.state.play_round(&raw)?;
        tracing::debug!(
            round = report.round,
            produced = report.produced,
            events = report.events.len(),
            "Round resolved"
        );
        Ok(report)
    }

    /// Play until the match is decided or the round cap is hit, reporting
    /// every frame to `on_frame`.
    pub fn run(&mut self, mut on_frame: impl FnMut(&Frame)) -> Result<MatchSummary, RunnerError> {
        on_frame(&Frame::Init {
            view: ViewInit::capture(&self.state),
        });
        let init = init_input(&self.state);
        for controller in &mut self.controllers {
            controller.init(&init);
        }

        let cap = self.state.rules().max_rounds;
        while !self.state.is_over() && self.state.round() < cap {
            let report = self.play_round()?;
            on_frame(&Frame::Round {
                report,
                view: ViewFrame::capture(&self.state),
            });
        }

        let reason = if self.state.is_over() {
            EndReason::Decided
        } else {
            EndReason::RoundCap
        };
        let summary = MatchSummary {
            outcome: self.state.final_outcome(),
            rounds: self.state.round(),
            scores: self.state.scores(),
            reason,
            state_hash: self.state.state_hash(),
        };
        tracing::info!(
            outcome = ?summary.outcome,
            rounds = summary.rounds,
            scores = ?summary.scores,
            ?reason,
            "Run finished"
        );

        on_frame(&Frame::GameOver {
            outcome: summary.outcome,
            round: summary.rounds,
            scores: summary.scores.clone(),
            reason,
        });
        Ok(summary)
    }

    /// Run without observing frames.
    pub fn run_quiet(&mut self) -> Result<MatchSummary, RunnerError> {
        self.run(|_| {})
    }
}

/// Winner of a summary, if any.
pub fn winner(summary: &MatchSummary) -> Option<PlayerId> {
    match summary.outcome {
        Outcome::Winner(player) => Some(player),
        Outcome::Draw => None,
    }
}
