//! JSON-lines output for viewers and CI logs.
//!
//! The runner writes one JSON object per line on stdout; logs go to stderr.
//!
//! # Example Session
//!
//! ```text
//! <- {"type":"init","view":{"width":16000,"height":6500,...}}
//! <- {"type":"round","report":{"round":1,...},"view":{...}}
//! <- {"type":"round","report":{"round":2,...},"view":{...}}
//! <- {"type":"game_over","outcome":{"Winner":0},"round":2,"scores":[31,0],"reason":"decided"}
//! ```

use outpost_core::simulation::RoundReport;
use outpost_core::victory::Outcome;
use outpost_core::view::{ViewFrame, ViewInit};
use serde::{Deserialize, Serialize};

/// Why a match stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// A player was eliminated or both were.
    Decided,
    /// The round cap was reached and scores decided.
    RoundCap,
}

/// One line of runner output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Frame {
    /// Static map layout, sent once.
    Init {
        /// Layout snapshot.
        view: ViewInit,
    },

    /// A resolved round.
    Round {
        /// What happened.
        report: RoundReport,
        /// State after the round.
        view: ViewFrame,
    },

    /// Match has ended.
    GameOver {
        /// Winner or draw.
        outcome: Outcome,
        /// Last round played.
        round: u32,
        /// Final scores by player.
        scores: Vec<u32>,
        /// Why the match stopped.
        reason: EndReason,
    },

    /// A failure that stopped the runner.
    Error {
        /// Human-readable description.
        message: String,
    },
}

impl Frame {
    /// Create an error frame.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Serialize to JSON line (with newline).
    pub fn to_json_line(&self) -> String {
        let mut json = serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"type":"error","message":"Serialization failed: {e}"}}"#)
        });
        json.push('\n');
        json
    }

    /// Parse from a JSON line.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Frame type name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Init { .. } => "init",
            Self::Round { .. } => "round",
            Self::GameOver { .. } => "game_over",
            Self::Error { .. } => "error",
        }
    }
}
