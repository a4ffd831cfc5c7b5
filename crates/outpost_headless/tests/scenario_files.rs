//! The shipped scenario files load and play to the end.

use std::path::PathBuf;

use outpost_core::entities::PlayerId;
use outpost_core::victory::Outcome;
use outpost_headless::batch::verify_determinism;
use outpost_headless::protocol::{EndReason, Frame};
use outpost_headless::runner::MatchRunner;
use outpost_headless::scenario::Scenario;

fn scenario(name: &str) -> Scenario {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("scenarios")
        .join(name);
    Scenario::load(&path).unwrap()
}

#[test]
fn opening_rush_plays_out() {
    let scenario = scenario("opening_rush.ron");
    assert_eq!(scenario.players.len(), 2);

    let mut runner = MatchRunner::from_scenario(&scenario).unwrap();
    assert_eq!(runner.state().factories().len(), 9);

    let mut lines = Vec::new();
    let summary = runner.run(|f| lines.push(f.to_json_line())).unwrap();

    assert!(summary.rounds <= 200);
    let last = Frame::from_json(lines.last().unwrap().trim()).unwrap();
    assert!(matches!(last, Frame::GameOver { .. }));
    assert!(lines.iter().all(|l| l.ends_with('\n') && !l.contains(r#""type":"error""#)));
}

#[test]
fn wood3_time_out_hands_the_win_over() {
    let scenario = scenario("wood3_timeout.ron");
    let summary = MatchRunner::from_scenario(&scenario)
        .unwrap()
        .run_quiet()
        .unwrap();
    assert_eq!(summary.outcome, Outcome::Winner(PlayerId(0)));
    assert_eq!(summary.reason, EndReason::Decided);
    assert_eq!(summary.rounds, 4);
}

#[test]
fn shipped_scenarios_are_deterministic() {
    for name in ["opening_rush.ron", "wood3_timeout.ron"] {
        assert!(verify_determinism(&scenario(name), 2), "{name} diverged");
    }
}
