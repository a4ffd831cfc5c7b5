//! Player order parsing and validation.
//!
//! A turn is free text, one or more lines, each holding actions separated by
//! `;`. Keywords are case-insensitive:
//!
//! ```text
//! WAIT
//! MOVE <source> <destination> <units>
//! BOMB <source> <destination>
//! INC <factory>
//! MSG <text>
//! ```
//!
//! A `;` only separates actions when a keyword follows it, so message text
//! may contain semicolons. Ids and unit counts are 1 to 8 decimal digits.
//! A keyword takes exactly one space before its first argument; further
//! arguments may be separated by any whitespace. Actions carry no other
//! padding except around a separating `;`.

use serde::{Deserialize, Serialize};

use crate::config::{Ruleset, MAX_MESSAGE_LEN};
use crate::entities::{EntityId, Factory, PlayerId, Route};
use crate::error::OrderError;

const KEYWORDS: [&str; 5] = ["WAIT", "MOVE", "BOMB", "INC", "MSG"];
const MAX_NUMBER_DIGITS: usize = 8;

/// Send units along a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MoveOrder {
    /// Route to travel.
    pub route: Route,
    /// Units requested; clamped to the garrison when executed.
    pub units: u32,
}

/// Launch a bomb along a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BombOrder {
    /// Route to travel.
    pub route: Route,
}

/// Spend units to raise a factory's production.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IncreaseOrder {
    /// Factory to upgrade.
    pub factory: EntityId,
}

/// Everything a player asked for in one turn, in the order given.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TurnOrders {
    /// Troop movements.
    pub moves: Vec<MoveOrder>,
    /// Bomb launches.
    pub bombs: Vec<BombOrder>,
    /// Production increases.
    pub increases: Vec<IncreaseOrder>,
    /// Last message of the turn, trimmed and truncated.
    pub message: Option<String>,
}

impl TurnOrders {
    /// Whether no action was accepted. Messages do not count.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty() && self.bombs.is_empty() && self.increases.is_empty()
    }
}

/// What the parser needs to know about the match.
#[derive(Debug, Clone, Copy)]
pub struct OrderContext<'a> {
    /// Player whose orders these are.
    pub player: PlayerId,
    /// Current factories, for range and ownership checks.
    pub factories: &'a [Factory],
    /// Rule toggles.
    pub rules: &'a Ruleset,
}

/// One action, syntactically valid but not yet checked against the match.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Action {
    Wait,
    Move { source: u32, destination: u32, units: u32 },
    Bomb { source: u32, destination: u32 },
    Increase { factory: u32 },
    Message(String),
}

/// Parse and validate one player's raw output.
///
/// Every line must hold at least one action, so an empty line (or empty
/// output) is malformed. The first fatal problem aborts parsing; the caller
/// is expected to eliminate the player.
pub fn parse_orders(raw: &str, ctx: &OrderContext<'_>) -> Result<TurnOrders, OrderError> {
    let mut orders = TurnOrders::default();

    let lines: Vec<&str> = if raw.is_empty() {
        vec![""]
    } else {
        raw.lines().collect()
    };

    for line in lines {
        for text in split_actions(line) {
            match parse_action(text)? {
                Action::Wait => {}
                Action::Move {
                    source,
                    destination,
                    units,
                } => {
                    if ctx.rules.move_restriction && !orders.moves.is_empty() {
                        continue;
                    }
                    let route = validate_route(ctx, "MOVE", source, destination)?;
                    orders.moves.push(MoveOrder { route, units });
                }
                Action::Bomb {
                    source,
                    destination,
                } => {
                    let route = validate_route(ctx, "BOMB", source, destination)?;
                    orders.bombs.push(BombOrder { route });
                }
                Action::Increase { factory } => {
                    if !ctx.rules.increase_enabled {
                        continue;
                    }
                    let factory = validate_source(ctx, "INC", factory)?;
                    orders.increases.push(IncreaseOrder { factory });
                }
                Action::Message(message) => orders.message = Some(message),
            }
        }
    }

    Ok(orders)
}

/// Order whitespace: space, tab, newline, vertical tab, form feed, return.
fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\u{0B}' | '\u{0C}' | '\r')
}

/// Split a line on `;` wherever the next action starts with a keyword.
///
/// Whitespace on both sides of such a separator is dropped; everything else
/// is kept verbatim, so a leading separator yields an empty action.
fn split_actions(line: &str) -> Vec<&str> {
    let mut actions = Vec::new();
    let mut start = 0;
    for (idx, _) in line.match_indices(';') {
        let after = &line[idx + 1..];
        let next = after.trim_start_matches(is_space);
        if starts_with_keyword(next) {
            actions.push(line[start..idx].trim_end_matches(is_space));
            start = line.len() - next.len();
        }
    }
    actions.push(&line[start..]);
    actions
}

fn starts_with_keyword(text: &str) -> bool {
    KEYWORDS.iter().any(|keyword| strip_keyword(text, keyword).is_some())
}

/// `text` without a leading case-insensitive `keyword`.
fn strip_keyword<'a>(text: &'a str, keyword: &str) -> Option<&'a str> {
    let prefix = text.get(..keyword.len())?;
    prefix
        .eq_ignore_ascii_case(keyword)
        .then(|| &text[keyword.len()..])
}

/// Numeric arguments after `keyword` and exactly one space.
///
/// Arguments are separated by whitespace runs; nothing may lead or trail.
fn numeric_args(text: &str, keyword: &str) -> Option<Vec<u32>> {
    let rest = strip_keyword(text, keyword)?.strip_prefix(' ')?;
    if rest.starts_with(is_space) || rest.ends_with(is_space) {
        return None;
    }
    rest.split(is_space)
        .filter(|token| !token.is_empty())
        .map(parse_number)
        .collect()
}

fn parse_action(text: &str) -> Result<Action, OrderError> {
    if let Some(args) = numeric_args(text, "MOVE") {
        if let [source, destination, units] = args[..] {
            return Ok(Action::Move {
                source,
                destination,
                units,
            });
        }
    }
    if let Some(args) = numeric_args(text, "BOMB") {
        if let [source, destination] = args[..] {
            return Ok(Action::Bomb {
                source,
                destination,
            });
        }
    }
    if let Some(args) = numeric_args(text, "INC") {
        if let [factory] = args[..] {
            return Ok(Action::Increase { factory });
        }
    }
    if text.eq_ignore_ascii_case("WAIT") {
        return Ok(Action::Wait);
    }
    if let Some(message) = strip_keyword(text, "MSG").and_then(|rest| rest.strip_prefix(' ')) {
        if !message.contains(['\r', '\u{85}', '\u{2028}', '\u{2029}']) {
            let message: String = message
                .trim_matches(|c: char| c <= ' ')
                .chars()
                .take(MAX_MESSAGE_LEN)
                .collect();
            return Ok(Action::Message(message));
        }
    }

    Err(OrderError::Malformed {
        action: text.to_string(),
    })
}

fn parse_number(token: &str) -> Option<u32> {
    let well_formed = !token.is_empty()
        && token.len() <= MAX_NUMBER_DIGITS
        && token.bytes().all(|b| b.is_ascii_digit());
    if well_formed {
        token.parse().ok()
    } else {
        None
    }
}

fn check_range(ctx: &OrderContext<'_>, role: &'static str, id: u32) -> Result<EntityId, OrderError> {
    if (id as usize) < ctx.factories.len() {
        Ok(id)
    } else {
        Err(OrderError::OutOfRange {
            role,
            id,
            factory_count: ctx.factories.len(),
        })
    }
}

fn check_owner(ctx: &OrderContext<'_>, verb: &'static str, id: EntityId) -> Result<(), OrderError> {
    let owned = ctx
        .factories
        .get(id as usize)
        .is_some_and(|f| f.owner.is(ctx.player));
    if owned {
        Ok(())
    } else {
        Err(OrderError::UnauthorizedSource { verb, factory: id })
    }
}

fn validate_source(
    ctx: &OrderContext<'_>,
    verb: &'static str,
    source: u32,
) -> Result<EntityId, OrderError> {
    let source = check_range(ctx, "source", source)?;
    check_owner(ctx, verb, source)?;
    Ok(source)
}

fn validate_route(
    ctx: &OrderContext<'_>,
    verb: &'static str,
    source: u32,
    destination: u32,
) -> Result<Route, OrderError> {
    let source = check_range(ctx, "source", source)?;
    let destination = check_range(ctx, "destination", destination)?;
    check_owner(ctx, verb, source)?;
    if source == destination {
        return Err(OrderError::DegenerateRoute {
            verb,
            factory: source,
        });
    }
    Ok(Route::new(source, destination))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{League, Ruleset};
    use crate::entities::Owner;
    use crate::error::OrderErrorKind;
    use crate::geometry::Point;

    fn factories() -> Vec<Factory> {
        vec![
            Factory::new(0, Owner::Neutral, Point::CENTER, 0, 0),
            Factory::new(1, Owner::Player(PlayerId(0)), Point::new(1000, 1000), 20, 1),
            Factory::new(2, Owner::Player(PlayerId(1)), Point::new(15000, 5500), 20, 1),
        ]
    }

    fn parse(raw: &str, rules: &Ruleset) -> Result<TurnOrders, OrderError> {
        let factories = factories();
        let ctx = OrderContext {
            player: PlayerId(0),
            factories: &factories,
            rules,
        };
        parse_orders(raw, &ctx)
    }

    fn parse_default(raw: &str) -> Result<TurnOrders, OrderError> {
        parse(raw, &Ruleset::default())
    }

    #[test]
    fn wait_is_empty() {
        let orders = parse_default("WAIT").unwrap();
        assert!(orders.is_empty());
        assert_eq!(orders.message, None);
    }

    #[test]
    fn parses_every_action() {
        let orders = parse_default("MOVE 1 2 5; BOMB 1 0;INC 1;MSG hello").unwrap();
        assert_eq!(
            orders.moves,
            vec![MoveOrder {
                route: Route::new(1, 2),
                units: 5
            }]
        );
        assert_eq!(orders.bombs, vec![BombOrder { route: Route::new(1, 0) }]);
        assert_eq!(orders.increases, vec![IncreaseOrder { factory: 1 }]);
        assert_eq!(orders.message.as_deref(), Some("hello"));
    }

    #[test]
    fn keywords_are_case_insensitive() {
        let orders = parse_default("move 1 2 5;wait;Inc 1").unwrap();
        assert_eq!(orders.moves.len(), 1);
        assert_eq!(orders.increases.len(), 1);
    }

    #[test]
    fn multiple_lines() {
        let orders = parse_default("MOVE 1 2 5\nMOVE 1 0 3\n").unwrap();
        assert_eq!(orders.moves.len(), 2);
    }

    #[test]
    fn message_keeps_semicolons_and_last_wins() {
        let orders = parse_default("MSG first;MSG a;b ; c").unwrap();
        assert_eq!(orders.message.as_deref(), Some("a;b ; c"));
    }

    #[test]
    fn message_is_trimmed_and_truncated() {
        let long = "x".repeat(150);
        let orders = parse_default(&format!("MSG    {long}   ")).unwrap();
        assert_eq!(orders.message.map(|m| m.len()), Some(MAX_MESSAGE_LEN));
    }

    #[test]
    fn unknown_action_is_malformed() {
        let err = parse_default("JUMP 1 2").unwrap_err();
        assert_eq!(err.kind(), OrderErrorKind::MalformedInput);
    }

    #[test]
    fn wrong_arity_is_malformed() {
        assert!(parse_default("MOVE 1 2").is_err());
        assert!(parse_default("BOMB 1 2 3").is_err());
        assert!(parse_default("WAIT 1").is_err());
    }

    #[test]
    fn negative_or_long_numbers_are_malformed() {
        assert_eq!(
            parse_default("MOVE -1 2 3").unwrap_err().kind(),
            OrderErrorKind::MalformedInput
        );
        assert_eq!(
            parse_default("MOVE 1 2 123456789").unwrap_err().kind(),
            OrderErrorKind::MalformedInput
        );
    }

    #[test]
    fn trailing_separator_is_malformed() {
        assert!(parse_default("MOVE 1 2 3;").is_err());
    }

    #[test]
    fn out_of_range_source() {
        let err = parse_default("MOVE 99 1 5").unwrap_err();
        assert_eq!(err.kind(), OrderErrorKind::InvalidReference);
        assert_eq!(
            err,
            OrderError::OutOfRange {
                role: "source",
                id: 99,
                factory_count: 3
            }
        );
    }

    #[test]
    fn out_of_range_destination() {
        let err = parse_default("BOMB 1 3").unwrap_err();
        assert!(matches!(
            err,
            OrderError::OutOfRange {
                role: "destination",
                ..
            }
        ));
    }

    #[test]
    fn foreign_source_is_rule_violation() {
        for raw in ["MOVE 2 1 5", "BOMB 0 1", "INC 2"] {
            let err = parse_default(raw).unwrap_err();
            assert_eq!(err.kind(), OrderErrorKind::RuleViolation, "{raw}");
        }
    }

    #[test]
    fn same_source_and_destination() {
        let err = parse_default("MOVE 1 1 5").unwrap_err();
        assert_eq!(
            err,
            OrderError::DegenerateRoute {
                verb: "MOVE",
                factory: 1
            }
        );
        assert!(parse_default("BOMB 1 1").is_err());
    }

    #[test]
    fn fatal_error_stops_at_first_problem() {
        let err = parse_default("MOVE 1 2 5;MOVE 99 1 5;JUMP").unwrap_err();
        assert_eq!(err.kind(), OrderErrorKind::InvalidReference);
    }

    #[test]
    fn move_restriction_drops_extra_moves() {
        let rules = Ruleset::for_league(League::Wood3);
        let orders = parse("MOVE 1 2 5;MOVE 1 0 3;MOVE 1 1 1", &rules).unwrap();
        assert_eq!(orders.moves.len(), 1);
        assert_eq!(orders.moves[0].route, Route::new(1, 2));
    }

    #[test]
    fn disabled_increase_is_dropped() {
        let rules = Ruleset::for_league(League::Wood1);
        let orders = parse("INC 1;INC 99", &rules).unwrap();
        assert!(orders.increases.is_empty());
    }

    #[test]
    fn empty_output_or_line_is_malformed() {
        for raw in ["", "\n", "WAIT\n\nWAIT", "  "] {
            let err = parse_default(raw).unwrap_err();
            assert_eq!(err.kind(), OrderErrorKind::MalformedInput, "{raw:?}");
        }
    }

    #[test]
    fn keyword_takes_exactly_one_space() {
        for raw in ["MOVE  1 0 5", "MOVE\t1 0 5", "INC   1", "BOMB  1 0", "MSG\thi", "MOVE1 0 5"] {
            let err = parse_default(raw).unwrap_err();
            assert_eq!(err.kind(), OrderErrorKind::MalformedInput, "{raw:?}");
        }
    }

    #[test]
    fn arguments_accept_any_whitespace_run() {
        let orders = parse_default("MOVE 1   0\t5").unwrap();
        assert_eq!(
            orders.moves,
            vec![MoveOrder {
                route: Route::new(1, 0),
                units: 5
            }]
        );
    }

    #[test]
    fn padding_outside_separators_is_malformed() {
        for raw in ["  WAIT  ", " WAIT", "WAIT ", "MOVE 1 0 5 ", "INC 1\t"] {
            let err = parse_default(raw).unwrap_err();
            assert_eq!(err.kind(), OrderErrorKind::MalformedInput, "{raw:?}");
        }
    }

    #[test]
    fn padding_around_separator_is_dropped() {
        let orders = parse_default("MOVE 1 0 5  ;  INC 1 ;\tWAIT").unwrap();
        assert_eq!(orders.moves.len(), 1);
        assert_eq!(orders.increases.len(), 1);
    }

    #[test]
    fn leading_separator_is_malformed() {
        assert!(parse_default(";WAIT").is_err());
        assert!(parse_default(" ; WAIT").is_err());
    }

    #[test]
    fn bare_message_is_malformed() {
        assert!(parse_default("MSG").is_err());
        assert!(parse_default("WAIT;MSG").is_err());
        assert_eq!(parse_default("MSG ").unwrap().message.as_deref(), Some(""));
    }

    #[test]
    fn split_only_before_keywords() {
        assert_eq!(split_actions("MOVE 1 2 3;WAIT"), vec!["MOVE 1 2 3", "WAIT"]);
        assert_eq!(split_actions("MSG a;b"), vec!["MSG a;b"]);
        assert_eq!(split_actions("MSG a; msg b"), vec!["MSG a", "msg b"]);
        assert_eq!(split_actions("MSG a;;WAIT"), vec!["MSG a;", "WAIT"]);
        assert_eq!(split_actions(";WAIT"), vec!["", "WAIT"]);
    }
}
