//! Command application
//!
//! The single entry point that advances a session: synchronized moves,
//! wall splits, and resets. Each accepted command resolves fully
//! (position updates, switch recomputation, win evaluation) before
//! control returns; a rejected command changes nothing.

use glam::IVec2;
use serde::{Deserialize, Serialize};

use crate::consts::MAX_PEBBLES;
use crate::engine::rules;
use crate::engine::state::{Direction, PebbleId, Session, SessionPhase};

/// A player command, already mapped from raw input by the driver.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    Move(Direction),
    Split,
    Reset,
}

/// What happened to a single pebble this command.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PebbleAction {
    /// Translated one cell.
    Moved,
    /// Move request was illegal; stayed in place (feedback only).
    Bumped,
    /// Untouched by this command.
    Held,
    /// Newly created by a split.
    Created,
}

/// Per-pebble slice of a report.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PebbleReport {
    pub id: PebbleId,
    pub pos: IVec2,
    pub action: PebbleAction,
    /// Split lineage; set only for `Created` pebbles.
    pub parent: Option<PebbleId>,
}

/// Per-switch slice of a report.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchReport {
    pub pos: IVec2,
    pub active: bool,
    /// Rising edge: went from inactive to active this command.
    pub just_activated: bool,
}

/// Everything a driver needs to present the result of one command.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepReport {
    /// One entry per live pebble, in Pebble Set order.
    pub pebbles: Vec<PebbleReport>,
    /// One entry per switch, in grid scan order.
    pub switches: Vec<SwitchReport>,
    pub won: bool,
    pub moves: u32,
    /// True iff at least one pebble changed position.
    pub any_moved: bool,
}

/// Why a command was ignored. Informational, not an error.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectReason {
    /// The level is already won; reset to continue.
    AlreadyWon,
    /// A previous move is still being played back by the driver.
    Busy,
}

/// Result of [`apply`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Applied(StepReport),
    Rejected(RejectReason),
}

impl Outcome {
    pub fn report(&self) -> Option<&StepReport> {
        match self {
            Outcome::Applied(report) => Some(report),
            Outcome::Rejected(_) => None,
        }
    }
}

/// Apply one command to the session.
///
/// Move and split are rejected after a win and while a move is still in
/// flight; reset is always accepted.
pub fn apply(session: &mut Session, command: Command) -> Outcome {
    match command {
        Command::Reset => Outcome::Applied(reset(session)),
        Command::Move(dir) => match gate(session) {
            Some(reason) => Outcome::Rejected(reason),
            None => Outcome::Applied(move_pebbles(session, dir)),
        },
        Command::Split => match gate(session) {
            Some(reason) => Outcome::Rejected(reason),
            None => Outcome::Applied(split_pebbles(session)),
        },
    }
}

/// Driver acknowledgement that playback of the last move finished.
/// Clears the in-flight slot so the next command is accepted.
pub fn playback_complete(session: &mut Session) {
    session.busy = false;
}

fn gate(session: &Session) -> Option<RejectReason> {
    if session.won() {
        return Some(RejectReason::AlreadyWon);
    }
    if session.busy {
        return Some(RejectReason::Busy);
    }
    None
}

fn move_pebbles(session: &mut Session, dir: Direction) -> StepReport {
    let plans = rules::plan_move(session.level.grid(), &session.pebbles, dir);

    let mut any_moved = false;
    let mut pebbles = Vec::with_capacity(plans.len());
    for (pebble, plan) in session.pebbles.iter_mut().zip(&plans) {
        if plan.legal {
            any_moved = true;
            pebble.pos = plan.to;
            pebbles.push(PebbleReport {
                id: plan.id,
                pos: plan.to,
                action: PebbleAction::Moved,
                parent: None,
            });
        } else {
            pebbles.push(PebbleReport {
                id: plan.id,
                pos: plan.from,
                action: PebbleAction::Bumped,
                parent: None,
            });
        }
    }

    if any_moved {
        // All-bump turns do not count and leave nothing to play back.
        session.moves += 1;
        session.busy = true;
    }

    finish(session, pebbles, any_moved)
}

fn split_pebbles(session: &mut Session) -> StepReport {
    let capacity = MAX_PEBBLES.saturating_sub(session.pebbles.len());
    let plans = if capacity == 0 {
        Vec::new()
    } else {
        rules::plan_splits(session.level.grid(), &session.pebbles, capacity)
    };

    let mut pebbles: Vec<PebbleReport> = session
        .pebbles
        .iter()
        .map(|p| PebbleReport {
            id: p.id,
            pos: p.pos,
            action: PebbleAction::Held,
            parent: None,
        })
        .collect();
    for plan in &plans {
        let id = session.spawn_pebble(plan.pos);
        pebbles.push(PebbleReport {
            id,
            pos: plan.pos,
            action: PebbleAction::Created,
            parent: Some(plan.parent),
        });
    }
    if !plans.is_empty() {
        log::debug!("split created {} pebble(s)", plans.len());
    }

    finish(session, pebbles, false)
}

fn reset(session: &mut Session) -> StepReport {
    session.respawn();
    log::info!("level {} reset", session.level.meta().id);

    let pebbles = session
        .pebbles
        .iter()
        .map(|p| PebbleReport {
            id: p.id,
            pos: p.pos,
            action: PebbleAction::Held,
            parent: None,
        })
        .collect();
    let switches = switch_reports(session);
    // A reset never wins a level, even if the start positions happen to
    // cover every switch; the win transition is taken only after a move
    // or split.
    StepReport {
        pebbles,
        switches,
        won: false,
        moves: session.moves,
        any_moved: false,
    }
}

/// Shared tail of move/split: recompute switches, evaluate win, report.
fn finish(session: &mut Session, pebbles: Vec<PebbleReport>, any_moved: bool) -> StepReport {
    let switches = switch_reports(session);
    if evaluate_win(session) && session.phase == SessionPhase::InProgress {
        session.phase = SessionPhase::Won;
        log::info!(
            "level {} complete in {} move(s)",
            session.level.meta().id,
            session.moves
        );
    }
    StepReport {
        pebbles,
        switches,
        won: session.won(),
        moves: session.moves,
        any_moved,
    }
}

fn switch_reports(session: &mut Session) -> Vec<SwitchReport> {
    let newly_active = session.refresh_switches();
    session
        .switches
        .iter()
        .map(|s| SwitchReport {
            pos: s.pos,
            active: s.active,
            just_activated: newly_active.contains(&s.pos),
        })
        .collect()
}

/// True iff the level has at least one switch and every switch is active.
/// A level with zero switches can never be won through this path.
fn evaluate_win(session: &Session) -> bool {
    !session.switches.is_empty() && session.switches.iter().all(|s| s.active)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::level::{LevelDef, LevelMeta};
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn level(map: &[&str]) -> LevelDef {
        LevelDef::from_map(map, LevelMeta::new("t-1", "Test", 1, 1)).unwrap()
    }

    /// A bordered 5x5 room with one interior switch, pebble at (1, 1).
    fn ring_level() -> LevelDef {
        level(&[
            "#####", //
            "#@..#", //
            "#.o.#", //
            "#...#", //
            "#####",
        ])
    }

    /// Apply a command and acknowledge playback immediately, the way a
    /// non-animating driver would.
    fn play(session: &mut Session, command: Command) -> Outcome {
        let outcome = apply(session, command);
        playback_complete(session);
        outcome
    }

    fn positions(session: &Session) -> Vec<IVec2> {
        session.pebbles().iter().map(|p| p.pos).collect()
    }

    #[test]
    fn test_move_right_then_down_wins_on_switch() {
        let mut session = Session::new(&ring_level());

        let outcome = play(&mut session, Command::Move(Direction::Right));
        let report = outcome.report().unwrap();
        assert_eq!(report.pebbles[0].action, PebbleAction::Moved);
        assert_eq!(report.pebbles[0].pos, IVec2::new(2, 1));
        assert!(!report.won);
        assert_eq!(report.moves, 1);

        let outcome = play(&mut session, Command::Move(Direction::Down));
        let report = outcome.report().unwrap();
        assert_eq!(report.pebbles[0].pos, IVec2::new(2, 2));
        assert!(report.switches[0].active);
        assert!(report.switches[0].just_activated);
        assert!(report.won);
        assert_eq!(report.moves, 2);
        assert!(session.won());
    }

    #[test]
    fn test_split_through_wall_creates_pebble_beyond() {
        // Pebble at (1, 1), wall at (2, 1), floor at (3, 1).
        let mut session = Session::new(&level(&[
            "#####", //
            "#@#.#", //
            "#...#", //
            "#####",
        ]));

        let outcome = play(&mut session, Command::Split);
        let report = outcome.report().unwrap();

        assert_eq!(session.pebbles().len(), 2);
        assert_eq!(report.pebbles[0].action, PebbleAction::Held);
        assert_eq!(report.pebbles[0].pos, IVec2::new(1, 1));
        assert_eq!(report.pebbles[1].action, PebbleAction::Created);
        assert_eq!(report.pebbles[1].pos, IVec2::new(3, 1));
        assert_eq!(report.pebbles[1].parent, Some(report.pebbles[0].id));
        assert!(report.pebbles[0].id < report.pebbles[1].id);
    }

    #[test]
    fn test_split_at_capacity_is_a_noop() {
        // Four pebbles with split opportunities left on the board.
        let mut session = Session::new(&level(&[
            "#######", //
            "#@#@#.#", //
            "#@#@#.#", //
            "#######",
        ]));
        assert_eq!(session.pebbles().len(), 4);

        let before = positions(&session);
        let outcome = play(&mut session, Command::Split);
        let report = outcome.report().unwrap();

        assert_eq!(session.pebbles().len(), 4);
        assert_eq!(positions(&session), before);
        assert!(
            report
                .pebbles
                .iter()
                .all(|p| p.action == PebbleAction::Held)
        );
    }

    #[test]
    fn test_split_stops_at_capacity_mid_scan() {
        // Two pebbles, each boxed by walls with several open beyond-cells;
        // only two newcomers fit under the cap.
        let mut session = Session::new(&level(&[
            "#########", //
            "#...#...#", //
            "#.#.#.#.#", //
            "##@###@##", //
            "#.#.#.#.#", //
            "#...#...#", //
            "#########",
        ]));
        assert_eq!(session.pebbles().len(), 2);

        let outcome = play(&mut session, Command::Split);
        let report = outcome.report().unwrap();

        assert_eq!(session.pebbles().len(), 4);
        let created: Vec<_> = report
            .pebbles
            .iter()
            .filter(|p| p.action == PebbleAction::Created)
            .collect();
        // First pebble claims Up and Down before the second gets a slot.
        assert_eq!(created.len(), 2);
        assert_eq!(created[0].parent, Some(report.pebbles[0].id));
        assert_eq!(created[1].parent, Some(report.pebbles[0].id));
    }

    #[test]
    fn test_split_can_win_level() {
        // The only switch sits one step beyond the wall: dividing must
        // trigger win detection exactly like a move.
        let mut session = Session::new(&level(&[
            "#######", //
            "#..o..#", //
            "#..#..#", //
            "#..@..#", //
            "#######",
        ]));

        let outcome = play(&mut session, Command::Split);
        let report = outcome.report().unwrap();
        assert_eq!(session.pebbles().len(), 2);
        assert!(report.switches[0].just_activated);
        assert!(report.won);
        assert!(session.won());
    }

    #[test]
    fn test_no_switches_means_no_win() {
        let mut session = Session::new(&level(&[
            "####", //
            "#@.#", //
            "#..#", //
            "####",
        ]));

        for command in [
            Command::Move(Direction::Right),
            Command::Move(Direction::Down),
            Command::Move(Direction::Left),
            Command::Move(Direction::Up),
        ] {
            let outcome = play(&mut session, command);
            assert!(!outcome.report().unwrap().won);
        }
        assert!(!session.won());
    }

    #[test]
    fn test_all_bump_turn_does_not_count() {
        let mut session = Session::new(&ring_level());

        let outcome = play(&mut session, Command::Move(Direction::Up));
        let report = outcome.report().unwrap();
        assert!(!report.any_moved);
        assert_eq!(report.pebbles[0].action, PebbleAction::Bumped);
        assert_eq!(report.pebbles[0].pos, IVec2::new(1, 1));
        assert_eq!(report.moves, 0);
        assert_eq!(session.moves(), 0);
    }

    #[test]
    fn test_all_bump_turn_leaves_session_ready() {
        let mut session = Session::new(&ring_level());
        // No playback acknowledgement: an all-bump move must not hold the
        // in-flight slot.
        let outcome = apply(&mut session, Command::Move(Direction::Up));
        assert!(outcome.report().is_some());
        assert!(!session.is_busy());

        let outcome = apply(&mut session, Command::Move(Direction::Right));
        assert!(outcome.report().is_some());
    }

    #[test]
    fn test_commands_rejected_while_move_in_flight() {
        let mut session = Session::new(&ring_level());

        let outcome = apply(&mut session, Command::Move(Direction::Right));
        assert!(outcome.report().is_some());
        assert!(session.is_busy());

        let before = positions(&session);
        assert_eq!(
            apply(&mut session, Command::Move(Direction::Down)),
            Outcome::Rejected(RejectReason::Busy)
        );
        assert_eq!(
            apply(&mut session, Command::Split),
            Outcome::Rejected(RejectReason::Busy)
        );
        assert_eq!(positions(&session), before);
        assert_eq!(session.moves(), 1);

        playback_complete(&mut session);
        let outcome = apply(&mut session, Command::Move(Direction::Down));
        assert!(outcome.report().is_some());
    }

    #[test]
    fn test_splits_do_not_occupy_the_in_flight_slot() {
        let mut session = Session::new(&level(&[
            "#####", //
            "#@#.#", //
            "#...#", //
            "#####",
        ]));

        let outcome = apply(&mut session, Command::Split);
        assert!(outcome.report().is_some());
        assert!(!session.is_busy());
    }

    #[test]
    fn test_move_and_split_rejected_after_win() {
        let mut session = Session::new(&ring_level());
        let _ = play(&mut session, Command::Move(Direction::Right));
        let _ = play(&mut session, Command::Move(Direction::Down));
        assert!(session.won());

        let before = positions(&session);
        assert_eq!(
            apply(&mut session, Command::Move(Direction::Up)),
            Outcome::Rejected(RejectReason::AlreadyWon)
        );
        assert_eq!(
            apply(&mut session, Command::Split),
            Outcome::Rejected(RejectReason::AlreadyWon)
        );
        assert_eq!(positions(&session), before);
        assert_eq!(session.moves(), 2);
    }

    #[test]
    fn test_reset_restores_starts_and_clears_win() {
        let mut session = Session::new(&ring_level());
        let _ = play(&mut session, Command::Move(Direction::Right));
        let _ = play(&mut session, Command::Move(Direction::Down));
        assert!(session.won());

        let outcome = apply(&mut session, Command::Reset);
        let report = outcome.report().unwrap();
        assert!(!report.won);
        assert_eq!(report.moves, 0);
        assert_eq!(positions(&session), session.level().start_positions());
        assert!(!session.won());
        assert!(!session.is_busy());

        // The session is playable again.
        let outcome = apply(&mut session, Command::Move(Direction::Right));
        assert!(outcome.report().is_some());
    }

    #[test]
    fn test_reset_accepted_while_busy() {
        let mut session = Session::new(&ring_level());
        let _ = apply(&mut session, Command::Move(Direction::Right));
        assert!(session.is_busy());

        let outcome = apply(&mut session, Command::Reset);
        assert!(outcome.report().is_some());
        assert!(!session.is_busy());
        assert_eq!(positions(&session), session.level().start_positions());
    }

    #[test]
    fn test_lockstep_chain_leader_moves_follower_bumps() {
        let mut session = Session::new(&level(&[
            "#####", //
            "#@@.#", //
            "#####",
        ]));

        let outcome = play(&mut session, Command::Move(Direction::Right));
        let report = outcome.report().unwrap();
        assert_eq!(report.pebbles[0].action, PebbleAction::Bumped);
        assert_eq!(report.pebbles[1].action, PebbleAction::Moved);
        assert_eq!(positions(&session), vec![IVec2::new(1, 1), IVec2::new(3, 1)]);
        // One pebble moved, so the turn counts.
        assert_eq!(report.moves, 1);
    }

    #[test]
    fn test_switch_transitions_report_edges() {
        // Two switches; stepping onto the first flags a rising edge
        // without winning, stepping off drops it silently.
        let mut session = Session::new(&level(&[
            "#####", //
            "#...#", //
            "#@o.#", //
            "#..o#", //
            "#####",
        ]));

        let outcome = play(&mut session, Command::Move(Direction::Right));
        let report = outcome.report().unwrap();
        assert!(report.switches[0].active);
        assert!(report.switches[0].just_activated);
        assert!(!report.switches[1].active);
        assert!(!report.won);

        let outcome = play(&mut session, Command::Move(Direction::Right));
        let report = outcome.report().unwrap();
        assert!(!report.switches[0].active);
        assert!(!report.switches[0].just_activated);
    }

    fn command_from_byte(byte: u8) -> Command {
        match byte % 6 {
            0 => Command::Move(Direction::Up),
            1 => Command::Move(Direction::Down),
            2 => Command::Move(Direction::Left),
            3 => Command::Move(Direction::Right),
            4 => Command::Split,
            _ => Command::Reset,
        }
    }

    /// A busy little room: walls to split through, two switches, portals.
    fn proptest_level() -> LevelDef {
        level(&[
            "########", //
            "#@.#..o#", //
            "#..#.*.#", //
            "#.##.#.#", //
            "#o.....#", //
            "########",
        ])
    }

    proptest! {
        #[test]
        fn prop_no_two_pebbles_share_a_cell(bytes in proptest::collection::vec(any::<u8>(), 0..64)) {
            let mut session = Session::new(&proptest_level());
            for byte in bytes {
                let _ = play(&mut session, command_from_byte(byte));
                let unique: HashSet<IVec2> =
                    session.pebbles().iter().map(|p| p.pos).collect();
                prop_assert_eq!(unique.len(), session.pebbles().len());
            }
        }

        #[test]
        fn prop_pebble_count_never_exceeds_cap(bytes in proptest::collection::vec(any::<u8>(), 0..64)) {
            let mut session = Session::new(&proptest_level());
            for byte in bytes {
                let _ = play(&mut session, command_from_byte(byte));
                prop_assert!(session.pebbles().len() <= MAX_PEBBLES);
            }
        }

        #[test]
        fn prop_reset_restores_start_configuration(bytes in proptest::collection::vec(any::<u8>(), 0..32)) {
            let level = proptest_level();
            let mut session = Session::new(&level);
            for byte in bytes {
                let _ = play(&mut session, command_from_byte(byte));
            }
            let _ = play(&mut session, Command::Reset);
            let positions: Vec<IVec2> =
                session.pebbles().iter().map(|p| p.pos).collect();
            prop_assert_eq!(positions, level.start_positions().to_vec());
            prop_assert!(!session.won());
            prop_assert_eq!(session.moves(), 0);
        }
    }
}
