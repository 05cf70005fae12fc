//! Pebbles entry point
//!
//! A thin terminal driver around the engine: maps key input to commands,
//! prints the board after every report, and persists progress between
//! runs. All rules live in the library; nothing here inspects session
//! state beyond the public API.

use std::io::{self, BufRead, Write};
use std::path::Path;

use pebbles::catalog;
use pebbles::engine::{
    Command, Direction, Outcome, RejectReason, Session, apply, playback_complete,
};
use pebbles::progress::Progress;

const SAVE_PATH: &str = "pebbles_save.json";

fn main() {
    env_logger::init();
    log::info!("Pebbles starting...");

    let mut progress = load_progress(SAVE_PATH);
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    // Start from an explicit level id, or the first unfinished level.
    let requested = std::env::args().nth(1);
    let mut current = match requested {
        Some(id) if catalog::level(&id).is_some() => id,
        Some(id) => {
            eprintln!("unknown level '{id}'");
            return;
        }
        None => next_unfinished(&progress),
    };

    loop {
        if !progress.is_level_unlocked(&current) {
            println!("Level {current} is still locked.");
            return;
        }
        match play_level(&current, &mut progress, &mut lines) {
            PlayResult::Quit => break,
            PlayResult::Finished => match catalog::next_level(&current) {
                Some(next) => current = next.to_string(),
                None => {
                    println!("That was the last level. Thanks for playing!");
                    break;
                }
            },
        }
    }

    save_progress(SAVE_PATH, &progress);
}

enum PlayResult {
    Finished,
    Quit,
}

fn play_level(
    id: &str,
    progress: &mut Progress,
    lines: &mut impl Iterator<Item = io::Result<String>>,
) -> PlayResult {
    // Unlock gating is checked by the caller; ids come from the catalog.
    let Some(level) = catalog::level(id) else {
        return PlayResult::Quit;
    };
    let meta = level.meta().clone();
    let world_name = catalog::world(meta.world).map(|w| w.name).unwrap_or("?");

    println!("\n=== {} - {} ===", world_name, meta.name);
    if let Some(lore) = &meta.lore_id {
        if progress.mark_lore_seen(lore) {
            println!("[lore: {lore}]");
        }
    }
    if let Some(tutorial) = &meta.tutorial_id {
        if progress.mark_tutorial_seen(tutorial) {
            println!("[tutorial: {tutorial}]");
        }
    }

    let mut session = Session::new(&level);
    print_board(&session);

    loop {
        print!("> ");
        let _ = io::stdout().flush();
        let Some(Ok(line)) = lines.next() else {
            return PlayResult::Quit;
        };
        let Some(command) = parse_command(line.trim()) else {
            if line.trim() == "q" {
                return PlayResult::Quit;
            }
            println!("w/a/s/d move, x split, r reset, q quit");
            continue;
        };

        match apply(&mut session, command) {
            Outcome::Applied(report) => {
                // No animation here, so acknowledge playback right away.
                playback_complete(&mut session);
                for switch in &report.switches {
                    if switch.just_activated {
                        println!("* a switch lights up at ({}, {})", switch.pos.x, switch.pos.y);
                    }
                }
                print_board(&session);
                if report.won {
                    println!("Level complete in {} moves!", report.moves);
                    if let Some(world) = progress.complete_level(id) {
                        let name = catalog::world(world).map(|w| w.name).unwrap_or("?");
                        println!("World {world} unlocked: {name}");
                    }
                    save_progress(SAVE_PATH, progress);
                    return PlayResult::Finished;
                }
            }
            Outcome::Rejected(RejectReason::AlreadyWon) => return PlayResult::Finished,
            Outcome::Rejected(RejectReason::Busy) => {}
        }
    }
}

fn parse_command(input: &str) -> Option<Command> {
    match input {
        "w" => Some(Command::Move(Direction::Up)),
        "s" => Some(Command::Move(Direction::Down)),
        "a" => Some(Command::Move(Direction::Left)),
        "d" => Some(Command::Move(Direction::Right)),
        "x" => Some(Command::Split),
        "r" => Some(Command::Reset),
        _ => None,
    }
}

fn print_board(session: &Session) {
    println!("{}", session.render_text());
    println!(
        "Pebbles: {}/{}  Moves: {}",
        session.pebbles().len(),
        pebbles::consts::MAX_PEBBLES,
        session.moves()
    );
}

/// First level in play order the player has not completed yet.
fn next_unfinished(progress: &Progress) -> String {
    catalog::LEVEL_ORDER
        .iter()
        .find(|id| !progress.is_completed(id))
        .unwrap_or(&catalog::LEVEL_ORDER[0])
        .to_string()
}

fn load_progress(path: &str) -> Progress {
    if !Path::new(path).exists() {
        log::info!("no save file, starting a fresh profile");
        return Progress::new();
    }
    match std::fs::read_to_string(path) {
        Ok(json) => match Progress::from_json(&json) {
            Ok(progress) => {
                log::info!("loaded progress from {path}");
                progress
            }
            Err(err) => {
                log::warn!("save file unreadable ({err}), starting fresh");
                Progress::new()
            }
        },
        Err(err) => {
            log::warn!("failed to read {path}: {err}");
            Progress::new()
        }
    }
}

fn save_progress(path: &str, progress: &Progress) {
    match progress.to_json() {
        Ok(json) => {
            if let Err(err) = std::fs::write(path, json) {
                log::warn!("failed to write {path}: {err}");
            } else {
                log::info!("progress saved");
            }
        }
        Err(err) => log::warn!("failed to serialize progress: {err}"),
    }
}
